//! Synthesis of hand-described controllers.

use bytes::Bytes;
use daedalus_config::WebConfig;
use daedalus_core::{
    synthesize, Aggregate, Binder, Controller, ControllerLayout, ControllerNode, FieldDescriptor,
    InputField, Mount, OperationDef, Operations, Outcome, OutputField, OutputValue, PredecessorSlot,
    SynthesisEnv, SynthesisError, Tags, TypeClass, WebContext, WebController, WebMiddleware,
    WebServer,
};
use http::{Method, Request, StatusCode};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
struct User {
    name: String,
}

#[derive(Default)]
struct UserParams {
    ctx: WebContext,
    id: String,
}

impl Aggregate for UserParams {
    fn type_name() -> &'static str {
        "UserParams"
    }

    fn fields() -> Vec<InputField<Self>> {
        vec![
            InputField::new(
                FieldDescriptor::carrier(0, "ctx").tags(Tags::new(&[("http", "user/:id")])),
                Binder::Context(|p: &mut UserParams, ctx| p.ctx = ctx),
            ),
            InputField::new(
                FieldDescriptor::new(1, "id", TypeClass::Text).type_name("String"),
                Binder::Value(|p: &mut UserParams, v| {
                    p.id = serde_json::from_value(v)?;
                    Ok(())
                }),
            ),
        ]
    }
}

#[derive(Default)]
struct UserOut {
    data: Option<User>,
}

impl Outcome for UserOut {
    fn type_name() -> &'static str {
        "UserOut"
    }

    fn fields() -> Vec<OutputField<Self>> {
        vec![OutputField::new(
            FieldDescriptor::new(0, "data", TypeClass::Struct)
                .optional()
                .type_name("User")
                .schema(|| {
                    serde_json::json!({
                        "type": "object",
                        "properties": { "name": { "type": "string" } }
                    })
                }),
            |o: &mut UserOut| o.data.take().map(|u| OutputValue::data(&u)).transpose(),
        )]
    }
}

struct Users;

impl Controller for Users {
    fn type_name(&self) -> &'static str {
        "Users"
    }

    fn layout(&self) -> ControllerLayout {
        ControllerLayout {
            predecessors: vec![PredecessorSlot::of::<WebController>(
                "controller",
                Tags::new(&[("http", "tag=users")]),
            )],
            ..ControllerLayout::default()
        }
    }
}

impl Operations for Users {
    fn operations() -> Vec<OperationDef<Self>> {
        vec![OperationDef::new::<UserParams, UserOut>("get_user", |_, p| {
            Box::pin(async move {
                UserOut {
                    data: Some(User {
                        name: format!("user-{}", p.id),
                    }),
                }
            })
        })]
    }
}

struct Stamp;

impl Controller for Stamp {
    fn type_name(&self) -> &'static str {
        "Stamp"
    }

    fn layout(&self) -> ControllerLayout {
        ControllerLayout {
            predecessors: vec![PredecessorSlot::of::<WebMiddleware>("middleware", Tags::EMPTY)],
            ..ControllerLayout::default()
        }
    }
}

impl Operations for Stamp {
    fn operations() -> Vec<OperationDef<Self>> {
        vec![OperationDef::new::<WebContext, ()>("handle_stamp", |_, ctx| {
            Box::pin(async move { ctx.header("x-stamp", "1") })
        })]
    }
}

struct Root {
    tags: Tags,
    predecessors: usize,
    middlewares: Vec<Mount>,
    extenders: Vec<Mount>,
}

impl Root {
    fn new(tags: &'static [(&'static str, &'static str)]) -> Self {
        Self {
            tags: Tags::new(tags),
            predecessors: 1,
            middlewares: vec![Mount::new("stamp", Arc::new(Stamp))],
            extenders: vec![Mount::new("users", Arc::new(Users))],
        }
    }
}

impl Controller for Root {
    fn type_name(&self) -> &'static str {
        "Root"
    }

    fn layout(&self) -> ControllerLayout {
        ControllerLayout {
            predecessors: (0..self.predecessors)
                .map(|_| PredecessorSlot::of::<WebServer>("server", self.tags))
                .collect(),
            middlewares: self.middlewares.clone(),
            extenders: self.extenders.clone(),
        }
    }
}

impl Operations for Root {
    fn operations() -> Vec<OperationDef<Self>> {
        Vec::new()
    }
}

fn env(openapi: bool) -> SynthesisEnv {
    SynthesisEnv::new(WebConfig::new().with_openapi(|o| o.set_enabled(openapi)))
}

fn root(node: Root) -> Arc<dyn ControllerNode> {
    Arc::new(node)
}

#[tokio::test]
async fn test_routes_through_group_and_middleware() {
    let table = synthesize(&root(Root::new(&[("http", "/api, middleware=stamp")])), &env(false)).unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.entries()[0].path, "/api/user/:id");
    assert_eq!(table.entries()[0].middleware, vec!["stamp".to_string()]);

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/user/7")
        .body(Bytes::new())
        .unwrap();
    let response = table.handle(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("x-stamp").unwrap(), "1");
    let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body, serde_json::json!({ "name": "user-7" }));
}

#[test]
fn test_document_mirrors_routes() {
    let env = env(true);
    synthesize(&root(Root::new(&[("http", "/api")])), &env).unwrap();

    let document = env.document.get().unwrap();
    let operation = document.paths["/api/user/{id}"].operation("get").unwrap();
    assert_eq!(operation.operation_id, "Users.get_user");
    assert_eq!(operation.tags, vec!["users".to_string()]);
    assert_eq!(operation.parameters[0].name, "id");
    assert!(operation.parameters[0].required);
    assert_eq!(operation.responses.len(), 1);
    assert!(operation.responses["200"].content.contains_key("application/json"));
}

#[test]
fn test_document_disabled_is_not_frozen() {
    let env = env(false);
    synthesize(&root(Root::new(&[])), &env).unwrap();
    assert!(!env.document.is_frozen());
}

#[test]
fn test_unknown_middleware_is_fatal() {
    let err = synthesize(&root(Root::new(&[("http", "middleware=missing")])), &env(false)).unwrap_err();
    assert!(matches!(err, SynthesisError::UnknownMiddleware { ref name, .. } if name == "missing"));
}

#[test]
fn test_duplicate_extender_is_fatal() {
    let mut node = Root::new(&[]);
    node.extenders.push(Mount::new("again", Arc::new(Users)));
    let err = synthesize(&root(node), &env(false)).unwrap_err();
    assert!(matches!(err, SynthesisError::Route(_)));
}

#[test]
fn test_duplicate_middleware_is_fatal() {
    let mut node = Root::new(&[]);
    node.middlewares.push(Mount::new("stamp_again", Arc::new(Stamp)));
    let err = synthesize(&root(node), &env(false)).unwrap_err();
    assert_eq!(err.to_string(), "middleware's handler 'stamp' is duplicated");
}

#[test]
fn test_role_mismatch_is_fatal() {
    let mut node = Root::new(&[]);
    node.middlewares = vec![Mount::new("users", Arc::new(Users))];
    let err = synthesize(&root(node), &env(false)).unwrap_err();
    assert!(matches!(err, SynthesisError::RoleMismatch { field: "users", .. }));
}

#[test]
fn test_predecessor_count_is_fatal() {
    let mut node = Root::new(&[]);
    node.predecessors = 2;
    let err = synthesize(&root(node), &env(false)).unwrap_err();
    assert!(matches!(err, SynthesisError::PredecessorCount { found: 2, .. }));
}

#[test]
fn test_env_gate_skips_subtree() {
    let env = SynthesisEnv::new(WebConfig::new().set_mode(daedalus_config::RuntimeMode::Prod));
    let table = synthesize(&root(Root::new(&[("http", "env=dev&test")])), &env).unwrap();
    assert!(table.is_empty());
}
