//! End-to-end behaviour of discovery, binding and synthesis.

use daedalus::prelude::*;
use daedalus::{Fault, Prepared, SynthesisError};
use daedalus_test::TestClient;
use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Serialize, schemars::JsonSchema)]
struct User {
    name: String,
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq, schemars::JsonSchema)]
struct Pair {
    a: i64,
    b: String,
}

#[derive(Default, Aggregate)]
struct UserById {
    #[http("users/:id")]
    ctx: WebContext,
    #[http("in=query")]
    id: u64,
}

#[derive(Default, Outcome)]
struct UserOut {
    #[http("200")]
    pub data: Option<User>,
    pub not_found_404: Option<Fault>,
}

#[derive(Default, Aggregate)]
struct Profile {
    #[http("me, method=get, middleware=")]
    ctx: WebContext,
}

#[derive(Default, Aggregate)]
struct JsonParams {
    ctx: WebContext,
    json: Pair,
}

#[derive(Default, Aggregate)]
struct XmlParams {
    #[http("pairs, xml")]
    ctx: WebContext,
    pair: Pair,
}

#[derive(Default, Aggregate)]
struct Ranged {
    #[http("ranged")]
    ctx: WebContext,
    #[http("id")]
    #[validate("gte=100,lte=999")]
    id: i64,
}

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
struct Address {
    #[validate("required")]
    city: String,
}

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
struct Account {
    #[validate("required,email")]
    email: String,
    #[daedalus(nested)]
    address: Address,
}

#[derive(Default, Aggregate)]
struct Signup {
    #[http("signup")]
    ctx: WebContext,
    #[daedalus(no_schema, nested)]
    account: Account,
}

static RANGED_CALLS: AtomicUsize = AtomicUsize::new(0);

#[derive(Controller)]
#[daedalus(no_operations)]
struct Api {
    #[http("/api")]
    server: WebServer,
    #[extender]
    users: Arc<Users>,
}

#[derive(Controller)]
struct Users {
    #[http("tag=users")]
    controller: WebController,
}

#[operations]
impl Users {
    pub async fn get_user_by_id(&self, ctx: WebContext) {
        ctx.text(StatusCode::OK, "by id");
    }

    pub async fn get_user(&self, params: UserById) -> UserOut {
        if params.id == 0 {
            return UserOut {
                not_found_404: Some(Fault::new("no such user")),
                ..UserOut::default()
            };
        }
        UserOut {
            data: Some(User {
                name: format!("user-{}", params.id),
            }),
            ..UserOut::default()
        }
    }

    pub async fn post_profile(&self, params: Profile) {
        params.ctx.text(StatusCode::OK, "profile");
    }

    pub async fn post_json(&self, params: JsonParams) {
        params.ctx.json(StatusCode::OK, &params.json);
    }

    pub async fn post_xml(&self, params: XmlParams) {
        params.ctx.json(StatusCode::OK, &params.pair);
    }

    pub async fn get_ranged(&self, params: Ranged) {
        RANGED_CALLS.fetch_add(1, Ordering::SeqCst);
        params.ctx.text(StatusCode::OK, params.id.to_string());
    }

    pub async fn post_signup(&self, params: Signup) {
        params.ctx.json(StatusCode::CREATED, &params.account);
    }

    pub async fn get_silent(&self, _ctx: WebContext) {}
}

fn prepare(config: WebConfig) -> Prepared {
    Launcher::new(config).prepare::<Api>().unwrap()
}

fn client() -> TestClient {
    TestClient::from_prepared(&prepare(WebConfig::new()))
}

fn entry<'a>(prepared: &'a Prepared, operation: &str) -> &'a daedalus::RouteTableEntry {
    prepared
        .table()
        .entries()
        .iter()
        .find(|e| e.operation == operation)
        .unwrap_or_else(|| panic!("{operation} not registered"))
}

#[tokio::test]
async fn verb_prefix_gives_method_and_path() {
    let prepared = prepare(WebConfig::new());
    let found = entry(&prepared, "Users.get_user_by_id");
    assert_eq!(found.method, Method::GET);
    assert_eq!(found.path, "/api/userbyid");

    let response = TestClient::from_prepared(&prepared).get("/api/userbyid").send().await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.text().unwrap(), "by id");
}

#[tokio::test]
async fn carrier_tag_overrides_name_defaults() {
    let prepared = prepare(WebConfig::new());
    let found = entry(&prepared, "Users.post_profile");
    assert_eq!(found.method, Method::GET);
    assert_eq!(found.path, "/api/me");
    assert!(found.middleware.is_empty());

    let client = TestClient::from_prepared(&prepared);
    client.get("/api/me").send().await.assert_status(StatusCode::OK);
    client
        .post("/api/profile")
        .send()
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn path_capture_beats_in_tag() {
    let response = client().get("/api/users/7?id=99").send().await;
    response
        .assert_status(StatusCode::OK)
        .assert_content_type("application/json")
        .assert_json_field("name", &json!("user-7"));
}

#[tokio::test]
async fn error_field_takes_status_from_name() {
    let response = client().get("/api/users/0").send().await;
    response
        .assert_status(StatusCode::NOT_FOUND)
        .assert_json_field("message", &json!("no such user"));
}

#[test]
fn result_field_emits_one_route_and_response() {
    let prepared = prepare(WebConfig::new().with_openapi(|o| o.enable().set_title("Users")));
    let routes = prepared
        .table()
        .entries()
        .iter()
        .filter(|e| e.operation == "Users.get_user")
        .count();
    assert_eq!(routes, 1);

    assert!(prepared.document().is_frozen());
    let document = prepared.document().get().unwrap();
    let value = serde_json::to_value(&*document).unwrap();
    let operation = &value["paths"]["/api/users/{id}"]["get"];
    assert_eq!(operation["tags"], json!(["users"]));

    let content = operation["responses"]["200"]["content"].as_object().unwrap();
    assert_eq!(content.len(), 1);
    let schema = &content["application/json"]["schema"];
    assert_eq!(schema["type"], "object");
    assert_eq!(schema["properties"]["name"]["type"], "string");
    assert!(operation["responses"]["404"].is_object());

    let parameters = operation["parameters"].as_array().unwrap();
    assert_eq!(parameters.len(), 1);
    assert_eq!(parameters[0]["in"], "path");
}

#[tokio::test]
async fn base_path_lives_in_server_url_only() {
    let prepared = prepare(
        WebConfig::new()
            .set_port(8000)
            .set_base_path("/v1")
            .with_openapi(|o| o.enable()),
    );
    assert_eq!(entry(&prepared, "Users.get_user").path, "/v1/api/users/:id");

    let document = prepared.document().get().unwrap();
    let value = serde_json::to_value(&*document).unwrap();
    let url = value["servers"][0]["url"].as_str().unwrap();
    assert!(url.ends_with(":8000/v1"), "server url was {url}");

    let paths = value["paths"].as_object().unwrap();
    assert!(paths.contains_key("/api/users/{id}"));
    assert!(paths.keys().all(|key| !key.starts_with("/v1")));

    let response = TestClient::from_prepared(&prepared).get("/v1/api/users/7").send().await;
    response
        .assert_status(StatusCode::OK)
        .assert_json_field("name", &json!("user-7"));
}

#[test]
fn duplicate_extender_is_rejected() {
    #[derive(Controller)]
    #[daedalus(no_operations)]
    struct Twice {
        #[http("/api")]
        server: WebServer,
        #[extender]
        first: Arc<Users>,
        #[extender]
        second: Arc<Users>,
    }

    let err = Launcher::new(WebConfig::new()).prepare::<Twice>().unwrap_err();
    assert!(matches!(err, LaunchError::Synthesis(SynthesisError::Route(_))), "{err}");
}

#[tokio::test]
async fn post_json_binds_whole_body() {
    let prepared = prepare(WebConfig::new());
    assert_eq!(entry(&prepared, "Users.post_json").path, "/api/json");

    let response = TestClient::from_prepared(&prepared)
        .post_json("/api/json", &json!({"a": 123, "b": "x"}))
        .send()
        .await;
    response.assert_status(StatusCode::OK);
    assert_eq!(
        response.json::<Pair>().unwrap(),
        Pair {
            a: 123,
            b: "x".to_string()
        }
    );
}

#[tokio::test]
async fn xml_coding_decodes_whole_body() {
    let client = client();
    let response = client
        .post("/api/pairs")
        .header("content-type", "application/xml")
        .body("<pair><a>9</a><b>nine</b></pair>")
        .send()
        .await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.json::<Pair>().unwrap(), Pair { a: 9, b: "nine".to_string() });

    // Without a content type the declared coding is assumed.
    let response = client.post("/api/pairs").body("<pair><a>1</a><b>one</b></pair>").send().await;
    assert_eq!(response.json::<Pair>().unwrap(), Pair { a: 1, b: "one".to_string() });
}

#[tokio::test]
async fn validation_failure_short_circuits() {
    let client = client();
    let before = RANGED_CALLS.load(Ordering::SeqCst);

    let response = client.get("/api/ranged?id=50").send().await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let error: serde_json::Value = response.json().unwrap();
    assert!(error["message"].is_string());
    assert!(error.get("code").is_some());
    assert_eq!(RANGED_CALLS.load(Ordering::SeqCst), before);

    let response = client.get("/api/ranged?id=150").send().await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.text().unwrap(), "150");
}

#[tokio::test]
async fn nested_member_rules_reject_body() {
    let client = client();
    let response = client
        .post_json("/api/signup", &json!({"email": "ann@example.com", "address": {}}))
        .send()
        .await;
    response.assert_status(StatusCode::BAD_REQUEST).assert_json_field(
        "message",
        &json!("Field validation for 'account.address.city' failed on the 'required' tag"),
    );

    let response = client
        .post_json(
            "/api/signup",
            &json!({"email": "ann@example.com", "address": {"city": "Oslo"}}),
        )
        .send()
        .await;
    response
        .assert_status(StatusCode::CREATED)
        .assert_json_field("address.city", &json!("Oslo"));
}

#[tokio::test]
async fn no_result_fields_writes_nothing() {
    let response = client().get("/api/silent").send().await;
    response.assert_status(StatusCode::OK);
    assert!(response.body().is_empty());
    assert!(response.content_type().is_none());
}
