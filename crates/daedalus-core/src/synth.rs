//! Route and document synthesis.
//!
//! [`synthesize`] walks a controller tree once. For each controller it
//! compiles the mounted middleware into a name map, applies the group
//! attributes of its role marker, registers every request operation in
//! the [`RouteTable`] and, when the document is enabled, emits the
//! matching OpenAPI operation. Extenders are visited last, nested under the
//! controller's group.

use crate::binding::{resolve_request, BindingLocation, BoundInputField, HTTP_TAG};
use crate::controller::{ControllerKind, ControllerNode, Mount};
use crate::descriptor::{FieldDescriptor, TypeClass};
use crate::discover::{OperationSpec, Purpose};
use crate::dispatch::Handler;
use crate::error::{SynthesisError, WebError};
use crate::refs::Container;
use crate::routes::{RouteScope, RouteTable, RouteTableEntry};
use crate::tag::Tag;
use crate::validate::{RuleValidator, Validator};
use daedalus_config::WebConfig;
use daedalus_docs::{
    capture_names, concat_openapi_path, join_paths, Info, MediaType, OpenApi, Operation, Parameter, ParameterIn,
    RequestBody, Response, Schema, SchemaType, Server, ServerVariable,
};
use daedalus_extract::MultipartConfig;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// The OpenAPI document of a synthesized tree.
///
/// Empty until synthesis completes; frozen afterwards. Controllers that
/// serve the document hold this handle and read it per request.
#[derive(Debug, Default)]
pub struct ApiDocument {
    cell: OnceLock<Arc<OpenApi>>,
}

impl ApiDocument {
    /// Creates an empty handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// The frozen document, once synthesis has finished.
    pub fn get(&self) -> Option<Arc<OpenApi>> {
        self.cell.get().cloned()
    }

    /// `true` once the document is frozen.
    pub fn is_frozen(&self) -> bool {
        self.cell.get().is_some()
    }

    pub(crate) fn freeze(&self, document: OpenApi) {
        if self.cell.set(Arc::new(document)).is_err() {
            tracing::warn!("document already frozen, keeping the first one");
        }
    }
}

/// Everything synthesis reads besides the controller tree.
#[derive(Clone)]
pub struct SynthesisEnv {
    /// Server configuration.
    pub config: Arc<WebConfig>,
    /// Validator run by every dispatcher.
    pub validator: Arc<dyn Validator>,
    /// Reference container, reachable from `setup_router`.
    pub refs: Arc<Container>,
    /// Target of document emission.
    pub document: Arc<ApiDocument>,
    /// Limits for multipart bodies.
    pub multipart: MultipartConfig,
}

impl SynthesisEnv {
    /// Creates an environment with a [`RuleValidator`] on the configured tag.
    pub fn new(config: WebConfig) -> Self {
        let validator = Arc::new(RuleValidator::new(config.validator_tag.clone()));
        Self {
            config: Arc::new(config),
            validator,
            refs: Arc::new(Container::new()),
            document: Arc::new(ApiDocument::new()),
            multipart: MultipartConfig::default(),
        }
    }

    /// Replaces the reference container.
    #[must_use]
    pub fn with_refs(mut self, refs: Arc<Container>) -> Self {
        self.refs = refs;
        self
    }

    /// Replaces the document handle.
    #[must_use]
    pub fn with_document(mut self, document: Arc<ApiDocument>) -> Self {
        self.document = document;
        self
    }

    /// Replaces the validator.
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = validator;
        self
    }

    /// Replaces the multipart limits.
    #[must_use]
    pub fn with_multipart(mut self, multipart: MultipartConfig) -> Self {
        self.multipart = multipart;
        self
    }
}

impl fmt::Debug for SynthesisEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynthesisEnv")
            .field("config", &self.config)
            .field("refs", &self.refs)
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}

/// Synthesizes the route table of the tree rooted at `root`.
///
/// Registration happens regardless of the document setting; the document
/// is emitted alongside and frozen into [`SynthesisEnv::document`] when
/// `openapi.enabled` is set.
pub fn synthesize(root: &Arc<dyn ControllerNode>, env: &SynthesisEnv) -> Result<RouteTable, SynthesisError> {
    let mut table = RouteTable::new(env.multipart.clone());
    let mut document = env.config.openapi.enabled.then(|| new_document(&env.config));

    let mut walker = Walker {
        env,
        table: &mut table,
        document: document.as_mut(),
    };
    let group = Group {
        base: env.config.base_path.clone(),
        document_base: String::new(),
        chain: Vec::new(),
        middleware: Vec::new(),
    };
    walker.visit(root, &group)?;

    if let Some(document) = document {
        env.document.freeze(document);
    }
    tracing::info!(routes = table.len(), "route synthesis complete");
    Ok(table)
}

/// Inherited group state.
///
/// `document_base` omits the configured base path, which the document
/// carries in its server URL instead.
struct Group {
    base: String,
    document_base: String,
    chain: Vec<Handler>,
    middleware: Vec<String>,
}

struct Walker<'a> {
    env: &'a SynthesisEnv,
    table: &'a mut RouteTable,
    document: Option<&'a mut OpenApi>,
}

impl Walker<'_> {
    fn visit(&mut self, node: &Arc<dyn ControllerNode>, parent: &Group) -> Result<(), SynthesisError> {
        let controller = node.type_name();
        let layout = node.layout();
        let predecessor = *layout.predecessor().ok_or(SynthesisError::PredecessorCount {
            controller,
            found: layout.predecessors.len(),
        })?;

        let attrs = Tag::parse(predecessor.tags.lookup(HTTP_TAG).unwrap_or_default());
        if let Some(env) = attrs.get("env") {
            if !self.env.config.mode.is_in_only(env) {
                tracing::info!(controller, env, mode = %self.env.config.mode, "controller disabled in this mode");
                return Ok(());
            }
        }

        let middlewares = self.compile_middleware(controller, &layout.middlewares)?;

        let group_path = attrs.preferred("path", true).unwrap_or_default();
        let mut group = Group {
            base: join_paths(&parent.base, group_path),
            document_base: join_paths(&parent.document_base, group_path),
            chain: parent.chain.clone(),
            middleware: parent.middleware.clone(),
        };
        for name in split_list(attrs.get("middleware")) {
            let handler = middlewares.get(name).ok_or_else(|| SynthesisError::UnknownMiddleware {
                name: name.to_string(),
                user: controller.to_string(),
            })?;
            group.chain.push(handler.clone());
            group.middleware.push(name.to_string());
        }
        let labels: Vec<String> = split_list(attrs.get("tag")).map(str::to_string).collect();

        tracing::debug!(controller, base = %group.base, middleware = ?group.middleware, "setting up controller");

        let discovered = node.clone().discover(Purpose::Request, self.env.config.mode, &self.env.validator)?;
        for mut found in discovered {
            let captures = capture_names(&join_paths(&group.base, &found.spec.path));
            let (openapi_path, _) = concat_openapi_path(&group.document_base, &found.spec.path);
            resolve_request(&mut found.spec, &captures)?;

            let mut chain = group.chain.clone();
            let mut names = group.middleware.clone();
            for name in &found.spec.middleware_names {
                let handler = middlewares.get(name.as_str()).ok_or_else(|| SynthesisError::UnknownMiddleware {
                    name: name.clone(),
                    user: found.spec.display_name(),
                })?;
                chain.push(handler.clone());
                names.push(name.clone());
            }

            let (spec, handler) = found.into_handler();
            let Some(method) = spec.http_method() else {
                tracing::warn!(operation = %spec.display_name(), method = %spec.method, "unroutable method, skipping");
                continue;
            };
            chain.push(handler);
            self.table.insert(RouteTableEntry {
                method,
                path: join_paths(&group.base, &spec.path),
                operation: spec.display_name(),
                middleware: names,
                chain,
            })?;

            if let Some(document) = self.document.as_deref_mut() {
                emit_operation(document, &openapi_path, &spec, &labels);
            }
        }

        let mut scope = RouteScope::new(
            self.table,
            self.env,
            group.base.clone(),
            group.chain.clone(),
            group.middleware.clone(),
        );
        node.setup_router(&mut scope)?;

        for mount in &layout.extenders {
            check_role(controller, mount, ControllerKind::Controller)?;
            self.visit(&mount.node, &group)?;
        }
        Ok(())
    }

    /// Discovers the middleware of every mounted middleware controller.
    fn compile_middleware(
        &self,
        controller: &'static str,
        mounts: &[Mount],
    ) -> Result<HashMap<String, Handler>, SynthesisError> {
        let mut compiled = HashMap::new();
        for mount in mounts {
            check_role(controller, mount, ControllerKind::Middleware)?;
            let discovered = mount.node.clone().discover(
                Purpose::Middleware,
                self.env.config.mode,
                &self.env.validator,
            )?;
            for mut found in discovered {
                resolve_request(&mut found.spec, &[])?;
                let (spec, handler) = found.into_handler();
                if spec.path.is_empty() {
                    tracing::debug!(operation = %spec.display_name(), "unnamed middleware ignored");
                    continue;
                }
                if compiled.contains_key(&spec.path) {
                    return Err(SynthesisError::DuplicateMiddleware(spec.path.clone()));
                }
                tracing::debug!(name = %spec.path, from = mount.field, "compiled middleware");
                compiled.insert(spec.path.clone(), handler);
            }
        }
        Ok(compiled)
    }
}

fn check_role(controller: &'static str, mount: &Mount, expected: ControllerKind) -> Result<(), SynthesisError> {
    let layout = mount.node.layout();
    let slot = layout.predecessor().ok_or(SynthesisError::PredecessorCount {
        controller: mount.node.type_name(),
        found: layout.predecessors.len(),
    })?;
    if slot.kind == expected {
        Ok(())
    } else {
        Err(SynthesisError::RoleMismatch {
            controller,
            field: mount.field,
            expected,
            found: slot.kind,
        })
    }
}

/// Non-empty trimmed entries of an `&`- or `;`-separated list.
pub(crate) fn split_list(value: Option<&str>) -> impl Iterator<Item = &str> {
    value
        .unwrap_or_default()
        .split(['&', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn new_document(config: &WebConfig) -> OpenApi {
    let openapi = &config.openapi;
    let mut info = Info::new(openapi.title.clone(), openapi.version.clone());
    if !openapi.description.is_empty() {
        info.description = Some(openapi.description.clone());
    }

    let mut document = OpenApi::new(info);
    document.servers.push(server_entry(config));
    document
}

/// `{schemes}://host:port/base` with the configured schemes as a variable.
fn server_entry(config: &WebConfig) -> Server {
    let host = if config.address.is_empty() {
        "localhost"
    } else {
        config.address.as_str()
    };
    let base = join_paths(&config.base_path, "");
    let base = if base == "/" { "" } else { base.as_str() };
    let schemes = config.openapi.schemes.clone();

    let mut variables = IndexMap::new();
    variables.insert(
        "schemes".to_string(),
        ServerVariable {
            default: schemes.first().cloned().unwrap_or_else(|| "http".to_string()),
            enum_values: schemes,
            description: None,
        },
    );
    Server {
        url: format!("{{schemes}}://{host}:{}{base}", config.port),
        description: None,
        variables,
    }
}

/// Emits the document entry of one registered operation.
fn emit_operation(document: &mut OpenApi, path: &str, spec: &OperationSpec, labels: &[String]) {
    let mut operation = Operation::new(spec.display_name());
    if !spec.description.is_empty() {
        operation.description = Some(spec.description.clone());
    }
    for label in labels {
        document.add_tag(label);
    }
    operation.tags = labels.to_vec();

    let mut body = None;
    let mut form: Option<Schema> = None;
    for field in spec.in_fields.iter().filter(|f| !f.is_carrier()) {
        let schema = field_schema(document, &field.descriptor);
        match field.location {
            Some(BindingLocation::Body) => body = Some(schema),
            Some(BindingLocation::Form) => {
                let mut object = form.take().unwrap_or_else(Schema::object);
                object = object.property(field.preferred_name.clone(), describe(schema, field));
                if field.required {
                    object = object.required_property(field.preferred_name.clone());
                }
                form = Some(object);
            }
            Some(BindingLocation::Query) if field.is_whole() && !schema.properties.is_empty() => {
                for (name, property) in &schema.properties {
                    operation.parameters.push(Parameter {
                        name: name.clone(),
                        location: ParameterIn::Query,
                        description: property.description.clone(),
                        required: schema.required.contains(name),
                        schema: Some(property.clone()),
                    });
                }
            }
            Some(location) => {
                if let Some(location) = location.parameter_in() {
                    operation.parameters.push(Parameter {
                        name: field.preferred_name.clone(),
                        location,
                        description: (!field.description.is_empty()).then(|| field.description.clone()),
                        required: field.required || location == ParameterIn::Path,
                        schema: Some(schema),
                    });
                }
            }
            None => {}
        }
    }

    if let Some(schema) = body.or(form) {
        let content = spec
            .consumes
            .iter()
            .map(|coding| {
                (
                    coding.content_type.to_string(),
                    MediaType {
                        schema: Some(schema.clone()),
                    },
                )
            })
            .collect();
        operation.request_body = Some(RequestBody {
            description: None,
            required: true,
            content,
        });
    }

    for field in &spec.out_fields {
        let schema = if field.descriptor.class == TypeClass::Fault {
            web_error_schema(document)
        } else {
            field_schema(document, &field.descriptor)
        };
        let response = operation
            .responses
            .entry(field.status.clone())
            .or_insert_with(|| Response {
                description: response_description(&field.status, &field.description),
                content: IndexMap::new(),
            });
        response.content.insert(
            field.format.content_type.to_string(),
            MediaType { schema: Some(schema) },
        );
    }
    if spec.out_fields.is_empty() {
        operation.responses.insert(
            "200".to_string(),
            Response {
                description: "OK".to_string(),
                content: IndexMap::new(),
            },
        );
    }

    document.add_path_operation(path, &spec.method, operation);
}

fn describe(schema: Schema, field: &BoundInputField) -> Schema {
    if field.description.is_empty() {
        schema
    } else {
        schema.with_description(field.description.clone())
    }
}

fn response_description(status: &str, description: &str) -> String {
    if !description.is_empty() {
        return description.to_string();
    }
    status
        .parse::<u16>()
        .ok()
        .and_then(|code| http::StatusCode::from_u16(code).ok())
        .and_then(|code| code.canonical_reason())
        .unwrap_or("Default response")
        .to_string()
}

/// The schema of a field, with nested definitions moved into components.
fn field_schema(document: &mut OpenApi, descriptor: &FieldDescriptor) -> Schema {
    match descriptor.schema {
        Some(schema) => import_schema(document, schema()),
        None => fallback_schema(descriptor.class),
    }
}

fn fallback_schema(class: TypeClass) -> Schema {
    match class {
        TypeClass::Text => Schema::string(),
        TypeClass::Bytes => Schema {
            format: Some("binary".to_string()),
            ..Schema::string()
        },
        TypeClass::Sequence => Schema::typed(SchemaType::Array),
        TypeClass::Map | TypeClass::Struct => Schema::object(),
        _ => Schema::default(),
    }
}

fn web_error_schema(document: &mut OpenApi) -> Schema {
    if !document.components.schemas.contains_key("WebError") {
        let schema = import_schema(document, schemars::schema_for!(WebError).to_value());
        document.add_schema("WebError", schema);
    }
    Schema::component_ref("WebError")
}

/// Converts a generated JSON Schema for use inside the document.
///
/// `$defs` are registered as component schemas and references to them are
/// rewritten; the root stays inline.
fn import_schema(document: &mut OpenApi, mut value: Value) -> Schema {
    let defs = value.as_object_mut().and_then(|root| {
        root.remove("$schema");
        root.remove("$defs")
    });
    if let Some(Value::Object(defs)) = defs {
        for (name, def) in defs {
            let mut schema = Schema::from_value(def);
            schema.rewrite_refs(&component_ref);
            document.add_schema(name, schema);
        }
    }
    let mut schema = Schema::from_value(value);
    schema.rewrite_refs(&component_ref);
    schema
}

fn component_ref(reference: &str) -> String {
    match reference.strip_prefix("#/$defs/") {
        Some(name) => format!("#/components/schemas/{name}"),
        None => reference.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_schema() -> Value {
        json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "title": "Team",
            "type": "object",
            "properties": {
                "lead": { "$ref": "#/$defs/User" }
            },
            "$defs": {
                "User": {
                    "type": "object",
                    "properties": { "name": { "type": "string" } }
                }
            }
        })
    }

    #[test]
    fn test_import_hoists_defs() {
        let mut document = OpenApi::new(Info::new("t", "1"));
        let schema = import_schema(&mut document, user_schema());

        assert_eq!(
            schema.properties["lead"].reference.as_deref(),
            Some("#/components/schemas/User")
        );
        assert!(!schema.extensions.contains_key("$schema"));
        assert!(!schema.extensions.contains_key("$defs"));
        assert!(document.components.schemas.contains_key("User"));
    }

    #[test]
    fn test_server_entry() {
        let config = WebConfig::new()
            .set_port(9000)
            .set_base_path("/api/")
            .with_openapi(|o| o.use_http_and_https());
        let server = server_entry(&config);
        assert_eq!(server.url, "{schemes}://localhost:9000/api");
        assert_eq!(server.variables["schemes"].default, "https");
        assert_eq!(server.variables["schemes"].enum_values, vec!["https", "http"]);
    }

    #[test]
    fn test_split_list() {
        let names: Vec<&str> = split_list(Some(" log & cors&")).collect();
        assert_eq!(names, vec!["log", "cors"]);
        let names: Vec<&str> = split_list(Some("log; cors & auth")).collect();
        assert_eq!(names, vec!["log", "cors", "auth"]);
        assert_eq!(split_list(None).count(), 0);
    }

    #[test]
    fn test_response_description() {
        assert_eq!(response_description("404", ""), "Not Found");
        assert_eq!(response_description("default", ""), "Default response");
        assert_eq!(response_description("200", "the user"), "the user");
    }

    #[test]
    fn test_document_is_frozen_once() {
        let handle = ApiDocument::new();
        assert!(handle.get().is_none());
        handle.freeze(OpenApi::new(Info::new("a", "1")));
        handle.freeze(OpenApi::new(Info::new("b", "1")));
        assert!(handle.is_frozen());
        assert_eq!(handle.get().unwrap().info.title, "a");
    }
}
