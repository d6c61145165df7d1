//! OpenAPI document types.
//!
//! Only the subset populated by route synthesis is modelled. Maps use
//! [`IndexMap`] so paths, responses and components serialize in insertion
//! order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::DocsResult;
use crate::schema::Schema;

/// OpenAPI version emitted by [`OpenApi::new`].
pub const OPENAPI_VERSION: &str = "3.1.0";

/// The root of an emitted document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenApi {
    /// Always [`OPENAPI_VERSION`] for documents built here.
    pub openapi: String,
    /// Title and version.
    pub info: Info,
    /// Base URLs, one per configured listener.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    /// Operations keyed by templated path.
    #[serde(default)]
    pub paths: IndexMap<String, PathItem>,
    /// Shared schemas.
    #[serde(default, skip_serializing_if = "Components::is_empty")]
    pub components: Components,
    /// Declared group names in first-use order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl OpenApi {
    /// Creates an empty document.
    #[must_use]
    pub fn new(info: Info) -> Self {
        Self {
            openapi: OPENAPI_VERSION.to_string(),
            info,
            servers: Vec::new(),
            paths: IndexMap::new(),
            components: Components::default(),
            tags: Vec::new(),
        }
    }

    /// Stores `operation` under `path` and `method`.
    ///
    /// A repeated call for the same path and method replaces the previous
    /// operation; paths keep their first insertion position. `CONNECT` has
    /// no slot in a path item and is ignored.
    ///
    /// # Example
    ///
    /// ```rust
    /// use daedalus_docs::{Info, OpenApi, Operation};
    ///
    /// let mut doc = OpenApi::new(Info::new("demo", "1.0.0"));
    /// doc.add_path_operation("/users", "GET", Operation::new("users.list"));
    /// doc.add_path_operation("/users", "get", Operation::new("users.all"));
    ///
    /// let op = doc.paths["/users"].get.as_ref().unwrap();
    /// assert_eq!(op.operation_id, "users.all");
    /// ```
    pub fn add_path_operation(&mut self, path: &str, method: &str, operation: Operation) {
        let item = self.paths.entry(path.to_string()).or_default();
        let slot = match method.to_ascii_lowercase().as_str() {
            "get" => &mut item.get,
            "put" => &mut item.put,
            "post" => &mut item.post,
            "delete" => &mut item.delete,
            "options" => &mut item.options,
            "head" => &mut item.head,
            "patch" => &mut item.patch,
            "trace" => &mut item.trace,
            _ => {
                tracing::debug!(path, method, "no path item slot for method, operation dropped");
                return;
            }
        };
        *slot = Some(operation);
    }

    /// Registers a component schema unless one with the same name exists.
    pub fn add_schema(&mut self, name: impl Into<String>, schema: Schema) {
        self.components.schemas.entry(name.into()).or_insert(schema);
    }

    /// Adds a tag declaration unless one with the same name exists.
    pub fn add_tag(&mut self, name: &str) {
        if !self.tags.iter().any(|t| t.name == name) {
            self.tags.push(Tag {
                name: name.to_string(),
                description: None,
            });
        }
    }

    /// Serializes the document as indented JSON.
    pub fn to_json_pretty(&self) -> DocsResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Title, version and description of the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Info {
    /// Shown as the page heading.
    pub title: String,
    /// Version of the API, not of OpenAPI.
    pub version: String,
    /// Free text, omitted when empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Info {
    /// Creates API metadata.
    #[must_use]
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            version: version.into(),
            description: None,
        }
    }
}

/// A base URL the operations are reachable under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    /// May contain `{variable}` placeholders.
    pub url: String,
    /// Server description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Values for the URL placeholders.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub variables: IndexMap<String, ServerVariable>,
}

/// Substitution for one URL placeholder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerVariable {
    /// Substituted when the client picks nothing.
    pub default: String,
    /// Allowed substitutions.
    #[serde(default, skip_serializing_if = "Vec::is_empty", rename = "enum")]
    pub enum_values: Vec<String>,
    /// Free text, omitted when empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Per-method operations of one path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathItem {
    /// Answer to `GET`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    /// Answer to `PUT`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    /// Answer to `POST`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    /// Answer to `DELETE`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    /// Answer to `OPTIONS`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    /// Answer to `HEAD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    /// Answer to `PATCH`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    /// Answer to `TRACE`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,
}

impl PathItem {
    /// The operation answering `method`, case-insensitively.
    #[must_use]
    pub fn operation(&self, method: &str) -> Option<&Operation> {
        match method.to_ascii_lowercase().as_str() {
            "get" => self.get.as_ref(),
            "put" => self.put.as_ref(),
            "post" => self.post.as_ref(),
            "delete" => self.delete.as_ref(),
            "options" => self.options.as_ref(),
            "head" => self.head.as_ref(),
            "patch" => self.patch.as_ref(),
            "trace" => self.trace.as_ref(),
            _ => None,
        }
    }
}

/// One documented route.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Operation {
    /// `Controller.method`.
    #[serde(rename = "operationId")]
    pub operation_id: String,
    /// Free text, omitted when empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Group names this operation is listed under.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Non-body inputs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    /// Present only for operations with body fields.
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "requestBody")]
    pub request_body: Option<RequestBody>,
    /// Keyed by status code or `default`.
    pub responses: IndexMap<String, Response>,
}

impl Operation {
    /// Creates an operation with no parameters and no responses.
    #[must_use]
    pub fn new(operation_id: impl Into<String>) -> Self {
        Self {
            operation_id: operation_id.into(),
            ..Self::default()
        }
    }
}

/// Where a non-body parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterIn {
    /// `in: query`.
    Query,
    /// `in: path`.
    Path,
    /// `in: header`.
    Header,
    /// `in: cookie`.
    Cookie,
}

/// A non-body input of an operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    /// As it appears on the wire.
    pub name: String,
    /// Where a non-body parameter is read from.
    #[serde(rename = "in")]
    pub location: ParameterIn,
    /// Free text, omitted when empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the input must be present.
    #[serde(default)]
    pub required: bool,
    /// Type of the value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

/// Body accepted by an operation, per consumed media type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestBody {
    /// Free text, omitted when empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the input must be present.
    #[serde(default)]
    pub required: bool,
    /// Keyed by media type.
    pub content: IndexMap<String, MediaType>,
}

/// Schema of one media type entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaType {
    /// Type of the value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

/// One documented response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Response {
    /// Mandatory in OpenAPI, falls back to the status reason.
    pub description: String,
    /// Keyed by media type.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaType>,
}

/// Shared definitions referenced from operations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Components {
    /// Keyed by type name.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub schemas: IndexMap<String, Schema>,
}

impl Components {
    /// `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

/// A group name declared at document level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    /// As it appears on the wire.
    pub name: String,
    /// Free text, omitted when empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
