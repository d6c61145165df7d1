//! # Daedalus Docs
//!
//! The OpenAPI document that route synthesis fills in, plus the Swagger UI
//! page used to browse it.
//!
//! Route synthesis writes through a single entry point,
//! [`OpenApi::add_path_operation`]; the rest of the model exists so the
//! document can be serialized.
//!
//! ```rust
//! use daedalus_docs::{concat_openapi_path, Info, OpenApi, Operation};
//!
//! let mut doc = OpenApi::new(Info::new("Pets", "1.0.0"));
//! let (path, params) = concat_openapi_path("/pets", ":id");
//! doc.add_path_operation(&path, "get", Operation::new("pets.get"));
//!
//! assert_eq!(path, "/pets/{id}");
//! assert_eq!(params, vec!["id"]);
//! ```

mod error;
mod openapi;
mod path;
mod schema;
mod swagger;

pub use error::{DocsError, DocsResult};
pub use openapi::{
    Components, Info, MediaType, OpenApi, Operation, Parameter, ParameterIn, PathItem,
    RequestBody, Response, Server, ServerVariable, Tag, OPENAPI_VERSION,
};
pub use path::{capture_names, concat_openapi_path, join_paths};
pub use schema::{Schema, SchemaType};
pub use swagger::{DocExpansion, SwaggerUi};
