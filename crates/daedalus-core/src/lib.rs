//! # Daedalus Core
//!
//! Operation discovery, parameter and result binding, request dispatch and
//! route/document synthesis.
//!
//! - [`Tag`] - the `key=value, bare` attribute grammar
//! - [`media`] - the media-type registry
//! - [`discover()`] - finds operations by verb prefix
//! - [`BoundInputField`] / [`BoundOutputField`] - per-field binding rules
//! - [`Handler`] - the per-request dispatch closure and middleware step
//! - [`synthesize`] - walks a controller tree into a [`RouteTable`] and an
//!   OpenAPI document
//! - [`WebContext`] - the request/response handle given to operations
//!
//! Controllers are normally described with the derive macros of the
//! `daedalus` crate; every trait they implement is public here so that
//! descriptors can also be written by hand.

#![doc(html_root_url = "https://docs.rs/daedalus-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod binding;
mod context;
mod controller;
mod descriptor;
mod discover;
mod dispatch;
mod error;
pub mod media;
mod refs;
mod routes;
mod synth;
mod tag;
mod validate;
pub mod xml;

pub use binding::{
    carries_body, default_status, infer_format, resolve_request, status_code, BindingLocation,
    BoundInputField, BoundOutputField, DESCRIPTION_TAG, HTTP_TAG,
};
pub use context::{RequestSummary, WebContext};
pub use controller::{
    Controller, ControllerKind, ControllerLayout, ControllerNode, Mount, Operations, Predecessor,
    PredecessorSlot, WebController, WebMiddleware, WebServer,
};
pub use descriptor::{
    is_writable_output, Aggregate, Binder, FieldDescriptor, FieldRole, InputField, Outcome,
    OutputField, OutputValue, SchemaFn, TypeClass, ValueKind,
};
pub use discover::{discover, normalize_name, Discovered, OperationCall, OperationDef, OperationSpec, Purpose};
pub use dispatch::{handler, Handler};
pub use error::{Fault, SynthesisError, SynthesisResult, WebError};
pub use media::{MediaKind, MediaTypeSupport};
pub use refs::{Construct, Container, InjectionError};
pub use routes::{RouteScope, RouteTable, RouteTableEntry};
pub use synth::{synthesize, ApiDocument, SynthesisEnv};
pub use tag::{Tag, TagTerm, Tags};
pub use validate::{FieldValue, MemberRule, RuleValidator, Validate, ValidationErrors, Validator, Violation};

/// Items used by generated code.
#[doc(hidden)]
pub mod __private {
    pub use daedalus_extract::{decode_body, ExtractionContext, ExtractionError};
    pub use futures_util::future::BoxFuture;
    pub use schemars;
    pub use serde_json;
}
