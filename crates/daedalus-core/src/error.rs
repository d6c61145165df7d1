//! Error types.
//!
//! [`SynthesisError`] covers every declaration problem found while building
//! the route table; all of them are startup failures. [`WebError`] is the
//! JSON payload written for validation failures and error results, and
//! [`Fault`] is what an operation returns in an error result field.

use crate::controller::ControllerKind;
use crate::refs::InjectionError;
use daedalus_router::RouteError;
use http::StatusCode;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias using [`SynthesisError`].
pub type SynthesisResult<T> = Result<T, SynthesisError>;

/// A declaration problem detected at startup.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// A controller must embed exactly one role marker.
    #[error("{controller} must declare exactly one WebServer, WebController or WebMiddleware field, found {found}")]
    PredecessorCount {
        /// Controller type
        controller: &'static str,
        /// Number of role markers found
        found: usize,
    },

    /// A mounted controller has the wrong role.
    #[error("{controller}.{field} must hold a {expected}, found a {found}")]
    RoleMismatch {
        /// Owning controller type
        controller: &'static str,
        /// Field name
        field: &'static str,
        /// Role the field requires
        expected: ControllerKind,
        /// Role of the mounted controller
        found: ControllerKind,
    },

    /// Two middleware operations at the same level share a name.
    #[error("middleware's handler '{0}' is duplicated")]
    DuplicateMiddleware(String),

    /// A route or group names middleware that is not mounted.
    #[error("middleware '{name}' used by {user} is not mounted")]
    UnknownMiddleware {
        /// Middleware name
        name: String,
        /// Operation or controller referring to it
        user: String,
    },

    /// An aggregate declares more than one context carrier.
    #[error("{aggregate} declares more than one context carrier")]
    MultipleCarriers {
        /// Aggregate type
        aggregate: &'static str,
    },

    /// An `in=` attribute names an unknown location.
    #[error("field {field} of {operation} uses unsupported location in={location}")]
    UnsupportedLocation {
        /// Operation name
        operation: String,
        /// Field name
        field: String,
        /// Location as written
        location: String,
    },

    /// A bindable field has a type that cannot be bound.
    #[error("field {field} of {operation} has unsupported type {type_name}")]
    UnsupportedField {
        /// Operation name
        operation: String,
        /// Field name
        field: String,
        /// Declared type
        type_name: &'static str,
    },

    /// Form fields and a body field in the same operation.
    #[error("{operation} mixes form fields with a body field")]
    FormAndBody {
        /// Operation name
        operation: String,
    },

    /// More than one field is bound to the body.
    #[error("{operation} binds more than one field to the body")]
    MultipleBodies {
        /// Operation name
        operation: String,
    },

    /// Objective and form codings declared together.
    #[error("{operation} declares both objective and form body codings")]
    MixedCoding {
        /// Operation name
        operation: String,
    },

    /// A body coding on a verb that carries no body.
    #[error("{operation} declares a body coding but {method} carries no body")]
    CodingWithoutBody {
        /// Operation name
        operation: String,
        /// HTTP method
        method: String,
    },

    /// A result field that is unnamed or not public.
    #[error("result field {field} of {outcome} must be named and public")]
    HiddenOutput {
        /// Result type
        outcome: &'static str,
        /// Field name or position
        field: String,
    },

    /// A result field with an unsupported shape.
    #[error("result field {field} of {outcome} has unsupported type {type_name}")]
    UnsupportedOutput {
        /// Result type
        outcome: &'static str,
        /// Field name
        field: String,
        /// Declared type
        type_name: &'static str,
    },

    /// The route table rejected a path.
    #[error(transparent)]
    Route(#[from] RouteError),

    /// A dependency could not be resolved while constructing a controller.
    #[error(transparent)]
    Injection(#[from] InjectionError),
}

/// JSON payload for validation failures and error results.
///
/// ```rust
/// use daedalus_core::WebError;
///
/// let body = serde_json::to_string(&WebError::new("boom", "400")).unwrap();
/// assert_eq!(body, r#"{"message":"boom","code":"400"}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct WebError {
    /// Human readable message.
    pub message: String,
    /// HTTP status code as text.
    pub code: String,
}

impl WebError {
    /// Creates a payload.
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
        }
    }

    /// Creates a payload whose code is `status`.
    pub fn from_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(message, status.as_str())
    }
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

/// An error returned by an operation through an error result field.
///
/// Any `std::error::Error` converts into a `Fault`, so `?` works inside
/// operations. A fault may carry its own status code; otherwise the code
/// declared on the result field is used.
///
/// ```rust
/// use daedalus_core::Fault;
/// use http::StatusCode;
///
/// let fault = Fault::with_status(StatusCode::NOT_FOUND, "no such user");
/// assert_eq!(fault.status(), Some(StatusCode::NOT_FOUND));
/// assert_eq!(fault.to_string(), "no such user");
/// ```
pub struct Fault {
    message: String,
    status: Option<StatusCode>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Fault {
    /// Creates a fault with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            source: None,
        }
    }

    /// Creates a fault with a message and an explicit status.
    pub fn with_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            ..Self::new(message)
        }
    }

    /// Returns the message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the explicit status, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Returns the wrapped error, if the fault was converted from one.
    pub fn source(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.source.as_deref()
    }
}

impl<E> From<E> for Fault
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(err: E) -> Self {
        Self {
            message: err.to_string(),
            status: None,
            source: Some(Box::new(err)),
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl fmt::Debug for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fault")
            .field("message", &self.message)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}
