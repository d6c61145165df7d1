//! Radix tree router for Daedalus.
//!
//! Routes are registered with gin-style templates: `:name` captures a single
//! segment and `*name` captures the rest of the path (including the leading
//! slash). Each route stores an arbitrary value, typically an index into a
//! handler table.
//!
//! # Example
//!
//! ```rust
//! use daedalus_router::Router;
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.insert(&Method::GET, "/user/:id/profile", 0usize).unwrap();
//! router.insert(&Method::GET, "/files/*path", 1usize).unwrap();
//!
//! let m = router.match_route(&Method::GET, "/user/7/profile").unwrap();
//! assert_eq!(*m.value, 0);
//! assert_eq!(m.params.get("id"), Some("7"));
//! ```

mod method_router;
mod node;
mod params;
mod router;

use http::Method;
use thiserror::Error;

pub use method_router::MethodRouter;
pub use node::{Node, SegmentKind};
pub use params::Params;
pub use router::Router;

/// A matched route with its value and captured parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a, T> {
    /// The value registered for the route
    pub value: &'a T,
    /// Captured path parameters
    pub params: Params,
}

impl<'a, T> RouteMatch<'a, T> {
    /// Creates a new route match.
    #[must_use]
    pub fn new(value: &'a T, params: Params) -> Self {
        Self { value, params }
    }
}

/// Errors raised while building a route table.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RouteError {
    /// The method and path were already registered.
    #[error("route {method} {path} is already registered")]
    Duplicate {
        /// HTTP method
        method: Method,
        /// Path template
        path: String,
    },
    /// A capture segment reuses a position under a different name.
    #[error("capture :{new} in {path} conflicts with existing capture :{existing}")]
    ConflictingCapture {
        /// Path template being inserted
        path: String,
        /// Name already registered at this position
        existing: String,
        /// Name from the new template
        new: String,
    },
    /// A catch-all segment is followed by more segments.
    #[error("catch-all segment must be last in {0}")]
    WildcardNotLast(String),
    /// A capture segment has no name.
    #[error("capture without a name in {0}")]
    EmptyCapture(String),
}
