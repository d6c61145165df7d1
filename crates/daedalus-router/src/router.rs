//! High-level router API.

use http::Method;

use crate::method_router::MethodRouter;
use crate::node::Node;
use crate::params::Params;
use crate::{RouteError, RouteMatch};

/// A radix tree router keyed by method and path template.
///
/// # Example
///
/// ```rust
/// use daedalus_router::Router;
/// use http::Method;
///
/// let mut router = Router::new();
/// router.insert(&Method::GET, "/users", "list_users").unwrap();
/// router.insert(&Method::GET, "/users/:id", "get_user").unwrap();
///
/// let m = router.match_route(&Method::GET, "/users/123").unwrap();
/// assert_eq!(*m.value, "get_user");
/// assert_eq!(m.params.get("id"), Some("123"));
/// ```
///
/// # Route Priority
///
/// 1. **Static segments** (e.g. `/users/me`)
/// 2. **Captures** (e.g. `/users/:id`)
/// 3. **Catch-all** (e.g. `/files/*filepath`)
#[derive(Debug, Clone)]
pub struct Router<T> {
    root: Node<T>,
    route_count: usize,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Router<T> {
    /// Creates a new empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            route_count: 0,
        }
    }

    /// Registers `value` for `method` at `path`.
    ///
    /// Registering the same method and path twice is an error, as is reusing
    /// a capture position under a different name.
    pub fn insert(&mut self, method: &Method, path: &str, value: T) -> Result<(), RouteError> {
        self.root.insert(method, path, value)?;
        self.route_count += 1;
        Ok(())
    }

    /// Matches a method and request path.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, T>> {
        let (methods, params) = self.root.match_path(path)?;
        let value = methods.get_value(method)?;
        Some(RouteMatch::new(value, params))
    }

    /// Matches a path regardless of method.
    ///
    /// Useful for answering `405 Method Not Allowed`.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<(&MethodRouter<T>, Params)> {
        self.root.match_path(path)
    }

    /// Returns the number of routes registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.route_count
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.route_count == 0
    }
}
