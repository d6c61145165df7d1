//! HTTP method-based routing.
//!
//! [`MethodRouter`] holds at most one value per HTTP method for a single
//! path template.

use http::Method;

/// Maps HTTP methods to route values for a single path.
///
/// # Example
///
/// ```rust
/// use daedalus_router::MethodRouter;
/// use http::Method;
///
/// let router = MethodRouter::new()
///     .get("list_users")
///     .post("create_user");
///
/// assert_eq!(router.get_value(&Method::GET), Some(&"list_users"));
/// assert_eq!(router.get_value(&Method::DELETE), None);
/// ```
#[derive(Debug, Clone)]
pub struct MethodRouter<T> {
    get: Option<T>,
    post: Option<T>,
    put: Option<T>,
    delete: Option<T>,
    patch: Option<T>,
    head: Option<T>,
    options: Option<T>,
    trace: Option<T>,
    connect: Option<T>,
}

impl<T> Default for MethodRouter<T> {
    fn default() -> Self {
        Self {
            get: None,
            post: None,
            put: None,
            delete: None,
            patch: None,
            head: None,
            options: None,
            trace: None,
            connect: None,
        }
    }
}

impl<T> MethodRouter<T> {
    /// Creates a new empty method router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a GET value.
    #[must_use]
    pub fn get(self, value: T) -> Self {
        self.with(&Method::GET, value)
    }

    /// Registers a POST value.
    #[must_use]
    pub fn post(self, value: T) -> Self {
        self.with(&Method::POST, value)
    }

    /// Registers a PUT value.
    #[must_use]
    pub fn put(self, value: T) -> Self {
        self.with(&Method::PUT, value)
    }

    /// Registers a DELETE value.
    #[must_use]
    pub fn delete(self, value: T) -> Self {
        self.with(&Method::DELETE, value)
    }

    /// Registers a PATCH value.
    #[must_use]
    pub fn patch(self, value: T) -> Self {
        self.with(&Method::PATCH, value)
    }

    /// Registers a value for a specific method, replacing any previous one.
    #[must_use]
    pub fn with(mut self, method: &Method, value: T) -> Self {
        if let Some(slot) = self.slot_mut(method) {
            *slot = Some(value);
        }
        self
    }

    /// Stores `value` for `method` unless a value is already present.
    ///
    /// Returns the rejected value when the slot is occupied or the method is
    /// not one of the nine standard verbs.
    pub fn try_insert(&mut self, method: &Method, value: T) -> Result<(), T> {
        match self.slot_mut(method) {
            Some(slot) if slot.is_none() => {
                *slot = Some(value);
                Ok(())
            }
            _ => Err(value),
        }
    }

    /// Returns the value for a given HTTP method.
    #[must_use]
    pub fn get_value(&self, method: &Method) -> Option<&T> {
        match *method {
            Method::GET => self.get.as_ref(),
            Method::POST => self.post.as_ref(),
            Method::PUT => self.put.as_ref(),
            Method::DELETE => self.delete.as_ref(),
            Method::PATCH => self.patch.as_ref(),
            Method::HEAD => self.head.as_ref(),
            Method::OPTIONS => self.options.as_ref(),
            Method::TRACE => self.trace.as_ref(),
            Method::CONNECT => self.connect.as_ref(),
            _ => None,
        }
    }

    /// Returns the methods that have a value, in a stable order.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<Method> {
        [
            (Method::GET, self.get.is_some()),
            (Method::POST, self.post.is_some()),
            (Method::PUT, self.put.is_some()),
            (Method::DELETE, self.delete.is_some()),
            (Method::PATCH, self.patch.is_some()),
            (Method::HEAD, self.head.is_some()),
            (Method::OPTIONS, self.options.is_some()),
            (Method::TRACE, self.trace.is_some()),
            (Method::CONNECT, self.connect.is_some()),
        ]
        .into_iter()
        .filter_map(|(m, present)| present.then_some(m))
        .collect()
    }

    /// Returns true if no method has a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.allowed_methods().is_empty()
    }

    fn slot_mut(&mut self, method: &Method) -> Option<&mut Option<T>> {
        match *method {
            Method::GET => Some(&mut self.get),
            Method::POST => Some(&mut self.post),
            Method::PUT => Some(&mut self.put),
            Method::DELETE => Some(&mut self.delete),
            Method::PATCH => Some(&mut self.patch),
            Method::HEAD => Some(&mut self.head),
            Method::OPTIONS => Some(&mut self.options),
            Method::TRACE => Some(&mut self.trace),
            Method::CONNECT => Some(&mut self.connect),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_router_builders() {
        let router = MethodRouter::new().get(1).post(2).put(3).delete(4).patch(5);
        assert_eq!(router.get_value(&Method::GET), Some(&1));
        assert_eq!(router.get_value(&Method::POST), Some(&2));
        assert_eq!(router.get_value(&Method::PUT), Some(&3));
        assert_eq!(router.get_value(&Method::DELETE), Some(&4));
        assert_eq!(router.get_value(&Method::PATCH), Some(&5));
        assert_eq!(router.get_value(&Method::HEAD), None);
    }

    #[test]
    fn test_try_insert_rejects_occupied_slot() {
        let mut router = MethodRouter::new();
        assert!(router.try_insert(&Method::TRACE, "a").is_ok());
        assert_eq!(router.try_insert(&Method::TRACE, "b"), Err("b"));
        assert_eq!(router.get_value(&Method::TRACE), Some(&"a"));
    }

    #[test]
    fn test_try_insert_rejects_extension_method() {
        let mut router = MethodRouter::new();
        let custom = Method::from_bytes(b"PURGE").unwrap();
        assert_eq!(router.try_insert(&custom, 7), Err(7));
        assert!(router.is_empty());
    }

    #[test]
    fn test_allowed_methods_order() {
        let router = MethodRouter::new()
            .with(&Method::OPTIONS, ())
            .with(&Method::GET, ());
        assert_eq!(router.allowed_methods(), vec![Method::GET, Method::OPTIONS]);
    }
}
