//! Shared references available while controllers are built and routed.
//!
//! The launcher stores the configuration, the validator and the API
//! document here before synthesis; user code adds its own services. A
//! controller field marked `#[inject]` is resolved by type, and
//! `#[inject("key")]` by name.
//!
//! ```rust
//! use daedalus_core::Container;
//! use std::sync::Arc;
//!
//! struct Database {
//!     url: String,
//! }
//!
//! let mut refs = Container::new();
//! refs.register(Arc::new(Database { url: "postgres://localhost/db".into() }));
//! refs.register_named("replica", Arc::new(Database { url: "postgres://replica/db".into() }));
//!
//! let db: Arc<Database> = refs.resolve().unwrap();
//! let replica: Arc<Database> = refs.resolve_named("replica").unwrap();
//! assert_ne!(db.url, replica.url);
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Error when a reference cannot be resolved.
#[derive(Debug, Clone)]
pub struct InjectionError {
    /// The type name that could not be resolved.
    pub type_name: &'static str,
    /// The reason for the failure.
    pub reason: String,
}

impl fmt::Display for InjectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to inject {}: {}", self.type_name, self.reason)
    }
}

impl std::error::Error for InjectionError {}

impl InjectionError {
    /// Creates an error for a type that was never registered.
    pub fn not_registered<T>() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            reason: "reference not registered".to_string(),
        }
    }

    /// Creates an error for a missing or mistyped named reference.
    pub fn not_named<T>(name: &str) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            reason: format!("no reference named '{name}' of this type"),
        }
    }
}

type Shared = Arc<dyn Any + Send + Sync>;

/// Reference container keyed by type and by name.
#[derive(Default)]
pub struct Container {
    typed: HashMap<TypeId, Shared>,
    named: HashMap<String, Shared>,
}

impl Container {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a reference under its type, replacing any previous one.
    pub fn register<T: Send + Sync + 'static>(&mut self, value: Arc<T>) {
        self.typed.insert(TypeId::of::<T>(), value);
    }

    /// Registers a reference under `name`, replacing any previous one.
    pub fn register_named<T: Send + Sync + 'static>(&mut self, name: impl Into<String>, value: Arc<T>) {
        self.named.insert(name.into(), value);
    }

    /// Resolves a reference by type.
    #[must_use]
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.typed
            .get(&TypeId::of::<T>())
            .and_then(|s| s.clone().downcast::<T>().ok())
    }

    /// Resolves a reference by name; the stored value must have type `T`.
    #[must_use]
    pub fn resolve_named<T: Send + Sync + 'static>(&self, name: &str) -> Option<Arc<T>> {
        self.named
            .get(name)
            .and_then(|s| s.clone().downcast::<T>().ok())
    }

    /// Resolves a reference by type or returns an error.
    pub fn resolve_required<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, InjectionError> {
        self.resolve().ok_or_else(InjectionError::not_registered::<T>)
    }

    /// Resolves a reference by name or returns an error.
    pub fn resolve_named_required<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, InjectionError> {
        self.resolve_named(name)
            .ok_or_else(|| InjectionError::not_named::<T>(name))
    }

    /// Checks if a type is registered.
    #[must_use]
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.typed.contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of registered references.
    #[must_use]
    pub fn len(&self) -> usize {
        self.typed.len() + self.named.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.typed.is_empty() && self.named.is_empty()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.named.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("Container")
            .field("typed", &self.typed.len())
            .field("named", &names)
            .finish()
    }
}

/// Builds a value from the references in a container.
///
/// Generated for controllers by `#[derive(Controller)]`; mounted
/// middleware and extenders are constructed recursively.
pub trait Construct: Sized {
    /// Builds the value.
    fn construct(refs: &Container) -> Result<Self, InjectionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Counter(u32);

    #[test]
    fn test_typed_and_named_are_separate() {
        let mut refs = Container::new();
        refs.register(Arc::new(Counter(1)));
        refs.register_named("second", Arc::new(Counter(2)));

        assert_eq!(*refs.resolve::<Counter>().unwrap(), Counter(1));
        assert_eq!(*refs.resolve_named::<Counter>("second").unwrap(), Counter(2));
        assert_eq!(refs.len(), 2);
    }

    #[test]
    fn test_named_with_wrong_type_fails() {
        let mut refs = Container::new();
        refs.register_named("n", Arc::new(5_u8));
        assert!(refs.resolve_named::<Counter>("n").is_none());

        let err = refs.resolve_named_required::<Counter>("n").unwrap_err();
        assert!(err.to_string().contains("'n'"));
    }

    #[test]
    fn test_required_missing() {
        let refs = Container::new();
        let err = refs.resolve_required::<Counter>().unwrap_err();
        assert!(err.type_name.ends_with("Counter"));
        assert!(refs.is_empty());
    }

    #[test]
    fn test_register_replaces() {
        let mut refs = Container::new();
        refs.register(Arc::new(Counter(1)));
        refs.register(Arc::new(Counter(9)));
        assert_eq!(refs.resolve::<Counter>().unwrap().0, 9);
        assert!(refs.contains::<Counter>());
    }
}
