//! Controller roles and the controller tree.
//!
//! A controller is a struct holding exactly one role marker field
//! ([`WebServer`], [`WebController`] or [`WebMiddleware`]) whose `http`
//! attribute configures the group, plus any number of mounted middleware
//! and extender controllers. `#[derive(Controller)]` produces the
//! [`Controller`] impl and `#[operations]` the [`Operations`] impl; every
//! such type is usable as a [`ControllerNode`].
//!
//! ```rust,ignore
//! #[derive(Controller, Default)]
//! pub struct Api {
//!     #[http("/api, middleware=log")]
//!     server: WebServer,
//!     #[middleware]
//!     log: Arc<LogMiddleware>,
//!     #[extender]
//!     users: Arc<UserController>,
//! }
//! ```

use crate::discover::{self, Discovered, OperationDef, Purpose};
use crate::error::SynthesisError;
use crate::routes::RouteScope;
use crate::tag::Tags;
use crate::validate::Validator;
use daedalus_config::RuntimeMode;
use std::fmt;
use std::sync::Arc;

/// The role a controller plays in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerKind {
    /// The root of the tree.
    Server,
    /// A group of request operations.
    Controller,
    /// A provider of named middleware.
    Middleware,
}

impl fmt::Display for ControllerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Server => "WebServer",
            Self::Controller => "WebController",
            Self::Middleware => "WebMiddleware",
        })
    }
}

/// Role marker types.
pub trait Predecessor: Default + Send + Sync + 'static {
    /// The role this marker declares.
    const KIND: ControllerKind;
}

/// Marks the root controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WebServer;

/// Marks a request controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WebController;

/// Marks a middleware controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WebMiddleware;

impl Predecessor for WebServer {
    const KIND: ControllerKind = ControllerKind::Server;
}

impl Predecessor for WebController {
    const KIND: ControllerKind = ControllerKind::Controller;
}

impl Predecessor for WebMiddleware {
    const KIND: ControllerKind = ControllerKind::Middleware;
}

/// A role marker field of a controller.
#[derive(Debug, Clone, Copy)]
pub struct PredecessorSlot {
    /// Field name.
    pub field: &'static str,
    /// Declared role.
    pub kind: ControllerKind,
    /// Field attributes; the `http` one configures the group.
    pub tags: Tags,
}

impl PredecessorSlot {
    /// Describes a marker field of type `P`.
    pub fn of<P: Predecessor>(field: &'static str, tags: Tags) -> Self {
        Self {
            field,
            kind: P::KIND,
            tags,
        }
    }
}

/// A mounted child controller.
#[derive(Clone)]
pub struct Mount {
    /// Field name.
    pub field: &'static str,
    /// The child.
    pub node: Arc<dyn ControllerNode>,
}

impl Mount {
    /// Mounts `node` from `field`.
    pub fn new(field: &'static str, node: Arc<dyn ControllerNode>) -> Self {
        Self { field, node }
    }
}

impl fmt::Debug for Mount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mount")
            .field("field", &self.field)
            .field("node", &self.node.type_name())
            .finish()
    }
}

/// The fields of a controller, partitioned by purpose.
#[derive(Debug, Clone, Default)]
pub struct ControllerLayout {
    /// Role marker fields; exactly one is required.
    pub predecessors: Vec<PredecessorSlot>,
    /// Mounted middleware controllers.
    pub middlewares: Vec<Mount>,
    /// Mounted sub-controllers.
    pub extenders: Vec<Mount>,
}

impl ControllerLayout {
    /// The single declared role, when there is exactly one marker.
    pub fn predecessor(&self) -> Option<&PredecessorSlot> {
        match self.predecessors.as_slice() {
            [one] => Some(one),
            _ => None,
        }
    }
}

/// Structural description of a controller, usually derived.
pub trait Controller: Send + Sync + 'static {
    /// Type name used in diagnostics and operation ids.
    fn type_name(&self) -> &'static str;

    /// The marker, middleware and extender fields of this instance.
    fn layout(&self) -> ControllerLayout;
}

/// The operations of a controller, usually generated by `#[operations]`.
pub trait Operations {
    /// Every public method with a discoverable signature.
    fn operations() -> Vec<OperationDef<Self>>
    where
        Self: Sized;

    /// Registers extra routes that are not operations.
    ///
    /// Called once after the controller's operations are registered.
    fn setup_router(&self, _scope: &mut RouteScope<'_>) -> Result<(), SynthesisError> {
        Ok(())
    }
}

/// A type-erased controller in the tree.
pub trait ControllerNode: Send + Sync + 'static {
    /// Type name used in diagnostics and operation ids.
    fn type_name(&self) -> &'static str;

    /// The fields of this instance.
    fn layout(&self) -> ControllerLayout;

    /// Discovers the operations matching `purpose`.
    fn discover(
        self: Arc<Self>,
        purpose: Purpose,
        mode: RuntimeMode,
        validator: &Arc<dyn Validator>,
    ) -> Result<Vec<Discovered>, SynthesisError>;

    /// Forwards to [`Operations::setup_router`].
    fn setup_router(&self, scope: &mut RouteScope<'_>) -> Result<(), SynthesisError>;
}

impl<T> ControllerNode for T
where
    T: Controller + Operations,
{
    fn type_name(&self) -> &'static str {
        Controller::type_name(self)
    }

    fn layout(&self) -> ControllerLayout {
        Controller::layout(self)
    }

    fn discover(
        self: Arc<Self>,
        purpose: Purpose,
        mode: RuntimeMode,
        validator: &Arc<dyn Validator>,
    ) -> Result<Vec<Discovered>, SynthesisError> {
        let name = Controller::type_name(self.as_ref());
        discover::discover(&self, name, T::operations(), purpose, mode, validator)
    }

    fn setup_router(&self, scope: &mut RouteScope<'_>) -> Result<(), SynthesisError> {
        Operations::setup_router(self, scope)
    }
}
