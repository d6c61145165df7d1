//! Building and starting a controller tree.
//!
//! ```rust,ignore
//! use daedalus_server::Launcher;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), daedalus_server::LaunchError> {
//!     let config = ConfigLoader::new().with_env_prefix("DAEDALUS").load()?;
//!     Launcher::new(config)
//!         .with_ref(Arc::new(Database::connect()))
//!         .launch::<Api>()
//!         .await
//! }
//! ```

use std::sync::Arc;

use daedalus_config::WebConfig;
use daedalus_core::{
    synthesize, ApiDocument, Construct, Container, ControllerKind, ControllerNode, RouteTable,
    RuleValidator, SynthesisEnv, Validator,
};
use daedalus_extract::MultipartConfig;

use crate::error::LaunchError;
use crate::server::Server;
use crate::shutdown::ShutdownSignal;

/// Collects the references and collaborators a tree is built with.
///
/// The configuration, the [`ApiDocument`] and the validator are registered
/// in the reference container before the root is constructed, so
/// controllers can `#[inject]` them. The validator is registered as
/// `Arc<dyn Validator>`.
pub struct Launcher {
    config: WebConfig,
    refs: Container,
    validator: Option<Arc<dyn Validator>>,
    multipart: MultipartConfig,
}

impl Launcher {
    /// Starts from `config`.
    pub fn new(config: WebConfig) -> Self {
        Self {
            config,
            refs: Container::new(),
            validator: None,
            multipart: MultipartConfig::default(),
        }
    }

    /// Registers a reference by type.
    #[must_use]
    pub fn with_ref<T: Send + Sync + 'static>(mut self, value: Arc<T>) -> Self {
        self.refs.register(value);
        self
    }

    /// Registers a reference by name.
    #[must_use]
    pub fn with_named_ref<T: Send + Sync + 'static>(mut self, name: impl Into<String>, value: Arc<T>) -> Self {
        self.refs.register_named(name, value);
        self
    }

    /// Replaces the default [`RuleValidator`].
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Sets multipart body limits.
    #[must_use]
    pub fn with_multipart(mut self, multipart: MultipartConfig) -> Self {
        self.multipart = multipart;
        self
    }

    /// Constructs `T` and synthesizes its tree.
    pub fn prepare<T>(self) -> Result<Prepared, LaunchError>
    where
        T: Construct + ControllerNode,
    {
        self.config.validate()?;
        let (env, refs) = self.environment();
        let root = T::construct(&refs)?;
        prepare_node(Arc::new(root), env.with_refs(Arc::new(refs)))
    }

    /// Prepares `T` and serves it until SIGTERM or Ctrl+C.
    ///
    /// Logging is initialized for the configured mode first.
    pub async fn launch<T>(self) -> Result<(), LaunchError>
    where
        T: Construct + ControllerNode,
    {
        daedalus_telemetry::init_for_mode(self.config.mode);
        let prepared = self.prepare::<T>()?;
        prepared.serve(ShutdownSignal::with_os_signals()).await
    }

    fn environment(mut self) -> (SynthesisEnv, Container) {
        let config = Arc::new(self.config);
        let validator = self
            .validator
            .unwrap_or_else(|| Arc::new(RuleValidator::new(config.validator_tag.clone())));
        let document = Arc::new(ApiDocument::new());

        self.refs.register(config.clone());
        self.refs.register(document.clone());
        self.refs.register(Arc::new(validator.clone()));

        let env = SynthesisEnv {
            config,
            validator,
            refs: Arc::new(Container::new()),
            document,
            multipart: self.multipart,
        };
        (env, self.refs)
    }
}

impl std::fmt::Debug for Launcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Launcher")
            .field("config", &self.config)
            .field("refs", &self.refs)
            .finish_non_exhaustive()
    }
}

/// Synthesizes an already-built root.
///
/// The root must declare a single `WebServer` predecessor.
pub fn prepare_node(root: Arc<dyn ControllerNode>, env: SynthesisEnv) -> Result<Prepared, LaunchError> {
    let layout = root.layout();
    if let Some(predecessor) = layout.predecessor() {
        if predecessor.kind != ControllerKind::Server {
            return Err(LaunchError::NotAServer {
                controller: root.type_name(),
            });
        }
    }
    let table = synthesize(&root, &env)?;
    Ok(Prepared {
        table: Arc::new(table),
        env,
    })
}

/// A synthesized tree ready to serve.
#[derive(Debug)]
pub struct Prepared {
    table: Arc<RouteTable>,
    env: SynthesisEnv,
}

impl Prepared {
    /// The route table.
    pub fn table(&self) -> &Arc<RouteTable> {
        &self.table
    }

    /// The API document handle.
    pub fn document(&self) -> &Arc<ApiDocument> {
        &self.env.document
    }

    /// The configuration the tree was built with.
    pub fn config(&self) -> &WebConfig {
        &self.env.config
    }

    /// A server for the configured address and connection limit.
    pub fn server(&self) -> Server {
        Server::new(Arc::clone(&self.table), self.env.config.listen_addr())
            .max_connections(self.env.config.max_connections)
    }

    /// Serves until `shutdown`.
    pub async fn serve(self, shutdown: ShutdownSignal) -> Result<(), LaunchError> {
        self.server().serve(shutdown).await?;
        Ok(())
    }
}
