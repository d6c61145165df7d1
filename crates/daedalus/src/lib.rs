//! # Daedalus
//!
//! **Declarative controller routing for REST APIs**
//!
//! Controllers are plain structs. Their public methods named after an HTTP
//! verb become routes; parameter structs describe where each value comes
//! from with `#[http(...)]` tags; result structs describe status codes and
//! formats. The same declarations produce an OpenAPI document.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use daedalus::prelude::*;
//!
//! #[derive(Default, Aggregate)]
//! struct GetPet {
//!     #[http("pets/:id")]
//!     ctx: WebContext,
//!     id: u64,
//! }
//!
//! #[derive(Default, Outcome)]
//! struct PetOut {
//!     #[http("200")]
//!     pub data: Option<Pet>,
//!     pub not_found_404: Option<Fault>,
//! }
//!
//! #[derive(Controller)]
//! struct Api {
//!     #[http("/api, middleware=log")]
//!     server: WebServer,
//!     #[middleware]
//!     log: Arc<LogMiddleware>,
//!     #[extender]
//!     pets: Arc<Pets>,
//! }
//!
//! #[derive(Controller)]
//! struct Pets {
//!     #[http("tag=pets")]
//!     controller: WebController,
//! }
//!
//! #[operations]
//! impl Pets {
//!     pub async fn get_pet(&self, params: GetPet) -> PetOut {
//!         // ...
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), LaunchError> {
//!     Launcher::new(WebConfig::new().set_port(8080)).launch::<Api>().await
//! }
//! ```
//!
//! ## Crates
//!
//! | Crate | Contents |
//! |-------|----------|
//! | [`core`] | tag grammar, discovery, binding, dispatch, synthesis |
//! | [`server`] | hyper serve loop and launcher |
//! | [`libs`] | CORS, request log, basic auth, document controller |
//! | [`config`] | `WebConfig` and its layered loader |
//! | [`router`] | radix-tree router |
//! | [`extract`] | request data access and body decoding |
//! | [`docs`] | OpenAPI model and Swagger UI |
//! | [`telemetry`] | logging initialization |

#![doc(html_root_url = "https://docs.rs/daedalus/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use daedalus_config as config;
pub use daedalus_core as core;
pub use daedalus_docs as docs;
pub use daedalus_extract as extract;
pub use daedalus_libs as libs;
pub use daedalus_router as router;
pub use daedalus_server as server;
pub use daedalus_telemetry as telemetry;

// Derive output names these paths through `::daedalus`.
pub use daedalus_core::*;
pub use daedalus_macros::{operations, Aggregate, Controller, Outcome, Validate};

pub use daedalus_config::{ConfigLoader, OpenApiConfig, RuntimeMode, WebConfig};
pub use daedalus_server::{LaunchError, Launcher, Prepared, Server, ShutdownSignal};

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use daedalus::prelude::*;
/// ```
pub mod prelude {
    pub use daedalus_core::{
        Construct, Container, Fault, OutputValue, RouteScope, WebContext, WebController, WebError,
        WebMiddleware, WebServer,
    };

    // Traits share names with the derives below.
    pub use daedalus_core::{Aggregate, Controller, Operations, Outcome, Validate};
    pub use daedalus_macros::{operations, Aggregate, Controller, Outcome, Validate};

    pub use daedalus_config::{RuntimeMode, WebConfig};
    pub use daedalus_libs::{BasicAuthMiddleware, CorsMiddleware, DocController, LogMiddleware};
    pub use daedalus_server::{LaunchError, Launcher};

    pub use std::sync::Arc;
}
