//! # Daedalus Server
//!
//! Serves a synthesized controller tree over HTTP/1.1.
//!
//! - [`Launcher`] registers references, constructs the root controller and
//!   synthesizes its routes
//! - [`Server`] runs the hyper accept loop with an optional connection limit
//! - [`ShutdownSignal`] coordinates graceful shutdown
//!
//! ```rust,ignore
//! use daedalus_server::Launcher;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), daedalus_server::LaunchError> {
//!     Launcher::new(WebConfig::new().set_port(8080)).launch::<Api>().await
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/daedalus-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod launch;
mod server;
pub mod shutdown;

pub use error::{LaunchError, ServerError};
pub use launch::{prepare_node, Launcher, Prepared};
pub use server::{ResponseBody, Server, DEFAULT_SHUTDOWN_TIMEOUT};
pub use shutdown::{ConnectionTracker, ShutdownSignal};
