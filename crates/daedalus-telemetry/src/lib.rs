//! Logging setup for Daedalus services.
//!
//! Installs a `tracing-subscriber` registry whose format and level are
//! chosen by the configured [`RuntimeMode`](daedalus_config::RuntimeMode).
//!
//! ```rust,ignore
//! use daedalus_config::RuntimeMode;
//! use daedalus_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::for_mode(RuntimeMode::Prod))?;
//! tracing::info!(operation = "UserController::get_user", "serving");
//! ```

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_for_mode, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
