//! # Daedalus Config
//!
//! Typed configuration for the Daedalus web layer.
//!
//! [`WebConfig`] holds the listen address, route prefix, validator tag,
//! runtime mode and OpenAPI document settings. [`ConfigLoader`] layers a
//! TOML/JSON file and `DAEDALUS__*` environment variables over the defaults.
//!
//! ```
//! use daedalus_config::{ConfigLoader, RuntimeMode};
//!
//! let config = ConfigLoader::new()
//!     .with_string("mode = \"test\"\n[openapi]\nenabled = true", "toml")
//!     .unwrap()
//!     .load()
//!     .unwrap();
//!
//! assert_eq!(config.mode, RuntimeMode::Test);
//! assert!(config.openapi.enabled);
//! ```

mod config;
mod error;
mod loader;

pub use config::{OpenApiConfig, RuntimeMode, WebConfig, DEFAULT_PORT, DEFAULT_VALIDATOR_TAG};
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
