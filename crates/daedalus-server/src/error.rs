//! Server and launcher errors.

use daedalus_config::ConfigError;
use daedalus_core::{InjectionError, SynthesisError};
use thiserror::Error;

/// Errors from the serve loop.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listen address could not be bound.
    #[error("cannot bind {addr}: {source}")]
    Bind {
        /// Address as configured.
        addr: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Other I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from [`Launcher`](crate::Launcher).
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The root controller does not declare a `WebServer` predecessor.
    #[error("'{controller}' is not a server: its predecessor must be WebServer")]
    NotAServer {
        /// Root controller type.
        controller: &'static str,
    },

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A reference required by a controller is missing.
    #[error(transparent)]
    Injection(#[from] InjectionError),

    /// The controller tree is misdeclared.
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    /// Serving failed.
    #[error(transparent)]
    Server(#[from] ServerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = LaunchError::NotAServer { controller: "Users" };
        assert_eq!(err.to_string(), "'Users' is not a server: its predecessor must be WebServer");

        let err = ServerError::Bind {
            addr: "0.0.0.0:80".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().starts_with("cannot bind 0.0.0.0:80"));
    }
}
