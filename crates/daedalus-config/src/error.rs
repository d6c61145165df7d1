//! Configuration errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from loading or validating a [`WebConfig`](crate::WebConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required file does not exist.
    #[error("configuration file {} does not exist", path.display())]
    Missing {
        /// Path as given.
        path: PathBuf,
    },

    /// A file exists but could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        /// Path as given.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Malformed TOML.
    #[error("bad TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// Malformed JSON.
    #[error("bad JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// A value outside its allowed range.
    #[error("{field}: {reason}")]
    InvalidValue {
        /// Dotted field name, e.g. `openapi.doc_path`.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An environment override that could not be applied.
    #[error("environment variable {var}: {reason}")]
    Env {
        /// Variable name.
        var: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Neither TOML nor JSON.
    #[error("unknown configuration format '{0}'")]
    UnknownFormat(String),
}

impl ConfigError {
    pub(crate) fn missing(path: impl Into<PathBuf>) -> Self {
        Self::Missing { path: path.into() }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// An [`InvalidValue`](Self::InvalidValue) error.
    #[must_use]
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn env(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Env {
            var: var.into(),
            reason: reason.into(),
        }
    }
}
