//! Error types for the documentation crate.

use thiserror::Error;

/// Errors that can occur while producing documentation.
#[derive(Debug, Error)]
pub enum DocsError {
    /// Failed to serialize the OpenAPI document to JSON.
    #[error("failed to serialize OpenAPI document: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Result type for documentation operations.
pub type DocsResult<T> = Result<T, DocsError>;
