//! Extraction errors.
//!
//! Every error names the part of the request it was reading so the binder
//! can log a precise diagnostic.

use http::StatusCode;
use std::fmt;
use thiserror::Error;

/// The part of a request a value was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    /// Query string
    Query,
    /// Urlencoded or multipart form fields
    Form,
    /// Structured body
    Body,
    /// The `Content-Type` header
    ContentType,
}

impl fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Query => "query",
            Self::Form => "form",
            Self::Body => "body",
            Self::ContentType => "content-type",
        })
    }
}

/// A request value that could not be extracted.
///
/// ```rust
/// use daedalus_extract::{ExtractionError, ExtractionSource};
/// use http::StatusCode;
///
/// let err = ExtractionError::too_large(1024, 2048);
/// assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
/// assert_eq!(err.extraction_source(), ExtractionSource::Body);
/// ```
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The data is present but malformed.
    #[error("cannot decode {at}: {message}")]
    Decode {
        /// Where decoding failed.
        at: ExtractionSource,
        /// Decoder message.
        message: String,
    },

    /// A single named value has the wrong shape.
    #[error("invalid {at} value '{field}': {message}")]
    InvalidValue {
        /// Where the value was read.
        at: ExtractionSource,
        /// Field name.
        field: String,
        /// Parser message.
        message: String,
    },

    /// The body or one of its parts exceeds a limit.
    #[error("payload of {actual} bytes exceeds the {limit} byte limit")]
    TooLarge {
        /// Configured limit.
        limit: usize,
        /// Received size.
        actual: usize,
    },

    /// The body has a content type that cannot be decoded.
    #[error("unsupported content type '{actual}', expected {expected}")]
    UnsupportedMediaType {
        /// What would have been accepted.
        expected: String,
        /// What was sent, or `none`.
        actual: String,
    },
}

impl ExtractionError {
    /// A [`Decode`](Self::Decode) error.
    pub fn decode(at: ExtractionSource, message: impl Into<String>) -> Self {
        Self::Decode {
            at,
            message: message.into(),
        }
    }

    /// An [`InvalidValue`](Self::InvalidValue) error.
    pub fn invalid_value(at: ExtractionSource, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            at,
            field: field.into(),
            message: message.into(),
        }
    }

    /// A [`TooLarge`](Self::TooLarge) error.
    pub fn too_large(limit: usize, actual: usize) -> Self {
        Self::TooLarge { limit, actual }
    }

    /// An [`UnsupportedMediaType`](Self::UnsupportedMediaType) error.
    pub fn unsupported_media_type(expected: &str, actual: Option<&str>) -> Self {
        Self::UnsupportedMediaType {
            expected: expected.to_string(),
            actual: actual.unwrap_or("none").to_string(),
        }
    }

    /// Where the failure happened.
    pub fn extraction_source(&self) -> ExtractionSource {
        match self {
            Self::Decode { at, .. } | Self::InvalidValue { at, .. } => *at,
            Self::TooLarge { .. } => ExtractionSource::Body,
            Self::UnsupportedMediaType { .. } => ExtractionSource::ContentType,
        }
    }

    /// The status a handler would answer with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Decode { .. } | Self::InvalidValue { .. } => StatusCode::BAD_REQUEST,
            Self::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_value() {
        let err = ExtractionError::invalid_value(ExtractionSource::Form, "avatar", "stream closed");
        assert_eq!(err.extraction_source(), ExtractionSource::Form);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "invalid form value 'avatar': stream closed");
    }

    #[test]
    fn test_unsupported_media_type() {
        let err = ExtractionError::unsupported_media_type("application/json", None);
        assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(err.to_string(), "unsupported content type 'none', expected application/json");
    }
}
