//! Response builders for common HTTP response types.
//!
//! | Builder | Content-Type |
//! |---------|--------------|
//! | [`JsonResponse`] | `application/json; charset=utf-8` |
//! | [`HtmlResponse`] | `text/html; charset=utf-8` |
//! | [`TextResponse`] | `text/plain; charset=utf-8` |

use bytes::Bytes;
use http::{header, HeaderValue, Response, StatusCode};
use serde::Serialize;

fn build(status: StatusCode, content_type: &'static str, body: Bytes) -> Response<Bytes> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

/// JSON response builder.
///
/// # Example
///
/// ```rust
/// use daedalus_extract::response::JsonResponse;
/// use http::StatusCode;
///
/// let response = JsonResponse::new(serde_json::json!({"ok": true}))
///     .with_status(StatusCode::CREATED)
///     .into_response()
///     .unwrap();
/// assert_eq!(response.status(), StatusCode::CREATED);
/// ```
#[derive(Debug)]
pub struct JsonResponse<T> {
    data: T,
    status: StatusCode,
    pretty: bool,
}

impl<T: Serialize> JsonResponse<T> {
    /// Creates a new JSON response with status 200 OK.
    #[must_use]
    pub fn new(data: T) -> Self {
        Self {
            data,
            status: StatusCode::OK,
            pretty: false,
        }
    }

    /// Sets a custom status code.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Indents the serialized body.
    #[must_use]
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Builds the HTTP response.
    pub fn into_response(self) -> Result<Response<Bytes>, serde_json::Error> {
        let body = if self.pretty {
            serde_json::to_vec_pretty(&self.data)?
        } else {
            serde_json::to_vec(&self.data)?
        };
        Ok(build(self.status, "application/json; charset=utf-8", Bytes::from(body)))
    }
}

/// HTML response builder.
#[derive(Debug, Clone)]
pub struct HtmlResponse {
    content: String,
    status: StatusCode,
}

impl HtmlResponse {
    /// Creates a new HTML response with status 200 OK.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            status: StatusCode::OK,
        }
    }

    /// Builds the HTTP response.
    #[must_use]
    pub fn into_response(self) -> Response<Bytes> {
        build(self.status, "text/html; charset=utf-8", Bytes::from(self.content))
    }
}

/// Plain text response builder.
#[derive(Debug, Clone)]
pub struct TextResponse {
    content: String,
    status: StatusCode,
}

impl TextResponse {
    /// Creates a new text response with status 200 OK.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            status: StatusCode::OK,
        }
    }

    /// Sets a custom status code.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Builds the HTTP response.
    #[must_use]
    pub fn into_response(self) -> Response<Bytes> {
        build(self.status, "text/plain; charset=utf-8", Bytes::from(self.content))
    }
}
