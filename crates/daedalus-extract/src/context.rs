//! The buffered request seen by parameter binding.
//!
//! [`ExtractionContext`] owns one buffered request and answers the keyed
//! lookups used by parameter binding: path captures, query parameters, form
//! fields, headers and cookies.

use bytes::Bytes;
use daedalus_router::Params;
use http::{header, HeaderMap, Method, Uri};

use crate::multipart::{read_multipart, MultipartConfig};
use crate::{Cookies, ExtractionError, FormData};

/// Content type of urlencoded form bodies.
pub const URLENCODED: &str = "application/x-www-form-urlencoded";
/// Content type of multipart form bodies.
pub const MULTIPART: &str = "multipart/form-data";

/// One buffered request plus its parsed query, cookies and form.
///
/// # Example
///
/// ```rust
/// use daedalus_extract::ExtractionContext;
/// use daedalus_router::Params;
/// use http::{HeaderMap, Method, Uri};
/// use bytes::Bytes;
///
/// let mut params = Params::new();
/// params.push("id", "123");
///
/// let ctx = ExtractionContext::new(
///     Method::GET,
///     Uri::from_static("/users/123?verbose=true"),
///     HeaderMap::new(),
///     Bytes::new(),
///     params,
/// );
///
/// assert_eq!(ctx.path_param("id"), Some("123"));
/// assert_eq!(ctx.query_value("verbose"), Some("true"));
/// ```
#[derive(Debug, Clone)]
pub struct ExtractionContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    path_params: Params,
    query: Vec<(String, String)>,
    cookies: Cookies,
    form: FormData,
}

impl Default for ExtractionContext {
    fn default() -> Self {
        Self::new(
            Method::GET,
            Uri::from_static("/"),
            HeaderMap::new(),
            Bytes::new(),
            Params::new(),
        )
    }
}

impl ExtractionContext {
    /// Query string and cookies are parsed here. Form bodies wait for
    /// [`prepare_form`](Self::prepare_form).
    #[must_use]
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: Bytes, path_params: Params) -> Self {
        let query = uri
            .query()
            .and_then(|q| serde_urlencoded::from_str(q).ok())
            .unwrap_or_default();
        let cookies = headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(Cookies::parse)
            .unwrap_or_default();
        Self {
            method,
            uri,
            headers,
            body,
            path_params,
            query,
            cookies,
            form: FormData::new(),
        }
    }

    /// Parses an urlencoded or multipart body into form fields.
    ///
    /// Requests with any other content type are left untouched.
    pub async fn prepare_form(&mut self, config: &MultipartConfig) -> Result<(), ExtractionError> {
        let Some(mime) = self.mime() else {
            return Ok(());
        };
        match mime.essence_str() {
            URLENCODED => {
                self.form = FormData::from_urlencoded(&self.body)?;
            }
            MULTIPART => {
                let content_type = self.content_type().unwrap_or(MULTIPART).to_string();
                self.form = read_multipart(&content_type, self.body.clone(), config).await?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request target.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Path without the query.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Raw query, undecoded.
    #[must_use]
    pub fn query_string(&self) -> Option<&str> {
        self.uri.query()
    }

    /// All request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw body as received.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// `true` for a zero-length body.
    #[must_use]
    pub fn is_body_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Captures from the matched route template.
    #[must_use]
    pub fn path_params(&self) -> &Params {
        &self.path_params
    }

    /// Header `name`, if present and visible ASCII.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Raw `Content-Type` value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE.as_str())
    }

    /// `Content-Type` as a media type; `None` when absent or malformed.
    #[must_use]
    pub fn mime(&self) -> Option<mime::Mime> {
        self.content_type().and_then(|v| v.parse().ok())
    }

    /// Capture `name` from the route template.
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name)
    }

    /// First query value under `name`. An empty value still counts as present.
    #[must_use]
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find_map(|(key, value)| (key == name).then_some(value.as_str()))
    }

    /// Every query pair in request order.
    #[must_use]
    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    /// First form value under `name`.
    #[must_use]
    pub fn form_value(&self, name: &str) -> Option<&str> {
        self.form.get(name)
    }

    /// Empty until `prepare_form` has run on a form request.
    #[must_use]
    pub fn form(&self) -> &FormData {
        &self.form
    }

    /// Cookie `name` from the `Cookie` header.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name)
    }
}

/// Assembles an [`ExtractionContext`] piece by piece, mostly for tests.
#[derive(Debug, Default)]
pub struct ExtractionContextBuilder {
    method: Option<Method>,
    uri: Option<Uri>,
    headers: HeaderMap,
    body: Bytes,
    path_params: Params,
}

impl ExtractionContextBuilder {
    /// An empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Request target.
    #[must_use]
    pub fn uri(mut self, uri: Uri) -> Self {
        self.uri = Some(uri);
        self
    }

    /// Values that are not valid header text are dropped.
    #[must_use]
    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = value.parse() {
            self.headers.insert(name, value);
        }
        self
    }

    /// Body bytes.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Adds a route capture.
    #[must_use]
    pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.push(name, value);
        self
    }

    /// Unset method and URI become `GET /`.
    #[must_use]
    pub fn build(self) -> ExtractionContext {
        ExtractionContext::new(
            self.method.unwrap_or(Method::GET),
            self.uri.unwrap_or_else(|| Uri::from_static("/")),
            self.headers,
            self.body,
            self.path_params,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_feeds_every_lookup() {
        let ctx = ExtractionContextBuilder::new()
            .method(Method::POST)
            .uri(Uri::from_static("/api/users?page=2&page=3"))
            .header("content-type", "application/json")
            .header("cookie", "sid=xyz")
            .header("x-trace", "t-1")
            .body(r#"{"name": "Alice"}"#)
            .path_param("version", "v1")
            .build();

        assert_eq!(ctx.method(), &Method::POST);
        assert_eq!(ctx.path(), "/api/users");
        assert_eq!(ctx.query_value("page"), Some("2"));
        assert_eq!(ctx.query_pairs().len(), 2);
        assert_eq!(ctx.cookie("sid"), Some("xyz"));
        assert_eq!(ctx.header("x-trace"), Some("t-1"));
        assert_eq!(ctx.path_param("version"), Some("v1"));
        assert_eq!(ctx.mime().unwrap().essence_str(), "application/json");
    }

    #[test]
    fn empty_query_value_is_present() {
        let ctx = ExtractionContextBuilder::new()
            .uri(Uri::from_static("/?flag="))
            .build();
        assert_eq!(ctx.query_value("flag"), Some(""));
        assert_eq!(ctx.query_value("other"), None);
    }

    #[tokio::test]
    async fn urlencoded_body_becomes_form() {
        let mut ctx = ExtractionContextBuilder::new()
            .method(Method::POST)
            .header("content-type", "application/x-www-form-urlencoded; charset=utf-8")
            .body("user=alice&age=30")
            .build();
        ctx.prepare_form(&MultipartConfig::default()).await.unwrap();
        assert_eq!(ctx.form_value("user"), Some("alice"));
        assert_eq!(ctx.form_value("age"), Some("30"));
    }

    #[tokio::test]
    async fn json_body_leaves_form_empty() {
        let mut ctx = ExtractionContextBuilder::new()
            .method(Method::POST)
            .header("content-type", "application/json")
            .body("{}")
            .build();
        ctx.prepare_form(&MultipartConfig::default()).await.unwrap();
        assert!(ctx.form().is_empty());
    }
}
