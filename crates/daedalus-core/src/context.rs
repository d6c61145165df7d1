//! The per-request context handed to operations and middleware.
//!
//! [`WebContext`] is cheap to clone; every clone refers to the same request
//! and the same pending response. Middleware and operations run in
//! sequence, and the first one to write a body decides the response.
//! [`WebContext::abort`] stops the remaining handlers of the chain.

use crate::binding::BindingLocation;
use crate::xml;
use bytes::Bytes;
use daedalus_extract::{body_member, ExtractionContext, ExtractionContextBuilder};
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Method, Response, StatusCode, Uri};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What a finish hook learns about a completed request.
#[derive(Debug, Clone)]
pub struct RequestSummary {
    /// Request method.
    pub method: Method,
    /// Request path.
    pub path: String,
    /// Final response status.
    pub status: StatusCode,
    /// Time since the context was created.
    pub elapsed: Duration,
}

type FinishHook = Box<dyn FnOnce(&RequestSummary) + Send>;

#[derive(Default)]
struct ResponseState {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Option<Bytes>,
    aborted: bool,
}

struct Inner {
    request: ExtractionContext,
    response: Mutex<ResponseState>,
    store: Mutex<HashMap<String, Arc<dyn Any + Send + Sync>>>,
    hooks: Mutex<Vec<FinishHook>>,
    started: Instant,
}

/// Request and response state shared by one request's handler chain.
#[derive(Clone)]
pub struct WebContext {
    inner: Arc<Inner>,
}

impl WebContext {
    /// Wraps a prepared request.
    pub fn new(request: ExtractionContext) -> Self {
        Self {
            inner: Arc::new(Inner {
                request,
                response: Mutex::new(ResponseState::default()),
                store: Mutex::new(HashMap::new()),
                hooks: Mutex::new(Vec::new()),
                started: Instant::now(),
            }),
        }
    }

    // ---- request side ----

    /// The underlying request data.
    pub fn request(&self) -> &ExtractionContext {
        &self.inner.request
    }

    /// Request method.
    pub fn method(&self) -> &Method {
        self.inner.request.method()
    }

    /// Request URI.
    pub fn uri(&self) -> &Uri {
        self.inner.request.uri()
    }

    /// Request path.
    pub fn path(&self) -> &str {
        self.inner.request.path()
    }

    /// A request header as text.
    pub fn request_header(&self, name: &str) -> Option<&str> {
        self.inner.request.header(name)
    }

    /// A query string value.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.inner.request.query_value(name)
    }

    /// A path capture.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.inner.request.path_param(name)
    }

    /// A cookie value.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.inner.request.cookie(name)
    }

    /// A form field from an urlencoded or multipart body.
    pub fn form_value(&self, name: &str) -> Option<&str> {
        self.inner.request.form_value(name)
    }

    /// The raw request body.
    pub fn body(&self) -> &Bytes {
        self.inner.request.body()
    }

    /// Looks up a single request value.
    ///
    /// With a location, only that location is read; `Body` reads a member
    /// of a JSON body or a form field. Without one, the query string, form
    /// fields, path captures, headers and cookies are tried in that order.
    pub fn request_value(&self, key: &str, location: Option<BindingLocation>) -> Option<Value> {
        let req = &self.inner.request;
        let text = |v: &str| Value::String(v.to_string());
        match location {
            Some(BindingLocation::Path) => req.path_param(key).map(text),
            Some(BindingLocation::Query) => req.query_value(key).map(text),
            Some(BindingLocation::Header) => req.header(key).map(text),
            Some(BindingLocation::Cookie) => req.cookie(key).map(text),
            Some(BindingLocation::Form) => req.form_value(key).map(text),
            Some(BindingLocation::Body) => body_member(req, key),
            None => req
                .query_value(key)
                .or_else(|| req.form_value(key))
                .or_else(|| req.path_param(key))
                .or_else(|| req.header(key))
                .or_else(|| req.cookie(key))
                .map(text),
        }
    }

    /// Time since the request started.
    pub fn elapsed(&self) -> Duration {
        self.inner.started.elapsed()
    }

    // ---- values shared along the chain ----

    /// Stores a value for later handlers.
    pub fn set<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) {
        self.inner.store.lock().insert(key.into(), Arc::new(value));
    }

    /// Reads a stored value of type `T`.
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.inner
            .store
            .lock()
            .get(key)
            .and_then(|v| v.clone().downcast::<T>().ok())
    }

    /// Registers a hook that runs once the response is assembled.
    pub fn on_finish(&self, hook: impl FnOnce(&RequestSummary) + Send + 'static) {
        self.inner.hooks.lock().push(Box::new(hook));
    }

    // ---- response side ----

    /// Sets the response status without writing a body.
    pub fn status(&self, status: StatusCode) {
        self.inner.response.lock().status = Some(status);
    }

    /// Sets a response header. Invalid names or values are ignored.
    pub fn header(&self, name: &str, value: &str) {
        match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            (Ok(name), Ok(value)) => {
                self.inner.response.lock().headers.insert(name, value);
            }
            _ => tracing::debug!(header = name, "ignoring invalid response header"),
        }
    }

    /// Writes `body` with an explicit content type.
    ///
    /// Only the first body written is kept.
    pub fn bytes(&self, status: StatusCode, content_type: &str, body: impl Into<Bytes>) {
        let mut state = self.inner.response.lock();
        if state.body.is_some() {
            tracing::debug!(path = self.path(), "response body already written");
            return;
        }
        state.status = Some(status);
        if let Ok(value) = HeaderValue::try_from(content_type) {
            state.headers.insert(CONTENT_TYPE, value);
        }
        state.body = Some(body.into());
    }

    /// Writes a JSON body.
    pub fn json<T: Serialize + ?Sized>(&self, status: StatusCode, value: &T) {
        match serde_json::to_vec(value) {
            Ok(body) => self.bytes(status, "application/json; charset=utf-8", body),
            Err(err) => self.encoding_failed(&err),
        }
    }

    /// Writes an indented JSON body.
    pub fn json_pretty<T: Serialize + ?Sized>(&self, status: StatusCode, value: &T) {
        match serde_json::to_vec_pretty(value) {
            Ok(body) => self.bytes(status, "application/json; charset=utf-8", body),
            Err(err) => self.encoding_failed(&err),
        }
    }

    /// Writes an XML body rooted at `<response>`.
    pub fn xml<T: Serialize + ?Sized>(&self, status: StatusCode, value: &T) {
        self.xml_named(status, "response", value);
    }

    /// Writes an XML body rooted at `root`.
    pub fn xml_named<T: Serialize + ?Sized>(&self, status: StatusCode, root: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(value) => self.bytes(status, "application/xml; charset=utf-8", xml::to_xml(root, &value)),
            Err(err) => self.encoding_failed(&err),
        }
    }

    /// Writes a plain text body.
    pub fn text(&self, status: StatusCode, body: impl Into<String>) {
        self.bytes(status, "text/plain; charset=utf-8", body.into());
    }

    /// Writes an HTML body.
    pub fn html(&self, status: StatusCode, body: impl Into<String>) {
        self.bytes(status, "text/html; charset=utf-8", body.into());
    }

    /// Stops the remaining handlers of the chain.
    pub fn abort(&self) {
        self.inner.response.lock().aborted = true;
    }

    /// Sets `status` and stops the chain.
    pub fn abort_with_status(&self, status: StatusCode) {
        let mut state = self.inner.response.lock();
        state.status = Some(status);
        state.aborted = true;
    }

    /// Writes a JSON body and stops the chain.
    pub fn abort_with_json<T: Serialize + ?Sized>(&self, status: StatusCode, value: &T) {
        self.json(status, value);
        self.abort();
    }

    /// `true` once a handler aborted the chain.
    pub fn is_aborted(&self) -> bool {
        self.inner.response.lock().aborted
    }

    /// `true` once a body was written.
    pub fn is_written(&self) -> bool {
        self.inner.response.lock().body.is_some()
    }

    /// The status set so far.
    pub fn response_status(&self) -> Option<StatusCode> {
        self.inner.response.lock().status
    }

    /// A response header set so far.
    pub fn response_header(&self, name: &str) -> Option<String> {
        self.inner
            .response
            .lock()
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    /// Assembles the response and runs the finish hooks.
    ///
    /// Hooks run at most once; later calls rebuild the response only.
    pub fn finish(&self) -> Response<Bytes> {
        let (status, headers, body) = {
            let state = self.inner.response.lock();
            (
                state.status.unwrap_or(StatusCode::OK),
                state.headers.clone(),
                state.body.clone().unwrap_or_default(),
            )
        };

        let hooks = std::mem::take(&mut *self.inner.hooks.lock());
        if !hooks.is_empty() {
            let summary = RequestSummary {
                method: self.method().clone(),
                path: self.path().to_string(),
                status,
                elapsed: self.elapsed(),
            };
            for hook in hooks {
                hook(&summary);
            }
        }

        let mut response = Response::new(body);
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }

    fn encoding_failed(&self, err: &serde_json::Error) {
        tracing::error!(path = self.path(), error = %err, "failed to encode response");
        self.bytes(
            StatusCode::INTERNAL_SERVER_ERROR,
            "text/plain; charset=utf-8",
            "response encoding failed",
        );
    }
}

impl Default for WebContext {
    fn default() -> Self {
        Self::new(ExtractionContextBuilder::new().build())
    }
}

impl fmt::Debug for WebContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebContext")
            .field("method", self.method())
            .field("path", &self.path())
            .field("aborted", &self.is_aborted())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU16, Ordering};

    fn ctx(uri: &str) -> WebContext {
        WebContext::new(
            ExtractionContextBuilder::new()
                .method(Method::GET)
                .uri(uri.parse().unwrap())
                .header("x-token", "abc")
                .header("cookie", "sid=42")
                .path_param("id", "7")
                .build(),
        )
    }

    #[test]
    fn test_request_value_by_location() {
        let ctx = ctx("/users/7?id=9&q=x");
        let loc = |l| ctx.request_value("id", Some(l));
        assert_eq!(loc(BindingLocation::Path), Some(Value::String("7".into())));
        assert_eq!(loc(BindingLocation::Query), Some(Value::String("9".into())));
        assert_eq!(ctx.request_value("sid", Some(BindingLocation::Cookie)), Some(Value::String("42".into())));
        assert_eq!(ctx.request_value("x-token", Some(BindingLocation::Header)), Some(Value::String("abc".into())));
    }

    #[test]
    fn test_request_value_guess_order() {
        let ctx = ctx("/users/7?id=9");
        assert_eq!(ctx.request_value("id", None), Some(Value::String("9".into())));
        assert_eq!(ctx.request_value("x-token", None), Some(Value::String("abc".into())));
        assert_eq!(ctx.request_value("missing", None), None);
    }

    #[test]
    fn test_first_body_wins() {
        let ctx = ctx("/");
        ctx.text(StatusCode::CREATED, "first");
        ctx.json(StatusCode::OK, &"second");
        let resp = ctx.finish();
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(resp.body().as_ref(), b"first");
        assert_eq!(resp.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");
    }

    #[test]
    fn test_abort_with_status_keeps_empty_body() {
        let ctx = ctx("/");
        ctx.abort_with_status(StatusCode::UNAUTHORIZED);
        assert!(ctx.is_aborted());
        assert!(!ctx.is_written());
        let resp = ctx.finish();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(resp.body().is_empty());
    }

    #[test]
    fn test_store_and_hooks() {
        let ctx = ctx("/users/7");
        ctx.set("user", String::from("alice"));
        assert_eq!(ctx.get::<String>("user").as_deref().map(String::as_str), Some("alice"));
        assert!(ctx.get::<u32>("user").is_none());

        let seen = Arc::new(AtomicU16::new(0));
        let seen_hook = seen.clone();
        ctx.on_finish(move |summary| seen_hook.store(summary.status.as_u16(), Ordering::SeqCst));
        ctx.status(StatusCode::ACCEPTED);
        ctx.finish();
        ctx.finish();
        assert_eq!(seen.load(Ordering::SeqCst), 202);
    }

    #[test]
    fn test_clones_share_state() {
        let ctx = ctx("/");
        let other = ctx.clone();
        other.header("x-request-id", "r1");
        assert_eq!(ctx.response_header("x-request-id").as_deref(), Some("r1"));
    }
}
