//! The registered route table.
//!
//! Synthesis fills a [`RouteTable`]; the server then hands every request to
//! [`RouteTable::handle`], which matches the route, prepares the request
//! context and runs the entry's handler chain.

use crate::context::WebContext;
use crate::dispatch::Handler;
use crate::error::{SynthesisError, WebError};
use crate::refs::Container;
use crate::synth::{ApiDocument, SynthesisEnv};
use bytes::Bytes;
use daedalus_config::WebConfig;
use daedalus_docs::join_paths;
use daedalus_extract::{ExtractionContext, MultipartConfig};
use daedalus_router::{RouteError, Router};
use http::header::{ALLOW, CONTENT_TYPE};
use http::{HeaderValue, Method, Request, Response, StatusCode};
use std::fmt;
use std::sync::Arc;

/// One registered route.
pub struct RouteTableEntry {
    /// HTTP method.
    pub method: Method,
    /// Router template, e.g. `/api/user/:id`.
    pub path: String,
    /// Operation id, `Controller.operation`, or a label for custom routes.
    pub operation: String,
    /// Names of the middleware chained before the handler.
    pub middleware: Vec<String>,
    /// Middleware handlers followed by the operation handler.
    pub chain: Vec<Handler>,
}

impl RouteTableEntry {
    /// Runs the chain, stopping once a step aborts.
    pub async fn run(&self, ctx: WebContext) {
        for step in &self.chain {
            if ctx.is_aborted() {
                tracing::debug!(operation = %self.operation, "chain aborted");
                break;
            }
            step(ctx.clone()).await;
        }
    }
}

impl fmt::Debug for RouteTableEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTableEntry")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("operation", &self.operation)
            .field("middleware", &self.middleware)
            .field("chain", &self.chain.len())
            .finish()
    }
}

/// All routes of a synthesized controller tree.
#[derive(Default)]
pub struct RouteTable {
    router: Router<Arc<RouteTableEntry>>,
    entries: Vec<Arc<RouteTableEntry>>,
    multipart: MultipartConfig,
}

impl RouteTable {
    /// Creates an empty table.
    pub fn new(multipart: MultipartConfig) -> Self {
        Self {
            router: Router::new(),
            entries: Vec::new(),
            multipart,
        }
    }

    /// Registers `entry`; the same method and path twice is an error.
    pub fn insert(&mut self, entry: RouteTableEntry) -> Result<(), RouteError> {
        let entry = Arc::new(entry);
        self.router.insert(&entry.method, &entry.path, entry.clone())?;
        tracing::info!(
            method = %entry.method,
            path = %entry.path,
            operation = %entry.operation,
            middleware = ?entry.middleware,
            "registered route"
        );
        self.entries.push(entry);
        Ok(())
    }

    /// Entries in registration order.
    pub fn entries(&self) -> &[Arc<RouteTableEntry>] {
        &self.entries
    }

    /// Number of routes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when no route is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finds the entry that answers `method` on a request `path`.
    pub fn find(&self, method: &Method, path: &str) -> Option<Arc<RouteTableEntry>> {
        self.router.match_route(method, path).map(|m| m.value.clone())
    }

    /// Answers one buffered request.
    pub async fn handle(&self, request: Request<Bytes>) -> Response<Bytes> {
        let (parts, body) = request.into_parts();
        let path = parts.uri.path().to_string();

        let Some((entry, params)) = self
            .router
            .match_route(&parts.method, &path)
            .map(|m| (m.value.clone(), m.params))
        else {
            return self.unmatched(&parts.method, &path);
        };

        let mut request = ExtractionContext::new(parts.method, parts.uri, parts.headers, body, params);
        if let Err(err) = request.prepare_form(&self.multipart).await {
            tracing::debug!(path = %path, error = %err, "failed to read form body");
        }

        let ctx = WebContext::new(request);
        entry.run(ctx.clone()).await;
        ctx.finish()
    }

    fn unmatched(&self, method: &Method, path: &str) -> Response<Bytes> {
        match self.router.match_path(path) {
            Some((methods, _)) if !methods.is_empty() => {
                let allow = methods
                    .allowed_methods()
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                tracing::debug!(%method, path, allow = %allow, "method not allowed");
                let mut response = error_response(StatusCode::METHOD_NOT_ALLOWED);
                if let Ok(value) = HeaderValue::from_str(&allow) {
                    response.headers_mut().insert(ALLOW, value);
                }
                response
            }
            _ => {
                tracing::debug!(%method, path, "no route");
                error_response(StatusCode::NOT_FOUND)
            }
        }
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTable")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

fn error_response(status: StatusCode) -> Response<Bytes> {
    let message = status.canonical_reason().unwrap_or("error");
    let body = serde_json::to_vec(&WebError::from_status(status, message)).unwrap_or_default();
    let mut response = Response::new(Bytes::from(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// The registration scope handed to [`Operations::setup_router`].
///
/// Paths are relative to the controller's group and handlers run after the
/// group's middleware.
///
/// [`Operations::setup_router`]: crate::Operations::setup_router
pub struct RouteScope<'a> {
    table: &'a mut RouteTable,
    env: &'a SynthesisEnv,
    base_path: String,
    chain: Vec<Handler>,
    middleware: Vec<String>,
}

impl<'a> RouteScope<'a> {
    pub(crate) fn new(
        table: &'a mut RouteTable,
        env: &'a SynthesisEnv,
        base_path: String,
        chain: Vec<Handler>,
        middleware: Vec<String>,
    ) -> Self {
        Self {
            table,
            env,
            base_path,
            chain,
            middleware,
        }
    }

    /// The group prefix of this scope.
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// The server configuration.
    pub fn config(&self) -> &WebConfig {
        &self.env.config
    }

    /// The reference container.
    pub fn refs(&self) -> &Container {
        &self.env.refs
    }

    /// The document being synthesized.
    pub fn document(&self) -> &Arc<ApiDocument> {
        &self.env.document
    }

    /// Registers `handler` for `method` at `path` under this scope.
    pub fn handle(&mut self, method: Method, path: &str, handler: Handler) -> Result<(), SynthesisError> {
        let full = join_paths(&self.base_path, path);
        let mut chain = self.chain.clone();
        chain.push(handler);
        self.table.insert(RouteTableEntry {
            operation: format!("{method} {full}"),
            method,
            path: full,
            middleware: self.middleware.clone(),
            chain,
        })?;
        Ok(())
    }

    /// Registers a `GET` route.
    pub fn get(&mut self, path: &str, handler: Handler) -> Result<(), SynthesisError> {
        self.handle(Method::GET, path, handler)
    }

    /// Registers a `POST` route.
    pub fn post(&mut self, path: &str, handler: Handler) -> Result<(), SynthesisError> {
        self.handle(Method::POST, path, handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::handler;

    fn entry(method: Method, path: &str, chain: Vec<Handler>) -> RouteTableEntry {
        RouteTableEntry {
            method,
            path: path.to_string(),
            operation: "Test.op".to_string(),
            middleware: Vec::new(),
            chain,
        }
    }

    fn request(method: Method, uri: &str) -> Request<Bytes> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Bytes::new())
            .unwrap()
    }

    #[tokio::test]
    async fn test_dispatches_with_params() {
        let mut table = RouteTable::default();
        table
            .insert(entry(
                Method::GET,
                "/user/:id",
                vec![handler(|ctx: WebContext| async move {
                    let id = ctx.param("id").unwrap_or_default().to_string();
                    ctx.text(StatusCode::OK, id);
                })],
            ))
            .unwrap();

        let resp = table.handle(request(Method::GET, "/user/42")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.body().as_ref(), b"42");
    }

    #[tokio::test]
    async fn test_abort_stops_chain() {
        let mut table = RouteTable::default();
        table
            .insert(entry(
                Method::GET,
                "/guarded",
                vec![
                    handler(|ctx: WebContext| async move {
                        ctx.abort_with_status(StatusCode::UNAUTHORIZED);
                    }),
                    handler(|ctx: WebContext| async move {
                        ctx.text(StatusCode::OK, "secret");
                    }),
                ],
            ))
            .unwrap();

        let resp = table.handle(request(Method::GET, "/guarded")).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(resp.body().is_empty());
    }

    #[tokio::test]
    async fn test_not_found_and_method_not_allowed() {
        let mut table = RouteTable::default();
        table.insert(entry(Method::GET, "/ping", Vec::new())).unwrap();

        let resp = table.handle(request(Method::GET, "/nope")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: WebError = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body.code, "404");

        let resp = table.handle(request(Method::POST, "/ping")).await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers().get(ALLOW).unwrap(), "GET");
    }

    #[test]
    fn test_duplicate_route_is_rejected() {
        let mut table = RouteTable::default();
        table.insert(entry(Method::GET, "/a", Vec::new())).unwrap();
        assert!(table.insert(entry(Method::GET, "/a", Vec::new())).is_err());
        assert_eq!(table.len(), 1);
        assert!(table.find(&Method::GET, "/a").is_some());
    }
}
