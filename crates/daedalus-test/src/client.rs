//! Test client for in-memory HTTP testing.

use crate::error::TestError;
use crate::request::{TestRequest, TestRequestBuilder};
use crate::response::TestResponse;
use daedalus_core::{Construct, ControllerNode, RouteTable};
use daedalus_server::{LaunchError, Launcher, Prepared};
use http::Method;
use serde::Serialize;
use std::sync::Arc;

/// A test client that answers requests straight from a [`RouteTable`].
///
/// Requests run through the same matching, middleware chain and dispatch as
/// the server, without binding a port.
///
/// # Example
///
/// ```ignore
/// use daedalus_test::TestClient;
///
/// let client = TestClient::build::<Api>(Launcher::new(WebConfig::new()))?;
///
/// let response = client.get("/api/pets/1").send().await;
/// response.assert_status(StatusCode::OK);
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct TestClient {
    table: Arc<RouteTable>,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Creates a test client over a synthesized table.
    pub fn new(table: Arc<RouteTable>) -> Self {
        Self {
            table,
            default_headers: Vec::new(),
        }
    }

    /// Creates a test client over a prepared tree.
    pub fn from_prepared(prepared: &Prepared) -> Self {
        Self::new(Arc::clone(prepared.table()))
    }

    /// Prepares `T` with `launcher` and wraps its table.
    pub fn build<T>(launcher: Launcher) -> Result<Self, LaunchError>
    where
        T: Construct + ControllerNode,
    {
        Ok(Self::from_prepared(&launcher.prepare::<T>()?))
    }

    /// Adds a default header that will be included in all requests.
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// The table requests are answered from.
    pub fn table(&self) -> &Arc<RouteTable> {
        &self.table
    }

    /// Creates a GET request builder.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::get(uri))
    }

    /// Creates a POST request builder.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::post(uri))
    }

    /// Creates a PUT request builder.
    pub fn put(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::put(uri))
    }

    /// Creates a DELETE request builder.
    pub fn delete(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::delete(uri))
    }

    /// Creates a request builder with a custom method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequestBuilder::new(method, uri))
    }

    /// Creates a POST request carrying `value` as JSON.
    pub fn post_json<T: Serialize>(&self, uri: impl AsRef<str>, value: &T) -> TestClientRequest<'_> {
        self.post(uri).json(value)
    }

    /// Creates a POST request carrying `value` as a urlencoded form.
    pub fn post_form<T: Serialize>(&self, uri: impl AsRef<str>, value: &T) -> TestClientRequest<'_> {
        self.post(uri).form(value)
    }

    async fn send_internal(&self, request: TestRequest) -> TestResponse {
        let response = self.table.handle(request.into_http_request()).await;
        TestResponse::from_http(response)
    }
}

/// A request builder bound to a test client.
#[must_use]
#[derive(Debug)]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl<'a> TestClientRequest<'a> {
    fn new(client: &'a TestClient, builder: TestRequestBuilder) -> Self {
        let builder = client
            .default_headers
            .iter()
            .fold(builder, |builder, (name, value)| builder.header(name, value));
        Self { client, builder }
    }

    /// Sets a header on the request.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets the Content-Type header.
    pub fn content_type(mut self, content_type: impl AsRef<str>) -> Self {
        self.builder = self.builder.content_type(content_type);
        self
    }

    /// Sets the Accept header.
    pub fn accept(mut self, accept: impl AsRef<str>) -> Self {
        self.builder = self.builder.accept(accept);
        self
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<bytes::Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets the request body as JSON.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Sets the request body as a urlencoded form.
    pub fn form<T: Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.form(value);
        self
    }

    /// Sends the request and returns the response.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built.
    pub async fn send(self) -> TestResponse {
        match self.try_send().await {
            Ok(response) => response,
            Err(e) => panic!("failed to build test request: {e}"),
        }
    }

    /// Sends the request and returns a Result.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        let request = self.builder.build()?;
        Ok(self.client.send_internal(request).await)
    }
}
