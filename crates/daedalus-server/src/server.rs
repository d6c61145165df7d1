//! The hyper serve loop.
//!
//! Each accepted TCP connection is served over HTTP/1.1. Request bodies are
//! collected in full and handed to the [`RouteTable`]; the accept loop stops
//! on shutdown and waits for live connections.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use daedalus_core::{RouteTable, WebError};
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::error::ServerError;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Response body type written to the wire.
pub type ResponseBody = Full<Bytes>;

/// How long shutdown waits for live connections.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Serves a synthesized route table.
#[derive(Debug, Clone)]
pub struct Server {
    table: Arc<RouteTable>,
    addr: String,
    max_connections: usize,
    shutdown_timeout: Duration,
}

impl Server {
    /// Creates a server for `table` listening on `addr`.
    pub fn new(table: Arc<RouteTable>, addr: impl Into<String>) -> Self {
        Self {
            table,
            addr: addr.into(),
            max_connections: 0,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Limits concurrent connections; `0` means unlimited.
    #[must_use]
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets how long shutdown waits for live connections.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// The listen address.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// The served table.
    pub fn table(&self) -> &Arc<RouteTable> {
        &self.table
    }

    /// Binds the configured address and serves until `shutdown`.
    pub async fn serve(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let listener = TcpListener::bind(&self.addr).await.map_err(|source| ServerError::Bind {
            addr: self.addr.clone(),
            source,
        })?;
        self.serve_on(listener, shutdown).await
    }

    /// Serves connections accepted from `listener` until `shutdown`.
    pub async fn serve_on(self, listener: TcpListener, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let local = listener.local_addr()?;
        tracing::info!(addr = %local, routes = self.table.len(), "server listening");

        let limit = (self.max_connections > 0).then(|| Arc::new(Semaphore::new(self.max_connections)));
        let tracker = ConnectionTracker::new();

        loop {
            let permit = match &limit {
                Some(semaphore) => tokio::select! {
                    permit = semaphore.clone().acquire_owned() => permit.ok(),
                    _ = shutdown.recv() => break,
                },
                None => None,
            };

            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote)) => {
                        let table = Arc::clone(&self.table);
                        let token = tracker.acquire();
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            if let Err(e) = serve_connection(table, stream, remote, shutdown).await {
                                tracing::error!(remote = %remote, error = %e, "connection error");
                            }
                            drop(permit);
                            drop(token);
                        });
                    }
                    Err(e) => tracing::error!(error = %e, "failed to accept connection"),
                },
                _ = shutdown.recv() => break,
            }
        }

        tracing::info!(
            active = tracker.active_connections(),
            timeout = ?self.shutdown_timeout,
            "shutdown requested, draining connections"
        );
        tokio::select! {
            _ = tracker.wait_idle() => tracing::info!("all connections closed"),
            _ = tokio::time::sleep(self.shutdown_timeout) => {
                tracing::warn!(active = tracker.active_connections(), "shutdown timeout reached");
            }
        }
        tracing::info!("server stopped");
        Ok(())
    }
}

async fn serve_connection(
    table: Arc<RouteTable>,
    stream: TcpStream,
    remote: SocketAddr,
    shutdown: ShutdownSignal,
) -> Result<(), hyper::Error> {
    let service = service_fn(move |request: Request<Incoming>| {
        let table = Arc::clone(&table);
        async move { Ok::<_, Infallible>(handle(&table, request).await) }
    });
    let connection = http1::Builder::new().serve_connection(TokioIo::new(stream), service);

    tokio::select! {
        result = connection => result,
        _ = shutdown.recv() => {
            tracing::debug!(remote = %remote, "connection closed by shutdown");
            Ok(())
        }
    }
}

async fn handle(table: &RouteTable, request: Request<Incoming>) -> Response<ResponseBody> {
    let (parts, body) = request.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            tracing::debug!(error = %e, "failed to read request body");
            let error = WebError::from_status(StatusCode::BAD_REQUEST, format!("failed to read request body: {e}"));
            let body = serde_json::to_vec(&error).map(Bytes::from).unwrap_or_default();
            return Response::builder()
                .status(StatusCode::BAD_REQUEST)
                .header(http::header::CONTENT_TYPE, "application/json; charset=utf-8")
                .body(Full::new(body))
                .unwrap_or_else(|_| Response::new(Full::new(Bytes::new())));
        }
    };
    let response = table.handle(Request::from_parts(parts, body)).await;
    response.map(Full::new)
}
