//! Request log middleware.
//!
//! Assigns each request a UUID v7 id, echoes it in `x-request-id`, and logs
//! method, path, status and latency once the response is assembled.

use daedalus_core::{RequestSummary, WebContext, WebMiddleware};
use daedalus_macros::{operations, Controller};
use uuid::Uuid;

/// The header carrying the request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Context key of the request id.
pub const REQUEST_ID_KEY: &str = "daedalus.request_id";

/// Middleware named `log`.
#[derive(Debug, Clone, Default, Controller)]
#[daedalus(crate = "::daedalus_core")]
pub struct LogMiddleware {
    middleware: WebMiddleware,
}

impl LogMiddleware {
    /// Creates the middleware.
    pub fn new() -> Self {
        Self::default()
    }
}

#[operations(crate = "::daedalus_core")]
impl LogMiddleware {
    /// Tags the request and logs it when finished.
    pub async fn handle_log(&self, ctx: WebContext) {
        let id = Uuid::now_v7().to_string();
        ctx.header(REQUEST_ID_HEADER, &id);
        ctx.set(REQUEST_ID_KEY, id.clone());
        ctx.on_finish(move |summary: &RequestSummary| {
            tracing::info!(
                request_id = %id,
                method = %summary.method,
                path = %summary.path,
                status = summary.status.as_u16(),
                latency_ms = summary.elapsed.as_secs_f64() * 1000.0,
                "request finished"
            );
        });
    }
}
