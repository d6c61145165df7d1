//! Permissive CORS middleware.
//!
//! Every response gets the allow headers. A preflight `OPTIONS` request is
//! answered with `204 No Content` and the chain stops there.
//!
//! ```rust,ignore
//! #[derive(Controller)]
//! struct Api {
//!     #[http("/api, middleware=cors")]
//!     server: WebServer,
//!     #[middleware]
//!     cors: Arc<CorsMiddleware>,
//! }
//! ```

use daedalus_core::{Construct, Container, InjectionError, WebContext, WebMiddleware};
use daedalus_macros::{operations, Controller};
use http::{Method, StatusCode};

/// CORS header names.
pub mod headers {
    /// `Access-Control-Allow-Origin` header.
    pub const ALLOW_ORIGIN: &str = "access-control-allow-origin";
    /// `Access-Control-Allow-Methods` header.
    pub const ALLOW_METHODS: &str = "access-control-allow-methods";
    /// `Access-Control-Allow-Headers` header.
    pub const ALLOW_HEADERS: &str = "access-control-allow-headers";
    /// `Access-Control-Allow-Credentials` header.
    pub const ALLOW_CREDENTIALS: &str = "access-control-allow-credentials";
    /// `Access-Control-Max-Age` header.
    pub const MAX_AGE: &str = "access-control-max-age";
}

/// Header values written by [`CorsMiddleware`].
#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Allowed origin; `*` for any.
    pub allow_origin: String,
    /// Allowed methods.
    pub allow_methods: Vec<Method>,
    /// Allowed request headers.
    pub allow_headers: Vec<String>,
    /// Whether credentials are allowed.
    pub allow_credentials: bool,
    /// Preflight cache duration in seconds.
    pub max_age: u32,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origin: "*".to_string(),
            allow_methods: vec![
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::HEAD,
                Method::OPTIONS,
            ],
            allow_headers: ["Origin", "Content-Length", "Content-Type", "Authorization", "X-Request-ID"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            allow_credentials: true,
            max_age: 43_200,
        }
    }
}

impl CorsConfig {
    /// Sets the allowed origin.
    pub fn allow_origin(mut self, origin: impl Into<String>) -> Self {
        self.allow_origin = origin.into();
        self
    }

    /// Sets whether credentials are allowed.
    pub fn allow_credentials(mut self, allow: bool) -> Self {
        self.allow_credentials = allow;
        self
    }
}

/// Middleware named `cors`.
///
/// Reads a [`CorsConfig`] from the reference container when one is
/// registered, otherwise uses the defaults.
#[derive(Debug, Clone, Default, Controller)]
#[daedalus(crate = "::daedalus_core", no_construct)]
pub struct CorsMiddleware {
    middleware: WebMiddleware,
    config: CorsConfig,
}

impl CorsMiddleware {
    /// Creates the middleware with `config`.
    pub fn new(config: CorsConfig) -> Self {
        Self {
            middleware: WebMiddleware,
            config,
        }
    }
}

impl Construct for CorsMiddleware {
    fn construct(refs: &Container) -> Result<Self, InjectionError> {
        let config = refs.resolve::<CorsConfig>().map(|c| (*c).clone()).unwrap_or_default();
        Ok(Self::new(config))
    }
}

#[operations(crate = "::daedalus_core")]
impl CorsMiddleware {
    /// Writes the allow headers; ends preflight requests.
    pub async fn handle_cors(&self, ctx: WebContext) {
        let config = &self.config;
        let methods: Vec<&str> = config.allow_methods.iter().map(Method::as_str).collect();

        ctx.header(headers::ALLOW_ORIGIN, &config.allow_origin);
        ctx.header(headers::ALLOW_METHODS, &methods.join(", "));
        ctx.header(headers::ALLOW_HEADERS, &config.allow_headers.join(", "));
        ctx.header(headers::MAX_AGE, &config.max_age.to_string());
        if config.allow_credentials {
            ctx.header(headers::ALLOW_CREDENTIALS, "true");
        }

        if ctx.method() == Method::OPTIONS {
            ctx.abort_with_status(StatusCode::NO_CONTENT);
        }
    }
}
