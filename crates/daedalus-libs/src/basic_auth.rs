//! HTTP basic authentication middleware.
//!
//! Accounts are looked up through [`AccountForBasicAuth`]. The middleware
//! is constructed from a [`BasicAuthAccounts`] registered in the reference
//! container.
//!
//! ```rust,ignore
//! let accounts = StaticAccounts::new("admin area").with_account("admin", "secret");
//! refs.register(Arc::new(BasicAuthAccounts::new(accounts)));
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use daedalus_core::{Construct, Container, InjectionError, WebContext, WebMiddleware};
use daedalus_macros::{operations, Aggregate, Controller};
use http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use http::StatusCode;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Context key of the authenticated user name.
pub const BASIC_AUTH_USER_KEY: &str = "daedalus.basic_auth.user";

/// Looks up basic auth credentials.
pub trait AccountForBasicAuth: Send + Sync + 'static {
    /// Realm announced in `WWW-Authenticate`.
    fn realm(&self) -> String;

    /// Returns the user for an `Authorization` header value.
    fn search_credential(&self, authorization: &str) -> Option<String>;
}

/// In-memory accounts keyed by their encoded `Authorization` value.
#[derive(Debug, Clone, Default)]
pub struct StaticAccounts {
    realm: String,
    credentials: HashMap<String, String>,
}

impl StaticAccounts {
    /// Creates an empty account set for `realm`.
    pub fn new(realm: impl Into<String>) -> Self {
        Self {
            realm: realm.into(),
            credentials: HashMap::new(),
        }
    }

    /// Adds a user.
    pub fn with_account(mut self, user: &str, password: &str) -> Self {
        self.credentials.insert(encode_credential(user, password), user.to_string());
        self
    }
}

impl AccountForBasicAuth for StaticAccounts {
    fn realm(&self) -> String {
        self.realm.clone()
    }

    fn search_credential(&self, authorization: &str) -> Option<String> {
        self.credentials.get(authorization.trim()).cloned()
    }
}

/// The `Authorization` value for `user` and `password`.
pub fn encode_credential(user: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
}

/// The accounts a [`BasicAuthMiddleware`] is built with.
#[derive(Clone)]
pub struct BasicAuthAccounts(Arc<dyn AccountForBasicAuth>);

impl BasicAuthAccounts {
    /// Wraps an account source.
    pub fn new(accounts: impl AccountForBasicAuth) -> Self {
        Self(Arc::new(accounts))
    }
}

impl fmt::Debug for BasicAuthAccounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BasicAuthAccounts").field(&self.0.realm()).finish()
    }
}

/// Parameter of the `basic_auth` middleware.
#[derive(Default, Aggregate)]
#[daedalus(crate = "::daedalus_core")]
pub struct BasicAuthParams {
    #[http("basic_auth, method=handle")]
    ctx: WebContext,
}

/// Middleware named `basic_auth`.
#[derive(Controller)]
#[daedalus(crate = "::daedalus_core", no_construct)]
pub struct BasicAuthMiddleware {
    middleware: WebMiddleware,
    accounts: BasicAuthAccounts,
}

impl fmt::Debug for BasicAuthMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuthMiddleware")
            .field("accounts", &self.accounts)
            .finish()
    }
}

impl BasicAuthMiddleware {
    /// Creates the middleware over `accounts`.
    pub fn new(accounts: impl AccountForBasicAuth) -> Self {
        Self {
            middleware: WebMiddleware,
            accounts: BasicAuthAccounts::new(accounts),
        }
    }
}

impl Construct for BasicAuthMiddleware {
    fn construct(refs: &Container) -> Result<Self, InjectionError> {
        let accounts = refs.resolve_required::<BasicAuthAccounts>()?;
        Ok(Self {
            middleware: WebMiddleware,
            accounts: (*accounts).clone(),
        })
    }
}

#[operations(crate = "::daedalus_core")]
impl BasicAuthMiddleware {
    /// Admits requests with known credentials.
    #[operation]
    pub async fn basic_auth(&self, params: BasicAuthParams) {
        let found = params
            .request_header(AUTHORIZATION.as_str())
            .and_then(|value| self.accounts.0.search_credential(value));
        match found {
            Some(user) => {
                tracing::debug!(user = %user, "basic auth accepted");
                params.set(BASIC_AUTH_USER_KEY, user);
            }
            None => {
                let realm = self.accounts.0.realm().replace('"', "\\\"");
                params.header(WWW_AUTHENTICATE.as_str(), &format!("Basic realm=\"{realm}\""));
                params.abort_with_status(StatusCode::UNAUTHORIZED);
            }
        }
    }
}
