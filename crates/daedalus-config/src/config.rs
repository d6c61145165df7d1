//! Web server configuration types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ConfigError;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8000;
/// Default attribute name consulted by the structural validator.
pub const DEFAULT_VALIDATOR_TAG: &str = "validate";

/// Runtime mode of the process.
///
/// The mode selects the logging preset and is matched against `env=` gates
/// on controllers and operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    /// Production.
    Prod,
    /// Development.
    #[default]
    Dev,
    /// Verbose debugging.
    Debug,
    /// Automated tests.
    Test,
}

impl RuntimeMode {
    /// Returns the lower-case mode name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prod => "prod",
            Self::Dev => "dev",
            Self::Debug => "debug",
            Self::Test => "test",
        }
    }

    /// Checks an `&`-separated allow list such as `dev&test`.
    ///
    /// An empty list allows every mode. Names compare case-insensitively.
    ///
    /// ```
    /// use daedalus_config::RuntimeMode;
    ///
    /// assert!(RuntimeMode::Dev.is_in_only("dev&test"));
    /// assert!(!RuntimeMode::Prod.is_in_only("dev&test"));
    /// assert!(RuntimeMode::Prod.is_in_only(""));
    /// ```
    #[must_use]
    pub fn is_in_only(self, allowed: &str) -> bool {
        let mut names = allowed.split('&').map(str::trim).filter(|s| !s.is_empty()).peekable();
        if names.peek().is_none() {
            return true;
        }
        names.any(|name| name.eq_ignore_ascii_case(self.as_str()))
    }
}

impl fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuntimeMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Ok(Self::Prod),
            "dev" | "development" => Ok(Self::Dev),
            "debug" => Ok(Self::Debug),
            "test" | "testing" => Ok(Self::Test),
            other => Err(ConfigError::invalid_value(
                "mode",
                format!("expected prod, dev, debug or test, got '{other}'"),
            )),
        }
    }
}

/// OpenAPI document settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct OpenApiConfig {
    /// Emit the document and serve it.
    pub enabled: bool,
    /// URL schemes announced in the server entry.
    pub schemes: Vec<String>,
    /// Path (relative to the base path) the document is served under.
    pub doc_path: String,
    /// Document title.
    pub title: String,
    /// Document version.
    pub version: String,
    /// Document description.
    pub description: String,
}

impl Default for OpenApiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            schemes: vec!["https".to_string()],
            doc_path: "doc".to_string(),
            title: "Daedalus API".to_string(),
            version: "1.0.0".to_string(),
            description: String::new(),
        }
    }
}

impl OpenApiConfig {
    /// Announce plain HTTP only.
    #[must_use]
    pub fn use_http_only(mut self) -> Self {
        self.schemes = vec!["http".to_string()];
        self
    }

    /// Announce HTTPS only.
    #[must_use]
    pub fn use_https_only(mut self) -> Self {
        self.schemes = vec!["https".to_string()];
        self
    }

    /// Announce both, HTTPS first.
    #[must_use]
    pub fn use_http_and_https(mut self) -> Self {
        self.schemes = vec!["https".to_string(), "http".to_string()];
        self
    }

    /// Turn document generation on.
    #[must_use]
    pub fn enable(self) -> Self {
        self.set_enabled(true)
    }

    /// Turn document generation on or off.
    #[must_use]
    pub fn set_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the document path.
    #[must_use]
    pub fn set_doc_path(mut self, path: impl Into<String>) -> Self {
        self.doc_path = path.into();
        self
    }

    /// Set the document title.
    #[must_use]
    pub fn set_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// Complete web server configuration.
///
/// # Example
///
/// ```
/// use daedalus_config::{RuntimeMode, WebConfig};
///
/// let config = WebConfig::new()
///     .set_address("localhost")
///     .set_port(9000)
///     .set_mode(RuntimeMode::Test)
///     .with_openapi(|o| o.use_http_only().enable());
///
/// assert_eq!(config.listen_addr(), "localhost:9000");
/// assert!(config.openapi.enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct WebConfig {
    /// Listen host; empty means all interfaces.
    pub address: String,
    /// Listen port.
    pub port: u16,
    /// Maximum concurrent connections; 0 means unlimited.
    pub max_connections: usize,
    /// Prefix applied to every route.
    pub base_path: String,
    /// Attribute name consulted by the structural validator.
    pub validator_tag: String,
    /// Runtime mode.
    pub mode: RuntimeMode,
    /// OpenAPI document settings.
    pub openapi: OpenApiConfig,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            port: DEFAULT_PORT,
            max_connections: 0,
            base_path: String::new(),
            validator_tag: DEFAULT_VALIDATOR_TAG.to_string(),
            mode: RuntimeMode::Dev,
            openapi: OpenApiConfig::default(),
        }
    }
}

impl WebConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the listen host.
    #[must_use]
    pub fn set_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Set the listen port.
    #[must_use]
    pub fn set_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the connection limit.
    #[must_use]
    pub fn set_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the route prefix.
    #[must_use]
    pub fn set_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Set the validator attribute name.
    #[must_use]
    pub fn set_validator_tag(mut self, tag: impl Into<String>) -> Self {
        self.validator_tag = tag.into();
        self
    }

    /// Set the runtime mode.
    #[must_use]
    pub fn set_mode(mut self, mode: RuntimeMode) -> Self {
        self.mode = mode;
        self
    }

    /// Adjust the OpenAPI settings.
    #[must_use]
    pub fn with_openapi(mut self, f: impl FnOnce(OpenApiConfig) -> OpenApiConfig) -> Self {
        self.openapi = f(self.openapi);
        self
    }

    /// Returns `address:port`, using `0.0.0.0` for an empty address.
    #[must_use]
    pub fn listen_addr(&self) -> String {
        let host = if self.address.is_empty() {
            "0.0.0.0"
        } else {
            &self.address
        };
        format!("{host}:{}", self.port)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::invalid_value("port", "must be greater than 0"));
        }
        if self.validator_tag.trim().is_empty() {
            return Err(ConfigError::invalid_value("validator_tag", "must not be empty"));
        }
        if self.openapi.doc_path.trim_matches('/').is_empty() {
            return Err(ConfigError::invalid_value("openapi.doc_path", "must not be empty"));
        }
        if self.openapi.schemes.is_empty() {
            return Err(ConfigError::invalid_value(
                "openapi.schemes",
                "at least one scheme is required",
            ));
        }
        if let Some(bad) = self
            .openapi
            .schemes
            .iter()
            .find(|s| !matches!(s.as_str(), "http" | "https"))
        {
            return Err(ConfigError::invalid_value(
                "openapi.schemes",
                format!("unsupported scheme '{bad}'"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WebConfig::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.validator_tag, "validate");
        assert_eq!(config.mode, RuntimeMode::Dev);
        assert!(!config.openapi.enabled);
        assert_eq!(config.openapi.schemes, vec!["https"]);
        assert_eq!(config.openapi.doc_path, "doc");
        assert_eq!(config.listen_addr(), "0.0.0.0:8000");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_scheme_setters() {
        let o = OpenApiConfig::default().use_http_and_https();
        assert_eq!(o.schemes, vec!["https", "http"]);
        assert_eq!(o.clone().use_http_only().schemes, vec!["http"]);
        assert_eq!(o.use_https_only().schemes, vec!["https"]);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(WebConfig::new().set_port(0).validate().is_err());
        let config = WebConfig::new().with_openapi(|o| o.set_doc_path("/"));
        assert!(config.validate().is_err());
        let mut config = WebConfig::new();
        config.openapi.schemes = vec!["ftp".into()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_runtime_mode_parse() {
        assert_eq!("PROD".parse::<RuntimeMode>().unwrap(), RuntimeMode::Prod);
        assert_eq!("testing".parse::<RuntimeMode>().unwrap(), RuntimeMode::Test);
        assert!("staging".parse::<RuntimeMode>().is_err());
    }

    #[test]
    fn test_is_in_only_case_and_spaces() {
        assert!(RuntimeMode::Debug.is_in_only(" DEBUG & prod "));
        assert!(!RuntimeMode::Test.is_in_only("dev"));
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let config: WebConfig = toml::from_str(
            r#"
            port = 9090
            mode = "prod"

            [openapi]
            enabled = true
            "#,
        )
        .unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.mode, RuntimeMode::Prod);
        assert!(config.openapi.enabled);
        assert_eq!(config.openapi.doc_path, "doc");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<WebConfig, _> = toml::from_str("prot = 1");
        assert!(result.is_err());
    }
}
