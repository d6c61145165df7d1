//! Layered configuration loading.
//!
//! Layers apply in order, later ones overriding earlier ones:
//! 1. built-in defaults or a mode preset
//! 2. a TOML or JSON file
//! 3. environment variables of the form `PREFIX__KEY` or `PREFIX__OPENAPI__KEY`

use std::env;
use std::fs;
use std::path::Path;

use crate::{ConfigError, RuntimeMode, WebConfig};

/// Environment prefix used when none is given.
pub const DEFAULT_ENV_PREFIX: &str = "DAEDALUS";

/// Builds a [`WebConfig`] from defaults, files and the environment.
///
/// # Example
///
/// ```no_run
/// use daedalus_config::ConfigLoader;
///
/// # fn main() -> Result<(), daedalus_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_optional_file("daedalus.toml")?
///     .with_env_prefix("DAEDALUS")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: WebConfig,
    env_prefix: Option<String>,
    file_loaded: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a loader seeded with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: WebConfig::default(),
            env_prefix: None,
            file_loaded: false,
        }
    }

    /// Reset to default values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = WebConfig::default();
        self
    }

    /// Start from the development preset: dev mode, document served over HTTP.
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = WebConfig::default()
            .set_mode(RuntimeMode::Dev)
            .with_openapi(|o| o.use_http_and_https().enable());
        self
    }

    /// Start from the production preset: prod mode, document disabled.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = WebConfig::default()
            .set_mode(RuntimeMode::Prod)
            .with_openapi(|o| o.use_https_only().set_enabled(false));
        self
    }

    /// Load a `.toml` or `.json` file.
    ///
    /// # Errors
    ///
    /// Fails when the file is missing, unreadable, malformed, or has an
    /// unknown extension.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::missing(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read(path, e))?;

        self.config = Self::parse_file(&content, path)?;
        self.file_loaded = true;

        Ok(self)
    }

    /// Load a file if it exists.
    ///
    /// # Errors
    ///
    /// Fails only when the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration text in the given format (`toml` or `json`).
    ///
    /// ```
    /// use daedalus_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("port = 3000", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.port, 3000);
    /// ```
    ///
    /// # Errors
    ///
    /// Fails on parse errors or an unknown format.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            other => return Err(ConfigError::UnknownFormat(other.to_string())),
        };
        Ok(self)
    }

    /// Enable environment overrides under `prefix`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Read a `.env` file into the process environment if one exists.
    ///
    /// # Errors
    ///
    /// Fails when a `.env` file exists but cannot be parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(ConfigError::env(".env", e.to_string())),
        }
    }

    /// Whether a configuration file was loaded.
    #[must_use]
    pub fn file_loaded(&self) -> bool {
        self.file_loaded
    }

    /// Apply environment overrides and validate.
    ///
    /// # Errors
    ///
    /// Fails when an override cannot be parsed or validation fails.
    pub fn load(mut self) -> Result<WebConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }
        self.config.validate()?;
        Ok(self.config)
    }

    /// Return the configuration as-is, skipping overrides and validation.
    #[must_use]
    pub fn load_unvalidated(self) -> WebConfig {
        self.config
    }

    fn parse_file(content: &str, path: &Path) -> Result<WebConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::UnknownFormat(path.display().to_string())),
        }
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let mut vars: Vec<(String, String)> = env::vars()
            .filter(|(k, _)| k.starts_with(prefix))
            .collect();
        vars.sort();

        for (key, value) in vars {
            self.apply_env_var(&key, &value, prefix)?;
        }
        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let Some(rest) = key.strip_prefix(prefix).and_then(|k| k.strip_prefix("__")) else {
            // Some other variable that happens to share the prefix.
            return Ok(());
        };

        let parts: Vec<&str> = rest.split("__").collect();
        let config = &mut self.config;

        match parts.as_slice() {
            ["ADDRESS"] => config.address = value.to_string(),
            ["PORT"] => {
                config.port = value
                    .parse()
                    .map_err(|_| ConfigError::env(key, "expected port number"))?;
            }
            ["MAX_CONNECTIONS"] => {
                config.max_connections = value
                    .parse()
                    .map_err(|_| ConfigError::env(key, "expected integer"))?;
            }
            ["BASE_PATH"] => config.base_path = value.to_string(),
            ["VALIDATOR_TAG"] => config.validator_tag = value.to_string(),
            ["MODE"] => {
                config.mode = value
                    .parse()
                    .map_err(|e: ConfigError| ConfigError::env(key, e.to_string()))?;
            }
            ["OPENAPI", "ENABLED"] => config.openapi.enabled = parse_bool(key, value)?,
            ["OPENAPI", "SCHEMES"] => {
                config.openapi.schemes = value
                    .split(',')
                    .map(|s| s.trim().to_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect();
            }
            ["OPENAPI", "DOC_PATH"] => config.openapi.doc_path = value.to_string(),
            ["OPENAPI", "TITLE"] => config.openapi.title = value.to_string(),
            ["OPENAPI", "VERSION"] => config.openapi.version = value.to_string(),
            ["OPENAPI", "DESCRIPTION"] => config.openapi.description = value.to_string(),
            _ => {
                return Err(ConfigError::env(key, "unknown configuration key"));
            }
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::env(key, "expected boolean")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_loader_new() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, WebConfig::default());
    }

    #[test]
    fn test_loader_presets() {
        let dev = ConfigLoader::new().with_development().load().unwrap();
        assert_eq!(dev.mode, RuntimeMode::Dev);
        assert!(dev.openapi.enabled);

        let prod = ConfigLoader::new().with_production().load().unwrap();
        assert_eq!(prod.mode, RuntimeMode::Prod);
        assert!(!prod.openapi.enabled);
    }

    #[test]
    fn test_loader_with_string_json() {
        let config = ConfigLoader::new()
            .with_string(r#"{"base_path": "/api", "openapi": {"doc_path": "docs"}}"#, "json")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.base_path, "/api");
        assert_eq!(config.openapi.doc_path, "docs");
    }

    #[test]
    fn test_loader_with_string_unknown_format() {
        let result = ConfigLoader::new().with_string("", "yaml");
        assert!(matches!(result, Err(ConfigError::UnknownFormat(_))));
    }

    #[test]
    fn test_loader_with_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "port = 8181\nmax_connections = 64").unwrap();

        let loader = ConfigLoader::new().with_file(file.path()).unwrap();
        assert!(loader.file_loaded());
        let config = loader.load().unwrap();
        assert_eq!(config.port, 8181);
        assert_eq!(config.max_connections, 64);
    }

    #[test]
    fn test_loader_with_file_bad_extension() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        let result = ConfigLoader::new().with_file(file.path());
        assert!(matches!(result, Err(ConfigError::UnknownFormat(_))));
    }

    #[test]
    fn test_loader_with_file_not_found() {
        let result = ConfigLoader::new().with_file("/nonexistent/daedalus.toml");
        assert!(matches!(result, Err(ConfigError::Missing { .. })));
    }

    #[test]
    fn test_loader_with_optional_file_not_found() {
        let loader = ConfigLoader::new()
            .with_optional_file("/nonexistent/daedalus.toml")
            .unwrap();
        assert!(!loader.file_loaded());
    }

    #[test]
    fn test_load_runs_validation() {
        let result = ConfigLoader::new()
            .with_string("port = 0", "toml")
            .unwrap()
            .load();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("K", "yes").unwrap());
        assert!(parse_bool("K", "ON").unwrap());
        assert!(!parse_bool("K", "0").unwrap());
        assert!(parse_bool("K", "maybe").is_err());
    }

    // Environment mutation is process-global, so overrides are exercised
    // through apply_env_var directly.

    #[test]
    fn test_apply_env_var_top_level() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("DAEDALUS__PORT", "9001", "DAEDALUS").unwrap();
        loader.apply_env_var("DAEDALUS__MODE", "test", "DAEDALUS").unwrap();
        loader.apply_env_var("DAEDALUS__BASE_PATH", "/v1", "DAEDALUS").unwrap();
        let config = loader.load_unvalidated();
        assert_eq!(config.port, 9001);
        assert_eq!(config.mode, RuntimeMode::Test);
        assert_eq!(config.base_path, "/v1");
    }

    #[test]
    fn test_apply_env_var_openapi() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("DAEDALUS__OPENAPI__ENABLED", "true", "DAEDALUS").unwrap();
        loader.apply_env_var("DAEDALUS__OPENAPI__SCHEMES", "https, http", "DAEDALUS").unwrap();
        let config = loader.load_unvalidated();
        assert!(config.openapi.enabled);
        assert_eq!(config.openapi.schemes, vec!["https", "http"]);
    }

    #[test]
    fn test_apply_env_var_errors() {
        let mut loader = ConfigLoader::new();
        assert!(loader.apply_env_var("DAEDALUS__PORT", "high", "DAEDALUS").is_err());
        assert!(loader.apply_env_var("DAEDALUS__MODE", "staging", "DAEDALUS").is_err());
        assert!(loader.apply_env_var("DAEDALUS__NOPE", "1", "DAEDALUS").is_err());
        // Shares the prefix but is not a key of ours.
        assert!(loader.apply_env_var("DAEDALUSX", "1", "DAEDALUS").is_ok());
    }
}
