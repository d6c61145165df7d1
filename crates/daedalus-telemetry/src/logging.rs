//! Structured logging for Daedalus.
//!
//! Output format and verbosity follow the [`RuntimeMode`]:
//!
//! | Mode    | Format  | Level |
//! |---------|---------|-------|
//! | `prod`  | JSON    | info  |
//! | `dev`   | pretty  | debug |
//! | `debug` | pretty  | trace |
//! | `test`  | compact | warn  |
//!
//! `RUST_LOG`, when set, replaces the level directive.

use daedalus_config::RuntimeMode;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Output format of the log layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Multi-line human-readable output.
    Pretty,
    /// Single-line human-readable output.
    Compact,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Filter directive (e.g. "info", "daedalus_core=debug,hyper=warn").
    pub level: String,

    /// Output format.
    pub format: LogFormat,

    /// Whether to include span events (new, close).
    pub span_events: bool,

    /// Whether to include file/line info.
    pub file_line_info: bool,

    /// Whether to include target (module path).
    pub include_target: bool,

    /// Whether `RUST_LOG` may override `level`.
    pub respect_env: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::for_mode(RuntimeMode::default())
    }
}

impl LogConfig {
    /// The preset for a runtime mode.
    #[must_use]
    pub fn for_mode(mode: RuntimeMode) -> Self {
        let (level, format) = match mode {
            RuntimeMode::Prod => ("info", LogFormat::Json),
            RuntimeMode::Dev => ("debug", LogFormat::Pretty),
            RuntimeMode::Debug => ("trace", LogFormat::Pretty),
            RuntimeMode::Test => ("warn", LogFormat::Compact),
        };
        Self {
            enabled: true,
            level: level.to_string(),
            format,
            span_events: mode == RuntimeMode::Debug,
            file_line_info: matches!(mode, RuntimeMode::Dev | RuntimeMode::Debug),
            include_target: true,
            respect_env: true,
        }
    }

    /// Override the filter directive.
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Override the output format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    fn filter(&self) -> TelemetryResult<EnvFilter> {
        if self.respect_env {
            if let Ok(directive) = std::env::var(EnvFilter::DEFAULT_ENV) {
                if !directive.trim().is_empty() {
                    return create_env_filter(&directive);
                }
            }
        }
        create_env_filter(&self.level)
    }
}

/// Installs the global log subscriber.
///
/// A subscriber that is already installed is reported as
/// [`TelemetryError::LoggingInit`]; callers that may initialise twice (tests,
/// repeated launches) can ignore that error.
///
/// # Errors
///
/// Returns an error for an invalid filter or when a global subscriber exists.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = config.filter()?;

    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let base = tracing_subscriber::fmt::layer()
        .with_span_events(span_events)
        .with_file(config.file_line_info)
        .with_line_number(config.file_line_info)
        .with_target(config.include_target);

    let layer = match config.format {
        LogFormat::Json => base.json().with_filter(filter).boxed(),
        LogFormat::Pretty => base.pretty().with_filter(filter).boxed(),
        LogFormat::Compact => base.compact().with_filter(filter).boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

/// Installs the preset for `mode`, ignoring an already-installed subscriber.
pub fn init_for_mode(mode: RuntimeMode) {
    if let Err(e) = init_logging(&LogConfig::for_mode(mode)) {
        tracing::debug!(error = %e, "log subscriber not installed");
    }
}

/// Creates an env filter from a directive string.
///
/// # Errors
///
/// Returns an error if the directive is invalid.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter).map_err(|e| TelemetryError::InvalidFilter(e.to_string()))
}

/// Standard log field names.
pub mod fields {
    /// Request ID field name.
    pub const REQUEST_ID: &str = "request_id";

    /// Operation field name (controller type and method).
    pub const OPERATION: &str = "operation";

    /// HTTP method field name.
    pub const HTTP_METHOD: &str = "http.method";

    /// HTTP path field name.
    pub const HTTP_PATH: &str = "http.path";

    /// HTTP status code field name.
    pub const HTTP_STATUS: &str = "http.status_code";

    /// Duration field name (in milliseconds).
    pub const DURATION_MS: &str = "duration_ms";

    /// Error field name.
    pub const ERROR: &str = "error";
}

/// Logs a request completion event.
#[macro_export]
macro_rules! log_request_complete {
    ($request_id:expr, $method:expr, $path:expr, $status:expr, $duration_ms:expr) => {
        tracing::info!(
            request_id = %$request_id,
            http.method = %$method,
            http.path = %$path,
            http.status_code = $status,
            duration_ms = $duration_ms,
            "Request completed"
        );
    };
}

/// Logs a request error event.
#[macro_export]
macro_rules! log_request_error {
    ($request_id:expr, $error:expr) => {
        tracing::error!(
            request_id = %$request_id,
            error = %$error,
            "Request failed"
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_presets() {
        let prod = LogConfig::for_mode(RuntimeMode::Prod);
        assert_eq!(prod.format, LogFormat::Json);
        assert_eq!(prod.level, "info");
        assert!(!prod.file_line_info);

        let dev = LogConfig::for_mode(RuntimeMode::Dev);
        assert_eq!(dev.format, LogFormat::Pretty);
        assert_eq!(dev.level, "debug");

        let debug = LogConfig::for_mode(RuntimeMode::Debug);
        assert_eq!(debug.level, "trace");
        assert!(debug.span_events);

        let test = LogConfig::for_mode(RuntimeMode::Test);
        assert_eq!(test.format, LogFormat::Compact);
        assert_eq!(test.level, "warn");
    }

    #[test]
    fn test_default_is_dev() {
        assert_eq!(LogConfig::default().format, LogFormat::Pretty);
    }

    #[test]
    fn test_builders() {
        let config = LogConfig::for_mode(RuntimeMode::Prod)
            .with_level("daedalus_core=trace")
            .with_format(LogFormat::Compact);
        assert_eq!(config.level, "daedalus_core=trace");
        assert_eq!(config.format, LogFormat::Compact);
    }

    #[test]
    fn test_create_env_filter() {
        assert!(create_env_filter("info").is_ok());
        assert!(create_env_filter("daedalus_core=debug,hyper=warn").is_ok());
    }

    #[test]
    fn test_invalid_level_rejected() {
        let config = LogConfig {
            respect_env: false,
            ..LogConfig::for_mode(RuntimeMode::Test)
        }
        .with_level("daedalus=loudest");
        assert!(matches!(
            init_logging(&config),
            Err(TelemetryError::InvalidFilter(_))
        ));
    }

    #[test]
    fn test_disabled_logging() {
        let config = LogConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(init_logging(&config).is_ok());
    }

    #[test]
    fn test_field_names() {
        assert_eq!(fields::REQUEST_ID, "request_id");
        assert_eq!(fields::HTTP_STATUS, "http.status_code");
    }
}
