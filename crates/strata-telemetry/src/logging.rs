//! Structured logging setup.
//!
//! Installs a `tracing-subscriber` registry with an [`EnvFilter`] and a
//! formatting layer chosen by [`LogFormat`]. Library crates only emit
//! `tracing` events; binaries call [`init_logging`] once at startup.
//!
//! # Example
//!
//! ```rust,ignore
//! use strata_telemetry::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!(request_id = "abc", "request started");
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use serde::{Deserialize, Serialize};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Multi-line, human-readable output.
    Pretty,
    /// Single-line, human-readable output.
    Compact,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Default level (e.g., "info", "debug", "warn").
    pub level: String,

    /// Extra filter directives, e.g. `strata_middleware=trace`.
    pub directives: Vec<String>,

    /// Output format.
    pub format: LogFormat,

    /// Whether to include span close events with timings.
    pub span_events: bool,

    /// Whether to include file/line info.
    pub file_line_info: bool,

    /// Whether to include target (module path).
    pub include_target: bool,

    /// Service name recorded on the root span.
    pub service_name: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            directives: Vec::new(),
            format: LogFormat::Json,
            span_events: false,
            file_line_info: false,
            include_target: true,
            service_name: "strata".to_string(),
        }
    }
}

impl LogConfig {
    /// Human-readable output at debug level, with chain diagnostics.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            directives: vec!["strata_middleware=trace".to_string()],
            format: LogFormat::Pretty,
            span_events: true,
            file_line_info: true,
            ..Self::default()
        }
    }

    /// JSON output at info level.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }

    /// Builds the filter string: the level followed by each directive.
    #[must_use]
    pub fn filter_string(&self) -> String {
        std::iter::once(self.level.as_str())
            .chain(self.directives.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Initializes the global logging subscriber.
///
/// Disabled configurations are a no-op.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] for a bad level or directive, and
/// [`TelemetryError::LoggingInit`] if a global subscriber is already set.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.filter_string())?;
    let span_events = if config.span_events {
        FmtSpan::CLOSE
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

/// Creates an env filter from a directive string.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] if the string does not parse.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter).map_err(|e| TelemetryError::InvalidFilter {
        directive: filter.to_string(),
        reason: e.to_string(),
    })
}

/// Returns `true` if `level` names a tracing level.
#[must_use]
pub fn is_valid_level(level: &str) -> bool {
    matches!(
        level.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error" | "off"
    )
}

/// Opens the root span for a service, carrying its name.
#[must_use]
pub fn service_span(config: &LogConfig) -> tracing::Span {
    tracing::info_span!("service", service.name = %config.service_name)
}

/// Standard log field names.
///
/// The stock pipeline stages use these names; custom handlers should too.
pub mod fields {
    /// Request ID field name.
    pub const REQUEST_ID: &str = "request_id";

    /// HTTP method field name.
    pub const METHOD: &str = "method";

    /// Request path field name.
    pub const PATH: &str = "path";

    /// Response status code field name.
    pub const STATUS: &str = "status";

    /// Duration field name (in milliseconds).
    pub const DURATION_MS: &str = "duration_ms";

    /// Handler name field name.
    pub const HANDLER: &str = "handler";

    /// Chain position field name.
    pub const POSITION: &str = "position";

    /// Error field name.
    pub const ERROR: &str = "error";

    /// User ID field name.
    pub const USER_ID: &str = "user_id";

    /// Service name field name.
    pub const SERVICE_NAME: &str = "service.name";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert!(config.enabled);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, "info");
        assert_eq!(config.filter_string(), "info");
    }

    #[test]
    fn test_development_config() {
        let config = LogConfig::development();
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.span_events);
        assert!(config.file_line_info);
        assert_eq!(config.filter_string(), "debug,strata_middleware=trace");
    }

    #[test]
    fn test_production_config() {
        let config = LogConfig::production();
        assert_eq!(config.format, LogFormat::Json);
        assert!(!config.span_events);
        assert!(config.directives.is_empty());
    }

    #[test]
    fn test_log_format_serde() {
        let format: LogFormat = serde_json::from_str(r#""compact""#).unwrap();
        assert_eq!(format, LogFormat::Compact);
        assert_eq!(serde_json::to_string(&LogFormat::Pretty).unwrap(), r#""pretty""#);
    }

    #[test]
    fn test_create_env_filter() {
        assert!(create_env_filter("info,strata_middleware=trace").is_ok());
        assert!(matches!(
            create_env_filter("strata=notalevel"),
            Err(TelemetryError::InvalidFilter { .. })
        ));
    }

    #[test]
    fn test_level_names() {
        assert!(is_valid_level("INFO"));
        assert!(is_valid_level("off"));
        assert!(!is_valid_level("verbose"));
    }

    #[test]
    fn test_field_names() {
        assert_eq!(fields::REQUEST_ID, "request_id");
        assert_eq!(fields::DURATION_MS, "duration_ms");
    }

    #[test]
    fn test_disabled_logging() {
        let config = LogConfig {
            enabled: false,
            ..LogConfig::default()
        };
        assert!(init_logging(&config).is_ok());
    }
}
