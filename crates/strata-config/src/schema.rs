//! Configuration schema types.
//!
//! Every section rejects unknown fields and fills missing ones with defaults,
//! so a file only needs to name what it changes.

use serde::{Deserialize, Serialize};
use strata_telemetry::LogConfig;

pub use strata_telemetry::LogFormat;

// ============================================================================
// Telemetry
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Extra filter directives, e.g. `strata_middleware=trace`.
    #[serde(default)]
    pub directives: Vec<String>,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            directives: Vec::new(),
            format: LogFormat::default(),
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telemetry configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfigSection {
    /// Service name recorded on log events.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Deployment environment (e.g., "development", "production").
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for TelemetryConfigSection {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            environment: default_environment(),
            logging: LoggingConfig::default(),
        }
    }
}

impl TelemetryConfigSection {
    /// Converts this section into the settings `init_logging` takes.
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.logging.enabled,
            level: self.logging.level.clone(),
            directives: self.logging.directives.clone(),
            format: self.logging.format,
            span_events: false,
            file_line_info: self.logging.include_location,
            include_target: true,
            service_name: self.service_name.clone(),
        }
    }
}

fn default_service_name() -> String {
    "strata-service".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

// ============================================================================
// Pipeline
// ============================================================================

/// Rate limit stage settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Register the stage.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Requests allowed before rejecting.
    #[serde(default = "default_rate_limit")]
    pub limit: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            limit: default_rate_limit(),
        }
    }
}

fn default_rate_limit() -> u32 {
    10
}

/// A credential accepted by the authentication stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TokenConfig {
    /// Full header value, e.g. `Bearer abc`.
    pub token: String,

    /// User the token authenticates as.
    pub user_id: u64,

    /// Role granted to the user.
    pub role: String,
}

/// Authentication stage settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AuthenticationConfig {
    /// Register the stage.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Header carrying the credential.
    #[serde(default = "default_auth_header")]
    pub header: String,

    /// Accepted credentials.
    #[serde(default = "default_tokens")]
    pub tokens: Vec<TokenConfig>,
}

impl Default for AuthenticationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            header: default_auth_header(),
            tokens: default_tokens(),
        }
    }
}

fn default_auth_header() -> String {
    "authorization".to_string()
}

fn default_tokens() -> Vec<TokenConfig> {
    vec![TokenConfig {
        token: "Bearer valid-token-123".to_string(),
        user_id: 42,
        role: "admin".to_string(),
    }]
}

/// Validation stage settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ValidationConfig {
    /// Register the stage.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Body fields that must be non-empty strings on `POST`.
    #[serde(default = "default_required_fields")]
    pub required_fields: Vec<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            required_fields: default_required_fields(),
        }
    }
}

fn default_required_fields() -> Vec<String> {
    vec!["name".to_string()]
}

/// Authorization stage settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AuthorizationConfig {
    /// Register the stage.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Paths starting with this prefix require the admin role.
    #[serde(default = "default_admin_prefix")]
    pub admin_prefix: String,

    /// Role allowed under the admin prefix.
    #[serde(default = "default_admin_role")]
    pub admin_role: String,
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            admin_prefix: default_admin_prefix(),
            admin_role: default_admin_role(),
        }
    }
}

fn default_admin_prefix() -> String {
    "/admin".to_string()
}

fn default_admin_role() -> String {
    "admin".to_string()
}

/// Responder stage settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ResponderConfig {
    /// Simulated processing time in milliseconds.
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            latency_ms: default_latency_ms(),
        }
    }
}

fn default_latency_ms() -> u64 {
    100
}

/// Settings for the stock request pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Register the recover handler first, turning errors into responses.
    #[serde(default)]
    pub recover_errors: bool,

    /// Register the request logging stage.
    #[serde(default = "default_true")]
    pub log_requests: bool,

    /// Deadline for everything after the logging stage, in milliseconds.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Rate limit stage.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Authentication stage.
    #[serde(default)]
    pub authentication: AuthenticationConfig,

    /// Validation stage.
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Authorization stage.
    #[serde(default)]
    pub authorization: AuthorizationConfig,

    /// Responder stage.
    #[serde(default)]
    pub responder: ResponderConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            recover_errors: false,
            log_requests: true,
            timeout_ms: None,
            rate_limit: RateLimitConfig::default(),
            authentication: AuthenticationConfig::default(),
            validation: ValidationConfig::default(),
            authorization: AuthorizationConfig::default(),
            responder: ResponderConfig::default(),
        }
    }
}

fn default_true() -> bool {
    true
}
