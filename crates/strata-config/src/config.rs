//! Main configuration types.
//!
//! This module provides the top-level [`StrataConfig`] struct and its builder.

use serde::{Deserialize, Serialize};
use strata_telemetry::is_valid_level;

use crate::{ConfigError, LogFormat, PipelineConfig, TelemetryConfigSection};

/// Complete Strata configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use strata_config::StrataConfig;
///
/// let config = StrataConfig::default();
/// assert_eq!(config.pipeline.rate_limit.limit, 10);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct StrataConfig {
    /// Telemetry configuration (service identity, logging).
    #[serde(default)]
    pub telemetry: TelemetryConfigSection,

    /// Stock pipeline configuration.
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl StrataConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> StrataConfigBuilder {
        StrataConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The log level is not a tracing level
    /// - The rate limit is zero
    /// - Authentication is enabled with no tokens
    /// - The admin prefix does not start with `/`
    /// - The timeout is set to zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        let logging = &self.telemetry.logging;
        if !is_valid_level(&logging.level) {
            return Err(ConfigError::invalid_value(
                "telemetry.logging.level",
                format!("unknown log level: {}", logging.level),
            ));
        }

        let pipeline = &self.pipeline;
        if pipeline.rate_limit.enabled && pipeline.rate_limit.limit == 0 {
            return Err(ConfigError::invalid_value(
                "pipeline.rate_limit.limit",
                "must be greater than 0",
            ));
        }

        if pipeline.authentication.enabled && pipeline.authentication.tokens.is_empty() {
            return Err(ConfigError::invalid_value(
                "pipeline.authentication.tokens",
                "at least one token is required when authentication is enabled",
            ));
        }

        if pipeline.authorization.enabled && !pipeline.authorization.admin_prefix.starts_with('/')
        {
            return Err(ConfigError::invalid_value(
                "pipeline.authorization.admin_prefix",
                format!(
                    "must start with '/': {}",
                    pipeline.authorization.admin_prefix
                ),
            ));
        }

        if pipeline.timeout_ms == Some(0) {
            return Err(ConfigError::invalid_value(
                "pipeline.timeout_ms",
                "must be greater than 0 when set",
            ));
        }

        Ok(())
    }

    /// Development preset: pretty debug logs, no simulated latency.
    ///
    /// ```
    /// use strata_config::StrataConfig;
    ///
    /// let config = StrataConfig::development();
    /// assert_eq!(config.telemetry.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.telemetry.environment = "development".to_string();
        config.telemetry.logging.level = "debug".to_string();
        config.telemetry.logging.format = LogFormat::Pretty;
        config.telemetry.logging.include_location = true;
        config.telemetry.logging.directives = vec!["strata_middleware=trace".to_string()];

        config.pipeline.responder.latency_ms = 0;

        config
    }

    /// Production preset: JSON logs, errors recovered into responses, and a
    /// request deadline.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.telemetry.environment = "production".to_string();
        config.telemetry.logging.level = "info".to_string();
        config.telemetry.logging.format = LogFormat::Json;

        config.pipeline.recover_errors = true;
        config.pipeline.timeout_ms = Some(30_000);

        config
    }
}

/// Builder for [`StrataConfig`].
#[derive(Debug, Default)]
pub struct StrataConfigBuilder {
    telemetry: Option<TelemetryConfigSection>,
    pipeline: Option<PipelineConfig>,
}

impl StrataConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the telemetry configuration.
    #[must_use]
    pub fn telemetry(mut self, telemetry: TelemetryConfigSection) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Set the pipeline configuration.
    #[must_use]
    pub fn pipeline(mut self, pipeline: PipelineConfig) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Build the configuration. Unset sections use their defaults.
    #[must_use]
    pub fn build(self) -> StrataConfig {
        StrataConfig {
            telemetry: self.telemetry.unwrap_or_default(),
            pipeline: self.pipeline.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<StrataConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
