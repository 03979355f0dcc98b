//! Layered configuration loading.
//!
//! Layers apply in call order, later ones replacing earlier ones. Environment
//! overrides and validation run last, in [`ConfigLoader::load`].

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::{ConfigError, LogFormat, StrataConfig};

/// Configuration loader.
///
/// # Example
///
/// ```no_run
/// use strata_config::ConfigLoader;
///
/// # fn main() -> Result<(), strata_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_optional_file("strata.toml")?
///     .with_dotenv()?
///     .with_env_prefix("STRATA")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: StrataConfig,
    env_prefix: Option<String>,
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
            config: StrataConfig::default(),
            env_prefix: None,
        }
    }

    /// Reset to default values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = StrataConfig::default();
        self
    }

    /// Start from the development preset.
    ///
    /// ```
    /// use strata_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.telemetry.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = StrataConfig::development();
        self
    }

    /// Start from the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = StrataConfig::production();
        self
    }

    /// Load a `.toml` or `.json` file, chosen by extension.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing or unreadable, has an
    /// unsupported extension, or does not parse (unknown fields included).
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        self.config = Self::parse_file(&content, path)?;
        Ok(self)
    }

    /// Like [`with_file`](Self::with_file), but a missing file is skipped.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists and fails to load.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in `"toml"` or `"json"` format.
    ///
    /// ```
    /// use strata_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[pipeline.rate_limit]\nlimit = 3", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.pipeline.rate_limit.limit, 3);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the format is unknown or parsing fails.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::unsupported_format(format))
            }
        };
        Ok(self)
    }

    /// Set the prefix for `PREFIX__SECTION__KEY` environment overrides.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Load `.env` from the current directory or its parents, if present.
    ///
    /// Variables already set in the process environment win.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::DotenvError` if a `.env` file exists but cannot
    /// be parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(e.into()),
        }
    }

    /// Load a specific dotenv file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::DotenvError` if the file is missing or malformed.
    pub fn with_dotenv_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        dotenvy::from_path(path)?;
        Ok(self)
    }

    /// Apply environment overrides, validate, and return the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override does not parse or validation
    /// fails.
    pub fn load(mut self) -> Result<StrataConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Return the configuration without environment overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> StrataConfig {
        self.config
    }

    fn parse_file(content: &str, path: &Path) -> Result<StrataConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::unsupported_format(path.display().to_string())),
        }
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let marker = format!("{prefix}__");
        // Sorted so that failures are reported deterministically.
        let vars: BTreeMap<String, String> = env::vars()
            .filter(|(key, _)| key.starts_with(&marker))
            .collect();

        for (key, value) in vars {
            self.apply_env_var(&key, &value, prefix)?;
        }
        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let path = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;
        let parts: Vec<&str> = path.split("__").collect();

        let telemetry = &mut self.config.telemetry;
        let pipeline = &mut self.config.pipeline;

        match parts.as_slice() {
            ["TELEMETRY", "SERVICE_NAME"] => telemetry.service_name = value.to_string(),
            ["TELEMETRY", "ENVIRONMENT"] => telemetry.environment = value.to_string(),

            ["TELEMETRY", "LOGGING", "ENABLED"] => {
                telemetry.logging.enabled = bool_var(key, value)?;
            }
            ["TELEMETRY", "LOGGING", "LEVEL"] => telemetry.logging.level = value.to_string(),
            ["TELEMETRY", "LOGGING", "FORMAT"] => {
                telemetry.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    "compact" => LogFormat::Compact,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json', 'pretty', or 'compact'",
                        ))
                    }
                };
            }
            ["TELEMETRY", "LOGGING", "DIRECTIVES"] => {
                telemetry.logging.directives = list_var(value);
            }
            ["TELEMETRY", "LOGGING", "INCLUDE_LOCATION"] => {
                telemetry.logging.include_location = bool_var(key, value)?;
            }

            ["PIPELINE", "RECOVER_ERRORS"] => pipeline.recover_errors = bool_var(key, value)?,
            ["PIPELINE", "LOG_REQUESTS"] => pipeline.log_requests = bool_var(key, value)?,
            ["PIPELINE", "TIMEOUT_MS"] => {
                pipeline.timeout_ms = if value.eq_ignore_ascii_case("none") || value.is_empty() {
                    None
                } else {
                    Some(number_var(key, value)?)
                };
            }

            ["PIPELINE", "RATE_LIMIT", "ENABLED"] => {
                pipeline.rate_limit.enabled = bool_var(key, value)?;
            }
            ["PIPELINE", "RATE_LIMIT", "LIMIT"] => {
                pipeline.rate_limit.limit = number_var(key, value)?;
            }

            ["PIPELINE", "AUTHENTICATION", "ENABLED"] => {
                pipeline.authentication.enabled = bool_var(key, value)?;
            }
            ["PIPELINE", "AUTHENTICATION", "HEADER"] => {
                pipeline.authentication.header = value.to_lowercase();
            }

            ["PIPELINE", "VALIDATION", "ENABLED"] => {
                pipeline.validation.enabled = bool_var(key, value)?;
            }
            ["PIPELINE", "VALIDATION", "REQUIRED_FIELDS"] => {
                pipeline.validation.required_fields = list_var(value);
            }

            ["PIPELINE", "AUTHORIZATION", "ENABLED"] => {
                pipeline.authorization.enabled = bool_var(key, value)?;
            }
            ["PIPELINE", "AUTHORIZATION", "ADMIN_PREFIX"] => {
                pipeline.authorization.admin_prefix = value.to_string();
            }
            ["PIPELINE", "AUTHORIZATION", "ADMIN_ROLE"] => {
                pipeline.authorization.admin_role = value.to_string();
            }

            ["PIPELINE", "RESPONDER", "LATENCY_MS"] => {
                pipeline.responder.latency_ms = number_var(key, value)?;
            }

            // Unknown keys are left for other consumers of the prefix.
            _ => {}
        }

        Ok(())
    }
}

fn bool_var(key: &str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))
}

fn number_var<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))
}

/// Splits a comma-separated list, dropping blank entries.
fn list_var(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
