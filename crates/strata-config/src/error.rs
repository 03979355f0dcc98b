//! Errors raised while loading a `StrataConfig`.
//!
//! Each layer of [`ConfigLoader`](crate::ConfigLoader) has its own variant:
//! reading `strata.toml` / `strata.json`, parsing it, loading `.env`, reading
//! `STRATA__*` overrides, and the final [`StrataConfig::validate`] pass.
//!
//! [`StrataConfig::validate`]: crate::StrataConfig::validate

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or validating Strata configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A file passed to `ConfigLoader::with_file` does not exist.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// A configuration file exists but could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A file or string is neither TOML nor JSON.
    #[error("unsupported configuration format for {origin} (expected toml or json)")]
    UnsupportedFormat {
        /// File path or format name that was rejected.
        origin: String,
    },

    /// A TOML layer does not match the `[telemetry]` / `[pipeline]` schema.
    #[error("failed to parse TOML configuration: {0}")]
    TomlError(#[from] toml::de::Error),

    /// A JSON layer does not match the `telemetry` / `pipeline` schema.
    #[error("failed to parse JSON configuration: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A `.env` file exists but is malformed.
    #[error("failed to load .env file: {0}")]
    DotenvError(#[from] dotenvy::Error),

    /// A loaded value breaks a pipeline or telemetry rule, such as
    /// `pipeline.rate_limit.limit = 0`.
    #[error("invalid configuration value for {field}: {reason}")]
    InvalidValue {
        /// Dotted key, e.g. `pipeline.authorization.admin_prefix`.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A `STRATA__SECTION__KEY` override is unknown or does not parse.
    #[error("failed to parse environment variable {var}: {reason}")]
    EnvParseError {
        /// Full variable name, prefix included.
        var: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl ConfigError {
    /// Creates a [`ConfigError::FileNotFound`].
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Creates a [`ConfigError::ReadError`].
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Creates a [`ConfigError::UnsupportedFormat`].
    pub fn unsupported_format(origin: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            origin: origin.into(),
        }
    }

    /// Creates a [`ConfigError::InvalidValue`].
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a [`ConfigError::EnvParseError`].
    pub fn env_parse_error(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// Returns the configuration key or variable at fault, when there is one.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::InvalidValue { field, .. } => Some(field),
            Self::EnvParseError { var, .. } => Some(var),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_not_found_names_path() {
        let err = ConfigError::file_not_found("/etc/strata/strata.toml");
        assert_eq!(
            err.to_string(),
            "configuration file not found: /etc/strata/strata.toml"
        );
        assert_eq!(err.key(), None);
    }

    #[test]
    fn test_unsupported_format() {
        let err = ConfigError::unsupported_format("strata.yaml");
        assert_eq!(
            err.to_string(),
            "unsupported configuration format for strata.yaml (expected toml or json)"
        );
    }

    #[test]
    fn test_invalid_rate_limit() {
        let err = ConfigError::invalid_value("pipeline.rate_limit.limit", "must be greater than 0");
        assert_eq!(
            err.to_string(),
            "invalid configuration value for pipeline.rate_limit.limit: must be greater than 0"
        );
        assert_eq!(err.key(), Some("pipeline.rate_limit.limit"));
    }

    #[test]
    fn test_bad_timeout_override() {
        let err = ConfigError::env_parse_error("STRATA__PIPELINE__TIMEOUT_MS", "expected integer");
        assert_eq!(
            err.to_string(),
            "failed to parse environment variable STRATA__PIPELINE__TIMEOUT_MS: expected integer"
        );
        assert_eq!(err.key(), Some("STRATA__PIPELINE__TIMEOUT_MS"));
    }

    #[test]
    fn test_pipeline_json_error_converts() {
        let source = serde_json::from_str::<crate::StrataConfig>(r#"{"pipeline": 3}"#).unwrap_err();
        let err: ConfigError = source.into();
        assert!(matches!(err, ConfigError::JsonError(_)));
        assert!(err.to_string().starts_with("failed to parse JSON configuration"));
    }
}
