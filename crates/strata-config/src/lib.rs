//! Typed configuration for Strata pipelines.
//!
//! [`StrataConfig`] has two sections:
//!
//! - [`TelemetryConfigSection`] - service identity and logging
//! - [`PipelineConfig`] - per-stage settings for the stock request pipeline
//!
//! Configuration is layered by [`ConfigLoader`]: defaults or a preset, then
//! a TOML/JSON file, then `.env`, then `PREFIX__SECTION__KEY` environment
//! overrides, then validation. Unknown fields are rejected.
//!
//! # Example
//!
//! ```no_run
//! use strata_config::ConfigLoader;
//!
//! # fn main() -> Result<(), strata_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("strata.toml")?
//!     .with_env_prefix("STRATA")
//!     .load()?;
//!
//! println!("rate limit: {}", config.pipeline.rate_limit.limit);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [telemetry]
//! service_name = "orders"
//!
//! [telemetry.logging]
//! level = "info"
//! format = "json"
//!
//! [pipeline]
//! recover_errors = true
//! timeout_ms = 5000
//!
//! [pipeline.rate_limit]
//! limit = 100
//!
//! [[pipeline.authentication.tokens]]
//! token = "Bearer ops-token"
//! user_id = 7
//! role = "admin"
//!
//! [pipeline.authorization]
//! admin_prefix = "/admin"
//! ```
//!
//! # Environment Variable Overrides
//!
//! - `STRATA__TELEMETRY__LOGGING__LEVEL=debug`
//! - `STRATA__PIPELINE__TIMEOUT_MS=none`
//! - `STRATA__PIPELINE__RATE_LIMIT__LIMIT=50`
//! - `STRATA__PIPELINE__VALIDATION__REQUIRED_FIELDS=name,email`
//!
//! Lists are comma-separated. Tokens can only be set from files.

#![doc(html_root_url = "https://docs.rs/strata-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{StrataConfig, StrataConfigBuilder};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{
    AuthenticationConfig, AuthorizationConfig, LogFormat, LoggingConfig, PipelineConfig,
    RateLimitConfig, ResponderConfig, TelemetryConfigSection, TokenConfig, ValidationConfig,
};
