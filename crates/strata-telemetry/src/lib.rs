//! Logging setup for Strata.
//!
//! Strata's library crates emit `tracing` events and never install a
//! subscriber themselves. This crate provides the one-call setup binaries use:
//!
//! ```rust,ignore
//! use strata_telemetry::{init_logging, LogConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_logging(&LogConfig::production())?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```
//!
//! Event levels used across the workspace:
//!
//! | Level | Emitted for |
//! |-------|-------------|
//! | `trace` | every chain advance and exhaustion |
//! | `debug` | chain faults, stage decisions |
//! | `info` | request start and completion |
//! | `warn` | rejected requests, timeouts, recovered errors |

#![doc(html_root_url = "https://docs.rs/strata-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{
    create_env_filter, fields, init_logging, is_valid_level, service_span, LogConfig, LogFormat,
};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
