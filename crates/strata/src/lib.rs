//! # Strata
//!
//! **Ordered async handler chains with onion-style dispatch**
//!
//! Strata runs a registered list of handlers over a mutable context. Each
//! handler decides whether to continue the chain, and code after the
//! continuation runs on the way back out:
//!
//! ```text
//! Request → recover → logging → timeout → rate_limit → authentication
//!                                                          ↓
//!                         responder ← authorization ← validation
//! ```
//!
//! This crate re-exports the workspace crates and assembles the stock request
//! pipeline from configuration.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use strata::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::new().with_env_prefix("STRATA").load()?;
//!     init_logging(&config.telemetry.log_config())?;
//!
//!     let chain = standard_pipeline(&config.pipeline);
//!     let mut ctx = RequestContext::new(Method::GET, "/api/users")
//!         .with_header("Authorization", "Bearer valid-token-123");
//!     chain.run(&mut ctx).await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/strata/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod pipeline;

pub use pipeline::standard_pipeline;

// Re-export workspace crates
pub use strata_config as config;
pub use strata_core as core;
pub use strata_middleware as middleware;
pub use strata_telemetry as telemetry;

pub use strata_config::{ConfigLoader, PipelineConfig, StrataConfig};
pub use strata_core::{ChainFault, ErrorCategory, StrataError, StrataResult};
pub use strata_middleware::{Dispatcher, Handler, Next, RequestContext};

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use strata::prelude::*;
/// ```
pub mod prelude {
    pub use strata_config::{ConfigError, ConfigLoader, PipelineConfig, StrataConfig};
    pub use strata_core::{
        ChainFault, ErrorCategory, ErrorEnvelope, FieldErrors, RequestId, StrataError,
        StrataResult,
    };
    pub use strata_middleware::rules::{
        async_rule_fn, rule_fn, AsyncFieldRule, Email, FieldRule, FieldRules, MaxLength,
        MinLength, Present, Required, RuleOutcome, Text,
    };
    pub use strata_middleware::stages::{
        AuthenticationHandler, AuthorizationHandler, LoggingHandler, Principal, RateLimitHandler,
        RecoverHandler, ResponderHandler, TimeoutHandler, ValidationHandler,
    };
    pub use strata_middleware::{
        handler_fn, BoxFuture, Dispatcher, Handler, Next, RequestContext,
    };
    pub use strata_telemetry::{init_logging, LogConfig, LogFormat};

    pub use crate::standard_pipeline;
}
