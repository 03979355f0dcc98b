//! Stock handlers for a request-processing pipeline.
//!
//! The request stages operate on [`RequestContext`](crate::RequestContext)
//! and are meant to be registered in this order:
//!
//! 1. [`logging`] - Request line, headers and response timing
//! 2. [`rate_limit`] - Per-client request budget
//! 3. [`authentication`] - Bearer token lookup
//! 4. [`validation`] - JSON body field rules
//! 5. [`authorization`] - Role check for admin paths
//! 6. [`responder`] - Terminal handler producing the response
//!
//! Two wrappers may be layered around them:
//!
//! - [`recover`] - Translates domain errors into an error response
//! - [`timeout`] - Bounds how long the rest of the chain may take; generic
//!   over any context type

pub mod authentication;
pub mod authorization;
pub mod logging;
pub mod rate_limit;
pub mod recover;
pub mod responder;
pub mod timeout;
pub mod validation;

// Re-export main types
pub use authentication::{AuthenticationHandler, Principal};
pub use authorization::AuthorizationHandler;
pub use logging::LoggingHandler;
pub use rate_limit::RateLimitHandler;
pub use recover::RecoverHandler;
pub use responder::ResponderHandler;
pub use timeout::TimeoutHandler;
pub use validation::ValidationHandler;

use chrono::{SecondsFormat, Utc};

/// Current time as an RFC 3339 timestamp with millisecond precision.
pub(crate) fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::{Dispatcher, Handler, RequestContext};

    /// Log line pushed by the marker that follows the stage under test.
    pub(crate) const REACHED: &str = "marker reached";

    /// A chain of `stage` followed by a marker recording that it was reached.
    pub(crate) fn then_marker(stage: impl Handler<RequestContext>) -> Dispatcher<RequestContext> {
        let mut chain: Dispatcher<RequestContext> = Dispatcher::new();
        chain.register(stage).register_fn("marker", |ctx, next| {
            Box::pin(async move {
                ctx.push_log(REACHED);
                next.run(ctx).await
            })
        });
        chain
    }

    pub(crate) fn reached(ctx: &RequestContext) -> bool {
        ctx.logs().iter().any(|line| line == REACHED)
    }
}
