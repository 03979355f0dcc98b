//! Rate limiting stage.
//!
//! Counts the request against the budget carried in
//! [`RequestContext::request_count`] and rejects it once the budget is spent.
//! The counter is seeded by the caller, typically from a per-client store.

use crate::context::RequestContext;
use crate::handler::{BoxFuture, Handler, Next};
use http::StatusCode;
use serde_json::json;
use strata_core::StrataError;
use tracing::{debug, warn};

/// Requests allowed before the limit applies.
pub const DEFAULT_LIMIT: u32 = 10;

/// Handler that enforces a request budget.
///
/// # Behavior
///
/// 1. Increments the context's request count
/// 2. If the count exceeds the limit, responds `429` and fails with
///    [`StrataError::RateLimited`]
/// 3. Otherwise continues
#[derive(Debug, Clone, Copy)]
pub struct RateLimitHandler {
    limit: u32,
}

impl RateLimitHandler {
    /// Creates a handler allowing `limit` requests.
    #[must_use]
    pub const fn new(limit: u32) -> Self {
        Self { limit }
    }

    /// Returns the configured limit.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }
}

impl Default for RateLimitHandler {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT)
    }
}

impl Handler<RequestContext> for RateLimitHandler {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    fn call<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a, RequestContext>,
    ) -> BoxFuture<'a, Result<(), StrataError>> {
        Box::pin(async move {
            let count = ctx.increment_request_count();

            if count > self.limit {
                ctx.respond(
                    StatusCode::TOO_MANY_REQUESTS,
                    json!({ "error": "Too many requests" }),
                );
                ctx.push_log("Rate limit exceeded");
                warn!(
                    request_id = %ctx.request_id(),
                    count,
                    limit = self.limit,
                    "rate limit exceeded"
                );
                return Err(StrataError::rate_limited("Rate limit exceeded", None));
            }

            ctx.push_log(format!("Rate limit check passed ({count}/{})", self.limit));
            debug!(count, limit = self.limit, "rate limit check passed");
            next.run(ctx).await
        })
    }
}
