//! Terminal responder stage.

use super::timestamp;
use crate::context::RequestContext;
use crate::handler::{BoxFuture, Handler, Next};
use http::StatusCode;
use serde_json::json;
use std::time::Duration;
use strata_core::StrataError;
use tracing::debug;

/// Default simulated processing time.
pub const DEFAULT_LATENCY: Duration = Duration::from_millis(100);

/// Terminal handler that produces the success response.
///
/// Waits for the configured latency, standing in for real work, then responds
/// `200` with a greeting for the body's `name` (or `"User"`). It never invokes
/// its continuation, so anything registered after it does not run.
#[derive(Debug, Clone, Copy)]
pub struct ResponderHandler {
    latency: Duration,
}

impl ResponderHandler {
    /// Creates a responder with the default latency.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            latency: DEFAULT_LATENCY,
        }
    }

    /// Uses `latency` instead. Zero skips the wait.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Returns the simulated latency.
    #[must_use]
    pub const fn latency(&self) -> Duration {
        self.latency
    }
}

impl Default for ResponderHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler<RequestContext> for ResponderHandler {
    fn name(&self) -> &'static str {
        "responder"
    }

    fn call<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        _next: Next<'a, RequestContext>,
    ) -> BoxFuture<'a, Result<(), StrataError>> {
        Box::pin(async move {
            ctx.push_log("Processing request...");

            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }

            let name = ctx
                .body_str("name")
                .filter(|name| !name.is_empty())
                .unwrap_or("User")
                .to_string();
            ctx.respond(
                StatusCode::OK,
                json!({
                    "success": true,
                    "message": format!("Hello {name}!"),
                    "userId": ctx.user_id(),
                    "timestamp": timestamp(),
                }),
            );
            ctx.push_log("Request processed successfully");
            debug!(request_id = %ctx.request_id(), "response produced");
            Ok(())
        })
    }
}
