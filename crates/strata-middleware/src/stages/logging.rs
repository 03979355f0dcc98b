//! Request logging stage.
//!
//! Records the request line and headers on the way in, and the response
//! status and duration on the way out. The closing line is written only when
//! the rest of the chain succeeds; a failure unwinds past it.

use super::timestamp;
use crate::context::RequestContext;
use crate::handler::{BoxFuture, Handler, Next};
use http::StatusCode;
use strata_core::StrataError;
use tracing::info;

/// Handler that logs each request and its response.
///
/// Lines are appended to the context log and mirrored as `tracing` events:
///
/// ```text
/// [2026-01-01T00:00:00.000Z] POST /api/users
/// Headers: {"authorization":"Bearer ..."}
/// [2026-01-01T00:00:00.105Z] Response: 200 - 105ms
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHandler;

impl LoggingHandler {
    /// Creates a new logging handler.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Handler<RequestContext> for LoggingHandler {
    fn name(&self) -> &'static str {
        "logging"
    }

    fn call<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a, RequestContext>,
    ) -> BoxFuture<'a, Result<(), StrataError>> {
        Box::pin(async move {
            ctx.mark_started();
            let headers =
                serde_json::to_string(ctx.headers()).unwrap_or_else(|_| "{}".to_string());
            ctx.push_log(format!("[{}] {} {}", timestamp(), ctx.method(), ctx.path()));
            ctx.push_log(format!("Headers: {headers}"));
            info!(
                request_id = %ctx.request_id(),
                method = %ctx.method(),
                path = ctx.path(),
                "request started"
            );

            next.run(ctx).await?;

            let status = ctx.status().unwrap_or(StatusCode::OK);
            let duration_ms = u64::try_from(ctx.elapsed().as_millis()).unwrap_or(u64::MAX);
            ctx.push_log(format!(
                "[{}] Response: {} - {duration_ms}ms",
                timestamp(),
                status.as_u16()
            ));
            info!(
                request_id = %ctx.request_id(),
                status = status.as_u16(),
                duration_ms,
                "request completed"
            );
            Ok(())
        })
    }
}
