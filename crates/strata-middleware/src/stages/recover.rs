//! Error recovery stage.
//!
//! Registered first, [`RecoverHandler`] turns domain errors raised anywhere
//! downstream into an error response, so the run itself succeeds. The status
//! comes from the error category and the payload is the serialized
//! [`ErrorEnvelope`](strata_core::ErrorEnvelope).
//!
//! Chain faults are programmer errors and are never recovered.

use crate::context::RequestContext;
use crate::handler::{BoxFuture, Handler, Next};
use strata_core::StrataError;
use tracing::{error, warn};

/// Handler that converts downstream errors into error responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecoverHandler;

impl RecoverHandler {
    /// Creates a new recover handler.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Handler<RequestContext> for RecoverHandler {
    fn name(&self) -> &'static str {
        "recover"
    }

    fn call<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a, RequestContext>,
    ) -> BoxFuture<'a, Result<(), StrataError>> {
        Box::pin(async move {
            let err = match next.run(ctx).await {
                Ok(()) => return Ok(()),
                Err(err) if err.is_fault() => {
                    error!(request_id = %ctx.request_id(), error = %err, "chain fault");
                    return Err(err);
                }
                Err(err) => err,
            };

            let request_id = ctx.request_id().to_string();
            let envelope = err.to_envelope(Some(&request_id));
            let payload = serde_json::to_value(&envelope)
                .map_err(|e| StrataError::internal_with_source("failed to encode error envelope", e))?;

            warn!(
                request_id = %request_id,
                status = err.status_code().as_u16(),
                error = %err,
                "recovered from handler error"
            );
            ctx.push_log(format!("Recovered: {err}"));
            ctx.respond(err.status_code(), payload);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Dispatcher;
    use http::{Method, StatusCode};
    use serde_json::json;

    fn recovering(err: fn() -> StrataError) -> Dispatcher<RequestContext> {
        let mut chain: Dispatcher<RequestContext> = Dispatcher::new();
        chain
            .register(RecoverHandler::new())
            .register_fn("fail", move |_ctx, _next| {
                Box::pin(async move { Err(err()) })
            });
        chain
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let mut chain: Dispatcher<RequestContext> = Dispatcher::new();
        chain.register(RecoverHandler::new()).register_fn("ok", |ctx, _next| {
            Box::pin(async move {
                ctx.respond(StatusCode::OK, json!({ "ok": true }));
                Ok(())
            })
        });

        let mut ctx = RequestContext::new(Method::GET, "/");
        chain.run(&mut ctx).await.unwrap();
        assert_eq!(ctx.response(), Some(&json!({ "ok": true })));
    }

    #[tokio::test]
    async fn test_domain_error_becomes_response() {
        let chain = recovering(|| StrataError::authentication("Unauthorized"));
        let mut ctx = RequestContext::new(Method::GET, "/");

        chain.run(&mut ctx).await.unwrap();

        assert_eq!(ctx.status(), Some(StatusCode::UNAUTHORIZED));
        let response = ctx.response().unwrap();
        assert_eq!(response["error"]["code"], json!("AUTHENTICATION_ERROR"));
        assert_eq!(response["error"]["message"], json!("Unauthorized"));
        assert_eq!(
            response["request_id"],
            json!(ctx.request_id().to_string())
        );
        assert_eq!(
            ctx.logs(),
            ["Recovered: Authentication error: Unauthorized"]
        );
    }

    #[tokio::test]
    async fn test_rate_limit_maps_to_429() {
        let chain = recovering(|| StrataError::rate_limited("Rate limit exceeded", Some(30)));
        let mut ctx = RequestContext::new(Method::GET, "/");

        chain.run(&mut ctx).await.unwrap();

        assert_eq!(ctx.status(), Some(StatusCode::TOO_MANY_REQUESTS));
        assert_eq!(
            ctx.response().unwrap()["error"]["details"],
            json!({ "retry_after_seconds": 30 })
        );
    }

    #[tokio::test]
    async fn test_fault_is_not_recovered() {
        let mut chain: Dispatcher<RequestContext> = Dispatcher::new();
        chain
            .register(RecoverHandler::new())
            .register_fn("twice", |ctx, next| {
                Box::pin(async move {
                    next.clone().run(ctx).await?;
                    next.run(ctx).await
                })
            });

        let mut ctx = RequestContext::new(Method::GET, "/");
        let err = chain.run(&mut ctx).await.unwrap_err();

        assert!(err.is_fault());
        assert_eq!(ctx.status(), None);
    }
}
