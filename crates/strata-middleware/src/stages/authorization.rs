//! Authorization stage.
//!
//! Paths under the admin prefix require the admin role. Everything else is
//! allowed. Runs after authentication, which sets the role.

use crate::context::RequestContext;
use crate::handler::{BoxFuture, Handler, Next};
use http::StatusCode;
use serde_json::json;
use strata_core::StrataError;
use tracing::warn;

/// Default path prefix that requires the admin role.
pub const DEFAULT_ADMIN_PREFIX: &str = "/admin";

/// Default role allowed under the admin prefix.
pub const DEFAULT_ADMIN_ROLE: &str = "admin";

/// Handler that restricts admin paths to the admin role.
#[derive(Debug, Clone)]
pub struct AuthorizationHandler {
    admin_prefix: String,
    admin_role: String,
}

impl AuthorizationHandler {
    /// Creates a handler with the default prefix and role.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Protects paths starting with `prefix` instead.
    #[must_use]
    pub fn with_admin_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.admin_prefix = prefix.into();
        self
    }

    /// Requires `role` instead.
    #[must_use]
    pub fn with_admin_role(mut self, role: impl Into<String>) -> Self {
        self.admin_role = role.into();
        self
    }

    /// Returns `true` if `ctx` may proceed.
    #[must_use]
    pub fn permits(&self, ctx: &RequestContext) -> bool {
        !ctx.path().starts_with(&self.admin_prefix)
            || ctx.user_role() == Some(self.admin_role.as_str())
    }
}

impl Default for AuthorizationHandler {
    fn default() -> Self {
        Self {
            admin_prefix: DEFAULT_ADMIN_PREFIX.to_string(),
            admin_role: DEFAULT_ADMIN_ROLE.to_string(),
        }
    }
}

impl Handler<RequestContext> for AuthorizationHandler {
    fn name(&self) -> &'static str {
        "authorization"
    }

    fn call<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a, RequestContext>,
    ) -> BoxFuture<'a, Result<(), StrataError>> {
        Box::pin(async move {
            if !self.permits(ctx) {
                ctx.respond(
                    StatusCode::FORBIDDEN,
                    json!({ "error": "Forbidden: Admin access required" }),
                );
                ctx.push_log("Authorization failed: Not admin");
                warn!(
                    request_id = %ctx.request_id(),
                    path = ctx.path(),
                    role = ?ctx.user_role(),
                    "admin access denied"
                );
                return Err(StrataError::authorization("Forbidden"));
            }

            ctx.push_log("Authorization passed");
            next.run(ctx).await
        })
    }
}
