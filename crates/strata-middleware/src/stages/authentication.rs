//! Authentication stage.
//!
//! Looks the request's credential header up in a static token table and
//! records the matching [`Principal`] on the context. Requests without a
//! credential, or with an unknown one, are rejected with `401`.

use crate::context::RequestContext;
use crate::handler::{BoxFuture, Handler, Next};
use http::StatusCode;
use serde_json::json;
use std::collections::HashMap;
use strata_core::StrataError;
use tracing::{debug, warn};

/// Header carrying the credential by default.
pub const AUTHORIZATION_HEADER: &str = "authorization";

/// Token accepted by [`AuthenticationHandler::default`].
pub const DEFAULT_TOKEN: &str = "Bearer valid-token-123";

/// The identity a token resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// User ID.
    pub user_id: u64,
    /// Role used by authorization.
    pub role: String,
}

impl Principal {
    /// Creates a principal.
    #[must_use]
    pub fn new(user_id: u64, role: impl Into<String>) -> Self {
        Self {
            user_id,
            role: role.into(),
        }
    }
}

/// Handler that authenticates requests against a token table.
///
/// The default table maps [`DEFAULT_TOKEN`] to user `42` with role `admin`.
///
/// # Example
///
/// ```
/// use strata_middleware::stages::{AuthenticationHandler, Principal};
///
/// let auth = AuthenticationHandler::without_tokens()
///     .with_header("x-api-key")
///     .with_token("secret", Principal::new(7, "viewer"));
/// assert_eq!(auth.header(), "x-api-key");
/// ```
#[derive(Debug, Clone)]
pub struct AuthenticationHandler {
    header: String,
    tokens: HashMap<String, Principal>,
}

impl AuthenticationHandler {
    /// Creates a handler with the default token table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a handler that accepts no tokens until some are added.
    #[must_use]
    pub fn without_tokens() -> Self {
        Self {
            header: AUTHORIZATION_HEADER.to_string(),
            tokens: HashMap::new(),
        }
    }

    /// Reads the credential from `header` instead.
    #[must_use]
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into().to_ascii_lowercase();
        self
    }

    /// Accepts `token` as `principal`.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, principal: Principal) -> Self {
        self.tokens.insert(token.into(), principal);
        self
    }

    /// Returns the credential header name.
    #[must_use]
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Resolves a credential.
    #[must_use]
    pub fn lookup(&self, token: &str) -> Option<&Principal> {
        self.tokens.get(token)
    }
}

impl Default for AuthenticationHandler {
    fn default() -> Self {
        Self::without_tokens().with_token(DEFAULT_TOKEN, Principal::new(42, "admin"))
    }
}

impl Handler<RequestContext> for AuthenticationHandler {
    fn name(&self) -> &'static str {
        "authentication"
    }

    fn call<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a, RequestContext>,
    ) -> BoxFuture<'a, Result<(), StrataError>> {
        Box::pin(async move {
            let Some(token) = ctx.header(&self.header).filter(|token| !token.is_empty()) else {
                ctx.respond(
                    StatusCode::UNAUTHORIZED,
                    json!({ "error": "Unauthorized: Missing token" }),
                );
                ctx.push_log("Authentication failed: No token");
                warn!(request_id = %ctx.request_id(), "missing credential");
                return Err(StrataError::authentication("Unauthorized"));
            };

            let Some(principal) = self.lookup(token).cloned() else {
                ctx.respond(
                    StatusCode::UNAUTHORIZED,
                    json!({ "error": "Unauthorized: Invalid token" }),
                );
                ctx.push_log("Authentication failed: Invalid token");
                warn!(request_id = %ctx.request_id(), "invalid credential");
                return Err(StrataError::authentication("Unauthorized"));
            };

            ctx.set_user(principal.user_id, principal.role.as_str());
            ctx.push_log(format!(
                "Authenticated as user {} ({})",
                principal.user_id, principal.role
            ));
            debug!(user_id = principal.user_id, role = %principal.role, "authenticated");

            next.run(ctx).await
        })
    }
}
