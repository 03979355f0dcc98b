//! Request body validation stage.
//!
//! Applies [`FieldRules`] to the JSON body of `POST` requests. Other methods,
//! and `POST` requests whose body is missing or falsy (`null`, `false`, `0`,
//! `""`), pass through unchecked.

use crate::context::RequestContext;
use crate::handler::{BoxFuture, Handler, Next};
use crate::rules::{is_falsy, FieldRules, Present, Text};
use http::{Method, StatusCode};
use serde_json::{json, Value};
use strata_core::StrataError;
use tracing::{debug, warn};

/// Handler that validates request bodies.
///
/// By default the body must carry a non-empty string `name`.
#[derive(Debug)]
pub struct ValidationHandler {
    rules: FieldRules,
}

impl ValidationHandler {
    /// Creates a handler with the default rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a handler applying `rules`.
    #[must_use]
    pub fn with_rules(rules: FieldRules) -> Self {
        Self { rules }
    }

    /// Returns the rules applied.
    #[must_use]
    pub fn rules(&self) -> &FieldRules {
        &self.rules
    }

    /// Success log line, naming the value of the first checked field.
    fn passed_line(&self, body: Option<&Value>) -> String {
        let value = self
            .rules
            .field_names()
            .first()
            .and_then(|field| body.and_then(|body| body.get(*field)));
        match value {
            Some(Value::String(text)) => format!("Validation passed: {text}"),
            Some(other) => format!("Validation passed: {other}"),
            None => "Validation passed".to_string(),
        }
    }
}

impl Default for ValidationHandler {
    fn default() -> Self {
        Self::with_rules(
            FieldRules::new()
                .field("name", Present::new().message("name is required"))
                .field("name", Text::new().message("name is required")),
        )
    }
}

impl Handler<RequestContext> for ValidationHandler {
    fn name(&self) -> &'static str {
        "validation"
    }

    fn call<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a, RequestContext>,
    ) -> BoxFuture<'a, Result<(), StrataError>> {
        Box::pin(async move {
            if *ctx.method() == Method::POST && !is_falsy(ctx.body()) {
                let checked = self.rules.validate(ctx.body()).await;
                if let Err(violations) = checked {
                    let first = violations.first_message().unwrap_or("invalid body").to_string();
                    ctx.respond(
                        StatusCode::BAD_REQUEST,
                        json!({ "error": format!("Validation failed: {first}") }),
                    );
                    ctx.push_log(format!("Validation failed: {first}"));
                    warn!(
                        request_id = %ctx.request_id(),
                        violations = violations.len(),
                        "validation failed"
                    );
                    return Err(StrataError::validation_with_fields(
                        "Validation failed",
                        violations.to_field_errors(),
                    ));
                }

                let line = self.passed_line(ctx.body());
                ctx.push_log(line);
                debug!(fields = ?self.rules.field_names(), "validation passed");
            }

            next.run(ctx).await
        })
    }
}
