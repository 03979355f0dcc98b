//! Stock pipeline assembly from configuration.

use std::time::Duration;

use strata_config::{AuthenticationConfig, PipelineConfig, ValidationConfig};
use strata_middleware::rules::{FieldRules, Present, Text};
use strata_middleware::stages::{
    AuthenticationHandler, AuthorizationHandler, LoggingHandler, Principal, RateLimitHandler,
    RecoverHandler, ResponderHandler, TimeoutHandler, ValidationHandler,
};
use strata_middleware::{Dispatcher, RequestContext};

/// Builds the stock request pipeline described by `config`.
///
/// Handlers are registered in this order, skipping disabled ones:
///
/// ```text
/// recover? → logging? → timeout? → rate_limit → authentication
///          → validation → authorization → responder
/// ```
///
/// The timeout sits inside logging, so a timed-out request is still logged
/// as started but never as completed.
///
/// # Example
///
/// ```
/// use strata::{standard_pipeline, PipelineConfig};
///
/// let chain = standard_pipeline(&PipelineConfig::default());
/// assert_eq!(
///     chain.handler_names(),
///     ["logging", "rate_limit", "authentication", "validation", "authorization", "responder"]
/// );
/// ```
#[must_use]
pub fn standard_pipeline(config: &PipelineConfig) -> Dispatcher<RequestContext> {
    let mut chain: Dispatcher<RequestContext> = Dispatcher::new();

    if config.recover_errors {
        chain.register(RecoverHandler::new());
    }
    if config.log_requests {
        chain.register(LoggingHandler::new());
    }
    if let Some(ms) = config.timeout_ms {
        chain.register(TimeoutHandler::new(Duration::from_millis(ms)));
    }
    if config.rate_limit.enabled {
        chain.register(RateLimitHandler::new(config.rate_limit.limit));
    }
    if config.authentication.enabled {
        chain.register(authentication(&config.authentication));
    }
    if config.validation.enabled {
        chain.register(validation(&config.validation));
    }
    if config.authorization.enabled {
        chain.register(
            AuthorizationHandler::new()
                .with_admin_prefix(config.authorization.admin_prefix.as_str())
                .with_admin_role(config.authorization.admin_role.as_str()),
        );
    }
    chain.register(
        ResponderHandler::new().with_latency(Duration::from_millis(config.responder.latency_ms)),
    );

    tracing::debug!(handlers = ?chain.handler_names(), "assembled request pipeline");
    chain
}

fn authentication(config: &AuthenticationConfig) -> AuthenticationHandler {
    config.tokens.iter().fold(
        AuthenticationHandler::without_tokens().with_header(config.header.as_str()),
        |handler, token| {
            handler.with_token(
                token.token.as_str(),
                Principal::new(token.user_id, token.role.as_str()),
            )
        },
    )
}

fn validation(config: &ValidationConfig) -> ValidationHandler {
    let rules = config
        .required_fields
        .iter()
        .fold(FieldRules::new(), |rules, field| {
            let message = format!("{field} is required");
            rules
                .field(field.as_str(), Present::new().message(message.as_str()))
                .field(field.as_str(), Text::new().message(message))
        });
    ValidationHandler::with_rules(rules)
}
