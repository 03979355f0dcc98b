//! Runs pipelines assembled from configuration.

use http::{Method, StatusCode};
use serde_json::json;
use strata::prelude::*;

fn load(toml: &str) -> StrataConfig {
    ConfigLoader::new()
        .with_string(toml, "toml")
        .unwrap()
        .load()
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_default_pipeline_serves_request() {
    let chain = standard_pipeline(&PipelineConfig::default());
    let mut ctx = RequestContext::new(Method::POST, "/api/users")
        .with_header("Authorization", "Bearer valid-token-123")
        .with_body(json!({ "name": "John Doe" }));

    chain.run(&mut ctx).await.unwrap();

    assert_eq!(ctx.status(), Some(StatusCode::OK));
    assert_eq!(ctx.response().unwrap()["message"], json!("Hello John Doe!"));
    assert_eq!(ctx.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_configured_tokens_and_fields() {
    let config = load(
        r#"
        [pipeline.authentication]
        header = "x-api-key"

        [[pipeline.authentication.tokens]]
        token = "ops-key"
        user_id = 7
        role = "operator"

        [pipeline.validation]
        required_fields = ["name", "email"]
        "#,
    );
    let chain = standard_pipeline(&config.pipeline);

    let mut ctx = RequestContext::new(Method::POST, "/api/users")
        .with_header("X-Api-Key", "ops-key")
        .with_body(json!({ "name": "Ada" }));
    let err = chain.run(&mut ctx).await.unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Validation);
    assert_eq!(ctx.user_id(), Some(7));
    assert_eq!(
        ctx.response(),
        Some(&json!({ "error": "Validation failed: email is required" }))
    );
}

#[tokio::test(start_paused = true)]
async fn test_custom_admin_prefix() {
    let config = load(
        r#"
        [pipeline.authorization]
        admin_prefix = "/ops"
        admin_role = "operator"
        "#,
    );
    let chain = standard_pipeline(&config.pipeline);

    let mut ctx = RequestContext::new(Method::GET, "/ops/jobs")
        .with_header("Authorization", "Bearer valid-token-123");
    let err = chain.run(&mut ctx).await.unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Authorization);
    assert_eq!(ctx.status(), Some(StatusCode::FORBIDDEN));

    // Paths outside the prefix are unaffected.
    let mut ctx = RequestContext::new(Method::GET, "/admin/jobs")
        .with_header("Authorization", "Bearer valid-token-123");
    chain.run(&mut ctx).await.unwrap();
    assert_eq!(ctx.status(), Some(StatusCode::OK));
}

#[tokio::test(start_paused = true)]
async fn test_recovering_pipeline_answers_with_envelope() {
    let chain = standard_pipeline(&StrataConfig::production().pipeline);
    let mut ctx = RequestContext::new(Method::GET, "/api/users");

    chain.run(&mut ctx).await.unwrap();

    assert_eq!(ctx.status(), Some(StatusCode::UNAUTHORIZED));
    let envelope = ctx.response().unwrap();
    assert_eq!(envelope["error"]["code"], json!("AUTHENTICATION_ERROR"));
    assert_eq!(
        envelope["request_id"],
        json!(ctx.request_id().to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn test_timeout_from_config() {
    let config = load(
        r#"
        [pipeline]
        recover_errors = true
        timeout_ms = 50

        [pipeline.responder]
        latency_ms = 5000
        "#,
    );
    let chain = standard_pipeline(&config.pipeline);
    let mut ctx = RequestContext::new(Method::GET, "/")
        .with_header("Authorization", "Bearer valid-token-123");

    chain.run(&mut ctx).await.unwrap();

    assert_eq!(ctx.status(), Some(StatusCode::GATEWAY_TIMEOUT));
}

#[tokio::test(start_paused = true)]
async fn test_configured_fields_accept_whitespace_and_skip_null_bodies() {
    let chain = standard_pipeline(&PipelineConfig::default());

    let mut spaced = RequestContext::new(Method::POST, "/api/users")
        .with_header("Authorization", "Bearer valid-token-123")
        .with_body(json!({ "name": "  " }));
    chain.run(&mut spaced).await.unwrap();
    assert_eq!(spaced.status(), Some(StatusCode::OK));

    let mut null_body = RequestContext::new(Method::POST, "/api/users")
        .with_header("Authorization", "Bearer valid-token-123")
        .with_body(json!(null));
    chain.run(&mut null_body).await.unwrap();
    assert_eq!(null_body.status(), Some(StatusCode::OK));
    assert_eq!(null_body.response().unwrap()["message"], json!("Hello User!"));
}
