//! Request pipeline demo.
//!
//! Builds the stock pipeline from configuration and runs three requests
//! through it: one that succeeds, one without a token, and one whose body
//! fails validation.
//!
//! Configuration is read from an optional `strata.toml`, a `.env` file and
//! `STRATA__*` environment variables:
//!
//! ```text
//! STRATA__TELEMETRY__LOGGING__FORMAT=pretty cargo run -p request-pipeline
//! ```

use anyhow::Context as _;
use http::Method;
use serde_json::json;
use strata::prelude::*;
use tracing::{info, warn};

struct Scenario {
    title: &'static str,
    request: RequestContext,
}

fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            title: "Successful request",
            request: RequestContext::new(Method::POST, "/api/users")
                .with_header("Authorization", "Bearer valid-token-123")
                .with_header("Content-Type", "application/json")
                .with_body(json!({ "name": "John Doe", "email": "john@example.com" }))
                .with_request_count(5),
        },
        Scenario {
            title: "Missing authentication",
            request: RequestContext::new(Method::POST, "/api/users")
                .with_header("Content-Type", "application/json")
                .with_body(json!({ "name": "Jane Doe" }))
                .with_request_count(1),
        },
        Scenario {
            title: "Validation failure",
            request: RequestContext::new(Method::POST, "/api/users")
                .with_header("Authorization", "Bearer valid-token-123")
                .with_header("Content-Type", "application/json")
                .with_body(json!({ "email": "test@example.com" }))
                .with_request_count(3),
        },
    ]
}

fn print_outcome(ctx: &RequestContext, outcome: &Result<(), StrataError>) -> anyhow::Result<()> {
    match outcome {
        Ok(()) => println!("Outcome: ok"),
        Err(err) => println!("Outcome: {err}"),
    }
    let status = ctx.status().map_or(200, |status| status.as_u16());
    println!("Status: {status}");
    if let Some(response) = ctx.response() {
        let body = serde_json::to_string_pretty(response).context("encoding response")?;
        println!("Response: {body}");
    }
    println!("Logs:");
    for line in ctx.logs() {
        println!("  {line}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::new()
        .with_optional_file("strata.toml")?
        .with_dotenv()?
        .with_env_prefix("STRATA")
        .load()
        .context("loading configuration")?;

    let log_config = config.telemetry.log_config();
    init_logging(&log_config).context("initializing logging")?;
    let _service = strata::telemetry::service_span(&log_config).entered();

    let chain = standard_pipeline(&config.pipeline);
    info!(handlers = ?chain.handler_names(), "pipeline ready");

    for (number, Scenario { title, mut request }) in scenarios().into_iter().enumerate() {
        println!("=== Scenario {}: {title} ===", number + 1);
        let outcome = chain.run(&mut request).await;
        if let Err(err) = &outcome {
            if err.is_fault() {
                warn!(error = %err, "pipeline misbehaved");
            }
        }
        print_outcome(&request, &outcome)?;
        println!();
    }

    Ok(())
}
