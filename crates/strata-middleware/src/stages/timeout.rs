//! Timeout wrapper.
//!
//! The dispatcher imposes no deadline of its own. [`TimeoutHandler`] bounds
//! how long the rest of the chain may take by racing its continuation against
//! a timer. It works with any context and any error type that can represent a
//! [`StrataError`].

use crate::handler::{BoxFuture, Handler, Next};
use std::time::Duration;
use strata_core::{ChainFault, StrataError};
use tracing::warn;

/// Handler that fails the chain if its continuation does not settle in time.
///
/// On expiry the in-flight continuation is dropped and the handler fails with
/// [`StrataError::Timeout`], converted into the chain's error type.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use strata_middleware::stages::TimeoutHandler;
/// use strata_middleware::Dispatcher;
///
/// struct Job;
///
/// let chain: Dispatcher<Job> = Dispatcher::new()
///     .with(TimeoutHandler::new(Duration::from_secs(5)));
/// assert_eq!(chain.handler_names(), ["timeout"]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TimeoutHandler {
    duration: Duration,
}

impl TimeoutHandler {
    /// Creates a handler allowing `duration` for the rest of the chain.
    #[must_use]
    pub const fn new(duration: Duration) -> Self {
        Self { duration }
    }

    /// Returns the allowed duration.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }
}

impl<C, E> Handler<C, E> for TimeoutHandler
where
    C: Send + 'static,
    E: From<ChainFault> + From<StrataError> + Send + 'static,
{
    fn name(&self) -> &'static str {
        "timeout"
    }

    fn call<'a>(&'a self, ctx: &'a mut C, next: Next<'a, C, E>) -> BoxFuture<'a, Result<(), E>> {
        Box::pin(async move {
            if let Ok(outcome) = tokio::time::timeout(self.duration, next.run(ctx)).await {
                return outcome;
            }

            let millis = u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX);
            warn!(timeout_ms = millis, "chain did not settle in time");
            Err(E::from(StrataError::timeout(format!(
                "chain did not settle within {millis}ms"
            ))))
        })
    }
}
