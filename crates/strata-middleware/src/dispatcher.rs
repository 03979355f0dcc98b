//! Ordered handler chain and its execution.
//!
//! A [`Dispatcher`] owns the registered handlers. Registration takes
//! `&mut self` and execution takes `&self`, so the chain is frozen for as long
//! as any run is in flight. Each call to [`Dispatcher::run`] creates its own
//! cursor; a dispatcher shared behind an `Arc` can serve many concurrent runs.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use strata_middleware::{Dispatcher, StrataError};
//!
//! #[derive(Default)]
//! struct Tally {
//!     seen: u32,
//! }
//!
//! # tokio_test::block_on(async {
//! let mut chain: Dispatcher<Tally> = Dispatcher::new();
//! chain.register_fn("count", |ctx, next| {
//!     Box::pin(async move {
//!         ctx.seen += 1;
//!         next.run(ctx).await
//!     })
//! });
//! let chain = Arc::new(chain);
//!
//! let mut first = Tally::default();
//! let mut second = Tally::default();
//! chain.run(&mut first).await?;
//! chain.run(&mut second).await?;
//! assert_eq!((first.seen, second.seen), (1, 1));
//! # Ok::<(), StrataError>(())
//! # }).unwrap();
//! ```

use crate::cursor::Cursor;
use crate::handler::{BoxFuture, BoxedHandler, FnHandler, Handler, Next};
use std::fmt;
use std::sync::Arc;
use strata_core::{ChainFault, StrataError};
use tracing::{debug, trace};

/// An ordered, reusable chain of handlers over a context of type `C`.
///
/// `E` is the error type handlers return. It must be able to represent a
/// [`ChainFault`], which the dispatcher raises when a continuation is invoked
/// more than once.
pub struct Dispatcher<C, E = StrataError> {
    handlers: Vec<BoxedHandler<C, E>>,
}

impl<C, E> Dispatcher<C, E>
where
    C: Send + 'static,
    E: From<ChainFault> + Send + 'static,
{
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Appends a handler to the end of the chain.
    ///
    /// The same handler type may be registered any number of times; every
    /// registration occupies its own position.
    pub fn register(&mut self, handler: impl Handler<C, E>) -> &mut Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    /// Appends an already shared handler to the end of the chain.
    pub fn register_shared(&mut self, handler: Arc<dyn Handler<C, E>>) -> &mut Self {
        self.handlers.push(handler);
        self
    }

    /// Appends a closure handler to the end of the chain.
    pub fn register_fn<F>(&mut self, name: &'static str, func: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut C, Next<'a, C, E>) -> BoxFuture<'a, Result<(), E>>
            + Send
            + Sync
            + 'static,
    {
        self.register(FnHandler::new(name, func))
    }

    /// Builder-style variant of [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, handler: impl Handler<C, E>) -> Self {
        self.register(handler);
        self
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Returns the names of all handlers in execution order.
    #[must_use]
    pub fn handler_names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|handler| handler.name()).collect()
    }

    /// Runs the chain over `ctx`.
    ///
    /// Resolves `Ok(())` once every handler that ran has finished, including
    /// its post-continuation code. Fails with the first error a handler returns
    /// and no enclosing handler recovers, unchanged.
    ///
    /// If any continuation was invoked more than once, the run fails with the
    /// resulting [`ChainFault`] even when the offending handler ignored the
    /// error its second call returned.
    pub async fn run(&self, ctx: &mut C) -> Result<(), E> {
        let cursor = Cursor::new();
        let outcome = Next::new(&self.handlers, 0, &cursor).run(ctx).await;

        if let Some(fault) = cursor.fault() {
            debug!(
                position = fault.index(),
                "chain fault: continuation invoked more than once"
            );
            return Err(E::from(fault));
        }

        trace!(reached = ?cursor.highest(), ok = outcome.is_ok(), "chain settled");
        outcome
    }
}

impl<C, E> Default for Dispatcher<C, E>
where
    C: Send + 'static,
    E: From<ChainFault> + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<C, E> Clone for Dispatcher<C, E> {
    fn clone(&self) -> Self {
        Self {
            handlers: self.handlers.clone(),
        }
    }
}

impl<C: 'static, E: 'static> fmt::Debug for Dispatcher<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.handlers.iter().map(|handler| handler.name()).collect();
        f.debug_struct("Dispatcher").field("handlers", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct Log(Vec<String>);

    /// Pushes `<name> before`, continues, then pushes `<name> after`.
    struct Layer(&'static str);

    impl Handler<Log> for Layer {
        fn name(&self) -> &'static str {
            self.0
        }

        fn call<'a>(&'a self, ctx: &'a mut Log, next: Next<'a, Log>) -> BoxFuture<'a, Result<(), StrataError>> {
            Box::pin(async move {
                ctx.0.push(format!("{} before", self.0));
                next.run(ctx).await?;
                ctx.0.push(format!("{} after", self.0));
                Ok(())
            })
        }
    }

    #[tokio::test]
    async fn test_empty_chain_succeeds() {
        let chain: Dispatcher<Log> = Dispatcher::new();
        let mut log = Log::default();
        assert!(chain.is_empty());
        chain.run(&mut log).await.unwrap();
        assert!(log.0.is_empty());
    }

    #[tokio::test]
    async fn test_onion_order() {
        let chain: Dispatcher<Log> = Dispatcher::new()
            .with(Layer("a"))
            .with(Layer("b"))
            .with(Layer("c"));

        let mut log = Log::default();
        chain.run(&mut log).await.unwrap();
        assert_eq!(
            log.0,
            ["a before", "b before", "c before", "c after", "b after", "a after"]
        );
    }

    #[test]
    fn test_handler_names_and_debug() {
        let mut chain: Dispatcher<Log> = Dispatcher::new();
        chain.register(Layer("a")).register(Layer("a")).register(Layer("b"));

        assert_eq!(chain.len(), 3);
        assert_eq!(chain.handler_names(), ["a", "a", "b"]);
        assert!(format!("{chain:?}").contains("\"b\""));
    }

    #[tokio::test]
    async fn test_duplicate_registration_runs_each_position() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let shared: Arc<dyn Handler<Log>> = Arc::new(crate::handler_fn(
            "count",
            move |ctx: &mut Log, next: Next<'_, Log>| {
                counter.fetch_add(1, Ordering::SeqCst);
                Box::pin(async move { next.run(ctx).await })
            },
        ));

        let mut chain: Dispatcher<Log> = Dispatcher::new();
        chain
            .register_shared(Arc::clone(&shared))
            .register_shared(Arc::clone(&shared))
            .register_shared(shared);

        chain.run(&mut Log::default()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_clone_shares_handlers() {
        let chain: Dispatcher<Log> = Dispatcher::new().with(Layer("only"));
        let copy = chain.clone();

        let mut log = Log::default();
        copy.run(&mut log).await.unwrap();
        assert_eq!(log.0, ["only before", "only after"]);
    }

    #[tokio::test]
    async fn test_swallowed_fault_still_fails_run() {
        let mut chain: Dispatcher<Log> = Dispatcher::new();
        chain
            .register_fn("sloppy", |ctx, next| {
                Box::pin(async move {
                    next.clone().run(ctx).await?;
                    // Second call faults; the handler discards the error.
                    let _ = next.run(ctx).await;
                    ctx.0.push("sloppy after".to_string());
                    Ok(())
                })
            })
            .register(Layer("inner"));

        let mut log = Log::default();
        let err = chain.run(&mut log).await.unwrap_err();
        assert_eq!(err.as_fault(), Some(&ChainFault::ContinuationReused { index: 1 }));
        // The inner handler ran once only.
        assert_eq!(
            log.0,
            ["inner before", "inner after", "sloppy after"]
        );
    }
}
