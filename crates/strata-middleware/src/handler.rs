//! Core handler trait and the continuation passed to it.
//!
//! This module defines the [`Handler`] trait that every chain element
//! implements, and [`Next`], the continuation a handler invokes to run the
//! remainder of the chain.
//!
//! # Example
//!
//! ```
//! use strata_middleware::{BoxFuture, Handler, Next, StrataError};
//!
//! struct Greeting {
//!     lines: Vec<String>,
//! }
//!
//! struct Announce;
//!
//! impl Handler<Greeting> for Announce {
//!     fn name(&self) -> &'static str {
//!         "announce"
//!     }
//!
//!     fn call<'a>(
//!         &'a self,
//!         ctx: &'a mut Greeting,
//!         next: Next<'a, Greeting>,
//!     ) -> BoxFuture<'a, Result<(), StrataError>> {
//!         Box::pin(async move {
//!             ctx.lines.push("hello".to_string());
//!             next.run(ctx).await?;
//!             ctx.lines.push("goodbye".to_string());
//!             Ok(())
//!         })
//!     }
//! }
//! ```

use crate::cursor::Cursor;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use strata_core::{ChainFault, StrataError};
use tracing::trace;

/// A boxed future, `Send` so chains can run on a multi-threaded runtime.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A type-erased handler, shared between every execution of a chain.
pub(crate) type BoxedHandler<C, E> = Arc<dyn Handler<C, E>>;

/// One element of a handler chain.
///
/// A handler receives the shared context and a [`Next`] continuation. It may:
///
/// - read or mutate the context, then call `next.run(ctx).await` to run the
///   rest of the chain, then read or mutate the context again;
/// - return without calling `next`, which ends the chain early;
/// - return `Err`, which unwinds through every enclosing handler.
///
/// # Invariants
///
/// - A handler MUST NOT invoke its continuation more than once. Doing so is a
///   [`ChainFault`] and fails the whole execution.
/// - Errors from `next` SHOULD be propagated with `?`. A handler that wants to
///   recover must match on the result explicitly.
pub trait Handler<C, E = StrataError>: Send + Sync + 'static {
    /// Returns the name of this handler, used in diagnostics.
    fn name(&self) -> &'static str;

    /// Runs this handler against `ctx`.
    fn call<'a>(&'a self, ctx: &'a mut C, next: Next<'a, C, E>) -> BoxFuture<'a, Result<(), E>>;
}

/// Continuation that runs the remainder of the chain.
///
/// `run` consumes the continuation. A handler that clones it and invokes both
/// copies trips the per-execution cursor, which fails the execution with
/// [`ChainFault::ContinuationReused`].
pub struct Next<'a, C, E = StrataError> {
    handlers: &'a [BoxedHandler<C, E>],
    index: usize,
    cursor: &'a Cursor,
}

impl<'a, C, E> Next<'a, C, E> {
    pub(crate) const fn new(handlers: &'a [BoxedHandler<C, E>], index: usize, cursor: &'a Cursor) -> Self {
        Self {
            handlers,
            index,
            cursor,
        }
    }

    /// The chain position this continuation advances to.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.index
    }

    /// Number of handlers that would still run, including the one at
    /// [`position`](Self::position).
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.handlers.len().saturating_sub(self.index)
    }

    /// Returns `true` if invoking this continuation would only exhaust the chain.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.remaining() == 0
    }
}

impl<'a, C, E> Next<'a, C, E>
where
    C: Send + 'static,
    E: From<ChainFault> + Send + 'static,
{
    /// Runs the remainder of the chain.
    ///
    /// Resolves once every downstream handler, including its post-continuation
    /// code, has completed. Reaching the end of the chain resolves `Ok(())`.
    pub async fn run(self, ctx: &mut C) -> Result<(), E> {
        self.cursor.advance(self.index)?;

        let Some(handler) = self.handlers.get(self.index) else {
            trace!(position = self.index, "chain exhausted");
            return Ok(());
        };

        trace!(handler = handler.name(), position = self.index, "entering handler");
        let next = Next::new(self.handlers, self.index + 1, self.cursor);
        handler.call(ctx, next).await
    }
}

impl<C, E> Clone for Next<'_, C, E> {
    fn clone(&self) -> Self {
        Self {
            handlers: self.handlers,
            index: self.index,
            cursor: self.cursor,
        }
    }
}

impl<C, E> fmt::Debug for Next<'_, C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("position", &self.index)
            .field("remaining", &self.remaining())
            .finish()
    }
}

/// A handler built from a closure.
///
/// This allows defining simple handlers without implementing the trait
/// directly. The closure must return a boxed future borrowing the context:
///
/// ```
/// use strata_middleware::{handler_fn, Dispatcher, Next};
///
/// struct Counter(u32);
///
/// let mut chain: Dispatcher<Counter> = Dispatcher::new();
/// chain.register(handler_fn("bump", |ctx: &mut Counter, next: Next<'_, Counter>| {
///     Box::pin(async move {
///         ctx.0 += 1;
///         next.run(ctx).await
///     })
/// }));
/// assert_eq!(chain.len(), 1);
/// ```
pub struct FnHandler<F> {
    name: &'static str,
    func: F,
}

impl<F> FnHandler<F> {
    /// Wraps `func` as a handler named `name`.
    ///
    /// Prefer [`handler_fn`] or [`Dispatcher::register_fn`](crate::Dispatcher::register_fn)
    /// for closures; they carry the signature bound that lets the compiler
    /// infer the closure's argument types.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").field("name", &self.name).finish()
    }
}

impl<C, E, F> Handler<C, E> for FnHandler<F>
where
    F: for<'a> Fn(&'a mut C, Next<'a, C, E>) -> BoxFuture<'a, Result<(), E>>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn call<'a>(&'a self, ctx: &'a mut C, next: Next<'a, C, E>) -> BoxFuture<'a, Result<(), E>> {
        (self.func)(ctx, next)
    }
}

/// Creates a handler from a closure.
pub fn handler_fn<C, E, F>(name: &'static str, func: F) -> FnHandler<F>
where
    F: for<'a> Fn(&'a mut C, Next<'a, C, E>) -> BoxFuture<'a, Result<(), E>>
        + Send
        + Sync
        + 'static,
{
    FnHandler::new(name, func)
}
