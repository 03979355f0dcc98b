//! # Strata Middleware
//!
//! An ordered, reusable chain of asynchronous handlers executed with
//! onion-style control flow.
//!
//! Each handler receives the shared context and a [`Next`] continuation. Code
//! before `next.run(ctx).await` runs in registration order; code after it runs
//! in reverse registration order, once everything further down the chain has
//! completed:
//!
//! ```text
//! run(ctx) ─▶ h0 before ─▶ h1 before ─▶ h2 before ─┐
//!                                                  │ (chain exhausted)
//! Ok(())  ◀─ h0 after  ◀─ h1 after  ◀─ h2 after  ◀─┘
//! ```
//!
//! ## Key Properties
//!
//! - **Ordered**: registration order is execution order, for every run
//! - **Short-circuit**: a handler that never calls `next` ends the chain
//! - **Failure propagation**: an `Err` unwinds through every enclosing handler
//!   untouched, unless one of them inspects and recovers it
//! - **Single advance**: calling a continuation twice is a [`ChainFault`] that
//!   always reaches the caller of [`Dispatcher::run`]
//! - **Reusable**: every run gets its own cursor, so concurrent runs over one
//!   dispatcher do not interfere
//!
//! ## Example
//!
//! ```
//! use strata_middleware::{Dispatcher, StrataError};
//!
//! #[derive(Default)]
//! struct Trace {
//!     events: Vec<&'static str>,
//! }
//!
//! # tokio_test::block_on(async {
//! let mut chain: Dispatcher<Trace> = Dispatcher::new();
//! chain
//!     .register_fn("outer", |ctx, next| {
//!         Box::pin(async move {
//!             ctx.events.push("outer before");
//!             next.run(ctx).await?;
//!             ctx.events.push("outer after");
//!             Ok(())
//!         })
//!     })
//!     .register_fn("inner", |ctx, _next| {
//!         Box::pin(async move {
//!             ctx.events.push("inner");
//!             Ok::<_, StrataError>(())
//!         })
//!     });
//!
//! let mut trace = Trace::default();
//! chain.run(&mut trace).await.unwrap();
//! assert_eq!(trace.events, ["outer before", "inner", "outer after"]);
//! # });
//! ```
//!
//! ## Stock Stages
//!
//! The [`stages`] module ships handlers for a request-processing pipeline over
//! [`RequestContext`]: logging, rate limiting, authentication, validation,
//! authorization, a terminal responder, plus generic timeout and recovery
//! wrappers.

#![doc(html_root_url = "https://docs.rs/strata-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
mod cursor;
pub mod dispatcher;
pub mod handler;
pub mod rules;
pub mod stages;

// Re-export main types at crate root
pub use context::RequestContext;
pub use dispatcher::Dispatcher;
pub use handler::{handler_fn, BoxFuture, FnHandler, Handler, Next};
pub use strata_core::{ChainFault, StrataError};
