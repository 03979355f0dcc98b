//! # Strata Core
//!
//! Core types shared by every Strata crate.
//!
//! This crate provides the foundational types used throughout Strata:
//!
//! - [`ChainFault`] - Chain-integrity faults raised by the dispatcher itself
//! - [`StrataError`] - Standard domain error type raised by handlers
//! - [`ErrorCategory`] - Error classification with default HTTP status codes
//! - [`RequestId`] - UUID v7 request identifier

#![doc(html_root_url = "https://docs.rs/strata-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;

pub use context::RequestId;
pub use error::{
    ChainFault, ErrorCategory, ErrorDetail, ErrorEnvelope, FieldErrors, StrataError, StrataResult,
};
