//! Error types for Strata.
//!
//! Two families of errors flow through a handler chain:
//!
//! - [`ChainFault`] - the chain itself was misused (a continuation was invoked
//!   more than once). These are programmer errors and are always fatal to the
//!   execution that raised them.
//! - [`StrataError`] - domain errors raised by handlers ("unauthorized",
//!   "validation failed", "rate limited", ...). They propagate unchanged to
//!   the caller unless an enclosing handler explicitly recovers.
//!
//! [`StrataError`] also wraps [`ChainFault`] so that a single error type can be
//! used end to end.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias using [`StrataError`].
pub type StrataResult<T> = Result<T, StrataError>;

/// A violation of chain integrity.
///
/// Raised by the dispatcher, never by handlers.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainFault {
    /// A continuation was invoked more than once, trying to re-enter a chain
    /// position that had already been reached.
    #[error("next() called multiple times (chain position {index} was already reached)")]
    ContinuationReused {
        /// The chain position the second invocation tried to advance to.
        index: usize,
    },
}

impl ChainFault {
    /// Returns the chain position involved in the fault.
    #[must_use]
    pub const fn index(&self) -> usize {
        match self {
            Self::ContinuationReused { index } => *index,
        }
    }
}

/// Categories of errors for classification and handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Request validation errors (invalid input, missing fields).
    Validation,
    /// Authentication errors (invalid/missing credentials).
    Authentication,
    /// Authorization errors (permission denied).
    Authorization,
    /// Rate limiting.
    RateLimited,
    /// The downstream chain did not settle in time.
    Timeout,
    /// Internal errors, including chain faults.
    Internal,
}

impl ErrorCategory {
    /// Returns the default HTTP status code for this error category.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::Authentication => StatusCode::UNAUTHORIZED,
            Self::Authorization => StatusCode::FORBIDDEN,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Standard error type for Strata handlers.
///
/// # Example
///
/// ```
/// use strata_core::{StrataError, ErrorCategory};
///
/// fn check_token(token: Option<&str>) -> Result<(), StrataError> {
///     if token.is_none() {
///         return Err(StrataError::authentication("Unauthorized"));
///     }
///     Ok(())
/// }
///
/// let err = check_token(None).unwrap_err();
/// assert_eq!(err.category(), ErrorCategory::Authentication);
/// ```
#[derive(Error, Debug)]
pub enum StrataError {
    /// The chain was misused by a handler.
    #[error(transparent)]
    Chain(#[from] ChainFault),

    /// Request validation failed.
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable error message.
        message: String,
        /// Field-specific validation errors.
        #[source]
        field_errors: Option<FieldErrors>,
    },

    /// Authentication failed.
    #[error("Authentication error: {message}")]
    Authentication {
        /// Human-readable error message.
        message: String,
    },

    /// Authorization denied.
    #[error("Authorization denied: {message}")]
    Authorization {
        /// Human-readable error message.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limited: {message}")]
    RateLimited {
        /// Human-readable error message.
        message: String,
        /// Seconds until the caller may retry.
        retry_after_seconds: Option<u64>,
    },

    /// The downstream chain did not settle in time.
    #[error("Timeout: {message}")]
    Timeout {
        /// Human-readable error message.
        message: String,
    },

    /// Internal error.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error (not exposed in envelopes).
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl StrataError {
    /// Creates a validation error with a message.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field_errors: None,
        }
    }

    /// Creates a validation error with field-specific errors.
    #[must_use]
    pub fn validation_with_fields(message: impl Into<String>, field_errors: FieldErrors) -> Self {
        Self::Validation {
            message: message.into(),
            field_errors: Some(field_errors),
        }
    }

    /// Creates an authentication error.
    #[must_use]
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Creates an authorization error.
    #[must_use]
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
        }
    }

    /// Creates a rate limited error.
    #[must_use]
    pub fn rate_limited(message: impl Into<String>, retry_after_seconds: Option<u64>) -> Self {
        Self::RateLimited {
            message: message.into(),
            retry_after_seconds,
        }
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the chain fault if this error is one.
    #[must_use]
    pub const fn as_fault(&self) -> Option<&ChainFault> {
        match self {
            Self::Chain(fault) => Some(fault),
            _ => None,
        }
    }

    /// Returns `true` if this error is a chain fault rather than a domain error.
    #[must_use]
    pub const fn is_fault(&self) -> bool {
        matches!(self, Self::Chain(_))
    }

    /// Returns the human-readable message without the category prefix.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Chain(fault) => fault.to_string(),
            Self::Validation { message, .. }
            | Self::Authentication { message }
            | Self::Authorization { message }
            | Self::RateLimited { message, .. }
            | Self::Timeout { message }
            | Self::Internal { message, .. } => message.clone(),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::Authentication { .. } => ErrorCategory::Authentication,
            Self::Authorization { .. } => ErrorCategory::Authorization,
            Self::RateLimited { .. } => ErrorCategory::RateLimited,
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::Chain(_) | Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.category().default_status_code()
    }

    /// Converts this error to a serializable error envelope.
    #[must_use]
    pub fn to_envelope(&self, request_id: Option<&str>) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.message(),
                category: self.category(),
                details: self.error_details(),
            },
            request_id: request_id.map(ToString::to_string),
        }
    }

    /// Returns a machine-readable error code.
    const fn error_code(&self) -> &'static str {
        match self {
            Self::Chain(_) => "CHAIN_FAULT",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Authentication { .. } => "AUTHENTICATION_ERROR",
            Self::Authorization { .. } => "AUTHORIZATION_DENIED",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::Timeout { .. } => "TIMEOUT",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    fn error_details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Validation {
                field_errors: Some(errors),
                ..
            } => serde_json::to_value(errors).ok(),
            Self::RateLimited {
                retry_after_seconds: Some(seconds),
                ..
            } => Some(serde_json::json!({
                "retry_after_seconds": seconds
            })),
            Self::Chain(fault) => Some(serde_json::json!({
                "index": fault.index()
            })),
            _ => None,
        }
    }
}

/// Field-specific validation errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("Field validation errors")]
pub struct FieldErrors {
    /// Map of field name to list of error messages.
    pub fields: HashMap<String, Vec<String>>,
}

impl FieldErrors {
    /// Creates a new empty `FieldErrors`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an error for a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Returns the messages recorded for `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    /// Returns `true` if there are no field errors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the number of fields with errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

/// Serializable error envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorDetail,
    /// The request ID for correlation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Error detail within an envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Error category.
    pub category: ErrorCategory,
    /// Additional error details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_fault_display() {
        let fault = ChainFault::ContinuationReused { index: 3 };
        assert!(fault.to_string().contains("called multiple times"));
        assert_eq!(fault.index(), 3);
    }

    #[test]
    fn test_chain_fault_converts_into_strata_error() {
        let err: StrataError = ChainFault::ContinuationReused { index: 1 }.into();
        assert!(err.is_fault());
        assert_eq!(err.category(), ErrorCategory::Internal);
        assert_eq!(
            err.as_fault(),
            Some(&ChainFault::ContinuationReused { index: 1 })
        );
        assert!(err.to_string().contains("called multiple times"));
    }

    #[test]
    fn test_authentication_error() {
        let error = StrataError::authentication("Unauthorized");
        assert_eq!(error.category(), ErrorCategory::Authentication);
        assert_eq!(error.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(error.message(), "Unauthorized");
        assert_eq!(error.to_string(), "Authentication error: Unauthorized");
        assert!(!error.is_fault());
    }

    #[test]
    fn test_validation_error_with_fields() {
        let mut field_errors = FieldErrors::new();
        field_errors.add("name", "name: This field is required");
        field_errors.add("email", "Invalid email");

        let error = StrataError::validation_with_fields("Validation failed", field_errors);
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);

        let envelope = error.to_envelope(Some("req-123"));
        let details = envelope.error.details.unwrap();
        assert_eq!(details["fields"]["email"][0], "Invalid email");
    }

    #[test]
    fn test_rate_limited_envelope() {
        let error = StrataError::rate_limited("Rate limit exceeded", Some(60));
        assert_eq!(error.status_code(), StatusCode::TOO_MANY_REQUESTS);

        let envelope = error.to_envelope(None);
        assert_eq!(envelope.error.code, "RATE_LIMITED");
        assert_eq!(envelope.error.details.unwrap()["retry_after_seconds"], 60);
    }

    #[test]
    fn test_internal_with_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let error = StrataError::internal_with_source("storage failed", io);
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_error_envelope_serialization() {
        let error = StrataError::authorization("Forbidden");
        let envelope = error.to_envelope(Some("req-456"));

        let json = serde_json::to_string(&envelope).expect("serialization should work");
        assert!(json.contains("\"code\":\"AUTHORIZATION_DENIED\""));
        assert!(json.contains("\"message\":\"Forbidden\""));
        assert!(json.contains("\"request_id\":\"req-456\""));
        assert!(json.contains("\"category\":\"authorization\""));
    }

    #[test]
    fn test_field_errors() {
        let mut errors = FieldErrors::new();
        assert!(errors.is_empty());

        errors.add("email", "Invalid format");
        errors.add("email", "Required");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("email").map(<[String]>::len), Some(2));
        assert!(errors.get("name").is_none());
    }

    #[test]
    fn test_all_error_categories_have_error_status_codes() {
        let categories = [
            ErrorCategory::Validation,
            ErrorCategory::Authentication,
            ErrorCategory::Authorization,
            ErrorCategory::RateLimited,
            ErrorCategory::Timeout,
            ErrorCategory::Internal,
        ];

        for category in categories {
            let status = category.default_status_code();
            assert!(
                status.is_client_error() || status.is_server_error(),
                "Category {:?} should map to error status code, got {}",
                category,
                status
            );
        }
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn message_round_trips_through_envelope(message in "[a-zA-Z0-9 ]{1,40}") {
                let error = StrataError::validation(message.clone());
                let envelope = error.to_envelope(None);
                prop_assert_eq!(envelope.error.message, message);
            }
        }
    }
}
