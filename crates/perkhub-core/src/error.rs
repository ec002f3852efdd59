//! Unified application error types for PerkHub.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. The kind set carries the workflow
//! conflict taxonomy (enrollment and ledger conflicts are first-class
//! kinds, not generic 409s) so that callers can branch on a stable code.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested resource was not found.
    NotFound,
    /// A required identifier or field was missing or malformed.
    InvalidParameters,
    /// An enrollment invite already has a pending approval request.
    AlreadyPending,
    /// The customer is already actively enrolled in the program.
    AlreadyEnrolled,
    /// The approval request was already resolved.
    AlreadyProcessed,
    /// The approval request expired before it was answered.
    Expired,
    /// The customer has no active enrollment in the program.
    NotEnrolled,
    /// The enrollment's balance cannot cover the requested redemption.
    InsufficientPoints,
    /// A transient storage failure occurred.
    Storage,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// A remote ledger/API call failed.
    ExternalService,
    /// An internal error occurred.
    Internal,
}

impl ErrorKind {
    /// Whether an operation failing with this kind may be retried.
    ///
    /// Only transient storage failures are retryable, and only for
    /// idempotent reads at the store boundary. All workflow conflicts
    /// are surfaced to the caller as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage)
    }

    /// Whether this kind represents a user-facing workflow conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::AlreadyPending
                | Self::AlreadyEnrolled
                | Self::AlreadyProcessed
                | Self::Expired
                | Self::NotEnrolled
                | Self::InsufficientPoints
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::InvalidParameters => write!(f, "INVALID_PARAMETERS"),
            Self::AlreadyPending => write!(f, "ALREADY_PENDING"),
            Self::AlreadyEnrolled => write!(f, "ALREADY_ENROLLED"),
            Self::AlreadyProcessed => write!(f, "ALREADY_PROCESSED"),
            Self::Expired => write!(f, "EXPIRED"),
            Self::NotEnrolled => write!(f, "NOT_ENROLLED"),
            Self::InsufficientPoints => write!(f, "INSUFFICIENT_POINTS"),
            Self::Storage => write!(f, "STORAGE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::ExternalService => write!(f, "EXTERNAL_SERVICE"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout PerkHub.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls. Every public operation returns a stable
/// [`ErrorKind`] plus a human-readable message; nothing panics across the
/// public boundary.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create an invalid-parameters error.
    pub fn invalid_parameters(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidParameters, message)
    }

    /// Create an already-pending conflict.
    pub fn already_pending(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AlreadyPending, message)
    }

    /// Create an already-enrolled conflict.
    pub fn already_enrolled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AlreadyEnrolled, message)
    }

    /// Create an already-processed conflict.
    pub fn already_processed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AlreadyProcessed, message)
    }

    /// Create an expired-request conflict.
    pub fn expired(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Expired, message)
    }

    /// Create a not-enrolled conflict.
    pub fn not_enrolled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotEnrolled, message)
    }

    /// Create an insufficient-points conflict.
    pub fn insufficient_points(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InsufficientPoints, message)
    }

    /// Create a transient storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an external-service error.
    pub fn external_service(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExternalService, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_display_is_stable() {
        assert_eq!(ErrorKind::NotEnrolled.to_string(), "NOT_ENROLLED");
        assert_eq!(ErrorKind::AlreadyProcessed.to_string(), "ALREADY_PROCESSED");
        assert_eq!(ErrorKind::InsufficientPoints.to_string(), "INSUFFICIENT_POINTS");
    }

    #[test]
    fn test_only_storage_is_retryable() {
        assert!(ErrorKind::Storage.is_retryable());
        assert!(!ErrorKind::AlreadyProcessed.is_retryable());
        assert!(!ErrorKind::NotFound.is_retryable());
    }

    #[test]
    fn test_clone_drops_source() {
        let err = AppError::with_source(
            ErrorKind::Storage,
            "query failed",
            std::io::Error::new(std::io::ErrorKind::Other, "boom"),
        );
        let cloned = err.clone();
        assert_eq!(cloned.kind, ErrorKind::Storage);
        assert!(cloned.source.is_none());
    }
}
