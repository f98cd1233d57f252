//! Unified application error types for BoxOffice.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested resource was not found.
    NotFound,
    /// Lock acquisition failed within its wait budget.
    LockUnavailable,
    /// The admission token does not exist.
    TokenNotFound,
    /// The admission token is not in the state required for the operation.
    TokenNotActive,
    /// The seat is not available for a hold.
    SeatUnavailable,
    /// The reservation hold has already expired.
    ReservationExpired,
    /// The reservation is not in the state required for the transition.
    InvalidReservationState,
    /// A store (key-value backend) error occurred.
    Store,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::LockUnavailable => write!(f, "LOCK_UNAVAILABLE"),
            Self::TokenNotFound => write!(f, "TOKEN_NOT_FOUND"),
            Self::TokenNotActive => write!(f, "TOKEN_NOT_ACTIVE"),
            Self::SeatUnavailable => write!(f, "SEAT_UNAVAILABLE"),
            Self::ReservationExpired => write!(f, "RESERVATION_EXPIRED"),
            Self::InvalidReservationState => write!(f, "INVALID_RESERVATION_STATE"),
            Self::Store => write!(f, "STORE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout BoxOffice.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls. This provides a single error type for
/// the entire application boundary, while `kind` keeps contention failures
/// (`LockUnavailable`, `SeatUnavailable`) distinguishable from not-found
/// and invalid-state failures at the HTTP mapping layer.
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

    /// Create a lock-unavailable error naming the keys that could not be acquired.
    pub fn lock_unavailable(keys: &[String]) -> Self {
        Self::new(
            ErrorKind::LockUnavailable,
            format!("Failed to acquire lock on keys: {}", keys.join(", ")),
        )
    }

    /// Create a token-not-found error.
    pub fn token_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TokenNotFound, message)
    }

    /// Create a token-not-active error.
    pub fn token_not_active(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TokenNotActive, message)
    }

    /// Create a seat-unavailable error.
    pub fn seat_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SeatUnavailable, message)
    }

    /// Create a reservation-expired error.
    pub fn reservation_expired(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ReservationExpired, message)
    }

    /// Create an invalid-reservation-state error.
    pub fn invalid_reservation_state(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidReservationState, message)
    }

    /// Create a store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Store, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
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
