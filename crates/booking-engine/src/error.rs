//! Error types for booking-engine operations.

use thiserror::Error;

/// Failure reported by a catalog, ledger or blackout backend.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{backend}: {message}")]
pub struct StoreError {
    /// Which backend failed (e.g. "reservations", "catalog").
    pub backend: &'static str,
    pub message: String,
}

impl StoreError {
    pub fn new(backend: &'static str, message: impl Into<String>) -> Self {
        Self {
            backend,
            message: message.into(),
        }
    }
}

/// Errors surfaced by engine queries.
///
/// A missing resource is not an error: it is reported as zero availability.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The request was malformed and was rejected before any store access.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),

    /// A backing store could not be read. Safe to retry.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl EngineError {
    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::StoreUnavailable(_))
    }

    /// Whether the error is the client's fault (bad request).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidInput(_) | EngineError::UnknownResourceType(_)
        )
    }
}

/// Failure of the external approval / no-show predictor.
///
/// Never escapes a query: the engine substitutes a fallback prediction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictionError {
    #[error("Prediction service unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed prediction output: {0}")]
    Malformed(String),
}

/// Convenience alias used throughout booking-engine.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Result alias for store trait methods.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
