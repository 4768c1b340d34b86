//! Store error model.

use thiserror::Error;

use tallerhub_core::DomainError;

/// Result type used across the persistence layer.
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence-layer error: either a business-rule violation detected
/// before mutating anything, or an underlying database failure (which
/// includes constraint violations raced past the prechecks).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::Domain(DomainError::not_found(msg))
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Domain(DomainError::conflict(msg))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Domain(DomainError::validation(msg))
    }

    pub fn insufficient_stock(available: i64, requested: i64) -> Self {
        Self::Domain(DomainError::insufficient_stock(available, requested))
    }
}
