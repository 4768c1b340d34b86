//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, conflicts). Infrastructure concerns belong elsewhere.
///
/// Messages are user-facing (the API answers in Spanish), so constructors
/// receive the final text; variants that carry data render it themselves.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("{0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("{0}")]
    InvalidId(String),

    /// A requested resource was not found.
    #[error("{0}")]
    NotFound(String),

    /// A conflict occurred (duplicate association, unique field taken).
    #[error("{0}")]
    Conflict(String),

    /// A stock mutation would exceed what the ledger has available.
    #[error("Stock insuficiente. Disponible: {available}, Solicitado: {requested}")]
    InsufficientStock { available: i64, requested: i64 },
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn insufficient_stock(available: i64, requested: i64) -> Self {
        Self::InsufficientStock {
            available,
            requested,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_stock_reports_both_amounts() {
        let err = DomainError::insufficient_stock(2, 3);
        assert_eq!(
            err.to_string(),
            "Stock insuficiente. Disponible: 2, Solicitado: 3"
        );
    }

    #[test]
    fn constructors_carry_their_message() {
        assert_eq!(
            DomainError::not_found("Reparación no encontrada").to_string(),
            "Reparación no encontrada"
        );
        assert_eq!(
            DomainError::conflict("Este item ya está asociado a la reparación").to_string(),
            "Este item ya está asociado a la reparación"
        );
    }
}
