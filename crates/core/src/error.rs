//! Errors raised by domain rules.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// A rejected domain operation.
///
/// Lookups of missing records are reported by the office layer, which knows
/// the entity name and id; the domain types only see values they were given.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed input: empty names, non-positive quantities, bad dates.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The input is well formed but breaks a bookkeeping rule (over-invoicing,
    /// short multi-invoice payment, edits of settled invoices).
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The record changed or moved on: stale version, offer already accepted,
    /// document already cancelled.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Errors the caller can fix by changing the input.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::InvalidId(_))
    }

    pub fn is_invariant(&self) -> bool {
        matches!(self, Self::InvariantViolation(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}
