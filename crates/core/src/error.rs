//! Domain error model.

use thiserror::Error;

/// Result type used by the record-keeping stores.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Covers rule violations on client-held records (validation, duplicate ids,
/// missing targets). Transport, storage and decoding failures have their own
/// error types in `bizdesk-client`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. empty identifier).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The targeted record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A record with the same identity already exists.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}
