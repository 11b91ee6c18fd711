//! Domain error types
//!
//! These errors are framework-agnostic and represent business-level failures.
//! The HTTP layer maps each variant to a status code in `api::error`.

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),
    /// Malformed or semantically invalid input
    #[error("Validation error: {0}")]
    Validation(String),
    /// Operation blocked by the current state (loaned book, referenced row, ...)
    #[error("Conflict: {0}")]
    Conflict(String),
    /// Unknown user or wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,
    /// Missing, malformed or expired bearer token
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// Authenticated but lacking the required role
    #[error("Forbidden: {0}")]
    Forbidden(String),
    /// Time-boxed credential used outside its validity window
    #[error("{0} has expired")]
    Expired(String),
    /// Database/persistence error
    #[error("Database error: {0}")]
    Database(String),
    /// Content file could not be written or read
    #[error("Storage error: {0}")]
    Storage(String),
    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(what: impl Into<String>) -> Self {
        DomainError::NotFound(what.into())
    }
}

// Conversion from SeaORM errors (used in infrastructure and service layers)
impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        DomainError::Database(e.to_string())
    }
}
