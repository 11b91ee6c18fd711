//! Input checks shared by the services

use chrono::NaiveDate;
use sea_orm::{DbErr, SqlErr};

use crate::domain::DomainError;
use crate::utils::time::format_date;

/// Trimmed, non-empty text field.
pub fn required_text(value: &str, field: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::Validation(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

/// `YYYY-MM-DD` calendar date, returned in canonical form.
pub fn date(value: &str, field: &str) -> Result<String, DomainError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map(format_date)
        .map_err(|_| DomainError::Validation(format!("{} must be a YYYY-MM-DD date", field)))
}

/// Map unique and foreign-key violations to `Conflict`, everything else to `Database`.
pub fn constraint_error(err: DbErr, conflict: impl Into<String>) -> DomainError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) | Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
            DomainError::Conflict(conflict.into())
        }
        _ => err.into(),
    }
}
