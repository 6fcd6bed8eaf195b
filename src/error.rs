//! Error types for the registry.
//!
//! Mirrors the four failure classes the registry distinguishes:
//! precondition failures when the store cannot be opened, per-record
//! ingestion failures, query-time failures, and validation rejections.
//! "No matching rows" is not an error and never appears here.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the store and the ingestion pipeline.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The database file is missing, unreadable, or was never initialized.
    #[error("storage unavailable at {}: {reason}", path.display())]
    StorageUnavailable { path: PathBuf, reason: String },

    /// A read failed. No partial results are returned.
    #[error("query failed: {0}")]
    Query(#[source] sqlx::Error),

    /// A write failed in a way that invalidates the whole batch.
    #[error("storage error: {0}")]
    Storage(#[source] sqlx::Error),
}

impl RegistryError {
    pub fn is_precondition(&self) -> bool {
        matches!(self, RegistryError::StorageUnavailable { .. })
    }
}

/// Why the normalizer refused a record or a bearer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("organization name is missing")]
    MissingName,
    #[error("record has neither a registration number nor a file number")]
    MissingNaturalKey,
    #[error("office bearer name is empty after normalization")]
    EmptyBearerName,
}

/// Failure of a single source record. Counted and logged, never fatal.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("unreadable source file: {0}")]
    Read(String),
    #[error("malformed JSON: {0}")]
    Parse(String),
    #[error("row rejected by storage: {0}")]
    Constraint(String),
}

/// Split a write error into "this row is bad" and "the batch is lost".
///
/// Constraint violations only affect the row being written. Everything else
/// (I/O, a full or corrupt database, a closed pool) aborts the batch.
pub(crate) fn classify_write_error(err: sqlx::Error) -> Result<RecordError, RegistryError> {
    match &err {
        sqlx::Error::Database(db_err) => match db_err.kind() {
            sqlx::error::ErrorKind::UniqueViolation
            | sqlx::error::ErrorKind::ForeignKeyViolation
            | sqlx::error::ErrorKind::NotNullViolation
            | sqlx::error::ErrorKind::CheckViolation => {
                Ok(RecordError::Constraint(db_err.message().to_string()))
            }
            _ => Err(RegistryError::Storage(err)),
        },
        _ => Err(RegistryError::Storage(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_fatal() {
        let outcome = classify_write_error(sqlx::Error::PoolClosed);
        assert!(matches!(outcome, Err(RegistryError::Storage(_))));
    }

    #[test]
    fn precondition_is_distinct() {
        let err = RegistryError::StorageUnavailable {
            path: PathBuf::from("/nope/reg.sqlite"),
            reason: "file not found".into(),
        };
        assert!(err.is_precondition());
        assert!(err.to_string().contains("/nope/reg.sqlite"));
        assert!(!RegistryError::Query(sqlx::Error::RowNotFound).is_precondition());
    }
}
