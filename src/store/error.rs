//! Store Errors
//!
//! Error types for storage operations.

use sqlx::error::DatabaseError;

/// Primary SQLite result codes for lock contention
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

/// Errors that can occur in the storage layer
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A UNIQUE constraint rejected the write
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// Another connection holds the write lock or our snapshot went stale
    #[error("Database is busy: {0}")]
    Busy(String),

    /// A stored value could not be decoded into its domain type
    #[error("Corrupt value in column {column}: {value}")]
    CorruptValue { column: &'static str, value: String },

    /// Database error
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl StoreError {
    /// Check if this error is a uniqueness violation
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::UniqueViolation(_))
    }

    /// Check if running the whole transaction again may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Busy(_))
    }
}

fn is_lock_contention(db_err: &dyn DatabaseError) -> bool {
    db_err
        .code()
        .and_then(|code| code.parse::<i32>().ok())
        // Extended codes keep the primary code in the low byte
        .map(|code| matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
        .unwrap_or(false)
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                StoreError::UniqueViolation(db_err.message().to_string())
            }
            sqlx::Error::Database(ref db_err) if is_lock_contention(db_err.as_ref()) => {
                StoreError::Busy(db_err.message().to_string())
            }
            other => StoreError::Database(other),
        }
    }
}
