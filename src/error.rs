//! Error types for the serialized access layer.
//!
//! This module defines all error types using `thiserror`. Drivers report
//! rich errors through these variants; the public layer flattens them to
//! boolean/absent returns after logging, so callers that ignore integrity
//! can still make forward progress.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Connection failed: {message}")]
    Connection { message: String },

    #[error("Statement failed: {message}")]
    Statement {
        message: String,
        /// e.g., "1062" for a MySQL duplicate key, "ConstraintViolation" for SQLite
        code: Option<String>,
    },

    #[error("Transaction {operation} failed: {message}")]
    Transaction { operation: String, message: String },

    #[error("Batch flush of {rows} row(s) failed")]
    BatchFlush {
        rows: u32,
        #[source]
        source: Box<DbError>,
    },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

impl DbError {
    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a statement error with an optional engine error code.
    pub fn statement(message: impl Into<String>, code: Option<String>) -> Self {
        Self::Statement {
            message: message.into(),
            code,
        }
    }

    /// Create a transaction error for a given operation (begin/commit/rollback).
    pub fn transaction(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transaction {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Wrap a statement failure that aborted a batched flush.
    pub fn batch_flush(rows: u32, source: DbError) -> Self {
        Self::BatchFlush {
            rows,
            source: Box::new(source),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Whether this error indicates the connection itself is gone.
    ///
    /// A fatal error clears the handle's connected flag; everything else
    /// leaves connectivity as-is.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Connection { .. } => true,
            Self::BatchFlush { source, .. } => source.is_fatal(),
            _ => false,
        }
    }
}

/// Convert rusqlite errors to DbError.
#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;

        match &err {
            rusqlite::Error::SqliteFailure(ffi_err, msg) => {
                let connection_lost = matches!(
                    ffi_err.code,
                    ErrorCode::CannotOpen | ErrorCode::NotADatabase | ErrorCode::PermissionDenied
                );
                if connection_lost {
                    DbError::connection(msg.clone().unwrap_or_else(|| ffi_err.to_string()))
                } else {
                    DbError::statement(
                        msg.clone().unwrap_or_else(|| ffi_err.to_string()),
                        Some(format!("{:?}", ffi_err.code)),
                    )
                }
            }
            rusqlite::Error::InvalidColumnName(col) => {
                DbError::statement(format!("Column not found: {}", col), None)
            }
            rusqlite::Error::QueryReturnedNoRows => DbError::statement("No rows returned", None),
            _ => DbError::statement(err.to_string(), None),
        }
    }
}

/// Result type alias for driver-boundary operations.
pub type DbResult<T> = Result<T, DbError>;
