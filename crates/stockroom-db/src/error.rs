//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)          CoreError (business rule)         │
//! │       │                                   │                             │
//! │       ▼                                   ▼                             │
//! │  DbError::{QueryFailed, ...}         DbError::Rule(CoreError)          │
//! │       │                                   │                             │
//! │       └─────────────┬─────────────────────┘                             │
//! │                     ▼                                                   │
//! │  Caller: storage faults are fatal to the call, rule rejections are     │
//! │  reported with their detail (which lot, how much)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Dropping a sqlx transaction on the error path rolls it back, so a
//! `DbError` never leaves partial writes behind and the whole call can be
//! retried from scratch.

use stockroom_core::{CoreError, ValidationError};
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// A write referenced a row that doesn't exist.
    ///
    /// Plain lookups return `Ok(None)` instead.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Two users with the same PIN
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file can't be created
    /// - File permissions issue
    /// - Disk full
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Settings could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Business rule rejection (insufficient stock, credit limit, ...).
    #[error(transparent)]
    Rule(#[from] CoreError),

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Whether this is a storage-unavailable fault (connectivity, I/O,
    /// pool) rather than a rejection of the request itself.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            DbError::ConnectionFailed(_)
                | DbError::MigrationFailed(_)
                | DbError::QueryFailed(_)
                | DbError::TransactionFailed(_)
                | DbError::PoolExhausted
                | DbError::Internal(_)
        )
    }

    /// The business rule behind this error, if any.
    pub fn rule(&self) -> Option<&CoreError> {
        match self {
            DbError::Rule(rule) => Some(rule),
            _ => None,
        }
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Rule(CoreError::Validation(err))
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // "UNIQUE constraint failed: users.pin_hash"
                // "FOREIGN KEY constraint failed"
                if let Some(field) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::UniqueViolation {
                        field: field.to_string(),
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<config::ConfigError> for DbError {
    fn from(err: config::ConfigError) -> Self {
        DbError::Config(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_core::Quantity;

    #[test]
    fn test_rule_errors_are_not_storage_faults() {
        let err: DbError = CoreError::InsufficientStock {
            stock_id: 1,
            available: Quantity::from_units(6),
            requested: Quantity::from_units(11),
        }
        .into();

        assert!(!err.is_storage());
        assert!(matches!(err.rule(), Some(CoreError::InsufficientStock { .. })));
        assert_eq!(
            err.to_string(),
            "Insufficient stock in lot 1: available 6.000, requested 11.000"
        );
    }

    #[test]
    fn test_validation_wraps_into_rule() {
        let err: DbError = ValidationError::Required {
            field: "name".to_string(),
        }
        .into();
        assert!(matches!(err, DbError::Rule(CoreError::Validation(_))));
    }

    #[test]
    fn test_pool_closed_is_storage_fault() {
        let err: DbError = sqlx::Error::PoolClosed.into();
        assert!(err.is_storage());
    }
}
