//! # Database Error Types
//!
//! Error types for database operations, plus the combined error the
//! transactional engines return.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                │
//! │                                                                     │
//! │  SQLite Error (sqlx::Error)                                         │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  DbError (this module) ← categorized, with context                  │
//! │       │                                                             │
//! │       ├── joined with CoreError inside BookingError                 │
//! │       ▼                                                             │
//! │  ApiError (in the app) ← HTTP status + serialized body              │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;
use viajes_core::CoreError;

// =============================================================================
// DbError
// =============================================================================

/// Database operation errors.
///
/// These wrap sqlx errors and provide categorization for the boundary.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation (duplicate email, duplicate cart
    /// package, any UNIQUE index).
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
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

                // SQLite reports constraints in the message text:
                // "UNIQUE constraint failed: <table>.<column>"
                // "FOREIGN KEY constraint failed"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
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

/// Result type for plain database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// BookingError
// =============================================================================

/// The error type returned by the cart store, the checkout engine, and
/// the lifecycle manager.
///
/// These operations run domain rules *inside* their transactions, so a
/// single call can fail either way: a business rule was violated
/// (`Domain`) or the persistence layer failed (`Db`). Callers match on
/// the variant; the API boundary maps `Domain` to 4xx and `Db` to 5xx.
#[derive(Debug, Error)]
pub enum BookingError {
    /// A business rule was violated. Non-retryable without a state change
    /// by the caller.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// The persistence layer failed. Detail is logged, not exposed.
    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<sqlx::Error> for BookingError {
    fn from(err: sqlx::Error) -> Self {
        BookingError::Db(DbError::from(err))
    }
}

impl From<viajes_core::ValidationError> for BookingError {
    fn from(err: viajes_core::ValidationError) -> Self {
        BookingError::Domain(CoreError::Validation(err))
    }
}

/// Result type for operations that enforce domain rules transactionally.
pub type BookingResult<T> = Result<T, BookingError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[test]
    fn test_domain_error_is_transparent() {
        let err = BookingError::Domain(CoreError::EmptyCart);
        assert_eq!(err.to_string(), "The cart is empty");
    }
}
