//! Unified error types for the data-access layer.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use thiserror::Error;

/// Unified error type for Strata.
///
/// Absence is not an error: lookups return `Option` and deletes by id return
/// `bool`. Every variant here is a real failure that the caller must handle.
#[derive(Error, Debug)]
pub enum StrataError {
    // ============ Domain Errors ============
    /// A row that must exist (e.g. the one just inserted) could not be read back
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// Entity failed field validation before reaching storage
    #[error("Validation error: {0}")]
    Validation(String),

    // ============ Storage Errors ============
    /// Unique or primary key violation
    #[error("Conflict: {0}")]
    Conflict(String),

    /// NOT NULL, CHECK or foreign key violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Any other storage failure
    #[error("Database error: {0}")]
    Database(String),

    // ============ Query Errors ============
    /// Named query parameters do not match the query's placeholders
    #[error("Parameter binding error: {0}")]
    Binding(String),

    /// Named query is not registered
    #[error("Unknown named query: {0}")]
    UnknownQuery(String),

    // ============ Setup Errors ============
    /// Persistence context factory has not been initialized
    #[error("Initialization error: {0}")]
    Initialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ============ Internal Errors ============
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StrataError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::ConstraintViolation(_) => "CONSTRAINT_VIOLATION",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Binding(_) => "BINDING_ERROR",
            Self::UnknownQuery(_) => "UNKNOWN_QUERY",
            Self::Initialization(_) => "INITIALIZATION_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Creates a not found error for a resource.
    #[must_use]
    pub fn not_found<T: ToString>(resource_type: &'static str, id: T) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a binding error.
    #[must_use]
    pub fn binding<T: Into<String>>(message: T) -> Self {
        Self::Binding(message.into())
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration<T: Into<String>>(message: T) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal(message.into())
    }

    /// Checks if this error was raised by a storage-level constraint.
    #[must_use]
    pub const fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::ConstraintViolation(_))
    }

    /// Checks if this error originated in the storage layer.
    #[must_use]
    pub const fn is_storage_error(&self) -> bool {
        matches!(
            self,
            Self::Conflict(_) | Self::ConstraintViolation(_) | Self::Database(_)
        )
    }
}

/// SQLite extended result codes for unique and primary key violations, plus the
/// MySQL and PostgreSQL equivalents.
#[cfg(feature = "sqlx")]
const UNIQUE_VIOLATION_CODES: [&str; 4] = ["2067", "1555", "1062", "23505"];

/// SQLite extended result codes for NOT NULL, CHECK and foreign key violations.
#[cfg(feature = "sqlx")]
const CONSTRAINT_VIOLATION_CODES: [&str; 3] = ["1299", "275", "787"];

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for StrataError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::NotFound {
                resource_type: "database_row",
                id: "unknown".to_string(),
            },
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.kind() {
                    sqlx::error::ErrorKind::UniqueViolation => return Self::Conflict(message),
                    sqlx::error::ErrorKind::NotNullViolation
                    | sqlx::error::ErrorKind::CheckViolation
                    | sqlx::error::ErrorKind::ForeignKeyViolation => {
                        return Self::ConstraintViolation(message)
                    }
                    _ => {}
                }
                if let Some(code) = db_err.code() {
                    if UNIQUE_VIOLATION_CODES.contains(&code.as_ref()) {
                        return Self::Conflict(message);
                    }
                    if CONSTRAINT_VIOLATION_CODES.contains(&code.as_ref()) {
                        return Self::ConstraintViolation(message);
                    }
                }
                Self::Database(err.to_string())
            }
            _ => Self::Database(err.to_string()),
        }
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::migrate::MigrateError> for StrataError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::Database(format!("Migration failed: {}", err))
    }
}

impl From<serde_json::Error> for StrataError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON serialization error: {}", err))
    }
}

/// Field-level validation error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldError {
    /// Field name
    pub field: String,
    /// Error message
    pub message: String,
    /// Error code
    pub code: String,
}
