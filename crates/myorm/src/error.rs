//! Error types for myorm

use thiserror::Error;

/// Result type alias for myorm operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for database operations
#[derive(Debug, Error)]
pub enum OrmError {
    /// Connection configuration is invalid (bad port, missing field, wrong type)
    #[error("Invalid config: {0}")]
    ConfigInvalid(String),

    /// Pool construction or the initial ping failed
    #[error("Driver init failed: {0}")]
    DriverInitFailed(String),

    /// A single-row read found zero rows
    #[error("No matching row: {0}")]
    NoMatchingRow(String),

    /// Failure surfaced unchanged from the driver
    #[error("Driver error: {0}")]
    Driver(#[from] mysql_async::Error),

    /// Operator outside the allow-list, or an operand shape the operator cannot take
    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    /// Registry lookup miss
    #[error("Not found: {0}")]
    NotFound(String),

    /// Statement refused before reaching the driver
    #[error("Validation error: {0}")]
    Validation(String),

    /// Commit/rollback/begin called in the wrong executor mode
    #[error("Transaction state error: {0}")]
    TransactionState(String),
}

impl OrmError {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigInvalid(message.into())
    }

    /// Create a no matching row error
    pub fn no_matching_row(message: impl Into<String>) -> Self {
        Self::NoMatchingRow(message.into())
    }

    /// Create an unsupported operator error
    pub fn unsupported_operator(message: impl Into<String>) -> Self {
        Self::UnsupportedOperator(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Check if this is a no matching row error
    pub fn is_no_matching_row(&self) -> bool {
        matches!(self, Self::NoMatchingRow(_))
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this error came from the driver
    pub fn is_driver(&self) -> bool {
        matches!(self, Self::Driver(_))
    }

    /// Wrap a driver error raised while opening the pool or pinging it.
    pub fn from_init_error(err: mysql_async::Error) -> Self {
        Self::DriverInitFailed(err.to_string())
    }
}
