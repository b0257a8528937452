use std::time::Duration;

use thiserror::Error;

/// Centralized error types for the application
///
/// Expected business outcomes ("not subscribed", "already registered") are not
/// errors; they live in [`crate::registration::RegistrationOutcome`]. This enum
/// only carries failures.
///
/// # Example
///
/// ```no_run
/// use rafflecore::error::AppError;
///
/// fn handle_error(err: AppError) {
///     eprintln!("Error: {}", err);
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Persistence layer unreachable or failing (pool checkout, SQLite, blocking task)
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Storage call did not finish in time
    #[error("Storage timed out after {0:?}")]
    StorageTimeout(Duration),

    /// Telegram API errors
    #[cfg(feature = "telegram")]
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// Outbound message delivery failed
    #[error("Messaging error: {0}")]
    Messaging(String),

    /// Membership authority answered with something we cannot interpret
    #[error("Membership query failed: {0}")]
    Membership(String),

    /// Inbound webhook body is not a valid update
    #[error("Malformed inbound payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    /// Inbound update decoded, but none of its fields is a known update kind
    #[error("Invalid inbound update {update_id}: {reason}")]
    InvalidUpdate { update_id: u32, reason: String },

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// True for every failure that originates in the persistence layer.
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, AppError::StorageUnavailable(_) | AppError::StorageTimeout(_))
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::StorageUnavailable(format!("database error: {}", err))
    }
}

impl From<r2d2::Error> for AppError {
    fn from(err: r2d2::Error) -> Self {
        AppError::StorageUnavailable(format!("database pool error: {}", err))
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::StorageUnavailable(format!("storage task failed: {}", err))
    }
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;
