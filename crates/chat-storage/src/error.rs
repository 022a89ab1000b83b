//! Storage error types.

use thiserror::Error;

/// Errors that can occur during storage operations.
///
/// Every variant means the store could not serve the call; callers treat
/// them uniformly as "storage unavailable". Stores never retry internally.
#[derive(Debug, Error)]
pub enum StorageError {
    /// SQLx error (connection, query, pool timeout, etc.)
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored record could not be decoded.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// The backend refused or could not be reached.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
