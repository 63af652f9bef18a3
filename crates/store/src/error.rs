//! Store error type.

use thiserror::Error;

/// Persistence failures. A transaction either commits fully or not at all,
/// so these are safe for the caller to retry once.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("schema migration v{version} failed: {message}")]
    Migration { version: i64, message: String },

    #[error("malformed row in {table}: {message}")]
    MalformedRow { table: String, message: String },
}
