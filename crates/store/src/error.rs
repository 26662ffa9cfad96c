use domain::StoreError;
use thiserror::Error;

/// Errors raised while connecting to or migrating the database.
#[derive(Debug, Error)]
pub enum SetupError {
    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Maps a driver error onto the backend-neutral store error.
pub(crate) fn db_err(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

/// Returns true for a PostgreSQL `unique_violation` (SQLSTATE 23505).
pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

/// Maps a value that failed to decode into a domain type.
pub(crate) fn decode_err(column: &str, e: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(format!("invalid value in column {column}: {e}"))
}
