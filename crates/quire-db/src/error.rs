//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`] which wraps the underlying
//! [`sqlx`] and [`fred`] errors. Conversions into the core's
//! [`StoreError`] and [`CacheError`] let the backends plug into
//! [`SettingsStore`](quire_core::SettingsStore) with `?`.

use quire_core::{CacheError, StoreError};
use quire_types::CastError;

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A `Dragonfly`/Redis operation failed.
    #[error("Dragonfly error: {0}")]
    Dragonfly(#[from] fred::error::Error),

    /// A serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored value could not be cast back through its type tag.
    #[error("Cast error: {0}")]
    Cast(#[from] CastError),

    /// The configured table name cannot be used in SQL.
    #[error("Invalid table name: {0:?}")]
    InvalidTable(String),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Cast(e) => Self::Cast(e),
            other => Self::backend(other),
        }
    }
}

impl From<DbError> for CacheError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Serialization(e) => Self::Serialization(e),
            other => Self::backend(other),
        }
    }
}
