//! Error types for the settings core.
//!
//! [`SettingsError`] is what callers of the manager see. It wraps
//! [`StoreError`] for everything that went wrong below the manager, while
//! [`CacheError`] never escapes the store: a failing cache degrades to a
//! direct backend read.

use quire_types::CastError;

/// Boxed error raised by a storage or cache implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by [`SettingsManager`](crate::manager::SettingsManager).
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The key is empty or has an empty domain or path segment.
    #[error("invalid settings key {key:?}: {reason}")]
    InvalidKey {
        /// The key as passed by the caller.
        key: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// Loading or saving through the store failed.
    #[error("settings store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors raised by a [`SettingsBackend`](crate::store::SettingsBackend) or
/// while applying a changeset.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing medium failed (connection, query, constraint).
    #[error("backend error: {0}")]
    Backend(#[source] BoxError),

    /// A stored value could not be cast back through its type tag.
    #[error("cast error: {0}")]
    Cast(#[from] CastError),

    /// An update or delete referenced a key that was not in the saved
    /// snapshot used to compute the changeset.
    #[error("no saved entry for {domain}::{key}")]
    MissingEntry {
        /// Domain of the missing entry.
        domain: String,
        /// Dotted key of the missing entry.
        key: String,
    },
}

impl StoreError {
    /// Wrap any backend error.
    pub fn backend<E>(error: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Backend(error.into())
    }
}

/// Errors raised by a [`SettingsCache`](crate::cache::SettingsCache).
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The cache server failed or is unreachable.
    #[error("cache backend error: {0}")]
    Backend(#[source] BoxError),

    /// The cached payload could not be encoded or decoded.
    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CacheError {
    /// Wrap any cache backend error.
    pub fn backend<E>(error: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Backend(error.into())
    }
}
