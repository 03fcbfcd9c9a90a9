//! Persistence store: backend access, read-through caching, and changeset
//! application.
//!
//! [`SettingsBackend`] is the seam to the durable medium (`PostgreSQL` in
//! production, [`MemoryBackend`](crate::memory::MemoryBackend) in tests).
//! [`SettingsStore`] layers the optional cache on top and knows how to
//! apply a [`Changeset`].
//!
//! # Failure semantics
//!
//! Applying a changeset is not atomic. Entries are written one at a time in
//! the order inserted, updated, deleted; the first failure stops the apply
//! and is returned, and entries written before it stay written. The cache
//! is dropped once the apply ends, whether it completed or not.

use std::sync::Arc;

use async_trait::async_trait;
use quire_types::{Changeset, EntryId, SettingEntry, Value};
use tracing::{debug, warn};

use crate::cache::SettingsCache;
use crate::config::CacheConfig;
use crate::error::StoreError;

/// Durable storage for setting rows.
#[async_trait]
pub trait SettingsBackend: Send + Sync {
    /// Load every stored entry with its value cast through its type tag.
    async fn fetch_all(&self) -> Result<Vec<SettingEntry>, StoreError>;

    /// Create a row for `(domain, key)` holding `value` and its type tag.
    async fn insert(&self, domain: &str, key: &str, value: &Value) -> Result<EntryId, StoreError>;

    /// Rewrite the value and type tag of an existing row.
    async fn update(&self, id: EntryId, value: &Value) -> Result<(), StoreError>;

    /// Delete an existing row.
    async fn remove(&self, id: EntryId) -> Result<(), StoreError>;
}

/// Optional cache attachment of a store.
#[derive(Clone)]
struct CacheSlot {
    cache: Arc<dyn SettingsCache>,
    key: String,
}

/// A backend plus an optional read-through cache of its full entry list.
///
/// Cheap to clone; clones share the same backend and cache.
#[derive(Clone)]
pub struct SettingsStore {
    backend: Arc<dyn SettingsBackend>,
    cache: Option<CacheSlot>,
}

impl SettingsStore {
    /// Create an uncached store over `backend`.
    pub fn new(backend: Arc<dyn SettingsBackend>) -> Self {
        Self {
            backend,
            cache: None,
        }
    }

    /// Cache the full entry list in `cache` under `key`.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn SettingsCache>, key: impl Into<String>) -> Self {
        self.cache = Some(CacheSlot {
            cache,
            key: key.into(),
        });
        self
    }

    /// Build a store from configuration.
    ///
    /// The cache is attached only when `config.enabled` is set and a cache
    /// implementation is supplied.
    pub fn from_config(
        backend: Arc<dyn SettingsBackend>,
        cache: Option<Arc<dyn SettingsCache>>,
        config: &CacheConfig,
    ) -> Self {
        let store = Self::new(backend);
        match cache {
            Some(cache) if config.enabled => store.with_cache(cache, config.key.clone()),
            _ => store,
        }
    }

    /// Return `true` if reads go through a cache.
    pub const fn is_cached(&self) -> bool {
        self.cache.is_some()
    }

    /// Load every persisted entry, through the cache when one is attached.
    ///
    /// On a cache miss the backend result is cached with no expiry. Cache
    /// failures are logged and fall back to a direct backend read.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend read fails.
    pub async fn all(&self) -> Result<Vec<SettingEntry>, StoreError> {
        let Some(slot) = &self.cache else {
            return self.backend.fetch_all().await;
        };

        match slot.cache.get(&slot.key).await {
            Ok(Some(entries)) => {
                debug!(key = %slot.key, count = entries.len(), "settings cache hit");
                return Ok(entries);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(key = %slot.key, error = %e, "settings cache unavailable, reading backend");
                return self.backend.fetch_all().await;
            }
        }

        let entries = self.backend.fetch_all().await?;
        if let Err(e) = slot.cache.put(&slot.key, &entries).await {
            warn!(key = %slot.key, error = %e, "failed to populate settings cache");
        }
        debug!(key = %slot.key, count = entries.len(), "settings cache populated");
        Ok(entries)
    }

    /// Apply `changes` against the rows in `saved`.
    ///
    /// `saved` must be the entry list the changeset was computed from;
    /// updated and deleted keys are resolved to row ids through it.
    ///
    /// # Errors
    ///
    /// Returns the first [`StoreError`] raised by the backend, or
    /// [`StoreError::MissingEntry`] if an updated or deleted key has no row
    /// in `saved`. Rows written before the failure are not rolled back.
    pub async fn save(
        &self,
        saved: &[SettingEntry],
        changes: &Changeset,
    ) -> Result<(), StoreError> {
        let result = self.apply(saved, changes).await;
        self.invalidate().await;
        result?;

        debug!(
            inserted = changes.inserted_count(),
            updated = changes.updated_count(),
            deleted = changes.deleted_count(),
            "settings changeset applied"
        );
        Ok(())
    }

    /// Drop the cached entry list, if caching is enabled.
    pub async fn invalidate(&self) {
        if let Some(slot) = &self.cache {
            if let Err(e) = slot.cache.forget(&slot.key).await {
                warn!(key = %slot.key, error = %e, "failed to invalidate settings cache");
            }
        }
    }

    async fn apply(&self, saved: &[SettingEntry], changes: &Changeset) -> Result<(), StoreError> {
        for (domain, values) in &changes.inserted {
            for (key, value) in values {
                self.backend.insert(domain, key, value).await?;
            }
        }

        for (domain, values) in &changes.updated {
            for (key, value) in values {
                let id = resolve(saved, domain, key)?;
                self.backend.update(id, value).await?;
            }
        }

        for (domain, keys) in &changes.deleted {
            for key in keys {
                let id = resolve(saved, domain, key)?;
                self.backend.remove(id).await?;
            }
        }

        Ok(())
    }
}

fn resolve(saved: &[SettingEntry], domain: &str, key: &str) -> Result<EntryId, StoreError> {
    SettingEntry::find(saved, domain, key)
        .map(|entry| entry.id)
        .ok_or_else(|| StoreError::MissingEntry {
            domain: domain.to_owned(),
            key: key.to_owned(),
        })
}
