//! Read-through cache for the full persisted entry list.
//!
//! The store caches the whole list of entries under one key and drops it
//! after every save. There is no per-key caching.

use std::collections::HashMap;

use async_trait::async_trait;
use quire_types::SettingEntry;
use tokio::sync::Mutex;

use crate::error::CacheError;

/// A cache able to hold the full entry list under a single key.
#[async_trait]
pub trait SettingsCache: Send + Sync {
    /// Return the cached entry list, or `None` on a miss.
    async fn get(&self, key: &str) -> Result<Option<Vec<SettingEntry>>, CacheError>;

    /// Store the entry list under `key` with no expiry.
    async fn put(&self, key: &str, entries: &[SettingEntry]) -> Result<(), CacheError>;

    /// Drop whatever is stored under `key`.
    async fn forget(&self, key: &str) -> Result<(), CacheError>;
}

/// Process-local cache, mostly useful for tests and single-node setups.
#[derive(Debug, Default)]
pub struct MemoryCache {
    slots: Mutex<HashMap<String, Vec<SettingEntry>>>,
}

impl MemoryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `true` if something is cached under `key`.
    pub async fn contains(&self, key: &str) -> bool {
        self.slots.lock().await.contains_key(key)
    }
}

#[async_trait]
impl SettingsCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<SettingEntry>>, CacheError> {
        Ok(self.slots.lock().await.get(key).cloned())
    }

    async fn put(&self, key: &str, entries: &[SettingEntry]) -> Result<(), CacheError> {
        self.slots
            .lock()
            .await
            .insert(key.to_owned(), entries.to_vec());
        Ok(())
    }

    async fn forget(&self, key: &str) -> Result<(), CacheError> {
        self.slots.lock().await.remove(key);
        Ok(())
    }
}
