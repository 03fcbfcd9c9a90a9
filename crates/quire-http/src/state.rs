//! Shared application state for the settings API server.
//!
//! [`SettingsState`] is shared by every request. It holds the store and the
//! configured default domain, and hands out one fresh [`SettingsManager`]
//! per request. The per-request manager travels in the request extensions
//! as [`SharedSettings`] so the handler and the save middleware see the
//! same instance.

use std::sync::Arc;

use quire_core::{SettingsConfig, SettingsManager, SettingsStore};
use tokio::sync::{Mutex, MutexGuard};

/// Process-wide state behind the router.
#[derive(Clone)]
pub struct SettingsState {
    store: SettingsStore,
    default_domain: String,
}

impl SettingsState {
    /// Create state over `store` with the default domain from `config`.
    pub fn new(store: SettingsStore, config: &SettingsConfig) -> Self {
        Self {
            store,
            default_domain: config.default_domain.clone(),
        }
    }

    /// Start a fresh, unloaded manager for one request.
    pub fn manager(&self) -> SettingsManager {
        SettingsManager::new(self.store.clone()).with_default_domain(self.default_domain.clone())
    }
}

/// The manager of the current request.
#[derive(Clone)]
pub struct SharedSettings(Arc<Mutex<SettingsManager>>);

impl SharedSettings {
    /// Wrap `manager` for sharing between middleware and handler.
    pub fn new(manager: SettingsManager) -> Self {
        Self(Arc::new(Mutex::new(manager)))
    }

    /// Lock the manager.
    pub async fn lock(&self) -> MutexGuard<'_, SettingsManager> {
        self.0.lock().await
    }
}
