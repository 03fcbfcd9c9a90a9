//! Domain-scoped settings with lazy load and deferred batch save.
//!
//! A [`SettingsManager`] holds an in-memory view of every persisted setting,
//! grouped by domain and addressed by dotted paths. Mutations stay in memory
//! until [`SettingsManager::save`] computes the difference against the
//! persisted rows and writes it through a [`SettingsStore`].
//!
//! # Modules
//!
//! - [`cache`] -- [`SettingsCache`] trait and the process-local
//!   [`MemoryCache`].
//! - [`comparator`] -- Diff of an in-memory snapshot against a saved one.
//! - [`config`] -- Configuration loading from `quire-config.yaml` into
//!   strongly-typed structs.
//! - [`error`] -- [`SettingsError`], [`StoreError`], [`CacheError`].
//! - [`manager`] -- The [`SettingsManager`] session.
//! - [`memory`] -- [`MemoryBackend`], an in-process [`SettingsBackend`].
//! - [`path`] -- Dotted-path get/set/forget and flatten/unflatten helpers.
//! - [`store`] -- [`SettingsBackend`] trait and the caching
//!   [`SettingsStore`].
//!
//! [`SettingsCache`]: cache::SettingsCache
//! [`MemoryCache`]: cache::MemoryCache
//! [`SettingsError`]: error::SettingsError
//! [`StoreError`]: error::StoreError
//! [`CacheError`]: error::CacheError
//! [`MemoryBackend`]: memory::MemoryBackend
//! [`SettingsBackend`]: store::SettingsBackend

pub mod cache;
pub mod comparator;
pub mod config;
pub mod error;
pub mod manager;
pub mod memory;
pub mod path;
pub mod store;

pub use cache::{MemoryCache, SettingsCache};
pub use config::SettingsConfig;
pub use error::{CacheError, SettingsError, StoreError};
pub use manager::SettingsManager;
pub use memory::MemoryBackend;
pub use store::{SettingsBackend, SettingsStore};
