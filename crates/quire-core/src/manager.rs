//! The settings manager: in-memory view, lazy load, and deferred save.
//!
//! A [`SettingsManager`] is meant to live for one unit of work (a request,
//! a CLI invocation). The first read or write loads every persisted entry
//! into memory; after that all reads and writes touch memory only, until
//! [`SettingsManager::save`] diffs memory against the store and writes the
//! difference back.
//!
//! # Keys
//!
//! A key is a dotted path, optionally prefixed by a domain:
//! `mail.smtp.port` addresses the default domain, `billing::plan.name` the
//! `billing` domain. The domain is split off at the first `::`.
//!
//! # Concurrency
//!
//! There is no locking or versioning between load and save. If another
//! writer saves between this manager's load and its save, this save
//! overwrites that writer's changes to the same keys and deletes keys it
//! added to domains this manager has loaded or reset (lost update). Use one
//! manager per unit of work and keep units of work short.

use std::collections::BTreeMap;

use quire_types::{FlatSnapshot, Mapping, SettingEntry, Value};
use tracing::debug;

use crate::comparator;
use crate::config::SettingsConfig;
use crate::error::SettingsError;
use crate::path;
use crate::store::SettingsStore;

/// Separator between a domain and the dotted path.
pub const DOMAIN_SEPARATOR: &str = "::";

/// Domain used when none is configured.
pub const DEFAULT_DOMAIN: &str = "default";

/// In-memory settings session over a [`SettingsStore`].
pub struct SettingsManager {
    store: SettingsStore,
    default_domain: String,
    data: BTreeMap<String, Mapping>,
    loaded: bool,
    dirty: bool,
}

impl SettingsManager {
    /// Create a manager using the `"default"` domain for unqualified keys.
    pub fn new(store: SettingsStore) -> Self {
        Self {
            store,
            default_domain: DEFAULT_DOMAIN.to_owned(),
            data: BTreeMap::new(),
            loaded: false,
            dirty: false,
        }
    }

    /// Create a manager using the configured default domain.
    pub fn from_config(store: SettingsStore, config: &SettingsConfig) -> Self {
        Self::new(store).with_default_domain(config.default_domain.clone())
    }

    /// Use `domain` for keys without a `domain::` prefix.
    #[must_use]
    pub fn with_default_domain(mut self, domain: impl Into<String>) -> Self {
        self.default_domain = domain.into();
        self
    }

    /// The domain used for unqualified keys.
    pub fn default_domain(&self) -> &str {
        &self.default_domain
    }

    /// Whether the persisted entries have been loaded into memory.
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Whether memory has been mutated since the load or the last save.
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Return the value at `key`, or `None` if nothing is stored there.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidKey`] for malformed keys and
    /// [`SettingsError::Store`] if the lazy load fails.
    pub async fn get(&mut self, key: &str) -> Result<Option<Value>, SettingsError> {
        let (domain, path) = self.resolve(key)?;
        self.ensure_loaded().await?;

        Ok(self
            .data
            .get(&domain)
            .and_then(|map| path::get(map, path))
            .cloned())
    }

    /// Return the value at `key`, or `default` if nothing is stored there.
    ///
    /// # Errors
    ///
    /// Same as [`SettingsManager::get`].
    pub async fn get_or(
        &mut self,
        key: &str,
        default: impl Into<Value> + Send,
    ) -> Result<Value, SettingsError> {
        Ok(self.get(key).await?.unwrap_or_else(|| default.into()))
    }

    /// Store `value` at `key`, creating intermediate mappings.
    ///
    /// Nothing is persisted until [`SettingsManager::save`].
    ///
    /// # Errors
    ///
    /// Same as [`SettingsManager::get`]. Also returns
    /// [`SettingsError::InvalidKey`] if `value` is a mapping with an empty
    /// key or a key containing `.`, anywhere in its nested mappings.
    pub async fn set(
        &mut self,
        key: &str,
        value: impl Into<Value> + Send,
    ) -> Result<(), SettingsError> {
        let (domain, path) = self.resolve(key)?;
        let value = value.into();
        if !path::is_addressable(&value) {
            return Err(SettingsError::InvalidKey {
                key: key.to_owned(),
                reason: "mapping key is empty or contains '.'",
            });
        }
        self.ensure_loaded().await?;

        path::set(self.data.entry(domain).or_default(), path, value);
        self.dirty = true;
        Ok(())
    }

    /// Return `true` if a value exists at `key`, including `null` and `false`.
    ///
    /// # Errors
    ///
    /// Same as [`SettingsManager::get`].
    pub async fn has(&mut self, key: &str) -> Result<bool, SettingsError> {
        let (domain, path) = self.resolve(key)?;
        self.ensure_loaded().await?;

        Ok(self
            .data
            .get(&domain)
            .is_some_and(|map| path::has(map, path)))
    }

    /// Return the whole nested mapping of `domain` (default domain if
    /// `None`), or an empty mapping if the domain holds nothing.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Store`] if the lazy load fails.
    pub async fn all(&mut self, domain: Option<&str>) -> Result<Mapping, SettingsError> {
        self.ensure_loaded().await?;
        let domain = domain.unwrap_or(&self.default_domain);
        Ok(self.data.get(domain).cloned().unwrap_or_default())
    }

    /// Remove the value at `key`.
    ///
    /// Mappings emptied by the removal are pruned, and a domain left with
    /// nothing is dropped from memory entirely. Returns the removed value.
    ///
    /// # Errors
    ///
    /// Same as [`SettingsManager::get`].
    pub async fn delete(&mut self, key: &str) -> Result<Option<Value>, SettingsError> {
        let (domain, path) = self.resolve(key)?;
        self.ensure_loaded().await?;

        let Some(map) = self.data.get_mut(&domain) else {
            return Ok(None);
        };
        let removed = path::forget(map, path);
        if map.is_empty() {
            self.data.remove(&domain);
        }
        if removed.is_some() {
            self.dirty = true;
        }
        Ok(removed)
    }

    /// Drop every value of `domain` (default domain if `None`).
    ///
    /// The persisted rows of the domain are deleted by the next save.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Store`] if the lazy load fails.
    pub async fn reset(&mut self, domain: Option<&str>) -> Result<(), SettingsError> {
        self.ensure_loaded().await?;
        let domain = domain.unwrap_or(&self.default_domain).to_owned();
        if self.data.remove(&domain).is_some() {
            self.dirty = true;
        }
        Ok(())
    }

    /// Persist the difference between memory and the store.
    ///
    /// Fetches the store's current entries (through the cache when
    /// enabled), compares them with memory, and applies inserts, updates,
    /// and deletes. Memory is left as is and is not reloaded.
    ///
    /// A manager that was never loaded, or has not changed since the load
    /// or the last save, has nothing to write and returns immediately.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Store`] if fetching the saved entries or
    /// applying any change fails. Changes applied before the failure stay
    /// applied.
    pub async fn save(&mut self) -> Result<(), SettingsError> {
        if !self.loaded || !self.dirty {
            debug!(
                loaded = self.loaded,
                dirty = self.dirty,
                "settings unchanged, nothing to save"
            );
            return Ok(());
        }

        let saved = self.store.all().await?;
        let unsaved: FlatSnapshot = self
            .data
            .iter()
            .map(|(domain, map)| (domain.clone(), path::dot(map)))
            .collect();
        let changes = comparator::compare(&unsaved, &SettingEntry::group_by_domain(&saved));

        if !changes.is_empty() {
            self.store.save(&saved, &changes).await?;
        }
        self.dirty = false;

        debug!(
            inserted = changes.inserted_count(),
            updated = changes.updated_count(),
            deleted = changes.deleted_count(),
            "settings saved"
        );
        Ok(())
    }

    /// Split `key` into its domain and dotted path.
    fn resolve<'k>(&self, key: &'k str) -> Result<(String, &'k str), SettingsError> {
        let invalid = |reason| SettingsError::InvalidKey {
            key: key.to_owned(),
            reason,
        };

        let (domain, path) = match key.split_once(DOMAIN_SEPARATOR) {
            Some((domain, path)) => {
                if domain.is_empty() {
                    return Err(invalid("empty domain"));
                }
                (domain.to_owned(), path)
            }
            None => (self.default_domain.clone(), key),
        };

        if path.is_empty() {
            return Err(invalid("empty key"));
        }
        if path.split(path::SEPARATOR).any(str::is_empty) {
            return Err(invalid("empty path segment"));
        }
        Ok((domain, path))
    }

    async fn ensure_loaded(&mut self) -> Result<(), SettingsError> {
        if self.loaded {
            return Ok(());
        }

        let entries = self.store.all().await?;
        let data: BTreeMap<String, Mapping> = SettingEntry::group_by_domain(&entries)
            .iter()
            .map(|(domain, flat)| {
                let tree = path::undot(flat.iter().map(|(key, value)| (key.as_str(), value)));
                (domain.clone(), tree)
            })
            .collect();

        debug!(
            entries = entries.len(),
            domains = data.len(),
            "settings loaded"
        );
        self.data = data;
        self.loaded = true;
        Ok(())
    }
}
