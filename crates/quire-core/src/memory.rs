//! In-process settings backend.
//!
//! Rows are kept exactly as the relational table keeps them: raw encoded
//! text plus a type tag, cast back on every read. That keeps the casting
//! path honest in tests without a database.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use quire_types::{EntryId, SettingEntry, TypeTag, Value};
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::store::SettingsBackend;

/// A stored row: raw text and tag, as in the `settings` table.
#[derive(Debug, Clone)]
struct Row {
    domain: String,
    key: String,
    raw: Option<String>,
    tag: TypeTag,
}

#[derive(Debug, Default)]
struct Rows {
    next_id: i64,
    by_id: BTreeMap<EntryId, Row>,
}

/// Backend holding rows in memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    rows: Mutex<Rows>,
    fetches: AtomicUsize,
    writes: AtomicUsize,
    fail_after: Option<usize>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write after the first `writes` successful ones fail.
    #[must_use]
    pub const fn fail_after_writes(mut self, writes: usize) -> Self {
        self.fail_after = Some(writes);
        self
    }

    /// Number of stored rows.
    pub async fn len(&self) -> usize {
        self.rows.lock().await.by_id.len()
    }

    /// Return `true` if no rows are stored.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of times [`SettingsBackend::fetch_all`] ran.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    fn check_write(&self) -> Result<(), StoreError> {
        let done = self.writes.fetch_add(1, Ordering::Relaxed);
        match self.fail_after {
            Some(limit) if done >= limit => Err(StoreError::backend(format!(
                "write #{} rejected by memory backend",
                done.saturating_add(1)
            ))),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl SettingsBackend for MemoryBackend {
    async fn fetch_all(&self) -> Result<Vec<SettingEntry>, StoreError> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        let rows = self.rows.lock().await;
        rows.by_id
            .iter()
            .map(|(id, row)| -> Result<SettingEntry, StoreError> {
                Ok(SettingEntry {
                    id: *id,
                    domain: row.domain.clone(),
                    key: row.key.clone(),
                    value: row.tag.cast(row.raw.as_deref())?,
                })
            })
            .collect()
    }

    async fn insert(&self, domain: &str, key: &str, value: &Value) -> Result<EntryId, StoreError> {
        self.check_write()?;
        let raw = value.encode()?;
        let mut rows = self.rows.lock().await;

        if rows
            .by_id
            .values()
            .any(|row| row.domain == domain && row.key == key)
        {
            return Err(StoreError::backend(format!(
                "duplicate settings row for {domain}::{key}"
            )));
        }

        rows.next_id = rows.next_id.saturating_add(1);
        let id = EntryId::new(rows.next_id);
        rows.by_id.insert(
            id,
            Row {
                domain: domain.to_owned(),
                key: key.to_owned(),
                raw,
                tag: value.type_tag(),
            },
        );
        Ok(id)
    }

    async fn update(&self, id: EntryId, value: &Value) -> Result<(), StoreError> {
        self.check_write()?;
        let raw = value.encode()?;
        let mut rows = self.rows.lock().await;
        let row = rows
            .by_id
            .get_mut(&id)
            .ok_or_else(|| StoreError::backend(format!("no settings row with id {id}")))?;
        row.raw = raw;
        row.tag = value.type_tag();
        Ok(())
    }

    async fn remove(&self, id: EntryId) -> Result<(), StoreError> {
        self.check_write()?;
        self.rows.lock().await.by_id.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rows_are_cast_on_read() {
        let backend = MemoryBackend::new();
        backend
            .insert("default", "list", &Value::from(vec!["a", "b"]))
            .await
            .unwrap();
        backend
            .insert("default", "ratio", &Value::Float(2.0))
            .await
            .unwrap();

        let entries = backend.fetch_all().await.unwrap();
        let list = SettingEntry::find(&entries, "default", "list").unwrap();
        assert_eq!(list.value, Value::from(vec!["a", "b"]));
        let ratio = SettingEntry::find(&entries, "default", "ratio").unwrap();
        assert_eq!(ratio.value, Value::Float(2.0));
    }

    #[tokio::test]
    async fn duplicate_domain_key_is_rejected() {
        let backend = MemoryBackend::new();
        backend.insert("d", "k", &Value::Null).await.unwrap();
        assert!(backend.insert("d", "k", &Value::Null).await.is_err());
        assert!(backend.insert("other", "k", &Value::Null).await.is_ok());
    }

    #[tokio::test]
    async fn update_rewrites_type_tag() {
        let backend = MemoryBackend::new();
        let id = backend.insert("d", "k", &Value::Integer(1)).await.unwrap();
        backend.update(id, &Value::from("one")).await.unwrap();

        let entries = backend.fetch_all().await.unwrap();
        assert_eq!(entries.first().map(|e| &e.value), Some(&Value::from("one")));
    }

    #[tokio::test]
    async fn injected_failure_stops_writes() {
        let backend = MemoryBackend::new().fail_after_writes(0);
        assert!(backend.insert("d", "k", &Value::Null).await.is_err());
        assert!(backend.is_empty().await);
    }
}
