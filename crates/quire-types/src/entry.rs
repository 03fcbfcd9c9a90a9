//! Persisted setting entries, flat snapshots, and changesets.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::ids::EntryId;
use crate::value::Value;

/// A flat map from dotted key to leaf value within one domain.
pub type FlatMap = BTreeMap<String, Value>;

/// A flat snapshot: domain name to the domain's flat dotted-key map.
pub type FlatSnapshot = BTreeMap<String, FlatMap>;

/// A persisted setting leaf with its value already cast back from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingEntry {
    /// Surrogate row id assigned by the store.
    pub id: EntryId,
    /// Domain the entry belongs to.
    pub domain: String,
    /// Dotted path of the leaf inside the domain.
    pub key: String,
    /// The casted value.
    pub value: Value,
}

impl SettingEntry {
    /// Group a list of entries into a flat snapshot keyed by domain.
    ///
    /// If the list holds duplicate `(domain, key)` pairs the last one wins.
    pub fn group_by_domain(entries: &[Self]) -> FlatSnapshot {
        let mut snapshot = FlatSnapshot::new();
        for entry in entries {
            snapshot
                .entry(entry.domain.clone())
                .or_default()
                .insert(entry.key.clone(), entry.value.clone());
        }
        snapshot
    }

    /// Find the entry stored for `(domain, key)` in a list of entries.
    pub fn find<'a>(entries: &'a [Self], domain: &str, key: &str) -> Option<&'a Self> {
        entries
            .iter()
            .find(|e| e.domain == domain && e.key == key)
    }
}

/// The result of comparing an unsaved snapshot with a saved one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Changeset {
    /// Leaves present in memory but not in the store.
    pub inserted: FlatSnapshot,
    /// Leaves present in both whose values differ.
    pub updated: FlatSnapshot,
    /// Keys present in the store but no longer in memory.
    pub deleted: BTreeMap<String, BTreeSet<String>>,
}

impl Changeset {
    /// Return `true` if applying the changeset would not touch the store.
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }

    /// Number of inserted leaves across all domains.
    pub fn inserted_count(&self) -> usize {
        self.inserted.values().map(BTreeMap::len).sum()
    }

    /// Number of updated leaves across all domains.
    pub fn updated_count(&self) -> usize {
        self.updated.values().map(BTreeMap::len).sum()
    }

    /// Number of deleted leaves across all domains.
    pub fn deleted_count(&self) -> usize {
        self.deleted.values().map(BTreeSet::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i64, domain: &str, key: &str, value: Value) -> SettingEntry {
        SettingEntry {
            id: EntryId::new(id),
            domain: domain.to_owned(),
            key: key.to_owned(),
            value,
        }
    }

    #[test]
    fn groups_entries_per_domain() {
        let entries = vec![
            entry(1, "default", "foo", Value::from("bar")),
            entry(2, "test", "a.b", Value::Integer(1)),
            entry(3, "default", "baz", Value::Bool(false)),
        ];

        let snapshot = SettingEntry::group_by_domain(&entries);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("default").map(BTreeMap::len), Some(2));
        assert_eq!(
            snapshot.get("test").and_then(|m| m.get("a.b")),
            Some(&Value::Integer(1))
        );
    }

    #[test]
    fn finds_entry_by_domain_and_key() {
        let entries = vec![
            entry(1, "default", "foo", Value::Null),
            entry(2, "test", "foo", Value::Null),
        ];
        let found = SettingEntry::find(&entries, "test", "foo").map(|e| e.id);
        assert_eq!(found, Some(EntryId::new(2)));
        assert!(SettingEntry::find(&entries, "other", "foo").is_none());
    }

    #[test]
    fn changeset_counts() {
        let mut changes = Changeset::default();
        assert!(changes.is_empty());

        changes
            .deleted
            .entry(String::from("default"))
            .or_default()
            .insert(String::from("c"));
        changes
            .inserted
            .entry(String::from("default"))
            .or_default()
            .insert(String::from("a"), Value::Integer(1));

        assert!(!changes.is_empty());
        assert_eq!(changes.inserted_count(), 1);
        assert_eq!(changes.updated_count(), 0);
        assert_eq!(changes.deleted_count(), 1);
    }
}
