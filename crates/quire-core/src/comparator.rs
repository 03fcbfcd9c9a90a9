//! Change detection between the in-memory and persisted snapshots.
//!
//! The comparator is a pure function over two flat snapshots (domain to
//! dotted key to value). It decides which leaves must be inserted,
//! rewritten, or removed so the store ends up matching memory.
//!
//! # Deletion policy
//!
//! Every key present in the saved snapshot and absent from the unsaved one
//! is deleted. This includes whole domains that are missing from the
//! unsaved snapshot: after `reset("test")` the `test` domain disappears from
//! memory and every persisted `test` key must go. When the unsaved snapshot
//! is empty this degenerates into a full wipe of the store.

use std::collections::BTreeSet;

use quire_types::{Changeset, FlatMap, FlatSnapshot};

/// Compute the changeset that turns `saved` into `unsaved`.
///
/// Value comparison is strict: a leaf whose type changed (for example
/// `Integer(1)` to `Float(1.0)`) counts as updated.
pub fn compare(unsaved: &FlatSnapshot, saved: &FlatSnapshot) -> Changeset {
    let mut changes = Changeset::default();
    let empty = FlatMap::new();

    for (domain, values) in unsaved {
        let saved_values = saved.get(domain).unwrap_or(&empty);

        for (key, value) in values {
            match saved_values.get(key) {
                Some(previous) if previous != value => {
                    changes
                        .updated
                        .entry(domain.clone())
                        .or_default()
                        .insert(key.clone(), value.clone());
                }
                Some(_) => {}
                None => {
                    changes
                        .inserted
                        .entry(domain.clone())
                        .or_default()
                        .insert(key.clone(), value.clone());
                }
            }
        }
    }

    for (domain, saved_values) in saved {
        let unsaved_values = unsaved.get(domain).unwrap_or(&empty);
        let removed: BTreeSet<String> = saved_values
            .keys()
            .filter(|key| !unsaved_values.contains_key(*key))
            .cloned()
            .collect();

        if !removed.is_empty() {
            changes.deleted.insert(domain.clone(), removed);
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use quire_types::Value;

    use super::*;

    fn snapshot(domains: Vec<(&str, Vec<(&str, Value)>)>) -> FlatSnapshot {
        domains
            .into_iter()
            .map(|(domain, values)| {
                let flat: FlatMap = values
                    .into_iter()
                    .map(|(k, v)| (k.to_owned(), v))
                    .collect();
                (domain.to_owned(), flat)
            })
            .collect()
    }

    fn keys(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|k| (*k).to_owned()).collect()
    }

    #[test]
    fn insert_keep_and_delete_in_one_domain() {
        let unsaved = snapshot(vec![(
            "default",
            vec![("a", Value::Integer(1)), ("b", Value::Integer(2))],
        )]);
        let saved = snapshot(vec![(
            "default",
            vec![("b", Value::Integer(2)), ("c", Value::Integer(3))],
        )]);

        let changes = compare(&unsaved, &saved);

        assert_eq!(
            changes.inserted,
            snapshot(vec![("default", vec![("a", Value::Integer(1))])])
        );
        assert!(changes.updated.is_empty());
        assert_eq!(changes.deleted.get("default"), Some(&keys(&["c"])));
        assert_eq!(changes.deleted.len(), 1);
    }

    #[test]
    fn empty_unsaved_wipes_everything() {
        let saved = snapshot(vec![
            ("default", vec![("a", Value::Integer(1))]),
            ("test", vec![("b", Value::Integer(2))]),
        ]);

        let changes = compare(&FlatSnapshot::new(), &saved);

        assert!(changes.inserted.is_empty());
        assert!(changes.updated.is_empty());
        assert_eq!(changes.deleted.get("default"), Some(&keys(&["a"])));
        assert_eq!(changes.deleted.get("test"), Some(&keys(&["b"])));
    }

    #[test]
    fn absent_domain_is_fully_deleted() {
        let unsaved = snapshot(vec![("other", vec![("x", Value::Bool(true))])]);
        let saved = snapshot(vec![
            ("default", vec![("foo", Value::from("bar")), ("baz", Value::from("qux"))]),
            ("other", vec![("x", Value::Bool(true))]),
        ]);

        let changes = compare(&unsaved, &saved);

        assert_eq!(changes.deleted.get("default"), Some(&keys(&["baz", "foo"])));
        assert!(!changes.deleted.contains_key("other"));
        assert!(changes.inserted.is_empty());
    }

    #[test]
    fn type_change_counts_as_update() {
        let unsaved = snapshot(vec![("default", vec![("n", Value::Float(1.0))])]);
        let saved = snapshot(vec![("default", vec![("n", Value::Integer(1))])]);

        let changes = compare(&unsaved, &saved);

        assert_eq!(
            changes.updated,
            snapshot(vec![("default", vec![("n", Value::Float(1.0))])])
        );
        assert!(changes.inserted.is_empty());
        assert!(changes.deleted.is_empty());
    }

    #[test]
    fn identical_snapshots_produce_no_changes() {
        let both = snapshot(vec![
            ("default", vec![("list", Value::from(vec![1_i64, 2]))]),
            ("test", vec![("flag", Value::Null)]),
        ]);
        assert!(compare(&both, &both).is_empty());
    }

    #[test]
    fn new_domain_is_inserted() {
        let unsaved = snapshot(vec![("fresh", vec![("k", Value::from("v"))])]);
        let changes = compare(&unsaved, &FlatSnapshot::new());
        assert_eq!(changes.inserted_count(), 1);
        assert!(changes.deleted.is_empty());
    }
}
