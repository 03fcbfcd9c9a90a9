//! Dotted-path addressing over nested [`Mapping`] trees.
//!
//! A key such as `mail.smtp.port` addresses the leaf `port` inside the
//! mapping `smtp` inside the mapping `mail`. These helpers read and write
//! such paths in place, and convert between nested trees and flat
//! dotted-key maps.
//!
//! Only non-empty mappings are descended into when flattening. Sequences,
//! scalars, and empty mappings are leaves.
//!
//! Callers are expected to pass well-formed keys (non-empty segments); the
//! manager validates keys before they reach this module.

use quire_types::{FlatMap, Mapping, Value};

/// Segment separator inside a key.
pub const SEPARATOR: char = '.';

/// Look up the value at `key`.
pub fn get<'a>(map: &'a Mapping, key: &str) -> Option<&'a Value> {
    let mut segments = key.split(SEPARATOR);
    let first = segments.next()?;
    let mut current = map.get(first)?;
    for segment in segments {
        current = current.as_mapping()?.get(segment)?;
    }
    Some(current)
}

/// Return `true` if a value (including `Null`) exists at `key`.
pub fn has(map: &Mapping, key: &str) -> bool {
    get(map, key).is_some()
}

/// Write `value` at `key`, creating intermediate mappings as needed.
///
/// An intermediate segment that currently holds a non-mapping value is
/// replaced by a fresh mapping.
pub fn set(map: &mut Mapping, key: &str, value: Value) {
    let segments: Vec<&str> = key.split(SEPARATOR).collect();
    set_segments(map, &segments, value);
}

fn set_segments(map: &mut Mapping, segments: &[&str], value: Value) {
    match segments {
        [] => {}
        [last] => {
            map.insert((*last).to_owned(), value);
        }
        [head, rest @ ..] => {
            let slot = map
                .entry((*head).to_owned())
                .or_insert_with(|| Value::Mapping(Mapping::new()));
            if let Value::Mapping(inner) = slot {
                set_segments(inner, rest, value);
            } else {
                let mut inner = Mapping::new();
                set_segments(&mut inner, rest, value);
                *slot = Value::Mapping(inner);
            }
        }
    }
}

/// Remove the value at `key` and prune every mapping the removal emptied.
///
/// Returns the removed value, or `None` if nothing was stored at `key`.
/// Mappings that were already empty before the call are left alone.
pub fn forget(map: &mut Mapping, key: &str) -> Option<Value> {
    let segments: Vec<&str> = key.split(SEPARATOR).collect();
    forget_segments(map, &segments)
}

fn forget_segments(map: &mut Mapping, segments: &[&str]) -> Option<Value> {
    match segments {
        [] => None,
        [last] => map.remove(*last),
        [head, rest @ ..] => {
            let Some(Value::Mapping(inner)) = map.get_mut(*head) else {
                return None;
            };
            let removed = forget_segments(inner, rest);
            if removed.is_some() && inner.is_empty() {
                map.remove(*head);
            }
            removed
        }
    }
}

/// Flatten a nested mapping into dotted keys.
pub fn dot(map: &Mapping) -> FlatMap {
    let mut flat = FlatMap::new();
    dot_into(map, "", &mut flat);
    flat
}

fn dot_into(map: &Mapping, prefix: &str, flat: &mut FlatMap) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}{SEPARATOR}{key}")
        };
        match value {
            Value::Mapping(inner) if !inner.is_empty() => dot_into(inner, &path, flat),
            leaf => {
                flat.insert(path, leaf.clone());
            }
        }
    }
}

/// Return `true` if every mapping key reachable through nested mappings
/// is a single non-empty segment.
///
/// Such a value flattens into dotted keys that [`undot`] rebuilds into the
/// same tree. Keys inside sequences are not checked; sequences are stored
/// whole.
pub fn is_addressable(value: &Value) -> bool {
    match value {
        Value::Mapping(map) => map.iter().all(|(key, inner)| {
            !key.is_empty() && !key.contains(SEPARATOR) && is_addressable(inner)
        }),
        _ => true,
    }
}

/// Rebuild a nested mapping from dotted keys.
pub fn undot<'a, I>(flat: I) -> Mapping
where
    I: IntoIterator<Item = (&'a str, &'a Value)>,
{
    let mut map = Mapping::new();
    for (key, value) in flat {
        set(&mut map, key, value.clone());
    }
    map
}
