//! Shared type definitions for the Quire settings store.
//!
//! Every crate in the workspace speaks in these types: the dynamic
//! [`Value`] held in memory, the [`TypeTag`] persisted next to each raw
//! value, the [`SettingEntry`] rows loaded from a store, and the
//! [`Changeset`] produced when an in-memory snapshot is compared with the
//! persisted one.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe wrapper for persisted row identifiers
//! - [`value`] -- Dynamic values, type tags, and storage casting
//! - [`entry`] -- Persisted entries, flat snapshots, and changesets

pub mod entry;
pub mod ids;
pub mod value;

// Re-export all public types at crate root for convenience.
pub use entry::{Changeset, FlatMap, FlatSnapshot, SettingEntry};
pub use ids::EntryId;
pub use value::{CastError, Mapping, TypeTag, Value};
