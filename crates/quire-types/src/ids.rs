//! Type-safe identifier for persisted setting rows.
//!
//! Rows are keyed by a surrogate `BIGSERIAL` assigned by the backing store.
//! The wrapper keeps row ids from being mixed up with other integers (for
//! example integer setting values) at compile time.

use serde::{Deserialize, Serialize};

/// Surrogate identifier of a persisted setting row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub i64);

impl EntryId {
    /// Wrap a raw row id.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Return the inner row id.
    pub const fn into_inner(self) -> i64 {
        self.0
    }
}

impl core::fmt::Display for EntryId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for EntryId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<EntryId> for i64 {
    fn from(id: EntryId) -> Self {
        id.0
    }
}
