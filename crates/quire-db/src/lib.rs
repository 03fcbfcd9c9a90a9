//! Data layer for the settings store (`PostgreSQL` + `Dragonfly`).
//!
//! `PostgreSQL` holds the durable settings rows. `Dragonfly` optionally
//! caches the full entry list so that most loads skip the database.
//!
//! ```text
//! SettingsManager
//!     |
//!     +-- SettingsStore::all --> DragonflyCache (hit) / PgSettingsBackend (miss)
//!     |
//!     +-- SettingsStore::save --> PgSettingsBackend (insert/update/delete)
//!                             --> DragonflyCache::forget
//! ```
//!
//! # Modules
//!
//! - [`dragonfly`] -- `Dragonfly` cache of the entry list
//! - [`postgres`] -- `PostgreSQL` connection pool and configuration
//! - [`settings_store`] -- Settings table backend and DDL
//! - [`error`] -- Shared error types

pub mod dragonfly;
pub mod error;
pub mod postgres;
pub mod settings_store;

// Re-export primary types for convenience.
pub use dragonfly::DragonflyCache;
pub use error::DbError;
pub use postgres::{PostgresConfig, PostgresPool};
pub use settings_store::{PgSettingsBackend, SettingRow, create_table_sql};
