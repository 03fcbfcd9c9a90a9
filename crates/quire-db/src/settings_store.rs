//! `PostgreSQL` backend for settings rows.
//!
//! Each row holds one flattened setting: its domain, dotted key, the value
//! encoded as text (`NULL` for a null value), and the type tag used to cast
//! the text back on read.
//!
//! The table name comes from configuration and cannot be bound as a query
//! parameter, so it is validated as a plain identifier before it is ever
//! spliced into SQL. All values are bound.

use async_trait::async_trait;
use quire_core::config::is_valid_identifier;
use quire_core::{SettingsBackend, StoreError};
use quire_types::{EntryId, SettingEntry, TypeTag, Value};
use sqlx::PgPool;

use crate::error::DbError;

/// A raw row from the settings table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SettingRow {
    /// Auto-incremented row ID.
    pub id: i64,
    /// Domain the setting belongs to.
    pub domain: String,
    /// Dotted key within the domain.
    pub key: String,
    /// Encoded value, `None` for a null value.
    pub value: Option<String>,
    /// Type tag (`type` column).
    pub type_tag: String,
    /// When the row was created.
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// When the row was last written.
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl SettingRow {
    /// Cast the row into a typed entry.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Cast`] if the tag is unknown or the text does not
    /// parse as the tagged type.
    pub fn into_entry(self) -> Result<SettingEntry, DbError> {
        let tag: TypeTag = self.type_tag.parse()?;
        let value = tag.cast(self.value.as_deref())?;
        Ok(SettingEntry {
            id: EntryId::new(self.id),
            domain: self.domain,
            key: self.key,
            value,
        })
    }
}

/// Return the DDL creating `table` with the settings schema.
///
/// # Errors
///
/// Returns [`DbError::InvalidTable`] if `table` is not a plain identifier.
pub fn create_table_sql(table: &str) -> Result<String, DbError> {
    check_table(table)?;
    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {table} (
    id          BIGSERIAL PRIMARY KEY,
    domain      TEXT NOT NULL,
    key         TEXT NOT NULL,
    value       TEXT NULL,
    type        TEXT NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (domain, key)
);

CREATE INDEX IF NOT EXISTS idx_{table}_domain ON {table} (domain);
"
    ))
}

fn check_table(table: &str) -> Result<(), DbError> {
    if is_valid_identifier(table) {
        Ok(())
    } else {
        Err(DbError::InvalidTable(table.to_owned()))
    }
}

/// Settings rows stored in a `PostgreSQL` table.
#[derive(Debug, Clone)]
pub struct PgSettingsBackend {
    pool: PgPool,
    table: String,
}

impl PgSettingsBackend {
    /// Create a backend over `table`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidTable`] if `table` is not a plain identifier.
    pub fn new(pool: PgPool, table: &str) -> Result<Self, DbError> {
        check_table(table)?;
        Ok(Self {
            pool,
            table: table.to_owned(),
        })
    }

    /// Create the table if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the DDL fails.
    pub async fn ensure_table(&self) -> Result<(), DbError> {
        let ddl = create_table_sql(&self.table)?;
        sqlx::raw_sql(&ddl).execute(&self.pool).await?;
        tracing::info!(table = %self.table, "Settings table ready");
        Ok(())
    }

    /// Load every raw row, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn rows(&self) -> Result<Vec<SettingRow>, DbError> {
        let rows = sqlx::query_as::<_, SettingRow>(&format!(
            "SELECT id, domain, key, value, type AS type_tag, created_at, updated_at
             FROM {}
             ORDER BY id",
            self.table
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert_row(&self, domain: &str, key: &str, value: &Value) -> Result<EntryId, DbError> {
        let raw = value.encode()?;
        let id: i64 = sqlx::query_scalar(&format!(
            "INSERT INTO {} (domain, key, value, type)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
            self.table
        ))
        .bind(domain)
        .bind(key)
        .bind(raw)
        .bind(value.type_tag().as_str())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(id, domain, key, "Inserted setting");
        Ok(EntryId::new(id))
    }

    async fn update_row(&self, id: EntryId, value: &Value) -> Result<(), DbError> {
        let raw = value.encode()?;
        sqlx::query(&format!(
            "UPDATE {} SET value = $1, type = $2, updated_at = now() WHERE id = $3",
            self.table
        ))
        .bind(raw)
        .bind(value.type_tag().as_str())
        .bind(id.into_inner())
        .execute(&self.pool)
        .await?;

        tracing::debug!(id = id.into_inner(), "Updated setting");
        Ok(())
    }

    async fn delete_row(&self, id: EntryId) -> Result<(), DbError> {
        sqlx::query(&format!("DELETE FROM {} WHERE id = $1", self.table))
            .bind(id.into_inner())
            .execute(&self.pool)
            .await?;

        tracing::debug!(id = id.into_inner(), "Deleted setting");
        Ok(())
    }
}

#[async_trait]
impl SettingsBackend for PgSettingsBackend {
    async fn fetch_all(&self) -> Result<Vec<SettingEntry>, StoreError> {
        let rows = self.rows().await?;
        rows.into_iter()
            .map(|row| row.into_entry().map_err(StoreError::from))
            .collect()
    }

    async fn insert(&self, domain: &str, key: &str, value: &Value) -> Result<EntryId, StoreError> {
        Ok(self.insert_row(domain, key, value).await?)
    }

    async fn update(&self, id: EntryId, value: &Value) -> Result<(), StoreError> {
        Ok(self.update_row(id, value).await?)
    }

    async fn remove(&self, id: EntryId) -> Result<(), StoreError> {
        Ok(self.delete_row(id).await?)
    }
}
