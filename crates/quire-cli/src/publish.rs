//! `quire publish`: copy the default config and table migration into a
//! host project.
//!
//! Files that already exist are left alone unless `force` is set, so the
//! command is safe to re-run.

use std::fs;
use std::path::{Path, PathBuf};

use quire_core::config::DEFAULT_CONFIG_YAML;
use quire_db::{DbError, create_table_sql};
use tracing::info;

/// Name of the published configuration file.
pub const CONFIG_FILE: &str = "quire-config.yaml";

/// Directory, relative to the target, that receives the migration.
pub const MIGRATIONS_DIR: &str = "migrations";

/// Errors raised while publishing.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// A file or directory could not be written.
    #[error("failed to write {path}: {source}")]
    Io {
        /// The path being written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The migration could not be rendered.
    #[error(transparent)]
    Migration(#[from] DbError),
}

/// What [`publish`] did with each file.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Files created or overwritten.
    pub written: Vec<PathBuf>,
    /// Files that already existed and were kept.
    pub skipped: Vec<PathBuf>,
}

/// Write the default config and the migration for `table` under `target`.
///
/// # Errors
///
/// Returns [`PublishError::Migration`] if `table` is not a plain
/// identifier, or [`PublishError::Io`] if a file cannot be written.
pub fn publish(target: &Path, table: &str, force: bool) -> Result<PublishReport, PublishError> {
    let migration = create_table_sql(table)?;
    let files = [
        (target.join(CONFIG_FILE), DEFAULT_CONFIG_YAML.to_owned()),
        (
            target
                .join(MIGRATIONS_DIR)
                .join(format!("0001_create_{table}.sql")),
            migration,
        ),
    ];

    let mut report = PublishReport::default();
    for (path, contents) in files {
        if path.exists() && !force {
            info!(path = %path.display(), "exists, skipping");
            report.skipped.push(path);
            continue;
        }
        write_file(&path, &contents)?;
        info!(path = %path.display(), "published");
        report.written.push(path);
    }
    Ok(report)
}

fn write_file(path: &Path, contents: &str) -> Result<(), PublishError> {
    let io = |source| PublishError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io)?;
    }
    fs::write(path, contents).map_err(io)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn writes_config_and_migration() {
        let dir = tempfile::tempdir().unwrap();
        let report = publish(dir.path(), "settings", false).unwrap();

        assert_eq!(report.written.len(), 2);
        assert!(report.skipped.is_empty());

        let config = fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, DEFAULT_CONFIG_YAML);
        let sql = fs::read_to_string(
            dir.path()
                .join(MIGRATIONS_DIR)
                .join("0001_create_settings.sql"),
        )
        .unwrap();
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS settings"));
    }

    #[test]
    fn keeps_existing_files_without_force() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "default-domain: app\n").unwrap();

        let report = publish(dir.path(), "settings", false).unwrap();

        assert_eq!(report.skipped, vec![dir.path().join(CONFIG_FILE)]);
        assert_eq!(report.written.len(), 1);
        let config = fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, "default-domain: app\n");
    }

    #[test]
    fn force_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "default-domain: app\n").unwrap();

        let report = publish(dir.path(), "settings", true).unwrap();

        assert!(report.skipped.is_empty());
        let config = fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, DEFAULT_CONFIG_YAML);
    }

    #[test]
    fn migration_is_named_after_table() {
        let dir = tempfile::tempdir().unwrap();
        publish(dir.path(), "app_settings", false).unwrap();

        let sql = fs::read_to_string(
            dir.path()
                .join(MIGRATIONS_DIR)
                .join("0001_create_app_settings.sql"),
        )
        .unwrap();
        assert!(sql.contains("app_settings"));
    }

    #[test]
    fn rejects_unsafe_table() {
        let dir = tempfile::tempdir().unwrap();
        let err = publish(dir.path(), "bad-name", false).unwrap_err();
        assert!(matches!(err, PublishError::Migration(DbError::InvalidTable(_))));
        assert!(!dir.path().join(CONFIG_FILE).exists());
    }
}
