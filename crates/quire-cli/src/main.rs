//! Command-line entry point for the Quire settings store.
//!
//! ```text
//! quire [--config FILE] publish [--target DIR] [--force]
//! quire [--config FILE] migrate
//! quire [--config FILE] get|set|delete KEY [VALUE]
//! quire [--config FILE] reset|list [DOMAIN]
//! quire [--config FILE] serve
//! ```
//!
//! Keys are dotted paths, optionally prefixed with `domain::`.

mod publish;
mod session;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use quire_core::{SettingsCache, SettingsConfig, SettingsManager, SettingsStore};
use quire_db::{DragonflyCache, PgSettingsBackend, PostgresConfig, PostgresPool};
use quire_http::{SettingsState, start_server};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::session::SessionCommand;

/// Domain-scoped settings with deferred batch save.
#[derive(Parser)]
#[command(name = "quire", author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the configuration file; defaults apply if it does not exist.
    #[arg(short, long, value_name = "FILE", default_value = "quire-config.yaml", global = true)]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default config and table migration into a project
    Publish {
        /// Directory to publish into
        #[arg(long, value_name = "DIR", default_value = ".")]
        target: PathBuf,

        /// Overwrite files that already exist
        #[arg(long)]
        force: bool,
    },

    /// Create the configured settings table if it does not exist
    Migrate,

    /// Print the value stored at KEY as JSON
    Get {
        /// Dotted key, optionally `domain::`-prefixed
        key: String,
    },

    /// Store VALUE (JSON, or plain text) at KEY
    Set {
        /// Dotted key, optionally `domain::`-prefixed
        key: String,
        /// Value to store
        value: String,
    },

    /// Remove the value stored at KEY
    Delete {
        /// Dotted key, optionally `domain::`-prefixed
        key: String,
    },

    /// Remove every setting of DOMAIN (the default domain if omitted)
    Reset {
        /// Domain to clear
        domain: Option<String>,
    },

    /// Print every setting of DOMAIN (the default domain if omitted)
    List {
        /// Domain to print
        domain: Option<String>,
    },

    /// Run the HTTP API
    Serve,
}

/// Application entry point.
///
/// Initializes logging, loads configuration, and dispatches the command.
///
/// # Errors
///
/// Returns an error if configuration, connection, or the command fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = SettingsConfig::load_or_default(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    let command = match cli.command {
        Commands::Publish { target, force } => {
            let report = publish::publish(&target, &config.database.table, force)?;
            info!(
                written = report.written.len(),
                skipped = report.skipped.len(),
                "publish complete"
            );
            return Ok(());
        }
        Commands::Migrate => {
            let (pool, backend) = connect_backend(&config).await?;
            backend.ensure_table().await?;
            pool.close().await;
            return Ok(());
        }
        Commands::Serve => {
            let store = open_store(&config).await?;
            let state = Arc::new(SettingsState::new(store, &config));
            start_server(&config.server, state).await?;
            return Ok(());
        }
        Commands::Get { key } => SessionCommand::Get { key },
        Commands::Set { key, value } => SessionCommand::Set { key, value },
        Commands::Delete { key } => SessionCommand::Delete { key },
        Commands::Reset { domain } => SessionCommand::Reset { domain },
        Commands::List { domain } => SessionCommand::List { domain },
    };

    let store = open_store(&config).await?;
    let mut manager = SettingsManager::from_config(store, &config);
    let output = session::run(&mut manager, command).await?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}

async fn connect_backend(
    config: &SettingsConfig,
) -> anyhow::Result<(PostgresPool, PgSettingsBackend)> {
    let pool = PostgresPool::connect(&PostgresConfig::from_settings(&config.database))
        .await
        .context("failed to connect to PostgreSQL")?;
    let backend = PgSettingsBackend::new(pool.pool().clone(), &config.database.table)?;
    Ok((pool, backend))
}

/// Build the store from config. An unreachable cache is logged and skipped.
async fn open_store(config: &SettingsConfig) -> anyhow::Result<SettingsStore> {
    let (_pool, backend) = connect_backend(config).await?;

    let cache: Option<Arc<dyn SettingsCache>> = if config.cache.enabled {
        match DragonflyCache::connect(&config.cache.url).await {
            Ok(cache) => {
                let cache: Arc<dyn SettingsCache> = Arc::new(cache);
                Some(cache)
            }
            Err(e) => {
                warn!(url = %config.cache.url, error = %e, "cache unavailable, running uncached");
                None
            }
        }
    } else {
        None
    };

    Ok(SettingsStore::from_config(
        Arc::new(backend),
        cache,
        &config.cache,
    ))
}
