//! SQLite pools for the catalog database.
//!
//! `init` and `import` write through [`connect`]; the query pipeline reads
//! through [`connect_lazy`].

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::config::Config;

const MAX_CONNECTIONS: u32 = 5;

fn catalog_options(config: &Config) -> Result<SqliteConnectOptions> {
    let url = format!("sqlite:{}", config.db.path.display());
    SqliteConnectOptions::from_str(&url)
        .with_context(|| format!("Invalid database path: {}", config.db.path.display()))
}

/// Writable pool. Creates the file (and its directory) when missing.
pub async fn connect(config: &Config) -> Result<SqlitePool> {
    if let Some(dir) = config.db.path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let options = catalog_options(config)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal);

    Ok(SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await?)
}

/// Read-side pool for the query pipeline.
///
/// No connection is opened here: a missing or unreadable database surfaces
/// on the first `acquire`, where the pipeline downgrades it to "no data".
pub fn connect_lazy(config: &Config) -> Result<SqlitePool> {
    let options = catalog_options(config)?.create_if_missing(false);

    Ok(SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_lazy_with(options))
}
