use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::config::Config;
use crate::error::RegistryError;

/// Create (if needed) and connect to the database file. Used by `init` only.
pub async fn create(config: &Config) -> anyhow::Result<SqlitePool> {
    let db_path = &config.db.path;

    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Connect to an existing, initialized database.
///
/// Never creates the file. A missing file, a file SQLite cannot open, or a
/// database without the registry schema is a precondition failure.
pub async fn open(config: &Config) -> Result<SqlitePool, RegistryError> {
    let db_path = &config.db.path;
    let unavailable = |reason: String| RegistryError::StorageUnavailable {
        path: db_path.clone(),
        reason,
    };

    if !db_path.is_file() {
        return Err(unavailable(
            "database file not found (run `oreg init` first)".to_string(),
        ));
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))
        .map_err(|e| unavailable(e.to_string()))?
        .create_if_missing(false)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    // A single connection keeps the batch transaction and every read on
    // the same handle.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .map_err(|e| unavailable(e.to_string()))?;

    let initialized: Result<bool, sqlx::Error> = sqlx::query_scalar(
        "SELECT COUNT(*) = 4 FROM sqlite_master WHERE name IN \
         ('organizations', 'office_bearers', 'organizations_fts', 'office_bearers_fts')",
    )
    .fetch_one(&pool)
    .await;

    match initialized {
        Ok(true) => Ok(pool),
        Ok(false) => {
            pool.close().await;
            Err(unavailable(
                "registry schema is missing (run `oreg init` first)".to_string(),
            ))
        }
        Err(e) => {
            pool.close().await;
            Err(unavailable(e.to_string()))
        }
    }
}
