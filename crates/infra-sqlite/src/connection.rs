// SQLite Connection Pool Setup

use crate::error::map_sqlx_error;
use hottub_core::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

/// Create SQLite connection pool with WAL mode.
///
/// `timeout` bounds both SQLite's busy wait and pool acquisition. In-memory
/// databases are per-connection, so they get exactly one long-lived connection.
pub async fn create_pool(database_url: &str, timeout: Duration) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(map_sqlx_error)?
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(timeout)
        .create_if_missing(true);

    let pool_options = SqlitePoolOptions::new().acquire_timeout(timeout);
    let pool_options = if is_memory_url(database_url) {
        pool_options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        pool_options.max_connections(4)
    };

    let pool = pool_options
        .connect_with(options)
        .await
        .map_err(map_sqlx_error)?;

    Ok(pool)
}

fn is_memory_url(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}
