// Migration Runner

use crate::error::map_sqlx_error;
use hottub_core::error::Result;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};

/// Run database migrations.
///
/// Safe to run from several processes at once: each migration takes the
/// write lock before re-checking the version, so it is applied exactly once.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Running database migrations...");

    let mut conn = pool.acquire().await.map_err(map_sqlx_error)?;
    let current_version = current_version(&mut *conn).await?;
    info!(current_version, "Current schema version");

    // Apply migrations sequentially
    if current_version < 1 {
        info!("Applying migration 001: Heating events");
        apply_migration(
            &mut *conn,
            1,
            include_str!("../migrations/001_heating_events.sql"),
        )
        .await?;
    }

    info!("All migrations applied successfully");
    Ok(())
}

async fn current_version(conn: &mut SqliteConnection) -> Result<i64> {
    let table_exists: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_version'",
    )
    .fetch_one(&mut *conn)
    .await
    .map_err(map_sqlx_error)?;

    if table_exists == 0 {
        return Ok(0);
    }

    let version: Option<i64> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(&mut *conn)
            .await
            .map_err(map_sqlx_error)?;
    Ok(version.unwrap_or(0))
}

/// Apply a single migration SQL file under an IMMEDIATE transaction
async fn apply_migration(conn: &mut SqliteConnection, version: i64, sql: &str) -> Result<()> {
    sqlx::query("BEGIN IMMEDIATE")
        .execute(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    match apply_locked(conn, version, sql).await {
        Ok(()) => {
            sqlx::query("COMMIT")
                .execute(&mut *conn)
                .await
                .map_err(map_sqlx_error)?;
            Ok(())
        }
        Err(e) => {
            if let Err(rollback) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                warn!(error = %rollback, "Migration rollback failed");
            }
            Err(e)
        }
    }
}

async fn apply_locked(conn: &mut SqliteConnection, version: i64, sql: &str) -> Result<()> {
    if current_version(conn).await? >= version {
        info!(version, "Migration already applied by another process");
        return Ok(());
    }

    // Strip comment lines, then split by semicolon
    let uncommented: String = sql
        .lines()
        .filter(|line| !line.trim().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n");

    for statement in uncommented.split(';') {
        let statement = statement.trim();
        if !statement.is_empty() {
            sqlx::query(statement)
                .execute(&mut *conn)
                .await
                .map_err(map_sqlx_error)?;
        }
    }
    Ok(())
}
