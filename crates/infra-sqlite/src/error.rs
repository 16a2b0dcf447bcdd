// sqlx::Error -> AppError mapping
//
// Orphan rules prevent `From<sqlx::Error> for AppError` here, so every query
// maps through this helper.

use hottub_core::error::AppError;

pub(crate) fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => {
            // SQLite error codes: https://www.sqlite.org/rescode.html
            match db_err.code().as_deref() {
                // UNIQUE / PRIMARY KEY constraint failed
                Some(code @ ("2067" | "1555")) => AppError::Conflict(format!(
                    "Unique constraint violation: {} ({})",
                    db_err.message(),
                    code
                )),
                // SQLITE_BUSY - database is locked past busy_timeout
                Some("5") => AppError::Store(format!(
                    "Database locked (SQLITE_BUSY): {}",
                    db_err.message()
                )),
                // SQLITE_FULL - database or disk is full
                Some("13") => AppError::Store(format!("Database full: {}", db_err.message())),
                Some(code) => AppError::Store(format!(
                    "Database error [{}]: {}",
                    code,
                    db_err.message()
                )),
                None => AppError::Store(format!("Database error: {}", db_err.message())),
            }
        }
        sqlx::Error::RowNotFound => AppError::NotFound("Row not found".to_string()),
        sqlx::Error::ColumnNotFound(col) => AppError::Store(format!("Column not found: {}", col)),
        sqlx::Error::PoolTimedOut => {
            AppError::Store("Timed out waiting for a database connection".to_string())
        }
        // Connection, pool, protocol errors
        _ => AppError::Store(err.to_string()),
    }
}
