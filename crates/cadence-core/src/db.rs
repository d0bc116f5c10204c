use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::error::CoreError;

pub use sqlx::SqlitePool as DbPool;

const MEMORY_URL: &str = "sqlite::memory:";

/// Opens a connection pool to the SQLite database and runs migrations.
///
/// # Arguments
///
/// * `db_path` - Path to the database file, or `sqlite::memory:` for a
///   throwaway in-memory database.
///
/// # Returns
///
/// The ready-to-use pool, or a `CoreError` if the file cannot be created, the
/// connection fails or migrations cannot be run.
pub async fn establish_connection(db_path: &str) -> Result<SqlitePool, CoreError> {
    let pool = if db_path == MEMORY_URL {
        // every connection to :memory: is its own database, so keep exactly one
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(SqliteConnectOptions::from_str(MEMORY_URL)?.foreign_keys(true))
            .await?
    } else {
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?
    };

    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::debug!(path = db_path, "database ready");
    Ok(pool)
}
