use std::sync::Arc;
use std::time::Duration;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;

use crate::error::{AppError, AppResult};
use crate::storage::migrations::run_migrations;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Maximum number of pooled SQLite connections
const MAX_POOL_SIZE: u32 = 10;

/// Create a new database connection pool
///
/// Every connection gets a SQLite busy timeout of `timeout`, and checkouts from
/// the pool give up after the same duration, so a locked or unreachable
/// database turns into [`AppError::StorageUnavailable`] instead of a hang.
/// Schema migrations run once on the first connection.
///
/// # Arguments
///
/// * `database_path` - Path to SQLite database file
/// * `timeout` - Pool checkout and busy timeout
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use rafflecore::storage::create_pool;
///
/// let pool = create_pool("participants.db", Duration::from_secs(5))?;
/// # Ok::<(), rafflecore::error::AppError>(())
/// ```
pub fn create_pool(database_path: &str, timeout: Duration) -> AppResult<DbPool> {
    let manager = SqliteConnectionManager::file(database_path).with_init(move |conn| {
        conn.busy_timeout(timeout)?;
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON;")
    });

    let pool = Pool::builder()
        .max_size(MAX_POOL_SIZE)
        .connection_timeout(timeout)
        .build(manager)?;

    let mut conn = pool.get()?;
    run_migrations(&mut conn).map_err(|e| AppError::StorageUnavailable(format!("{:#}", e)))?;

    log::info!("Database ready at {} (pool size {})", database_path, MAX_POOL_SIZE);
    Ok(pool)
}

/// Get a connection from the pool
///
/// The connection is returned to the pool when dropped.
pub fn get_connection(pool: &DbPool) -> AppResult<DbConnection> {
    Ok(pool.get()?)
}

/// Waits until every pooled connection is back in the pool, then releases
/// this handle to it.
///
/// Called after the HTTP server has stopped accepting requests, so only
/// in-flight storage calls can still hold connections. Gives up after `grace`.
pub async fn shutdown_pool(pool: Arc<DbPool>, grace: Duration) {
    let deadline = tokio::time::Instant::now() + grace;

    loop {
        let state = pool.state();
        if state.idle_connections >= state.connections {
            break;
        }
        if tokio::time::Instant::now() >= deadline {
            log::warn!(
                "Closing database pool with {} connection(s) still in use",
                state.connections - state.idle_connections
            );
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    if Arc::strong_count(&pool) > 1 {
        log::warn!("Database pool is still referenced elsewhere; it closes when the last handle drops");
    }
    drop(pool);
    log::info!("Database pool closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_pool_runs_migrations() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("participants.db");
        let pool = create_pool(path.to_str().unwrap(), Duration::from_secs(1)).unwrap();

        let conn = get_connection(&pool).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM participants", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_create_pool_fails_for_unreachable_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing-dir").join("participants.db");
        let err = create_pool(path.to_str().unwrap(), Duration::from_millis(200)).unwrap_err();
        assert!(err.is_storage_unavailable());
    }

    #[tokio::test]
    async fn test_shutdown_pool_with_idle_connections() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("participants.db");
        let pool = create_pool(path.to_str().unwrap(), Duration::from_secs(1)).unwrap();

        let started = std::time::Instant::now();
        shutdown_pool(Arc::new(pool), Duration::from_secs(5)).await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
