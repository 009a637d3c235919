//! Connection pool creation.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OpenFlags};
use thiserror::Error;

/// Runtime tunables for SQLite connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbRuntimeSettings {
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u64,
    /// Maximum number of pooled connections.
    pub pool_max_size: u32,
}

impl Default for DbRuntimeSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            pool_max_size: 8,
        }
    }
}

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("failed to create database connection pool: {0}")]
    PoolInit(#[from] r2d2::Error),
}

/// Opens a file-backed pool with WAL journaling and foreign keys enabled.
///
/// # Errors
///
/// Returns [`PoolError::PoolInit`] if the first connection cannot be opened
/// or initialized.
pub fn create_pool(db_path: &str, settings: DbRuntimeSettings) -> Result<DbPool, PoolError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;

    let manager = SqliteConnectionManager::file(db_path)
        .with_flags(flags)
        .with_init(move |conn| {
            conn.query_row("PRAGMA journal_mode = WAL;", [], |_| Ok(()))?;
            init_connection(conn, settings.busy_timeout_ms)
        });

    let pool = Pool::builder()
        .max_size(settings.pool_max_size)
        .build(manager)?;

    tracing::debug!(
        path = db_path,
        max_size = settings.pool_max_size,
        "database pool ready"
    );

    Ok(pool)
}

/// Opens a single-connection in-memory pool.
///
/// Every SQLite in-memory connection is its own database, so the pool is
/// capped at one connection to keep all callers on the same data.
pub fn create_memory_pool() -> Result<DbPool, PoolError> {
    let manager = SqliteConnectionManager::memory().with_init(|conn| init_connection(conn, 5_000));
    Ok(Pool::builder().max_size(1).build(manager)?)
}

fn init_connection(conn: &mut Connection, busy_timeout_ms: u64) -> Result<(), rusqlite::Error> {
    conn.execute_batch(&format!(
        "PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = {busy_timeout_ms};"
    ))
}
