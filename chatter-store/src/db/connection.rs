use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

use super::schema::{drop_all_sql, SCHEMA, TABLES};
use crate::error::StoreResult;

/// SQLite in-memory database identifier
const MEMORY_DB_PATH: &str = ":memory:";

/// Pragmas applied to every pooled connection
const CONNECTION_PRAGMAS: &str = "PRAGMA foreign_keys = ON;";

/// Upper bound on waiting for a pooled file connection
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Options for [`Database::sync`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Drop every table before recreating it
    pub force: bool,
}

impl SyncOptions {
    pub fn force() -> Self {
        Self { force: true }
    }
}

/// Storage context handed to repositories and the association manager.
///
/// Clones share the same pool.
#[derive(Clone)]
pub struct Database {
    pub pool: DbPool,
}

impl Database {
    /// Open (or create) a database at `path`; ":memory:" selects an in-memory database
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path_str = path.as_ref().to_string_lossy();
        let trimmed_path = path_str.trim();

        let pool = if trimmed_path.eq_ignore_ascii_case(MEMORY_DB_PATH) {
            // Every in-memory connection is its own database, so the pool keeps
            // exactly one connection alive for the lifetime of the handle.
            Pool::builder()
                .max_size(1)
                .min_idle(Some(1))
                .max_lifetime(None)
                .idle_timeout(None)
                .build(Self::with_pragmas(SqliteConnectionManager::memory()))?
        } else {
            // Fail fast on an unreachable path instead of waiting out the pool timeout
            Connection::open(path.as_ref())?;
            Pool::builder()
                .connection_timeout(CONNECTION_TIMEOUT)
                .build(Self::with_pragmas(SqliteConnectionManager::file(
                    path.as_ref(),
                )))?
        };

        tracing::debug!("Opened database pool for {}", path_str);
        Ok(Self { pool })
    }

    fn with_pragmas(manager: SqliteConnectionManager) -> SqliteConnectionManager {
        manager.with_init(|conn| conn.execute_batch(CONNECTION_PRAGMAS))
    }

    /// Create an in-memory database (useful for testing)
    pub fn in_memory() -> StoreResult<Self> {
        Self::open(MEMORY_DB_PATH)
    }

    /// Create the schema. With `force`, every table is dropped first and
    /// recreated empty.
    pub fn sync(&self, options: SyncOptions) -> StoreResult<()> {
        let conn = self.connection()?;
        if options.force {
            conn.execute_batch(&drop_all_sql())?;
            tracing::info!("Dropped {} tables for forced sync", TABLES.len());
        }
        conn.execute_batch(SCHEMA)?;
        tracing::info!("Schema synchronized (force: {})", options.force);
        Ok(())
    }

    /// Names of the schema tables currently present
    pub fn existing_tables(&self) -> StoreResult<Vec<String>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let tables = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(tables)
    }

    /// Row count per schema table, in dependency order
    pub fn table_counts(&self) -> StoreResult<Vec<(&'static str, i64)>> {
        let conn = self.connection()?;
        TABLES
            .iter()
            .map(|table| -> StoreResult<(&'static str, i64)> {
                let count: i64 =
                    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                        row.get(0)
                    })?;
                Ok((*table, count))
            })
            .collect()
    }

    /// Get a connection from the pool
    pub fn connection(&self) -> StoreResult<DbConnection> {
        Ok(self.pool.get()?)
    }

    /// Release the pool. Other clones of this handle keep it alive.
    pub fn close(self) {
        tracing::debug!("Closing database handle");
        drop(self.pool);
    }
}
