use rusqlite::{Connection, Result};
use tracing::debug;

/// Bumping this drops and recreates every table on the next open. The file
/// index is rebuilt by rescanning, so nothing irreplaceable lives below the
/// current version.
const SCHEMA_VERSION: i64 = 1;

/// Owns the connection holding the file index, the classification snapshot
/// and the migration log. All SQL lives in `queries.rs`.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &str) -> Result<Self> {
        Self::initialize(Connection::open(path)?)
    }

    /// Private in-memory database; tests use this to get a fresh store per
    /// case.
    pub fn open_in_memory() -> Result<Self> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA cache_size = -64000;
             PRAGMA busy_timeout = 5000;",
        )?;

        let found: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        if found < SCHEMA_VERSION {
            debug!("Schema version {} is stale, recreating tables", found);
            conn.execute_batch(
                "DROP TABLE IF EXISTS migration_log;
                 DROP TABLE IF EXISTS classification;
                 DROP TABLE IF EXISTS indexed_file;",
            )?;
        }
        conn.execute_batch(include_str!("schema.sql"))?;
        debug!("SQLite storage ready (schema version {})", SCHEMA_VERSION);

        Ok(Database { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}
