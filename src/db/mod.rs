//! SQLite storage for advisory and feed records
//!
//! One [`Database`] owns the connection; the per-feed operations live in
//! [`osv`], [`nvd`] and [`checkpoints`]. The engine consumes storage only
//! through the [`store::AdvisoryStore`] seam.

pub mod checkpoints;
pub mod error;
pub mod nvd;
pub mod osv;
pub mod store;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::{debug, info};

pub use error::StoreError;
pub use store::AdvisoryStore;

/// Schema migrations
/// Each version contains a list of SQL statements to execute
const MIGRATIONS: &[&[&str]] = &[
    // v1: covering indices for the alias and purl lookups
    &[
        "CREATE INDEX IF NOT EXISTS idx_aliases_alias ON aliases(alias)",
        "CREATE INDEX IF NOT EXISTS idx_purl_osv_purl ON purl_osv(purl)",
    ],
];

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        info!("Opening database at {:?}", db_path);

        if let Some(parent) = db_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let conn = Connection::open(db_path)?;

        // Enable WAL mode for better concurrency
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        debug!("Database connection established");

        let db = Self {
            conn: Mutex::new(conn),
        };

        db.create_schema()?;
        info!("Database ready");

        Ok(db)
    }

    /// Delete the database file, if it exists
    pub fn drop_database(db_path: &Path) -> std::io::Result<()> {
        match std::fs::remove_file(db_path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Acquire database connection lock with proper error handling
    pub(crate) fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn create_schema(&self) -> Result<(), StoreError> {
        debug!("Creating database schema");

        let conn = self.lock_conn()?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS osv (
                ecosystem TEXT NOT NULL,
                id TEXT NOT NULL,
                last_modified INTEGER NOT NULL,
                data TEXT NOT NULL,
                UNIQUE(ecosystem, id)
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS aliases (
                id TEXT NOT NULL,
                alias TEXT NOT NULL,
                UNIQUE(id, alias)
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS purl_osv (
                purl TEXT NOT NULL,
                osv_id TEXT NOT NULL,
                UNIQUE(purl, osv_id)
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS cve (
                id TEXT PRIMARY KEY NOT NULL,
                last_modified INTEGER NOT NULL,
                data TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS cpe (
                id TEXT PRIMARY KEY NOT NULL,
                last_modified INTEGER NOT NULL,
                data TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS checkpoints (
                source TEXT PRIMARY KEY NOT NULL,
                last_updated INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        // Apply migrations
        Self::apply_migrations(&conn)?;

        debug!("Database schema created successfully");
        Ok(())
    }

    /// Apply pending migrations based on user_version pragma
    fn apply_migrations(conn: &Connection) -> Result<(), StoreError> {
        let current_version: i32 =
            conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

        for (i, statements) in MIGRATIONS.iter().enumerate() {
            let version = (i + 1) as i32;
            if version > current_version {
                for sql in *statements {
                    conn.execute(sql, [])?;
                }
                debug!("Applied migration v{}", version);
            }
        }

        let target_version = MIGRATIONS.len() as i32;
        if target_version > current_version {
            conn.pragma_update(None, "user_version", target_version)?;
            debug!("Updated schema version to v{}", target_version);
        }

        Ok(())
    }
}

/// Timestamps are stored as milliseconds since the UNIX epoch
pub(crate) fn timestamp_ms(value: &DateTime<Utc>) -> i64 {
    value.timestamp_millis()
}

pub(crate) fn from_timestamp_ms(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
}
