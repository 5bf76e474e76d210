use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;

use crate::error::Result;

/// SQLite database wrapper. Holds the single connection behind a mutex;
/// repositories borrow it for the duration of one guard.
pub struct Database {
    path: Option<String>,
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create the database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        init_schema(&conn)?;
        Ok(Self {
            path: Some(path.to_string_lossy().to_string()),
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self {
            path: None,
            conn: Mutex::new(conn),
        })
    }

    pub fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn is_in_memory(&self) -> bool {
        self.path.is_none()
    }
}

/// Create all tables if they don't exist.
fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS schema_migrations (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS titles (
            id         TEXT PRIMARY KEY,
            owner_id   TEXT NOT NULL,
            name       TEXT NOT NULL,
            platform   TEXT,
            added_at   TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS similarity_pairs (
            id         TEXT PRIMARY KEY,
            title_a_id TEXT NOT NULL,
            title_b_id TEXT NOT NULL,
            owner_id   TEXT NOT NULL,
            score      INTEGER NOT NULL,
            match_type TEXT NOT NULL,
            dismissed  INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(title_a_id, title_b_id, owner_id)
        );

        CREATE INDEX IF NOT EXISTS idx_titles_owner ON titles(owner_id);
        CREATE INDEX IF NOT EXISTS idx_pairs_owner  ON similarity_pairs(owner_id);
        CREATE INDEX IF NOT EXISTS idx_pairs_dismissed ON similarity_pairs(owner_id, dismissed);
        ",
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_migrations(version, applied_at) VALUES (1, ?1)",
        rusqlite::params![chrono::Utc::now().to_rfc3339()],
    )?;

    Ok(())
}
