//! SQLite connection behind the local backend.
//!
//! Every constructor brings the schema up to date before handing out a
//! [`Database`].

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use rusqlite::Connection;

use crate::error::{Result, StoreError};
use crate::migrations;

/// One migrated connection. Not shared across threads on its own; the
/// backend keeps it behind a mutex.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// `vibe.db` in the platform data directory (`~/.local/share/vibe` on
    /// Linux), created on first use.
    pub fn new() -> Result<Self> {
        let dirs = ProjectDirs::from("com", "vibe", "vibe").ok_or(StoreError::NoDataDir)?;
        std::fs::create_dir_all(dirs.data_dir())?;
        let path = dirs.data_dir().join("vibe.db");
        tracing::info!(path = %path.display(), "opening document database");
        Self::open_at(&path)
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::prepare(conn)
    }

    /// Private to this connection; gone when it is dropped.
    pub fn open_in_memory() -> Result<Self> {
        Self::prepare(Connection::open_in_memory()?)
    }

    fn prepare(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run_migrations(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// `None` for in-memory databases.
    pub fn path(&self) -> Option<PathBuf> {
        self.conn
            .path()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    }
}
