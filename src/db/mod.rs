//! SQLite persistence.
//!
//! One [`Database`] wraps a single connection behind a mutex. Every method
//! takes the lock for the duration of one statement or one transaction and
//! never across an `.await`, so handlers can call it directly.

mod history;
mod schema;
mod sessions;
mod songs;
mod users;

use std::{
    path::Path,
    sync::{Mutex, MutexGuard},
};

use rusqlite::Connection;
use tracing::info;

use crate::error::{AppError, AppResult};

pub use history::{HistoryEntry, HistoryRecord};
pub use sessions::Session;
pub use songs::{AudioAverages, Song};
pub use users::User;

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Opens (or creates) the database file at `db_path`.
    pub fn open<T: AsRef<Path>>(db_path: T) -> AppResult<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path)?;
        info!("Opened database at {}", db_path.display());
        Self::init(conn)
    }

    /// Opens a private in-memory database, mostly for tests.
    pub fn open_in_memory() -> AppResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> AppResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        let current = schema::current_schema();
        let expected = schema::BASE_DB_VERSION + current.version;

        if version == 0 {
            schema::create(&conn, current)?;
        } else if version == expected {
            schema::validate(&conn, current)?;
        } else {
            return Err(AppError::Schema(format!(
                "unknown database version {}, expected {}",
                version, expected
            )));
        }

        Ok(Database {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
