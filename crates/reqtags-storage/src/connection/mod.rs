//! Connection management for the issue database.
//!
//! One writer connection behind a mutex. File databases also get a few
//! read-only connections, handed out round-robin; in-memory databases read
//! through the writer, since a second in-memory connection would open a
//! different database.

pub mod pragmas;
pub mod writer;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use reqtags_core::errors::StorageError;
use rusqlite::{Connection, OpenFlags};

use self::pragmas::{apply_pragmas, apply_read_pragmas};
use crate::migrations;

/// Read connections opened for a file database. Listing and export are the
/// only concurrent readers next to a run.
pub const READ_CONNECTIONS: usize = 2;

fn open_err(path: Option<&Path>, e: rusqlite::Error) -> StorageError {
    let message = match path {
        Some(p) => format!("cannot open {}: {e}", p.display()),
        None => format!("cannot open in-memory database: {e}"),
    };
    StorageError::SqliteError { message }
}

pub struct DatabaseManager {
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    next_reader: AtomicUsize,
    path: Option<PathBuf>,
}

impl DatabaseManager {
    /// Open (or create) the database at `path` and bring its schema up to date.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let writer = Connection::open(path).map_err(|e| open_err(Some(path), e))?;
        apply_pragmas(&writer)?;
        migrations::run_migrations(&writer)?;

        let readers = (0..READ_CONNECTIONS)
            .map(|_| {
                let conn = Connection::open_with_flags(
                    path,
                    OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
                )
                .map_err(|e| open_err(Some(path), e))?;
                apply_read_pragmas(&conn)?;
                Ok(Mutex::new(conn))
            })
            .collect::<Result<Vec<_>, StorageError>>()?;
        tracing::debug!(path = %path.display(), readers = readers.len(), "issue database opened");

        Ok(Self {
            writer: Mutex::new(writer),
            readers,
            next_reader: AtomicUsize::new(0),
            path: Some(path.to_path_buf()),
        })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let writer = Connection::open_in_memory().map_err(|e| open_err(None, e))?;
        apply_pragmas(&writer)?;
        migrations::run_migrations(&writer)?;

        Ok(Self {
            writer: Mutex::new(writer),
            readers: Vec::new(),
            next_reader: AtomicUsize::new(0),
            path: None,
        })
    }

    /// Run `f` on the serialized writer connection.
    pub fn with_writer<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> Result<T, StorageError>,
    {
        let guard = self.writer.lock().map_err(|_| StorageError::SqliteError {
            message: "issue database writer lock poisoned".to_string(),
        })?;
        f(&guard)
    }

    /// Run `f` on the next read connection, or on the writer when there are none.
    pub fn with_reader<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> Result<T, StorageError>,
    {
        if self.readers.is_empty() {
            return self.with_writer(f);
        }
        let idx = self.next_reader.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        let guard = self.readers[idx]
            .lock()
            .map_err(|_| StorageError::SqliteError {
                message: "issue database reader lock poisoned".to_string(),
            })?;
        f(&guard)
    }

    pub fn reader_count(&self) -> usize {
        self.readers.len()
    }

    /// Fold the WAL back into the database file. No-op for in-memory databases.
    pub fn checkpoint(&self) -> Result<(), StorageError> {
        if self.path.is_none() {
            return Ok(());
        }
        self.with_writer(|conn| {
            conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
                .map_err(|e| StorageError::SqliteError {
                    message: format!("wal checkpoint failed: {e}"),
                })
        })
    }

    /// Database file path (None for in-memory).
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
