//! Storage driver.
//!
//! Owns exactly one embedded SQL connection per open index and mediates
//! every query through a process-wide reader/writer lock. Readers proceed
//! in parallel; a writer is exclusive against both readers and writers, and
//! `parking_lot::RwLock` does not let a stream of readers starve a waiting
//! writer, so lock acquisition stays fair without hand-rolled bookkeeping.
//! Acquisition itself is bounded: a caller that can't get its lock within
//! the busy timeout gets `Error::Busy` back instead of blocking forever.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use rusqlite::backup::{Backup, StepResult};
use rusqlite::Connection;

use crate::cancel::CancellationToken;
use crate::config::StorageMode;
use crate::error::{Error, Result};
use crate::ids;

use super::migrations;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// The storage driver for a single index.
pub struct StorageDriver {
    connection: RwLock<Option<Connection>>,
    mode: StorageMode,
    path: Option<PathBuf>,
}

impl StorageDriver {
    /// Construct a driver that has not yet been opened.
    pub fn new(mode: StorageMode, path: Option<PathBuf>) -> Self {
        Self {
            connection: RwLock::new(None),
            mode,
            path,
        }
    }

    /// Open the connection.
    ///
    /// Creates the schema and seeds `index_metadata` on first open. Fails
    /// with [`Error::AlreadyOpen`] if already open, [`Error::Io`] if an
    /// on-disk file cannot be created, [`Error::Corruption`] if a schema
    /// probe finds an incompatible shape.
    pub fn open(&self, index_name: &str) -> Result<()> {
        let mut guard = self.connection.write();
        if guard.is_some() {
            return Err(Error::AlreadyOpen);
        }

        let conn = match (self.mode, &self.path) {
            (StorageMode::InMemory, _) => Connection::open_in_memory()?,
            (StorageMode::OnDisk, Some(path)) => Self::open_on_disk(path)?,
            (StorageMode::OnDisk, None) => {
                return Err(Error::invalid_argument(
                    "storage_directory",
                    "required when storage_mode is on_disk",
                ))
            }
        };

        configure_connection(&conn, self.mode)?;

        if !migrations::probe_schema(&conn)? {
            return Err(Error::Corruption {
                detail: "existing database does not match the expected table shape".to_string(),
            });
        }
        migrations::apply_migrations(&conn)?;
        seed_index_metadata(&conn, index_name)?;

        tracing::info!(index = index_name, mode = ?self.mode, "index opened");
        *guard = Some(conn);
        Ok(())
    }

    fn open_on_disk(path: &Path) -> Result<Connection> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|cause| Error::Io {
                path: dir.display().to_string(),
                cause,
            })?;
        }
        Connection::open(path).map_err(Error::from)
    }

    /// Release the connection. Idempotent; performs a truncating WAL
    /// checkpoint first when on-disk.
    pub fn close(&self) -> Result<()> {
        let mut guard = self.connection.write();
        if let Some(conn) = guard.as_ref() {
            if self.mode == StorageMode::OnDisk {
                checkpoint_truncate(conn)?;
            }
        }
        *guard = None;
        Ok(())
    }

    /// Best-effort close that swallows I/O errors from the checkpoint, so
    /// resource release always completes.
    pub fn dispose(&self) {
        let mut guard = self.connection.write();
        if let Some(conn) = guard.as_ref() {
            if self.mode == StorageMode::OnDisk {
                if let Err(err) = checkpoint_truncate(conn) {
                    tracing::warn!(error = %err, "checkpoint during dispose failed, ignoring");
                }
            }
        }
        *guard = None;
    }

    /// Block on the shared lock up to the busy timeout, re-checking
    /// `cancel` between polls. Raises [`Error::Busy`] if the timeout elapses
    /// and [`Error::Cancelled`] if cancellation fires first.
    fn acquire_read(&self, cancel: Option<&CancellationToken>) -> Result<RwLockReadGuard<'_, Option<Connection>>> {
        let deadline = Instant::now() + BUSY_TIMEOUT;
        loop {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                return Err(Error::Cancelled);
            }
            if let Some(guard) = self.connection.try_read_for(LOCK_POLL_INTERVAL) {
                return Ok(guard);
            }
            if Instant::now() >= deadline {
                return Err(Error::Busy {
                    detail: "timed out waiting for the read lock".to_string(),
                });
            }
        }
    }

    /// Exclusive-lock counterpart to [`Self::acquire_read`].
    fn acquire_write(&self, cancel: Option<&CancellationToken>) -> Result<RwLockWriteGuard<'_, Option<Connection>>> {
        let deadline = Instant::now() + BUSY_TIMEOUT;
        loop {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                return Err(Error::Cancelled);
            }
            if let Some(guard) = self.connection.try_write_for(LOCK_POLL_INTERVAL) {
                return Ok(guard);
            }
            if Instant::now() >= deadline {
                return Err(Error::Busy {
                    detail: "timed out waiting for the write lock".to_string(),
                });
            }
        }
    }

    /// Run `op` under a shared lock. Fails with [`Error::NotOpen`] if closed,
    /// [`Error::Busy`] if the lock isn't free within the busy timeout.
    pub fn execute_read<F, T>(&self, cancel: Option<&CancellationToken>, op: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            return Err(Error::Cancelled);
        }
        let guard = self.acquire_read(cancel)?;
        let conn = guard.as_ref().ok_or(Error::NotOpen)?;
        op(conn)
    }

    /// Run `op` inside one write transaction under an exclusive lock. The
    /// driver bumps `index_metadata.last_modified_utc` as the transaction's
    /// final statement before committing, so every call site's write lands
    /// with an up-to-date `last_modified_utc`.
    pub fn execute_write<F, T>(&self, cancel: Option<&CancellationToken>, op: F) -> Result<T>
    where
        F: FnOnce(&rusqlite::Transaction) -> Result<T>,
    {
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            return Err(Error::Cancelled);
        }
        let mut guard = self.acquire_write(cancel)?;
        let conn = guard.as_mut().ok_or(Error::NotOpen)?;
        let tx = conn.transaction()?;

        if cancel.is_some_and(CancellationToken::is_cancelled) {
            tx.rollback()?;
            return Err(Error::Cancelled);
        }

        let result = op(&tx)?;
        bump_metadata(&tx)?;
        tx.commit()?;
        Ok(result)
    }

    /// Copy an in-memory database to `target_path`, or checkpoint an
    /// on-disk one.
    pub fn flush(&self, target_path: Option<&Path>, cancel: Option<&CancellationToken>) -> Result<()> {
        let guard = self.connection.write();
        let conn = guard.as_ref().ok_or(Error::NotOpen)?;

        match self.mode {
            StorageMode::OnDisk => checkpoint_truncate(conn),
            StorageMode::InMemory => {
                let target_path = target_path.ok_or_else(|| {
                    Error::invalid_argument("target_path", "required to flush an in-memory index")
                })?;
                if let Some(dir) = target_path.parent() {
                    std::fs::create_dir_all(dir).map_err(|cause| Error::Io {
                        path: dir.display().to_string(),
                        cause,
                    })?;
                }
                let mut target = Connection::open(target_path)?;
                {
                    let backup = Backup::new(conn, &mut target)?;
                    loop {
                        if cancel.is_some_and(CancellationToken::is_cancelled) {
                            return Err(Error::Cancelled);
                        }
                        if backup.step(64)? == StepResult::Done {
                            break;
                        }
                    }
                }
                Ok(())
            }
        }
    }

    /// Explicit WAL checkpoint; a no-op for in-memory indices.
    pub fn checkpoint(&self) -> Result<()> {
        let guard = self.connection.read();
        let conn = guard.as_ref().ok_or(Error::NotOpen)?;
        if self.mode == StorageMode::OnDisk {
            checkpoint_truncate(conn)?;
        }
        Ok(())
    }

    /// Whether the driver currently holds an open connection.
    pub fn is_open(&self) -> bool {
        self.connection.read().is_some()
    }
}

fn configure_connection(conn: &Connection, mode: StorageMode) -> Result<()> {
    if mode == StorageMode::OnDisk {
        conn.pragma_update(None, "journal_mode", "WAL")?;
    }
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(())
}

fn checkpoint_truncate(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
    Ok(())
}

fn seed_index_metadata(conn: &Connection, name: &str) -> Result<()> {
    let exists: bool = conn.query_row("SELECT EXISTS(SELECT 1 FROM index_metadata)", [], |row| {
        row.get(0)
    })?;
    if !exists {
        let now = ids::now();
        conn.execute(
            "INSERT INTO index_metadata (id, name, created_utc, last_modified_utc) VALUES (?1, ?2, ?3, ?3)",
            rusqlite::params![ids::new_id(), name, now],
        )?;
    }
    Ok(())
}

fn bump_metadata(tx: &rusqlite::Transaction) -> Result<()> {
    tx.execute(
        "UPDATE index_metadata SET last_modified_utc = ?1",
        rusqlite::params![ids::now()],
    )?;
    Ok(())
}
