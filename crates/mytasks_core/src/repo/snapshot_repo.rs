//! Snapshot repository contracts and storage implementations.
//!
//! # Responsibility
//! - Save and load the whole task collection as one snapshot.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - `save` replaces the previous snapshot atomically.
//! - `load` rejects invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::task::{Task, TaskId, TaskValidationError};
use crate::repo::snapshot::{decode_snapshot, encode_snapshot};
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Storage key of the task snapshot.
pub const SNAPSHOT_KEY: &str = "@MyTasks:tasks";

pub type RepoResult<T> = Result<T, RepoError>;

/// Snapshot persistence error.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Codec(serde_json::Error),
    InvalidData(String),
    /// Storage backend refused the write (used by non-SQL backends).
    Unavailable(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Codec(err) => write!(f, "snapshot codec error: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted snapshot: {message}"),
            Self::Unavailable(message) => write!(f, "snapshot storage unavailable: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Codec(err) => Some(err),
            Self::InvalidData(_) | Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Codec(value)
    }
}

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::InvalidData(value.to_string())
    }
}

impl RepoError {
    pub(crate) fn duplicate_id(id: TaskId) -> Self {
        Self::InvalidData(format!("duplicate task id {id}"))
    }
}

/// Persistence collaborator of the task store.
pub trait SnapshotRepository {
    /// Replaces the stored snapshot with `tasks`, preserving their order.
    fn save(&self, tasks: &[Task]) -> RepoResult<()>;
    /// Returns the stored snapshot, or `None` when nothing was saved yet.
    fn load(&self) -> RepoResult<Option<Vec<Task>>>;
}

impl<R: SnapshotRepository + ?Sized> SnapshotRepository for Arc<R> {
    fn save(&self, tasks: &[Task]) -> RepoResult<()> {
        (**self).save(tasks)
    }

    fn load(&self) -> RepoResult<Option<Vec<Task>>> {
        (**self).load()
    }
}

/// SQLite-backed snapshot repository.
///
/// Stores the encoded snapshot as a single row in `kv_store`.
pub struct SqliteSnapshotRepository {
    conn: Connection,
}

impl SqliteSnapshotRepository {
    /// Wraps a connection returned by [`crate::db::open_db`].
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl SnapshotRepository for SqliteSnapshotRepository {
    fn save(&self, tasks: &[Task]) -> RepoResult<()> {
        let encoded = encode_snapshot(tasks)?;
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![SNAPSHOT_KEY, encoded],
        )?;
        Ok(())
    }

    fn load(&self) -> RepoResult<Option<Vec<Task>>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                [SNAPSHOT_KEY],
                |row| row.get(0),
            )
            .optional()?;

        raw.map(|value| decode_snapshot(&value)).transpose()
    }
}

/// In-memory snapshot repository.
///
/// Keeps the encoded form so every save goes through the same codec as the
/// SQLite backend.
#[derive(Default)]
pub struct MemorySnapshotRepository {
    encoded: Mutex<Option<String>>,
    fail_saves: AtomicBool,
}

impl MemorySnapshotRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the repository with raw snapshot JSON.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            encoded: Mutex::new(Some(raw.into())),
            fail_saves: AtomicBool::new(false),
        }
    }

    /// Makes subsequent saves fail with [`RepoError::Unavailable`].
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

impl SnapshotRepository for MemorySnapshotRepository {
    fn save(&self, tasks: &[Task]) -> RepoResult<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(RepoError::Unavailable("saves disabled".to_string()));
        }
        let encoded = encode_snapshot(tasks)?;
        let mut guard = self
            .encoded
            .lock()
            .map_err(|_| RepoError::Unavailable("snapshot lock poisoned".to_string()))?;
        *guard = Some(encoded);
        Ok(())
    }

    fn load(&self) -> RepoResult<Option<Vec<Task>>> {
        let raw = self
            .encoded
            .lock()
            .map_err(|_| RepoError::Unavailable("snapshot lock poisoned".to_string()))?
            .clone();
        raw.map(|value| decode_snapshot(&value)).transpose()
    }
}
