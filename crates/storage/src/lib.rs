#![forbid(unsafe_code)]

use rusqlite::{Connection, OptionalExtension, params};
use sd_core::{ExerciseId, ProgressRecord, ProgressStore, StoreError};
use std::path::{Path, PathBuf};
use std::time::Duration;

// One JSON record under a fixed key, matching the export shape of the
// companion web curriculum's progress store.
const PROGRESS_KEY: &str = "main";

const MAX_ATTEMPT_LIST: usize = 1000;

#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    Sql(rusqlite::Error),
    Json(serde_json::Error),
    InvalidRow(&'static str),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Sql(err) => write!(f, "sqlite: {err}"),
            Self::Json(err) => write!(f, "json: {err}"),
            Self::InvalidRow(message) => write!(f, "invalid row: {message}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sql(value)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttemptOutcome {
    Entered,
    Ran,
    Passed,
    Mismatch,
    Error,
}

impl AttemptOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Entered => "entered",
            Self::Ran => "ran",
            Self::Passed => "passed",
            Self::Mismatch => "mismatch",
            Self::Error => "error",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "entered" => Some(Self::Entered),
            "ran" => Some(Self::Ran),
            "passed" => Some(Self::Passed),
            "mismatch" => Some(Self::Mismatch),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordAttemptRequest {
    pub exercise_id: ExerciseId,
    pub ts_ms: i64,
    pub outcome: AttemptOutcome,
    /// Submitted SQL for submit outcomes; empty for navigation entries.
    pub detail: Option<String>,
}

#[derive(Clone, Debug)]
pub struct AttemptRow {
    pub seq: i64,
    pub ts_ms: i64,
    pub exercise_id: ExerciseId,
    pub outcome: AttemptOutcome,
    pub detail: Option<String>,
}

#[derive(Debug)]
pub struct SqliteProgressStore {
    storage_dir: PathBuf,
    conn: Connection,
}

impl SqliteProgressStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        let db_path = storage_dir.join("sqldrill.db");
        let conn = Connection::open(db_path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        install_schema(&conn)?;

        Ok(Self { storage_dir, conn })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Missing record reads as the default (fresh install); a present but
    /// unparsable record is an error the caller decides how to surface.
    pub fn load_record(&self) -> Result<ProgressRecord, StorageError> {
        let raw = self
            .conn
            .query_row(
                "SELECT record_json FROM progress WHERE key = ?1",
                params![PROGRESS_KEY],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        match raw {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(ProgressRecord::default()),
        }
    }

    pub fn save_record(&mut self, record: &ProgressRecord) -> Result<(), StorageError> {
        let json = serde_json::to_string(record)?;
        let now_ms = now_ms();
        let tx = self.conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO progress(key, record_json, updated_at_ms)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET record_json=excluded.record_json, updated_at_ms=excluded.updated_at_ms
            "#,
            params![PROGRESS_KEY, json, now_ms],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Wipe the progress record. The attempts journal is history and stays.
    pub fn clear_record(&mut self) -> Result<bool, StorageError> {
        let tx = self.conn.transaction()?;
        let deleted = tx.execute(
            "DELETE FROM progress WHERE key = ?1",
            params![PROGRESS_KEY],
        )?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    pub fn record_attempt(
        &mut self,
        request: RecordAttemptRequest,
    ) -> Result<AttemptRow, StorageError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO attempts(ts_ms, exercise_id, outcome, detail) VALUES (?1, ?2, ?3, ?4)",
            params![
                request.ts_ms,
                request.exercise_id.get(),
                request.outcome.as_str(),
                request.detail
            ],
        )?;
        let seq = tx.last_insert_rowid();
        tx.commit()?;
        Ok(AttemptRow {
            seq,
            ts_ms: request.ts_ms,
            exercise_id: request.exercise_id,
            outcome: request.outcome,
            detail: request.detail,
        })
    }

    /// The newest `limit` attempts in journal order (ascending `seq`, newest
    /// last). Capped at `MAX_ATTEMPT_LIST`.
    pub fn list_attempts(
        &self,
        exercise_id: Option<ExerciseId>,
        limit: usize,
    ) -> Result<Vec<AttemptRow>, StorageError> {
        let limit = limit.min(MAX_ATTEMPT_LIST) as i64;
        let mut raw: Vec<(i64, i64, i64, String, Option<String>)> = Vec::new();
        match exercise_id {
            Some(id) => {
                let mut stmt = self.conn.prepare(
                    "SELECT seq, ts_ms, exercise_id, outcome, detail FROM attempts \
                     WHERE exercise_id = ?1 ORDER BY seq DESC LIMIT ?2",
                )?;
                let rows = stmt.query_map(params![id.get(), limit], |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                    ))
                })?;
                for row in rows {
                    raw.push(row?);
                }
            }
            None => {
                let mut stmt = self.conn.prepare(
                    "SELECT seq, ts_ms, exercise_id, outcome, detail FROM attempts \
                     ORDER BY seq DESC LIMIT ?1",
                )?;
                let rows = stmt.query_map(params![limit], |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                    ))
                })?;
                for row in rows {
                    raw.push(row?);
                }
            }
        }

        // The query walks seq DESC so LIMIT keeps the newest window; flip it
        // back into journal order for callers.
        raw.reverse();

        let mut out = Vec::with_capacity(raw.len());
        for (seq, ts_ms, exercise_id, outcome, detail) in raw {
            let Some(outcome) = AttemptOutcome::parse(&outcome) else {
                return Err(StorageError::InvalidRow("unknown attempt outcome"));
            };
            out.push(AttemptRow {
                seq,
                ts_ms,
                exercise_id: ExerciseId::new(exercise_id),
                outcome,
                detail,
            });
        }
        Ok(out)
    }
}

impl ProgressStore for SqliteProgressStore {
    fn load(&mut self) -> Result<ProgressRecord, StoreError> {
        self.load_record().map_err(boundary_error)
    }

    fn save(&mut self, record: &ProgressRecord) -> Result<(), StoreError> {
        self.save_record(record).map_err(boundary_error)
    }
}

// Rich errors stay inside this crate; the session boundary only distinguishes
// a corrupt record from backend failure.
fn boundary_error(err: StorageError) -> StoreError {
    match err {
        StorageError::Json(inner) => StoreError::Corrupt(inner.to_string()),
        other => StoreError::Backend(other.to_string()),
    }
}

fn install_schema(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode=WAL;
        PRAGMA synchronous=NORMAL;

        CREATE TABLE IF NOT EXISTS meta (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS progress (
          key TEXT PRIMARY KEY,
          record_json TEXT NOT NULL,
          updated_at_ms INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS attempts (
          seq INTEGER PRIMARY KEY AUTOINCREMENT,
          ts_ms INTEGER NOT NULL,
          exercise_id INTEGER NOT NULL,
          outcome TEXT NOT NULL,
          detail TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_attempts_exercise_seq ON attempts(exercise_id, seq);
        "#,
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO meta(key, value) VALUES (?1, ?2)",
        params!["schema_version", "v1"],
    )?;
    Ok(())
}

fn now_ms() -> i64 {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    now.as_millis() as i64
}
