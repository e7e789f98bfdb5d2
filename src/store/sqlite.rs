//! SQLite-backed version store.
//!
//! Schema:
//!
//! - `targets(target_id PK, url UNIQUE, added_at)`
//! - `versions(target_id, version, content_digest, content_size, first_seen,
//!   last_seen)` with `UNIQUE(target_id, version)`
//!
//! Classification reads the history and writes its result inside one
//! `IMMEDIATE` transaction, so concurrent writers on the same database file
//! serialize on the write lock and a partial write is never committed.

use super::VersionStore;
use super::classify::{Decision, decide};
use crate::error::{ErrorContext, MonitorError, Result, StoreErrorKind};
use crate::model::{Classification, Target, TargetId, VersionRecord};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

/// How long a writer waits for another connection's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS targets (
        target_id   TEXT PRIMARY KEY,
        url         TEXT NOT NULL UNIQUE,
        added_at    TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS versions (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        target_id       TEXT NOT NULL REFERENCES targets(target_id),
        version         INTEGER NOT NULL CHECK (version > 0),
        content_digest  TEXT NOT NULL,
        content_size    INTEGER NOT NULL,
        first_seen      TEXT NOT NULL,
        last_seen       TEXT NOT NULL,
        UNIQUE(target_id, version)
    );

    CREATE INDEX IF NOT EXISTS idx_versions_target_version
        ON versions(target_id, version DESC);
";

/// Version store persisted in a SQLite database file.
pub struct SqliteVersionStore {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for SqliteVersionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteVersionStore").finish_non_exhaustive()
    }
}

impl SqliteVersionStore {
    /// Open (creating if needed) the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| MonitorError::io(parent, e))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("opening database {}", path.display()))?;
        tracing::info!("Connected to version database {}", path.display());
        Self::from_connection(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA).context("creating schema")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| MonitorError::store("sqlite", StoreErrorKind::Poisoned))
    }
}

fn read_target(row: &Row<'_>) -> rusqlite::Result<Target> {
    Ok(Target {
        target_id: TargetId::from_hex(row.get::<_, String>(0)?),
        url: row.get(1)?,
        added_at: row.get(2)?,
    })
}

fn read_version(row: &Row<'_>) -> rusqlite::Result<VersionRecord> {
    let size: i64 = row.get(3)?;
    Ok(VersionRecord {
        target_id: TargetId::from_hex(row.get::<_, String>(0)?),
        version: row.get(1)?,
        content_digest: row.get(2)?,
        content_size: usize::try_from(size)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Integer, Box::new(e)))?,
        first_seen: row.get(4)?,
        last_seen: row.get(5)?,
    })
}

fn load_history(conn: &Connection, target_id: &TargetId) -> Result<Vec<VersionRecord>> {
    let mut stmt = conn.prepare_cached(
        "SELECT target_id, version, content_digest, content_size, first_seen, last_seen
         FROM versions
         WHERE target_id = ?1
         ORDER BY version DESC",
    )?;
    let rows = stmt.query_map(params![target_id.as_str()], read_version)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn size_to_sql(size: usize) -> Result<i64> {
    i64::try_from(size).map_err(|_| {
        MonitorError::store(
            "content size",
            StoreErrorKind::CorruptRow(format!("size {size} exceeds i64")),
        )
    })
}

impl VersionStore for SqliteVersionStore {
    fn register(&self, url: &str, added_at: DateTime<Utc>) -> Result<Target> {
        let candidate = Target::new(url, added_at);
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR IGNORE INTO targets (target_id, url, added_at) VALUES (?1, ?2, ?3)",
            params![candidate.target_id.as_str(), candidate.url, candidate.added_at],
        )
        .with_context(|| format!("registering {url}"))?;
        let target = conn
            .query_row(
                "SELECT target_id, url, added_at FROM targets WHERE target_id = ?1",
                params![candidate.target_id.as_str()],
                read_target,
            )
            .context("reading registered target")?;
        Ok(target)
    }

    fn targets(&self) -> Result<Vec<Target>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare_cached("SELECT target_id, url, added_at FROM targets ORDER BY rowid")?;
        let rows = stmt.query_map([], read_target)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn target(&self, target_id: &TargetId) -> Result<Option<Target>> {
        let conn = self.lock()?;
        Ok(conn
            .query_row(
                "SELECT target_id, url, added_at FROM targets WHERE target_id = ?1",
                params![target_id.as_str()],
                read_target,
            )
            .optional()?)
    }

    fn classify(
        &self,
        target_id: &TargetId,
        content_digest: &str,
        content_size: usize,
        observed_at: DateTime<Utc>,
    ) -> Result<Classification> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let registered: Option<String> = tx
            .query_row(
                "SELECT target_id FROM targets WHERE target_id = ?1",
                params![target_id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        if registered.is_none() {
            return Err(MonitorError::precondition(format!(
                "classify called for unregistered target {target_id}"
            )));
        }

        let history = load_history(&tx, target_id).context("classify")?;
        let decision = decide(&history, content_digest);
        let outcome = decision.outcome();
        let version = decision.version();

        let previous = match decision {
            Decision::Touch { version } => {
                tx.execute(
                    "UPDATE versions SET last_seen = ?1 WHERE target_id = ?2 AND version = ?3",
                    params![observed_at, target_id.as_str(), version],
                )
                .context("updating last_seen")?;
                None
            }
            Decision::FirstSighting => None,
            Decision::Append { previous, .. } => Some(previous),
        };

        if outcome != crate::model::PollOutcome::KnownVersion {
            tx.execute(
                "INSERT INTO versions
                    (target_id, version, content_digest, content_size, first_seen, last_seen)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![
                    target_id.as_str(),
                    version,
                    content_digest,
                    size_to_sql(content_size)?,
                    observed_at
                ],
            )
            .context("appending version")?;
        }

        tx.commit().context("committing classification")?;

        Ok(Classification {
            outcome,
            version,
            previous,
        })
    }

    fn history(&self, target_id: &TargetId) -> Result<Vec<VersionRecord>> {
        let conn = self.lock()?;
        load_history(&conn, target_id)
    }
}
