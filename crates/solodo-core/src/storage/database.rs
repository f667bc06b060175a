//! SQLite-based study log storage.
//!
//! Provides persistent storage for:
//! - The tag vocabulary
//! - Completed study sessions (the study log)
//! - Key-value store backing timer resume state

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::migrations;
use crate::error::{CoreError, DatabaseError};
use crate::timer::{Mode, ResumeState};

const KV_TIMER_MODE: &str = "timer-mode";
const KV_TIMER_START: &str = "timer-start";

/// A tag in the vocabulary. Never mutated after creation; deleting one
/// scrubs its id from every study log that references it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// One completed (or, in principle, in-progress) study interval.
///
/// `tag_ids` holds ids that existed when the log was appended; tags may be
/// deleted afterwards, so consumers must tolerate dangling ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyLog {
    pub id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub tag_ids: Vec<i64>,
    pub memo: Option<String>,
}

impl StudyLog {
    pub fn duration_secs(&self) -> Option<i64> {
        self.end_time.map(|end| (end - self.start_time).num_seconds())
    }
}

fn parse_timestamp(value: &str, idx: usize) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

fn parse_tag_ids(value: &str, idx: usize) -> Result<Vec<i64>, rusqlite::Error> {
    serde_json::from_str(value).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn row_to_log(row: &rusqlite::Row) -> Result<StudyLog, rusqlite::Error> {
    let start_time: String = row.get(1)?;
    let end_time: Option<String> = row.get(2)?;
    let tag_ids: String = row.get(3)?;

    Ok(StudyLog {
        id: row.get(0)?,
        start_time: parse_timestamp(&start_time, 1)?,
        end_time: end_time.as_deref().map(|s| parse_timestamp(s, 2)).transpose()?,
        tag_ids: parse_tag_ids(&tag_ids, 3)?,
        memo: row.get(4)?,
    })
}

/// SQLite database for study log storage.
///
/// Single-connection, single-user. The tag-deletion cascade is a sequence
/// of independent per-record updates, not a cross-record transaction.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/solodo/solodo.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = super::data_dir()?.join("solodo.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open (and migrate) the database at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: PathBuf::from(path),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        migrations::migrate(&self.conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    // ── Tags ─────────────────────────────────────────────────────────

    /// Create a tag.
    ///
    /// # Errors
    /// Returns `DuplicateTagName` if a tag with this name already exists.
    pub fn add_tag(&self, name: &str) -> Result<i64, DatabaseError> {
        if self.tag_id_by_name(name)?.is_some() {
            return Err(DatabaseError::DuplicateTagName(name.to_string()));
        }
        self.conn
            .execute("INSERT INTO tags (name) VALUES (?1)", params![name])?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Delete a tag by name and scrub its id from every study log that
    /// references it.
    ///
    /// Returns `None` if no tag with this name exists (a no-op), otherwise
    /// the number of logs rewritten. The tag row is removed first; a failed
    /// per-log rewrite is logged and the cascade continues, so a crash can
    /// at worst leave dangling ids for the display layer to tolerate.
    pub fn delete_tag(&self, name: &str) -> Result<Option<usize>, DatabaseError> {
        let id = match self.tag_id_by_name(name)? {
            Some(id) => id,
            None => return Ok(None),
        };

        self.conn
            .execute("DELETE FROM tags WHERE id = ?1", params![id])?;

        let mut scrubbed = 0;
        for log in self.logs_with_tag(id)? {
            let tag_ids: Vec<i64> = log.tag_ids.iter().copied().filter(|t| *t != id).collect();
            let encoded = match serde_json::to_string(&tag_ids) {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!("cascade rewrite of log {} failed to encode: {}", log.id, e);
                    continue;
                }
            };
            match self.conn.execute(
                "UPDATE study_logs SET tag_ids = ?1 WHERE id = ?2",
                params![encoded, log.id],
            ) {
                Ok(_) => scrubbed += 1,
                Err(e) => {
                    tracing::warn!(
                        "cascade rewrite of log {} failed, leaving dangling tag id {}: {}",
                        log.id,
                        id,
                        e
                    );
                }
            }
        }
        Ok(Some(scrubbed))
    }

    pub fn tag_id_by_name(&self, name: &str) -> Result<Option<i64>, DatabaseError> {
        let id = self
            .conn
            .query_row("SELECT id FROM tags WHERE name = ?1", params![name], |row| {
                row.get::<_, i64>(0)
            })
            .optional()?;
        Ok(id)
    }

    /// All tags in creation order.
    pub fn all_tags(&self) -> Result<Vec<Tag>, DatabaseError> {
        let mut stmt = self.conn.prepare("SELECT id, name FROM tags ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Tag {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;
        let mut tags = Vec::new();
        for tag in rows {
            tags.push(tag?);
        }
        Ok(tags)
    }

    // ── Study logs ───────────────────────────────────────────────────

    /// Append a study log record.
    ///
    /// Tag names are resolved to ids at append time; names with no matching
    /// tag are silently dropped (a tag deleted between selection and save
    /// simply does not appear on the log). The caller guarantees a positive
    /// elapsed time; the store does not re-validate it.
    pub fn append_log(
        &self,
        start_time: DateTime<Utc>,
        end_time: Option<DateTime<Utc>>,
        tag_names: &[String],
        memo: Option<&str>,
    ) -> Result<i64, DatabaseError> {
        let mut tag_ids = Vec::new();
        for name in tag_names {
            if let Some(id) = self.tag_id_by_name(name)? {
                tag_ids.push(id);
            }
        }
        let encoded = serde_json::to_string(&tag_ids)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        self.conn.execute(
            "INSERT INTO study_logs (start_time, end_time, tag_ids, memo)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                start_time.to_rfc3339(),
                end_time.map(|t| t.to_rfc3339()),
                encoded,
                memo,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Delete a study log. Returns false if the id does not exist (a no-op).
    pub fn delete_log(&self, id: i64) -> Result<bool, DatabaseError> {
        let deleted = self
            .conn
            .execute("DELETE FROM study_logs WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    /// All study logs, most recent first.
    ///
    /// This is the retrieval boundary that establishes the descending
    /// `start_time` ordering the query engine relies on.
    pub fn all_logs(&self) -> Result<Vec<StudyLog>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, start_time, end_time, tag_ids, memo
             FROM study_logs
             ORDER BY start_time DESC",
        )?;
        let rows = stmt.query_map([], row_to_log)?;
        let mut logs = Vec::new();
        for log in rows {
            logs.push(log?);
        }
        Ok(logs)
    }

    /// Study logs whose `tag_ids` contain the given tag id.
    pub fn logs_with_tag(&self, tag_id: i64) -> Result<Vec<StudyLog>, DatabaseError> {
        let logs = self.all_logs()?;
        Ok(logs
            .into_iter()
            .filter(|log| log.tag_ids.contains(&tag_id))
            .collect())
    }

    // ── Key-value store ──────────────────────────────────────────────

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt
            .query_row(params![key], |row| row.get::<_, String>(0))
            .optional()?;
        Ok(result)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a value from the kv store.
    pub fn kv_delete(&self, key: &str) -> Result<(), DatabaseError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    // ── Timer resume state ───────────────────────────────────────────

    /// Load the persisted `(mode, start_instant)` pair, if any.
    ///
    /// Both keys must be present and parse; anything else is treated as
    /// no resume state (a warning is logged for a half-written pair).
    pub fn load_resume_state(&self) -> Result<Option<ResumeState>, DatabaseError> {
        let mode = self.kv_get(KV_TIMER_MODE)?;
        let start = self.kv_get(KV_TIMER_START)?;

        let (mode, start) = match (mode, start) {
            (Some(mode), Some(start)) => (mode, start),
            (None, None) => return Ok(None),
            _ => {
                tracing::warn!("half-written timer resume state, ignoring");
                return Ok(None);
            }
        };

        let mode = match Mode::parse(&mode) {
            Some(mode) => mode,
            None => {
                tracing::warn!("unrecognized persisted timer mode '{}', ignoring", mode);
                return Ok(None);
            }
        };
        let start_instant = match DateTime::parse_from_rfc3339(&start) {
            Ok(dt) => dt.with_timezone(&Utc),
            Err(e) => {
                tracing::warn!("unparseable persisted start instant '{}': {}", start, e);
                return Ok(None);
            }
        };

        Ok(Some(ResumeState { mode, start_instant }))
    }

    /// Persist the resume state for a running timer.
    pub fn save_resume_state(&self, state: &ResumeState) -> Result<(), DatabaseError> {
        self.kv_set(KV_TIMER_MODE, state.mode.as_str())?;
        self.kv_set(KV_TIMER_START, &state.start_instant.to_rfc3339())?;
        Ok(())
    }

    /// Clear the resume state (the timer went idle).
    pub fn clear_resume_state(&self) -> Result<(), DatabaseError> {
        self.kv_delete(KV_TIMER_MODE)?;
        self.kv_delete(KV_TIMER_START)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, h, m, 0).unwrap()
    }

    #[test]
    fn add_tag_rejects_duplicate_name() {
        let db = Database::open_memory().unwrap();
        db.add_tag("Math").unwrap();
        let err = db.add_tag("Math").unwrap_err();
        assert!(matches!(err, DatabaseError::DuplicateTagName(name) if name == "Math"));
    }

    #[test]
    fn append_log_drops_unknown_tag_names() {
        let db = Database::open_memory().unwrap();
        let math = db.add_tag("Math").unwrap();

        let id = db
            .append_log(
                ts(9, 0),
                Some(ts(9, 25)),
                &["Math".into(), "Ghost".into()],
                None,
            )
            .unwrap();

        let logs = db.all_logs().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].id, id);
        assert_eq!(logs[0].tag_ids, vec![math]);
    }

    #[test]
    fn delete_tag_cascades_into_logs() {
        let db = Database::open_memory().unwrap();
        let math = db.add_tag("Math").unwrap();
        let physics = db.add_tag("Physics").unwrap();

        db.append_log(ts(9, 0), Some(ts(9, 25)), &["Math".into(), "Physics".into()], None)
            .unwrap();
        db.append_log(ts(10, 0), Some(ts(10, 25)), &["Math".into()], None)
            .unwrap();
        db.append_log(ts(11, 0), Some(ts(11, 25)), &["Physics".into()], None)
            .unwrap();

        let scrubbed = db.delete_tag("Math").unwrap();
        assert_eq!(scrubbed, Some(2));

        let logs = db.all_logs().unwrap();
        assert!(logs.iter().all(|log| !log.tag_ids.contains(&math)));
        // Unrelated tag ids are untouched.
        assert_eq!(
            logs.iter().filter(|log| log.tag_ids.contains(&physics)).count(),
            2
        );
    }

    #[test]
    fn delete_tag_unknown_name_is_noop() {
        let db = Database::open_memory().unwrap();
        assert_eq!(db.delete_tag("Ghost").unwrap(), None);
    }

    #[test]
    fn delete_log_unknown_id_is_noop() {
        let db = Database::open_memory().unwrap();
        assert!(!db.delete_log(42).unwrap());
    }

    #[test]
    fn all_logs_orders_most_recent_first() {
        let db = Database::open_memory().unwrap();
        db.append_log(ts(9, 0), Some(ts(9, 25)), &[], None).unwrap();
        db.append_log(ts(11, 0), Some(ts(11, 25)), &[], None).unwrap();
        db.append_log(ts(10, 0), Some(ts(10, 25)), &[], None).unwrap();

        let logs = db.all_logs().unwrap();
        let starts: Vec<_> = logs.iter().map(|log| log.start_time).collect();
        assert_eq!(starts, vec![ts(11, 0), ts(10, 0), ts(9, 0)]);
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
        db.kv_delete("test").unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
    }

    #[test]
    fn resume_state_roundtrip() {
        let db = Database::open_memory().unwrap();
        assert!(db.load_resume_state().unwrap().is_none());

        let state = ResumeState {
            mode: Mode::Studying,
            start_instant: ts(9, 0),
        };
        db.save_resume_state(&state).unwrap();
        assert_eq!(db.load_resume_state().unwrap(), Some(state));

        db.clear_resume_state().unwrap();
        assert!(db.load_resume_state().unwrap().is_none());
    }

    #[test]
    fn half_written_resume_state_is_ignored() {
        let db = Database::open_memory().unwrap();
        db.kv_set("timer-mode", "studying").unwrap();
        assert!(db.load_resume_state().unwrap().is_none());
    }
}
