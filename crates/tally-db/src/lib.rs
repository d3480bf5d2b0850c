//! Storage layer for the tally time tracker.
//!
//! [`Database`] implements [`EntryStore`] on top of `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` can be moved between threads but not shared without external
//! synchronization. The tracker assumes a single writer.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as TEXT in RFC 3339 UTC with millisecond precision
//! (e.g., `2026-03-02T09:00:00.000Z`). Fixed-width values keep lexicographic
//! ordering equal to chronological ordering, which the `pauses` CHECK
//! constraint and the range filters rely on.
//!
//! ## Active Entry
//!
//! At most one entry may be running or paused. Every write that can activate
//! an entry checks this inside its transaction; the partial unique index
//! `idx_entries_single_active` rejects anything that gets past that check.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Params, Row, params, params_from_iter};
use tally_core::{
    Entry, EntryFilter, EntryId, EntryStatus, EntryStore, EntryUpdate, NewEntry, NewPause, Pause,
    PauseId, PausePlan, PauseReason, ProjectName, StateChange, StoreError, TagName,
    ValidationError,
};
use thiserror::Error;
use uuid::Uuid;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored timestamp could not be parsed.
    #[error("invalid timestamp for {row_id}: {timestamp}")]
    TimestampParse {
        row_id: String,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored name, id, status or reason is not valid.
    #[error("invalid stored value for {row_id}: {source}")]
    InvalidValue {
        row_id: String,
        #[source]
        source: ValidationError,
    },
    #[error("entry {0} is already active")]
    ActiveEntryExists(EntryId),
    #[error("entry not found: {0}")]
    EntryNotFound(EntryId),
    #[error("pause not found: {0}")]
    PauseNotFound(PauseId),
    #[error("entry {id} is {found}, expected {expected}")]
    StaleStatus {
        id: EntryId,
        expected: EntryStatus,
        found: EntryStatus,
    },
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::ActiveEntryExists(id) => Self::ActiveEntryExists(id),
            DbError::EntryNotFound(id) => Self::EntryNotFound(id),
            DbError::PauseNotFound(id) => Self::PauseNotFound(id),
            DbError::StaleStatus {
                id,
                expected,
                found,
            } => Self::StaleStatus {
                id,
                expected,
                found,
            },
            other => Self::Backend(Box::new(other)),
        }
    }
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

const ENTRY_SELECT: &str = "
    SELECT e.id, p.name, e.title, e.start_time, e.end_time, e.status
    FROM entries e
    JOIN projects p ON p.id = e.project_id
";

const ACTIVE_STATUSES: &str = "('running', 'paused')";

struct EntryRow {
    id: String,
    project: String,
    title: Option<String>,
    start_time: String,
    end_time: Option<String>,
    status: String,
}

impl EntryRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            project: row.get(1)?,
            title: row.get(2)?,
            start_time: row.get(3)?,
            end_time: row.get(4)?,
            status: row.get(5)?,
        })
    }
}

struct PauseRow {
    id: String,
    pause_time: String,
    resume_time: Option<String>,
    reason: String,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// Idempotent: safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tags (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            );

            -- end_time is set iff status = 'stopped'
            CREATE TABLE IF NOT EXISTS entries (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL,
                title TEXT,
                start_time TEXT NOT NULL,
                end_time TEXT,
                status TEXT NOT NULL CHECK (status IN ('running', 'paused', 'stopped')),
                created_at TEXT NOT NULL,
                FOREIGN KEY (project_id) REFERENCES projects(id)
            );

            CREATE INDEX IF NOT EXISTS idx_entries_start ON entries(start_time);
            CREATE INDEX IF NOT EXISTS idx_entries_created ON entries(created_at);
            CREATE INDEX IF NOT EXISTS idx_entries_project ON entries(project_id);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_entries_single_active
                ON entries((status IN ('running', 'paused')))
                WHERE status IN ('running', 'paused');

            CREATE TABLE IF NOT EXISTS entry_tags (
                entry_id TEXT NOT NULL,
                tag_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                PRIMARY KEY (entry_id, tag_id),
                FOREIGN KEY (entry_id) REFERENCES entries(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags(id)
            );

            CREATE INDEX IF NOT EXISTS idx_entry_tags_tag ON entry_tags(tag_id);

            -- resume_time is NULL while the pause is open
            CREATE TABLE IF NOT EXISTS pauses (
                id TEXT PRIMARY KEY,
                entry_id TEXT NOT NULL,
                pause_time TEXT NOT NULL,
                resume_time TEXT,
                reason TEXT NOT NULL DEFAULT 'manual',
                FOREIGN KEY (entry_id) REFERENCES entries(id) ON DELETE CASCADE,
                CHECK (resume_time IS NULL OR resume_time >= pause_time)
            );

            CREATE INDEX IF NOT EXISTS idx_pauses_entry ON pauses(entry_id, pause_time);
            ",
        )?;
        Ok(())
    }

    fn find_active(&self) -> Result<Option<Entry>, DbError> {
        let tail = format!(
            "WHERE e.status IN {ACTIVE_STATUSES} ORDER BY e.start_time DESC LIMIT 1"
        );
        Ok(query_entries(&self.conn, &tail, [])?.pop())
    }

    fn find_entry(&self, id: &EntryId) -> Result<Option<Entry>, DbError> {
        load_entry(&self.conn, id.as_str())
    }

    fn find_last(&self, project: Option<&ProjectName>) -> Result<Option<Entry>, DbError> {
        let entries = match project {
            Some(project) => query_entries(
                &self.conn,
                "WHERE p.name = ? ORDER BY e.created_at DESC, e.rowid DESC LIMIT 1",
                [project.as_str()],
            )?,
            None => query_entries(
                &self.conn,
                "ORDER BY e.created_at DESC, e.rowid DESC LIMIT 1",
                [],
            )?,
        };
        Ok(entries.into_iter().next())
    }

    fn find_entries(&self, filter: &EntryFilter) -> Result<Vec<Entry>, DbError> {
        let mut conditions: Vec<String> = Vec::new();
        let mut values: Vec<String> = Vec::new();
        if let Some(project) = &filter.project {
            conditions.push("p.name = ?".to_string());
            values.push(project.to_string());
        }
        if !filter.tags.is_empty() {
            let placeholders = vec!["?"; filter.tags.len()].join(", ");
            conditions.push(format!(
                "e.id IN (
                    SELECT et.entry_id FROM entry_tags et
                    JOIN tags t ON t.id = et.tag_id
                    WHERE t.name IN ({placeholders})
                )"
            ));
            values.extend(filter.tags.iter().map(ToString::to_string));
        }
        if let Some(from) = filter.from {
            conditions.push("e.start_time >= ?".to_string());
            values.push(format_timestamp(from));
        }
        if let Some(to) = filter.to {
            conditions.push("e.start_time < ?".to_string());
            values.push(format_timestamp(to));
        }

        let mut tail = String::new();
        if !conditions.is_empty() {
            tail.push_str("WHERE ");
            tail.push_str(&conditions.join(" AND "));
        }
        tail.push_str(" ORDER BY e.start_time DESC, e.rowid DESC");
        if let Some(limit) = filter.limit {
            tail.push_str(&format!(" LIMIT {limit}"));
        }
        query_entries(&self.conn, &tail, params_from_iter(values.iter()))
    }

    fn insert_entry(&mut self, entry: &NewEntry) -> Result<Entry, DbError> {
        let now = format_timestamp(Utc::now());
        let id = Uuid::new_v4().to_string();
        let tx = self.conn.transaction()?;
        if entry.status.is_active() {
            if let Some(active) = other_active_entry(&tx, &id)? {
                return Err(DbError::ActiveEntryExists(active));
            }
        }
        let project_id = ensure_project(&tx, &entry.project, &now)?;
        tx.execute(
            "
            INSERT INTO entries (id, project_id, title, start_time, end_time, status, created_at)
            VALUES (?, ?, ?, ?, NULL, ?, ?)
            ",
            params![
                id,
                project_id,
                entry.title,
                format_timestamp(entry.start_time),
                entry.status.as_str(),
                now,
            ],
        )?;
        write_tags(&tx, &id, &entry.tags, &now)?;
        let created = require_entry(&tx, &id)?;
        tx.commit()?;
        tracing::debug!(entry = %created.id, "inserted entry");
        Ok(created)
    }

    fn replace_entry(
        &mut self,
        id: &EntryId,
        update: &EntryUpdate,
        plan: &PausePlan,
    ) -> Result<Entry, DbError> {
        let now = format_timestamp(Utc::now());
        let tx = self.conn.transaction()?;
        if entry_status(&tx, id.as_str())?.is_none() {
            return Err(DbError::EntryNotFound(id.clone()));
        }
        let project_id = ensure_project(&tx, &update.project, &now)?;
        tx.execute(
            "
            UPDATE entries
            SET project_id = ?, title = ?, start_time = ?, end_time = ?
            WHERE id = ?
            ",
            params![
                project_id,
                update.title,
                format_timestamp(update.start_time),
                update.end_time.map(format_timestamp),
                id.as_str(),
            ],
        )?;
        write_tags(&tx, id.as_str(), &update.tags, &now)?;

        for pause_id in &plan.deletes {
            let deleted = tx.execute(
                "DELETE FROM pauses WHERE id = ? AND entry_id = ?",
                params![pause_id.as_str(), id.as_str()],
            )?;
            if deleted == 0 {
                return Err(DbError::PauseNotFound(pause_id.clone()));
            }
        }
        for pause in &plan.updates {
            if pause.entry_id != *id {
                return Err(DbError::PauseNotFound(pause.id.clone()));
            }
            write_pause(&tx, pause)?;
        }
        for pause in &plan.creates {
            insert_pause(&tx, id, pause)?;
        }

        let updated = require_entry(&tx, id.as_str())?;
        tx.commit()?;
        Ok(updated)
    }

    fn remove_entry(&mut self, id: &EntryId) -> Result<(), DbError> {
        let deleted = self
            .conn
            .execute("DELETE FROM entries WHERE id = ?", [id.as_str()])?;
        if deleted == 0 {
            return Err(DbError::EntryNotFound(id.clone()));
        }
        Ok(())
    }

    fn change_state(&mut self, id: &EntryId, change: &StateChange) -> Result<Entry, DbError> {
        let tx = self.conn.transaction()?;
        let Some(found) = entry_status(&tx, id.as_str())? else {
            return Err(DbError::EntryNotFound(id.clone()));
        };
        if found != change.expected {
            return Err(DbError::StaleStatus {
                id: id.clone(),
                expected: change.expected,
                found,
            });
        }
        if change.status.is_active() {
            if let Some(active) = other_active_entry(&tx, id.as_str())? {
                return Err(DbError::ActiveEntryExists(active));
            }
        }
        if let Some(at) = change.close_open_pause_at {
            tx.execute(
                "UPDATE pauses SET resume_time = ? WHERE entry_id = ? AND resume_time IS NULL",
                params![format_timestamp(at), id.as_str()],
            )?;
        }
        if let Some(pause) = &change.insert_pause {
            insert_pause(&tx, id, pause)?;
        }
        tx.execute(
            "UPDATE entries SET status = ?, end_time = ? WHERE id = ?",
            params![
                change.status.as_str(),
                change.end_time.map(format_timestamp),
                id.as_str(),
            ],
        )?;
        let entry = require_entry(&tx, id.as_str())?;
        tx.commit()?;
        Ok(entry)
    }

    fn insert_pauses(&mut self, entry_id: &EntryId, pauses: &[NewPause]) -> Result<Vec<Pause>, DbError> {
        let tx = self.conn.transaction()?;
        if entry_status(&tx, entry_id.as_str())?.is_none() {
            return Err(DbError::EntryNotFound(entry_id.clone()));
        }
        let mut created = Vec::with_capacity(pauses.len());
        for pause in pauses {
            created.push(insert_pause(&tx, entry_id, pause)?);
        }
        tx.commit()?;
        Ok(created)
    }
}

impl EntryStore for Database {
    fn active_entry(&self) -> Result<Option<Entry>, StoreError> {
        Ok(self.find_active()?)
    }

    fn entry(&self, id: &EntryId) -> Result<Option<Entry>, StoreError> {
        Ok(self.find_entry(id)?)
    }

    fn last_entry(&self, project: Option<&ProjectName>) -> Result<Option<Entry>, StoreError> {
        Ok(self.find_last(project)?)
    }

    fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<Entry>, StoreError> {
        Ok(self.find_entries(filter)?)
    }

    fn create_entry(&mut self, entry: &NewEntry) -> Result<Entry, StoreError> {
        Ok(self.insert_entry(entry)?)
    }

    fn update_entry(
        &mut self,
        id: &EntryId,
        update: &EntryUpdate,
        pauses: &PausePlan,
    ) -> Result<Entry, StoreError> {
        Ok(self.replace_entry(id, update, pauses)?)
    }

    fn delete_entry(&mut self, id: &EntryId) -> Result<(), StoreError> {
        Ok(self.remove_entry(id)?)
    }

    fn apply_change(&mut self, id: &EntryId, change: &StateChange) -> Result<Entry, StoreError> {
        Ok(self.change_state(id, change)?)
    }

    fn list_pauses(&self, entry_id: &EntryId) -> Result<Vec<Pause>, StoreError> {
        Ok(load_pauses(&self.conn, entry_id)?)
    }

    fn create_pauses(
        &mut self,
        entry_id: &EntryId,
        pauses: &[NewPause],
    ) -> Result<Vec<Pause>, StoreError> {
        Ok(self.insert_pauses(entry_id, pauses)?)
    }

    fn update_pause(&mut self, pause: &Pause) -> Result<(), StoreError> {
        Ok(write_pause(&self.conn, pause)?)
    }

    fn delete_pause(&mut self, id: &PauseId) -> Result<(), StoreError> {
        let deleted = self
            .conn
            .execute("DELETE FROM pauses WHERE id = ?", [id.as_str()])
            .map_err(DbError::from)?;
        if deleted == 0 {
            return Err(StoreError::PauseNotFound(id.clone()));
        }
        Ok(())
    }
}

fn query_entries<P: Params>(conn: &Connection, tail: &str, params: P) -> Result<Vec<Entry>, DbError> {
    let sql = format!("{ENTRY_SELECT} {tail}");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params, EntryRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(|row| hydrate(conn, row)).collect()
}

fn load_entry(conn: &Connection, id: &str) -> Result<Option<Entry>, DbError> {
    Ok(query_entries(conn, "WHERE e.id = ?", [id])?.pop())
}

/// Reads back a row written earlier in the same transaction.
fn require_entry(conn: &Connection, id: &str) -> Result<Entry, DbError> {
    load_entry(conn, id)?.ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
}

fn hydrate(conn: &Connection, row: EntryRow) -> Result<Entry, DbError> {
    let id = EntryId::new(row.id.as_str()).map_err(|source| invalid_value(&row.id, source))?;
    let project = ProjectName::new(row.project).map_err(|source| invalid_value(&row.id, source))?;
    let status = row
        .status
        .parse::<EntryStatus>()
        .map_err(|source| invalid_value(&row.id, source))?;
    let start_time = parse_timestamp(&row.start_time, &row.id)?;
    let end_time = row
        .end_time
        .as_deref()
        .map(|value| parse_timestamp(value, &row.id))
        .transpose()?;
    let tags = load_tags(conn, &id)?;
    let pauses = load_pauses(conn, &id)?;
    Ok(Entry {
        id,
        project,
        title: row.title,
        tags,
        start_time,
        end_time,
        status,
        pauses,
    })
}

fn load_tags(conn: &Connection, entry_id: &EntryId) -> Result<Vec<TagName>, DbError> {
    let mut stmt = conn.prepare(
        "
        SELECT t.name
        FROM entry_tags et
        JOIN tags t ON t.id = et.tag_id
        WHERE et.entry_id = ?
        ORDER BY et.position ASC
        ",
    )?;
    let names = stmt
        .query_map([entry_id.as_str()], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    names
        .into_iter()
        .map(|name| TagName::new(name).map_err(|source| invalid_value(entry_id.as_str(), source)))
        .collect()
}

fn load_pauses(conn: &Connection, entry_id: &EntryId) -> Result<Vec<Pause>, DbError> {
    let mut stmt = conn.prepare(
        "
        SELECT id, pause_time, resume_time, reason
        FROM pauses
        WHERE entry_id = ?
        ORDER BY pause_time ASC, rowid ASC
        ",
    )?;
    let rows = stmt
        .query_map([entry_id.as_str()], |row| {
            Ok(PauseRow {
                id: row.get(0)?,
                pause_time: row.get(1)?,
                resume_time: row.get(2)?,
                reason: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut pauses = Vec::with_capacity(rows.len());
    for row in rows {
        let reason = row
            .reason
            .parse::<PauseReason>()
            .map_err(|source| invalid_value(&row.id, source))?;
        pauses.push(Pause {
            id: PauseId::new(row.id.as_str()).map_err(|source| invalid_value(&row.id, source))?,
            entry_id: entry_id.clone(),
            pause_time: parse_timestamp(&row.pause_time, &row.id)?,
            resume_time: row
                .resume_time
                .as_deref()
                .map(|value| parse_timestamp(value, &row.id))
                .transpose()?,
            reason,
        });
    }
    Ok(pauses)
}

fn entry_status(conn: &Connection, id: &str) -> Result<Option<EntryStatus>, DbError> {
    let status: Option<String> = conn
        .query_row("SELECT status FROM entries WHERE id = ?", [id], |row| {
            row.get(0)
        })
        .optional()?;
    status
        .map(|value| value.parse().map_err(|source| invalid_value(id, source)))
        .transpose()
}

/// Id of an active entry other than `except`, if any.
fn other_active_entry(conn: &Connection, except: &str) -> Result<Option<EntryId>, DbError> {
    let id: Option<String> = conn
        .query_row(
            &format!("SELECT id FROM entries WHERE status IN {ACTIVE_STATUSES} AND id != ? LIMIT 1"),
            [except],
            |row| row.get(0),
        )
        .optional()?;
    id.map(|id| EntryId::new(id.as_str()).map_err(|source| invalid_value(&id, source)))
        .transpose()
}

fn ensure_project(conn: &Connection, name: &ProjectName, now: &str) -> Result<String, DbError> {
    conn.execute(
        "INSERT OR IGNORE INTO projects (id, name, created_at) VALUES (?, ?, ?)",
        params![Uuid::new_v4().to_string(), name.as_str(), now],
    )?;
    Ok(conn.query_row(
        "SELECT id FROM projects WHERE name = ?",
        [name.as_str()],
        |row| row.get(0),
    )?)
}

fn ensure_tag(conn: &Connection, name: &TagName, now: &str) -> Result<String, DbError> {
    conn.execute(
        "INSERT OR IGNORE INTO tags (id, name, created_at) VALUES (?, ?, ?)",
        params![Uuid::new_v4().to_string(), name.as_str(), now],
    )?;
    Ok(conn.query_row("SELECT id FROM tags WHERE name = ?", [name.as_str()], |row| {
        row.get(0)
    })?)
}

/// Replaces the tag associations of an entry, keeping the given order.
fn write_tags(conn: &Connection, entry_id: &str, tags: &[TagName], now: &str) -> Result<(), DbError> {
    conn.execute("DELETE FROM entry_tags WHERE entry_id = ?", [entry_id])?;
    let mut position: i64 = 0;
    for tag in tags {
        let tag_id = ensure_tag(conn, tag, now)?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO entry_tags (entry_id, tag_id, position) VALUES (?, ?, ?)",
            params![entry_id, tag_id, position],
        )?;
        if inserted > 0 {
            position += 1;
        }
    }
    Ok(())
}

fn insert_pause(conn: &Connection, entry_id: &EntryId, pause: &NewPause) -> Result<Pause, DbError> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "
        INSERT INTO pauses (id, entry_id, pause_time, resume_time, reason)
        VALUES (?, ?, ?, ?, ?)
        ",
        params![
            id,
            entry_id.as_str(),
            format_timestamp(pause.pause_time),
            pause.resume_time.map(format_timestamp),
            pause.reason.as_str(),
        ],
    )?;
    Ok(Pause {
        id: PauseId::new(id.as_str()).map_err(|source| invalid_value(&id, source))?,
        entry_id: entry_id.clone(),
        pause_time: truncate_to_millis(pause.pause_time),
        resume_time: pause.resume_time.map(truncate_to_millis),
        reason: pause.reason,
    })
}

fn write_pause(conn: &Connection, pause: &Pause) -> Result<(), DbError> {
    let updated = conn.execute(
        "
        UPDATE pauses
        SET pause_time = ?, resume_time = ?, reason = ?
        WHERE id = ? AND entry_id = ?
        ",
        params![
            format_timestamp(pause.pause_time),
            pause.resume_time.map(format_timestamp),
            pause.reason.as_str(),
            pause.id.as_str(),
            pause.entry_id.as_str(),
        ],
    )?;
    if updated == 0 {
        return Err(DbError::PauseNotFound(pause.id.clone()));
    }
    Ok(())
}

fn invalid_value(row_id: &str, source: ValidationError) -> DbError {
    DbError::InvalidValue {
        row_id: row_id.to_string(),
        source,
    }
}

fn parse_timestamp(timestamp: &str, row_id: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            row_id: row_id.to_string(),
            timestamp: timestamp.to_string(),
            source,
        })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The value a timestamp reads back as after a store round trip.
fn truncate_to_millis(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    parse_timestamp(&format_timestamp(timestamp), "").unwrap_or(timestamp)
}
