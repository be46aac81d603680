// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed storage for tasks, lists, mirror records and sync status.
//!
//! The [`Database`] struct implements [`TaskStore`], [`MirrorStore`] and
//! [`SyncStatusStore`].

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

use crate::error::{Error, Result};
use crate::store::{MirrorStore, SaveMode, SyncStatus, SyncStatusStore, TaskStore};
use crate::task::{DueDate, MirrorRecord, Task, TaskId, TaskList, TaskSnapshot};

/// SQL schema for the task mirror database.
pub const SCHEMA: &str = r#"
-- Local task content
CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    notes TEXT,
    due TEXT,                    -- YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS
    completed_at TEXT,
    deleted_at TEXT,
    created_at TEXT NOT NULL,
    modified_at TEXT NOT NULL
);

-- Lists, keyed by remote list id
CREATE TABLE IF NOT EXISTS lists (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    remote_updated TEXT,
    last_sync TEXT               -- pull watermark
);

-- One row per task known to a list
CREATE TABLE IF NOT EXISTS mirrors (
    task_id INTEGER PRIMARY KEY,
    list_id TEXT NOT NULL,
    remote_id TEXT,
    ord INTEGER NOT NULL,
    indent INTEGER NOT NULL DEFAULT 0,
    parent_id INTEGER,
    remote_parent TEXT,
    remote_position TEXT,
    moved INTEGER NOT NULL DEFAULT 0,
    last_sync TEXT,
    deleted_at TEXT,
    snapshot TEXT,               -- JSON, last values agreed with the remote
    FOREIGN KEY (task_id) REFERENCES tasks(id),
    FOREIGN KEY (list_id) REFERENCES lists(id)
);

-- Sync bookkeeping
CREATE TABLE IF NOT EXISTS sync_state (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_mirrors_list_order ON mirrors(list_id, ord);
CREATE UNIQUE INDEX IF NOT EXISTS idx_mirrors_remote ON mirrors(remote_id) WHERE remote_id IS NOT NULL;
"#;

const MIRROR_COLUMNS: &str = "task_id, list_id, remote_id, ord, indent, parent_id, remote_parent,
     remote_position, moved, last_sync, deleted_at, snapshot";

const KEY_LAST_ATTEMPT: &str = "last_attempt";
const KEY_LAST_SUCCESS: &str = "last_success";
const KEY_LAST_ERROR: &str = "last_error";

fn corrupted(message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(Error::CorruptedData(message)),
    )
}

/// Parse a string value from the database, returning a rusqlite error on parse failure.
fn parse_db<T: std::str::FromStr>(
    value: &str,
    column: &str,
) -> std::result::Result<T, rusqlite::Error> {
    value
        .parse()
        .map_err(|_| corrupted(format!("invalid value '{value}' in column '{column}'")))
}

/// Parse an RFC3339 timestamp from the database.
fn parse_timestamp(
    value: &str,
    column: &str,
) -> std::result::Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| corrupted(format!("invalid timestamp '{value}' in column '{column}'")))
}

fn parse_timestamp_opt(
    value: Option<String>,
    column: &str,
) -> std::result::Result<Option<DateTime<Utc>>, rusqlite::Error> {
    value.map(|v| parse_timestamp(&v, column)).transpose()
}

fn to_text(dt: Option<DateTime<Utc>>) -> Option<String> {
    dt.map(|d| d.to_rfc3339())
}

fn task_from_row(row: &Row<'_>) -> std::result::Result<Task, rusqlite::Error> {
    let due: Option<String> = row.get(3)?;
    let created: String = row.get(6)?;
    let modified: String = row.get(7)?;
    Ok(Task {
        id: Some(row.get(0)?),
        title: row.get(1)?,
        notes: row.get(2)?,
        due: due.map(|d| parse_db::<DueDate>(&d, "due")).transpose()?,
        completed: parse_timestamp_opt(row.get(4)?, "completed_at")?,
        deleted: parse_timestamp_opt(row.get(5)?, "deleted_at")?,
        created: parse_timestamp(&created, "created_at")?,
        modified: parse_timestamp(&modified, "modified_at")?,
    })
}

fn record_from_row(row: &Row<'_>) -> std::result::Result<MirrorRecord, rusqlite::Error> {
    let indent: i64 = row.get(4)?;
    let snapshot: Option<String> = row.get(11)?;
    let snapshot = snapshot
        .map(|s| {
            serde_json::from_str::<TaskSnapshot>(&s)
                .map_err(|e| corrupted(format!("invalid snapshot '{s}': {e}")))
        })
        .transpose()?;
    Ok(MirrorRecord {
        task_id: row.get(0)?,
        list_id: row.get(1)?,
        remote_id: row.get(2)?,
        order: row.get(3)?,
        indent: u32::try_from(indent).map_err(|_| corrupted(format!("invalid indent {indent}")))?,
        parent: row.get(5)?,
        remote_parent: row.get(6)?,
        remote_position: row.get(7)?,
        moved: row.get(8)?,
        last_sync: parse_timestamp_opt(row.get(9)?, "last_sync")?,
        deleted: parse_timestamp_opt(row.get(10)?, "deleted_at")?,
        snapshot,
    })
}

fn list_from_row(row: &Row<'_>) -> std::result::Result<TaskList, rusqlite::Error> {
    Ok(TaskList {
        id: row.get(0)?,
        title: row.get(1)?,
        remote_updated: parse_timestamp_opt(row.get(2)?, "remote_updated")?,
        last_sync: parse_timestamp_opt(row.get(3)?, "last_sync")?,
    })
}

fn write_record(conn: &Connection, record: &MirrorRecord) -> Result<()> {
    let snapshot = record.snapshot.as_ref().map(serde_json::to_string).transpose()?;
    conn.execute(
        "INSERT INTO mirrors (task_id, list_id, remote_id, ord, indent, parent_id, remote_parent,
             remote_position, moved, last_sync, deleted_at, snapshot)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
         ON CONFLICT(task_id) DO UPDATE SET
             list_id = excluded.list_id,
             remote_id = excluded.remote_id,
             ord = excluded.ord,
             indent = excluded.indent,
             parent_id = excluded.parent_id,
             remote_parent = excluded.remote_parent,
             remote_position = excluded.remote_position,
             moved = excluded.moved,
             last_sync = excluded.last_sync,
             deleted_at = excluded.deleted_at,
             snapshot = excluded.snapshot",
        params![
            record.task_id,
            record.list_id,
            record.remote_id,
            record.order,
            i64::from(record.indent),
            record.parent,
            record.remote_parent,
            record.remote_position,
            record.moved,
            to_text(record.last_sync),
            to_text(record.deleted),
            snapshot,
        ],
    )?;
    Ok(())
}

/// Run schema creation on a database connection.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Callback invoked with the id of every task saved with [`SaveMode::Notify`].
pub type ChangeHook = Box<dyn FnMut(TaskId) + Send>;

/// SQLite database connection with task mirror operations.
pub struct Database {
    /// The underlying SQLite connection.
    pub conn: Connection,
    on_change: Option<ChangeHook>,
}

impl Database {
    /// Open a database connection at the given path, creating and migrating if needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // Enable foreign keys and WAL mode for concurrency
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;

        let db = Database { conn, on_change: None };
        run_migrations(&db.conn)?;
        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let db = Database { conn, on_change: None };
        run_migrations(&db.conn)?;
        Ok(db)
    }

    /// Installs the hook told about user edits. Replaces any previous hook.
    pub fn set_change_hook(&mut self, hook: ChangeHook) {
        self.on_change = Some(hook);
    }

    /// Number of lists, tasks and mirror records.
    pub fn counts(&self) -> Result<(usize, usize, usize)> {
        let count = |table: &str| -> Result<usize> {
            let n: i64 =
                self.conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
            Ok(usize::try_from(n).unwrap_or(0))
        };
        Ok((count("lists")?, count("tasks")?, count("mirrors")?))
    }

    fn get_state(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM sync_state WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set_state(&self, key: &str, value: Option<&str>) -> Result<()> {
        match value {
            Some(value) => {
                self.conn.execute(
                    "INSERT INTO sync_state (key, value) VALUES (?1, ?2)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                    params![key, value],
                )?;
            }
            None => {
                self.conn.execute("DELETE FROM sync_state WHERE key = ?1", params![key])?;
            }
        }
        Ok(())
    }

    fn get_state_timestamp(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        match self.get_state(key)? {
            Some(value) => Ok(Some(parse_timestamp(&value, key)?)),
            None => Ok(None),
        }
    }
}

impl TaskStore for Database {
    fn find_task(&self, id: TaskId) -> Result<Option<Task>> {
        let task = self
            .conn
            .query_row(
                "SELECT id, title, notes, due, completed_at, deleted_at, created_at, modified_at
                 FROM tasks WHERE id = ?1",
                params![id],
                task_from_row,
            )
            .optional()?;
        Ok(task)
    }

    fn save_task(&mut self, task: &mut Task, now: DateTime<Utc>, mode: SaveMode) -> Result<TaskId> {
        task.modified = now;
        let due = task.due.map(|d| d.to_string());
        let id = match task.id {
            Some(id) => {
                let changed = self.conn.execute(
                    "UPDATE tasks SET title = ?2, notes = ?3, due = ?4, completed_at = ?5,
                         deleted_at = ?6, created_at = ?7, modified_at = ?8
                     WHERE id = ?1",
                    params![
                        id,
                        task.title,
                        task.notes,
                        due,
                        to_text(task.completed),
                        to_text(task.deleted),
                        task.created.to_rfc3339(),
                        task.modified.to_rfc3339(),
                    ],
                )?;
                if changed == 0 {
                    return Err(Error::TaskNotFound(id));
                }
                id
            }
            None => {
                self.conn.execute(
                    "INSERT INTO tasks (title, notes, due, completed_at, deleted_at, created_at, modified_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        task.title,
                        task.notes,
                        due,
                        to_text(task.completed),
                        to_text(task.deleted),
                        task.created.to_rfc3339(),
                        task.modified.to_rfc3339(),
                    ],
                )?;
                let id = self.conn.last_insert_rowid();
                task.id = Some(id);
                id
            }
        };

        if mode == SaveMode::Notify {
            if let Some(hook) = self.on_change.as_mut() {
                hook(id);
            }
        }
        Ok(id)
    }
}

impl MirrorStore for Database {
    fn record_for_task(&self, task_id: TaskId) -> Result<Option<MirrorRecord>> {
        let record = self
            .conn
            .query_row(
                &format!("SELECT {MIRROR_COLUMNS} FROM mirrors WHERE task_id = ?1"),
                params![task_id],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn record_by_remote_id(&self, remote_id: &str) -> Result<Option<MirrorRecord>> {
        let record = self
            .conn
            .query_row(
                &format!("SELECT {MIRROR_COLUMNS} FROM mirrors WHERE remote_id = ?1"),
                params![remote_id],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn list_records(&self, list_id: &str) -> Result<Vec<MirrorRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {MIRROR_COLUMNS} FROM mirrors WHERE list_id = ?1 ORDER BY ord, task_id"
        ))?;
        let records = stmt
            .query_map(params![list_id], record_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn save_record(&mut self, record: &MirrorRecord) -> Result<()> {
        write_record(&self.conn, record)
    }

    fn save_records(&mut self, records: &[MirrorRecord]) -> Result<()> {
        let tx = self.conn.transaction()?;
        for record in records {
            write_record(&tx, record)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn delete_record(&mut self, task_id: TaskId) -> Result<()> {
        self.conn.execute("DELETE FROM mirrors WHERE task_id = ?1", params![task_id])?;
        Ok(())
    }

    fn next_order(&self, list_id: &str) -> Result<i64> {
        let max: Option<i64> = self.conn.query_row(
            "SELECT MAX(ord) FROM mirrors WHERE list_id = ?1",
            params![list_id],
            |row| row.get(0),
        )?;
        Ok(max.map_or(0, |m| m + 1))
    }

    fn lists(&self) -> Result<Vec<TaskList>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, title, remote_updated, last_sync FROM lists ORDER BY title, id")?;
        let lists = stmt
            .query_map([], list_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(lists)
    }

    fn find_list(&self, list_id: &str) -> Result<Option<TaskList>> {
        let list = self
            .conn
            .query_row(
                "SELECT id, title, remote_updated, last_sync FROM lists WHERE id = ?1",
                params![list_id],
                list_from_row,
            )
            .optional()?;
        Ok(list)
    }

    fn save_list(&mut self, list: &TaskList) -> Result<()> {
        self.conn.execute(
            "INSERT INTO lists (id, title, remote_updated, last_sync) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                 title = excluded.title,
                 remote_updated = excluded.remote_updated,
                 last_sync = excluded.last_sync",
            params![list.id, list.title, to_text(list.remote_updated), to_text(list.last_sync)],
        )?;
        Ok(())
    }

    fn purge_list(&mut self, list_id: &str) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM mirrors WHERE list_id = ?1", params![list_id])?;
        tx.execute("DELETE FROM lists WHERE id = ?1", params![list_id])?;
        tx.commit()?;
        Ok(())
    }
}

impl SyncStatusStore for Database {
    fn sync_status(&self) -> Result<SyncStatus> {
        Ok(SyncStatus {
            last_attempt: self.get_state_timestamp(KEY_LAST_ATTEMPT)?,
            last_success: self.get_state_timestamp(KEY_LAST_SUCCESS)?,
            last_error: self.get_state(KEY_LAST_ERROR)?,
        })
    }

    fn record_sync_start(&mut self, at: DateTime<Utc>) -> Result<()> {
        self.set_state(KEY_LAST_ATTEMPT, Some(&at.to_rfc3339()))
    }

    fn record_sync_success(&mut self, at: DateTime<Utc>) -> Result<()> {
        self.set_state(KEY_LAST_SUCCESS, Some(&at.to_rfc3339()))
    }

    fn set_sync_error(&mut self, message: Option<&str>) -> Result<()> {
        self.set_state(KEY_LAST_ERROR, message)
    }
}

#[cfg(test)]
#[path = "db_tests.rs"]
mod tests;
