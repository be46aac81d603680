// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Storage traits consumed by the list updater and the sync engine.
//!
//! [`crate::Database`] implements all three; the traits keep the engines
//! independent of SQLite.

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::task::{MirrorRecord, Task, TaskId, TaskList};

/// Whether a task save notifies the change hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// A user edit; observers are told.
    Notify,
    /// A write made by sync itself; observers are not told, so a listener
    /// that starts a sync on change cannot loop.
    Suppress,
}

/// Keyed storage for local task content.
pub trait TaskStore {
    fn find_task(&self, id: TaskId) -> Result<Option<Task>>;

    fn get_task(&self, id: TaskId) -> Result<Task> {
        self.find_task(id)?.ok_or(Error::TaskNotFound(id))
    }

    /// Inserts or updates `task`, stamping `modified` with `now`.
    ///
    /// Assigns `task.id` on insert and returns it.
    fn save_task(&mut self, task: &mut Task, now: DateTime<Utc>, mode: SaveMode) -> Result<TaskId>;
}

/// Keyed storage for mirror records and lists.
pub trait MirrorStore {
    fn record_for_task(&self, task_id: TaskId) -> Result<Option<MirrorRecord>>;

    fn record_by_remote_id(&self, remote_id: &str) -> Result<Option<MirrorRecord>>;

    /// Every record of the list, deleted ones included, by ascending order.
    fn list_records(&self, list_id: &str) -> Result<Vec<MirrorRecord>>;

    /// Records of the list that have not been removed from it.
    fn active_records(&self, list_id: &str) -> Result<Vec<MirrorRecord>> {
        Ok(self.list_records(list_id)?.into_iter().filter(MirrorRecord::is_active).collect())
    }

    /// Inserts or replaces the record keyed by its task id.
    fn save_record(&mut self, record: &MirrorRecord) -> Result<()>;

    /// Saves several records as one unit.
    fn save_records(&mut self, records: &[MirrorRecord]) -> Result<()> {
        for record in records {
            self.save_record(record)?;
        }
        Ok(())
    }

    fn delete_record(&mut self, task_id: TaskId) -> Result<()>;

    /// One past the highest order in the list.
    fn next_order(&self, list_id: &str) -> Result<i64>;

    fn lists(&self) -> Result<Vec<TaskList>>;

    fn find_list(&self, list_id: &str) -> Result<Option<TaskList>>;

    fn save_list(&mut self, list: &TaskList) -> Result<()>;

    /// Removes the list and all of its records.
    fn purge_list(&mut self, list_id: &str) -> Result<()>;
}

/// Outcome of the most recent sync passes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStatus {
    pub last_attempt: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// Terminal status shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    NeverRun,
    Error,
    Success,
}

impl SyncStatus {
    pub fn state(&self) -> SyncState {
        if self.last_attempt.is_none() {
            SyncState::NeverRun
        } else if self.last_error.is_some() {
            SyncState::Error
        } else {
            SyncState::Success
        }
    }
}

/// Persistent sync bookkeeping.
pub trait SyncStatusStore {
    fn sync_status(&self) -> Result<SyncStatus>;

    fn record_sync_start(&mut self, at: DateTime<Utc>) -> Result<()>;

    fn record_sync_success(&mut self, at: DateTime<Utc>) -> Result<()>;

    fn set_sync_error(&mut self, message: Option<&str>) -> Result<()>;
}

/// Everything sync needs from local storage.
pub trait Store: TaskStore + MirrorStore + SyncStatusStore {}

impl<T: TaskStore + MirrorStore + SyncStatusStore + ?Sized> Store for T {}
