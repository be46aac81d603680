// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Remote task service abstraction.
//!
//! [`RemoteClient`] is the typed surface sync consumes: paginated listing,
//! task create/update/move/delete and list create/rename/delete. The
//! implementations here are [`super::MemoryRemote`] and
//! [`super::FileRemote`]; a network client plugs in behind the same trait.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tm_core::merge::{normalize_notes, truncate, FieldChanges, FieldLimits};
use tm_core::{Task, TaskSnapshot};

/// Error type for remote operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// Credentials expired or revoked. Ends the whole sync session.
    #[error("unauthorized: {0}\n  hint: check the remote token in .taskmirror/config.toml")]
    Unauthorized(String),

    /// The addressed task or list does not exist remotely.
    #[error("not found: {0}")]
    NotFound(String),

    /// The remote refused the request as invalid.
    #[error("rejected: {0}")]
    Rejected(String),

    /// Transient transport or storage failure.
    #[error("remote i/o error: {0}")]
    Io(String),
}

/// Result type for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// A task list as the remote reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteList {
    pub id: String,
    pub title: String,
    pub updated: DateTime<Utc>,
}

/// A task as the remote reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTask {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deleted: bool,
    /// Completed and cleared from the list's view.
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Sortable sibling position.
    pub position: String,
    pub updated: DateTime<Utc>,
}

impl RemoteTask {
    /// Field values for use as a merge base.
    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            title: self.title.clone(),
            notes: normalize_notes(self.notes.as_deref()),
            due: self.due,
            completed: self.completed.is_some(),
            deleted: self.deleted,
        }
    }
}

/// Field values for a remote create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRemoteTask {
    pub title: String,
    pub notes: Option<String>,
    pub due: Option<NaiveDate>,
    pub completed: Option<DateTime<Utc>>,
}

impl NewRemoteTask {
    pub fn from_task(task: &Task, limits: &FieldLimits) -> Self {
        NewRemoteTask {
            title: truncate(&task.title, limits.title),
            notes: normalize_notes(task.notes.as_deref()).map(|n| truncate(&n, limits.notes)),
            due: task.due.map(|d| d.date()),
            completed: task.completed,
        }
    }
}

/// Partial update of a remote task. `None` leaves the field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    pub id: String,
    pub title: Option<String>,
    pub notes: Option<Option<String>>,
    pub due: Option<Option<NaiveDate>>,
    pub completed: Option<Option<DateTime<Utc>>>,
    pub deleted: Option<bool>,
}

impl TaskPatch {
    /// Patch carrying the `changes` fields of `task`.
    pub fn from_task(id: &str, task: &Task, changes: &FieldChanges, limits: &FieldLimits) -> Self {
        TaskPatch {
            id: id.to_string(),
            title: changes.title.then(|| truncate(&task.title, limits.title)),
            notes: changes
                .notes
                .then(|| normalize_notes(task.notes.as_deref()).map(|n| truncate(&n, limits.notes))),
            due: changes.due.then(|| task.due.map(|d| d.date())),
            completed: changes.completed.then_some(task.completed),
            deleted: changes.deleted.then_some(task.is_deleted()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.notes.is_none()
            && self.due.is_none()
            && self.completed.is_none()
            && self.deleted.is_none()
    }

    /// Applies the patch to a remote task in place.
    pub fn apply(&self, task: &mut RemoteTask) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(notes) = &self.notes {
            task.notes = notes.clone();
        }
        if let Some(due) = self.due {
            task.due = due;
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(deleted) = self.deleted {
            task.deleted = deleted;
        }
    }
}

/// Filter for [`RemoteClient::list_tasks`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub include_deleted: bool,
    pub include_hidden: bool,
    /// Only tasks updated strictly after this time.
    pub changed_since: Option<DateTime<Utc>>,
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
}

/// Typed calls against the remote task service.
pub trait RemoteClient {
    fn list_lists(&mut self, page_token: Option<&str>) -> RemoteResult<Page<RemoteList>>;

    fn list_tasks(
        &mut self,
        list_id: &str,
        query: &TaskQuery,
        page_token: Option<&str>,
    ) -> RemoteResult<Page<RemoteTask>>;

    /// Creates a task under `parent`, directly after `previous`.
    fn create_task(
        &mut self,
        list_id: &str,
        task: &NewRemoteTask,
        parent: Option<&str>,
        previous: Option<&str>,
    ) -> RemoteResult<RemoteTask>;

    fn update_task(&mut self, list_id: &str, patch: &TaskPatch) -> RemoteResult<RemoteTask>;

    /// Re-parents and re-positions a task directly after `previous`.
    fn move_task(
        &mut self,
        list_id: &str,
        task_id: &str,
        parent: Option<&str>,
        previous: Option<&str>,
    ) -> RemoteResult<RemoteTask>;

    fn delete_task(&mut self, list_id: &str, task_id: &str) -> RemoteResult<()>;

    fn create_list(&mut self, title: &str) -> RemoteResult<RemoteList>;

    fn rename_list(&mut self, list_id: &str, title: &str) -> RemoteResult<RemoteList>;

    fn delete_list(&mut self, list_id: &str) -> RemoteResult<()>;
}

impl<R: RemoteClient + ?Sized> RemoteClient for Box<R> {
    fn list_lists(&mut self, page_token: Option<&str>) -> RemoteResult<Page<RemoteList>> {
        (**self).list_lists(page_token)
    }

    fn list_tasks(
        &mut self,
        list_id: &str,
        query: &TaskQuery,
        page_token: Option<&str>,
    ) -> RemoteResult<Page<RemoteTask>> {
        (**self).list_tasks(list_id, query, page_token)
    }

    fn create_task(
        &mut self,
        list_id: &str,
        task: &NewRemoteTask,
        parent: Option<&str>,
        previous: Option<&str>,
    ) -> RemoteResult<RemoteTask> {
        (**self).create_task(list_id, task, parent, previous)
    }

    fn update_task(&mut self, list_id: &str, patch: &TaskPatch) -> RemoteResult<RemoteTask> {
        (**self).update_task(list_id, patch)
    }

    fn move_task(
        &mut self,
        list_id: &str,
        task_id: &str,
        parent: Option<&str>,
        previous: Option<&str>,
    ) -> RemoteResult<RemoteTask> {
        (**self).move_task(list_id, task_id, parent, previous)
    }

    fn delete_task(&mut self, list_id: &str, task_id: &str) -> RemoteResult<()> {
        (**self).delete_task(list_id, task_id)
    }

    fn create_list(&mut self, title: &str) -> RemoteResult<RemoteList> {
        (**self).create_list(title)
    }

    fn rename_list(&mut self, list_id: &str, title: &str) -> RemoteResult<RemoteList> {
        (**self).rename_list(list_id, title)
    }

    fn delete_list(&mut self, list_id: &str) -> RemoteResult<()> {
        (**self).delete_list(list_id)
    }
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod tests;
