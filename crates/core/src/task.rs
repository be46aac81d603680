// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Core data types: local tasks, their per-list mirror records, and lists.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Local task identifier, assigned by the task store on first save.
pub type TaskId = i64;

/// A due date, either a whole calendar day or a day with a time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueDate {
    Day(NaiveDate),
    DayTime(NaiveDateTime),
}

impl DueDate {
    /// Returns the calendar day.
    pub fn date(&self) -> NaiveDate {
        match self {
            DueDate::Day(d) => *d,
            DueDate::DayTime(dt) => dt.date(),
        }
    }

    /// Returns the time of day, if one was chosen.
    pub fn time(&self) -> Option<NaiveTime> {
        match self {
            DueDate::Day(_) => None,
            DueDate::DayTime(dt) => Some(dt.time()),
        }
    }

    /// Moves this due date to another day, keeping any time of day.
    pub fn on_date(self, date: NaiveDate) -> DueDate {
        match self.time() {
            Some(time) => DueDate::DayTime(date.and_time(time)),
            None => DueDate::Day(date),
        }
    }
}

impl fmt::Display for DueDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DueDate::Day(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            DueDate::DayTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
        }
    }
}

impl FromStr for DueDate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(day) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(DueDate::Day(day));
        }
        for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
                return Ok(DueDate::DayTime(dt));
            }
        }
        Err(Error::InvalidDueDate(s.to_string()))
    }
}

/// A local task as owned by the task store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// `None` until the task store assigns an id.
    pub id: Option<TaskId>,
    pub title: String,
    pub notes: Option<String>,
    pub due: Option<DueDate>,
    pub completed: Option<DateTime<Utc>>,
    pub deleted: Option<DateTime<Utc>>,
    pub created: DateTime<Utc>,
    /// Stamped by the task store on every save.
    pub modified: DateTime<Utc>,
}

impl Task {
    /// Creates an unsaved task with the given title.
    pub fn new(title: impl Into<String>, now: DateTime<Utc>) -> Self {
        Task {
            id: None,
            title: title.into(),
            notes: None,
            due: None,
            completed: None,
            deleted: None,
            created: now,
            modified: now,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed.is_some()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted.is_some()
    }
}

/// Field values of a task as last agreed with the remote service.
///
/// Stored on the mirror record after every successful push or pull and used
/// as the merge base when deciding which local fields to transmit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<NaiveDate>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub deleted: bool,
}

/// Links one local task to its position and identity in one remote list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorRecord {
    pub task_id: TaskId,
    pub list_id: String,
    /// Empty until the first successful remote create or adoption.
    pub remote_id: Option<String>,
    pub order: i64,
    pub indent: u32,
    pub parent: Option<TaskId>,
    /// Parent id as reported by the remote service.
    pub remote_parent: Option<String>,
    /// Sibling position string as reported by the remote service.
    pub remote_position: Option<String>,
    /// Placement changed locally; the next pass issues a remote move.
    pub moved: bool,
    pub last_sync: Option<DateTime<Utc>>,
    /// Set when the task left the list; the next pass deletes it remotely.
    pub deleted: Option<DateTime<Utc>>,
    pub snapshot: Option<TaskSnapshot>,
}

impl MirrorRecord {
    /// Creates a top-level record that has never been pushed.
    pub fn new(task_id: TaskId, list_id: impl Into<String>, order: i64) -> Self {
        MirrorRecord {
            task_id,
            list_id: list_id.into(),
            remote_id: None,
            order,
            indent: 0,
            parent: None,
            remote_parent: None,
            remote_position: None,
            moved: false,
            last_sync: None,
            deleted: None,
            snapshot: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.deleted.is_none()
    }

    /// Returns true if the local side has something the remote has not seen.
    pub fn needs_push(&self, task: &Task) -> bool {
        if self.deleted.is_some() || self.remote_id.is_none() || self.moved {
            return true;
        }
        match self.last_sync {
            Some(last_sync) => task.modified > last_sync,
            None => true,
        }
    }
}

/// A task list. Its id is the remote list id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskList {
    pub id: String,
    pub title: String,
    /// Remote "updated" timestamp from the last list refresh.
    pub remote_updated: Option<DateTime<Utc>>,
    /// Watermark: remote changes up to this time have been pulled.
    pub last_sync: Option<DateTime<Utc>>,
}

impl TaskList {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        TaskList { id: id.into(), title: title.into(), remote_updated: None, last_sync: None }
    }

    /// Returns true if the remote reports changes newer than the watermark.
    pub fn remote_is_newer(&self) -> bool {
        match (self.last_sync, self.remote_updated) {
            (None, _) => true,
            (Some(mark), Some(updated)) => updated > mark,
            (Some(_), None) => false,
        }
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
