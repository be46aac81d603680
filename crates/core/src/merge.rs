// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Field merge rules between a local task and its remote counterpart.
//!
//! Pushes are three-way: a local field is transmitted only when it differs
//! from the last values both sides agreed on (the record's snapshot). With
//! no snapshot the current remote values are the base, and with neither
//! every field is sent.

use chrono::NaiveDate;

use crate::task::{DueDate, Task, TaskSnapshot};

/// Longest title the remote service stores.
pub const MAX_TITLE_LENGTH: usize = 1024;

/// Longest notes text the remote service stores.
pub const MAX_NOTES_LENGTH: usize = 8192;

/// Length limits applied before pushing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLimits {
    pub title: usize,
    pub notes: usize,
}

impl Default for FieldLimits {
    fn default() -> Self {
        FieldLimits { title: MAX_TITLE_LENGTH, notes: MAX_NOTES_LENGTH }
    }
}

/// Which task fields a push must carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldChanges {
    pub title: bool,
    pub notes: bool,
    pub due: bool,
    pub completed: bool,
    pub deleted: bool,
}

impl FieldChanges {
    pub fn all() -> Self {
        FieldChanges { title: true, notes: true, due: true, completed: true, deleted: true }
    }

    pub fn any(&self) -> bool {
        self.title || self.notes || self.due || self.completed || self.deleted
    }
}

/// Truncates to at most `max` characters.
pub fn truncate(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((end, _)) => value[..end].to_string(),
        None => value.to_string(),
    }
}

/// Empty notes and absent notes are the same thing.
pub fn normalize_notes(notes: Option<&str>) -> Option<String> {
    notes.filter(|n| !n.is_empty()).map(String::from)
}

/// The values the remote would hold after a full push of `task`.
pub fn snapshot_of(task: &Task, limits: &FieldLimits) -> TaskSnapshot {
    TaskSnapshot {
        title: truncate(&task.title, limits.title),
        notes: normalize_notes(task.notes.as_deref()).map(|n| truncate(&n, limits.notes)),
        due: task.due.map(|d| d.date()),
        completed: task.is_completed(),
        deleted: task.is_deleted(),
    }
}

/// Fields of `task` that differ from `base`.
///
/// Completion and deletion compare set against unset, never timestamps.
pub fn changed_fields(task: &Task, base: Option<&TaskSnapshot>, limits: &FieldLimits) -> FieldChanges {
    let Some(base) = base else {
        return FieldChanges::all();
    };
    let local = snapshot_of(task, limits);
    FieldChanges {
        title: local.title != base.title,
        notes: local.notes != base.notes,
        due: local.due != base.due,
        completed: local.completed != base.completed,
        deleted: local.deleted != base.deleted,
    }
}

/// Local value to keep when the remote sends `incoming`.
///
/// A remote value at the length limit that prefixes the local value is the
/// truncated copy of it, so the local value stays.
pub fn truncated_value(current: Option<&str>, incoming: &str, max: usize) -> String {
    match current {
        Some(current)
            if !current.is_empty()
                && incoming.chars().count() >= max
                && current.starts_with(incoming) =>
        {
            current.to_string()
        }
        _ => incoming.to_string(),
    }
}

/// Applies a remote due day to the local due date.
///
/// The remote stores days only, so a local time of day survives a change of
/// date on the remote side.
pub fn merge_due(remote: Option<NaiveDate>, local: Option<DueDate>) -> Option<DueDate> {
    let date = remote?;
    Some(match local {
        Some(due) => due.on_date(date),
        None => DueDate::Day(date),
    })
}

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;
