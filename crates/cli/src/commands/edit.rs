// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use chrono::Utc;
use tm_core::{DueDate, SaveMode, TaskId, TaskStore};

use super::Project;
use crate::error::{Error, Result};

pub fn run(id: TaskId, title: Option<String>, notes: Option<String>, due: Option<String>) -> Result<()> {
    let mut project = Project::open()?;
    if run_impl(&mut project, id, title, notes, due.as_deref())? {
        println!("Updated task {}", id);
    } else {
        println!("Nothing to update");
    }
    project.finish()
}

/// Applies the given fields; returns false when none were given.
///
/// Empty notes clear the notes; a due date of `none` (or empty) clears it.
pub(crate) fn run_impl(
    project: &mut Project,
    id: TaskId,
    title: Option<String>,
    notes: Option<String>,
    due: Option<&str>,
) -> Result<bool> {
    let mut task = project.db.get_task(id)?;
    if task.is_deleted() {
        return Err(Error::TaskNotFound(id));
    }
    if title.is_none() && notes.is_none() && due.is_none() {
        return Ok(false);
    }

    if let Some(title) = title {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::FieldEmpty { field: "title" });
        }
        task.title = title.to_string();
    }
    if let Some(notes) = notes {
        task.notes = Some(notes).filter(|n| !n.is_empty());
    }
    if let Some(due) = due {
        task.due = match due.trim() {
            "" | "none" => None,
            value => Some(value.parse::<DueDate>()?),
        };
    }

    project.db.save_task(&mut task, Utc::now(), SaveMode::Notify)?;
    Ok(true)
}

#[cfg(test)]
#[path = "edit_tests.rs"]
mod tests;
