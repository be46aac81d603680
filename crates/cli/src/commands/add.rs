// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use chrono::Utc;
use tm_core::{updater, DueDate, SaveMode, Task, TaskId, TaskStore};
use tracing::debug;

use super::{resolve_list, Project};
use crate::error::Result;

pub fn run(title: String, list: Option<String>, notes: Option<String>, due: Option<String>) -> Result<()> {
    let mut project = Project::open()?;
    let id = run_impl(&mut project, title, list.as_deref(), notes, due.as_deref())?;
    println!("{}", id);
    project.finish()
}

/// Internal implementation that accepts a project for testing.
pub(crate) fn run_impl(
    project: &mut Project,
    title: String,
    list: Option<&str>,
    notes: Option<String>,
    due: Option<&str>,
) -> Result<TaskId> {
    let list = resolve_list(&project.db, &project.config, list)?;
    let due = due.map(str::parse::<DueDate>).transpose()?;

    let now = Utc::now();
    let mut task = Task::new(title.trim(), now);
    task.notes = notes.filter(|n| !n.is_empty());
    task.due = due;

    let id = project.db.save_task(&mut task, now, SaveMode::Notify)?;
    let record = updater::append_task(&mut project.db, &list.id, id)?;
    debug!(task = id, list = %list.id, order = record.order, "added task");
    Ok(id)
}

#[cfg(test)]
#[path = "add_tests.rs"]
mod tests;
