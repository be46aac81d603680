// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{DateTime, Utc};
use tm_core::{updater, Database, MirrorRecord, MirrorStore, SaveMode, Task, TaskId, TaskStore};
use tracing::debug;

use super::Project;
use crate::error::{Error, Result};

pub fn done(ids: &[TaskId]) -> Result<()> {
    let mut project = Project::open()?;
    for &id in ids {
        let count = done_impl(&mut project, id)?;
        match count {
            0 => println!("Task {} was already done", id),
            1 => println!("Completed task {}", id),
            n => println!("Completed task {} and {} subtask(s)", id, n - 1),
        }
    }
    project.finish()
}

pub fn reopen(ids: &[TaskId]) -> Result<()> {
    let mut project = Project::open()?;
    for &id in ids {
        if reopen_impl(&mut project, id)? {
            println!("Reopened task {}", id);
        } else {
            println!("Task {} is not done", id);
        }
    }
    project.finish()
}

pub fn remove(ids: &[TaskId]) -> Result<()> {
    let mut project = Project::open()?;
    for &id in ids {
        remove_impl(&mut project, id)?;
        println!("Deleted task {}", id);
    }
    project.finish()
}

/// Completes a task and every task below it; returns how many changed.
pub(crate) fn done_impl(project: &mut Project, id: TaskId) -> Result<usize> {
    let now = Utc::now();
    let task = live_task(&project.db, id)?;
    let mut count = usize::from(complete(&mut project.db, task, now)?);

    if let Some(record) = list_record(&project.db, id)? {
        updater::apply_to_descendants(&mut project.db, &record.list_id, id, |db, child| {
            let task = db.get_task(child)?;
            count += usize::from(complete(db, task, now)?);
            Ok(())
        })?;
    }
    debug!(task = id, count, "completed");
    Ok(count)
}

/// Clears completion of one task. Subtasks are left as they are.
pub(crate) fn reopen_impl(project: &mut Project, id: TaskId) -> Result<bool> {
    let mut task = live_task(&project.db, id)?;
    if !task.is_completed() {
        return Ok(false);
    }
    task.completed = None;
    project.db.save_task(&mut task, Utc::now(), SaveMode::Notify)?;
    Ok(true)
}

/// Deletes a task. Its children take its place in the list, and its
/// record stays behind, marked deleted, until sync removes the remote copy.
pub(crate) fn remove_impl(project: &mut Project, id: TaskId) -> Result<()> {
    let now = Utc::now();
    let mut task = live_task(&project.db, id)?;

    if let Some(record) = list_record(&project.db, id)? {
        updater::delete_task_cascading(&mut project.db, &record.list_id, id, now)?;
    }
    task.deleted = Some(now);
    project.db.save_task(&mut task, now, SaveMode::Notify)?;
    Ok(())
}

fn live_task(db: &Database, id: TaskId) -> Result<Task> {
    let task = db.get_task(id)?;
    if task.is_deleted() {
        return Err(Error::TaskNotFound(id));
    }
    Ok(task)
}

fn list_record(db: &Database, id: TaskId) -> Result<Option<MirrorRecord>> {
    Ok(db.record_for_task(id)?.filter(MirrorRecord::is_active))
}

fn complete(db: &mut Database, mut task: Task, now: DateTime<Utc>) -> tm_core::Result<bool> {
    if task.is_completed() || task.is_deleted() {
        return Ok(false);
    }
    task.completed = Some(now);
    db.save_task(&mut task, now, SaveMode::Notify)?;
    Ok(true)
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
