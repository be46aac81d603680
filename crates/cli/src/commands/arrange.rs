// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Structural edits: indent, outdent and move.

use tm_core::{updater, MoveTarget, TaskId};

use super::{active_record, Project};
use crate::error::{Error, Result};

pub fn indent(id: TaskId, out: bool) -> Result<()> {
    let mut project = Project::open()?;
    indent_impl(&mut project, id, out)?;
    println!("{} task {}", if out { "Outdented" } else { "Indented" }, id);
    project.finish()
}

pub fn move_task(id: TaskId, target: MoveTarget) -> Result<()> {
    let mut project = Project::open()?;
    move_impl(&mut project, id, target)?;
    println!("Moved task {}", id);
    project.finish()
}

pub(crate) fn indent_impl(project: &mut Project, id: TaskId, out: bool) -> Result<()> {
    let record = active_record(&project.db, id)?;
    let delta = if out { -1 } else { 1 };
    if !updater::indent_task(&mut project.db, &record.list_id, id, delta)? {
        return Err(if out {
            Error::InvalidPlacement { action: "outdent", id, reason: "it is already at the top level" }
        } else {
            Error::InvalidPlacement { action: "indent", id, reason: "there is no task above it to nest under" }
        });
    }
    project.mark_changed();
    Ok(())
}

pub(crate) fn move_impl(project: &mut Project, id: TaskId, target: MoveTarget) -> Result<()> {
    let record = active_record(&project.db, id)?;
    if let MoveTarget::Before(other) = target {
        if active_record(&project.db, other)?.list_id != record.list_id {
            return Err(Error::InvalidPlacement { action: "move", id, reason: "the target is in another list" });
        }
    }
    if !updater::move_task(&mut project.db, &record.list_id, id, target)? {
        return Err(Error::InvalidPlacement {
            action: "move",
            id,
            reason: "a task cannot move before itself or into its own subtree",
        });
    }
    project.mark_changed();
    Ok(())
}

#[cfg(test)]
#[path = "arrange_tests.rs"]
mod tests;
