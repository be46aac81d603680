// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt::Write as _;

use tm_core::{MirrorStore, Task, TaskStore};

use super::{resolve_list, Project};
use crate::error::Result;

pub fn run(list: Option<String>, open: bool) -> Result<()> {
    let project = Project::open()?;
    print!("{}", run_impl(&project, list.as_deref(), open)?);
    Ok(())
}

/// Renders the list as an indented tree, one task per line.
pub(crate) fn run_impl(project: &Project, list: Option<&str>, open: bool) -> Result<String> {
    let list = resolve_list(&project.db, &project.config, list)?;
    let mut out = format!("{} ({})\n", list.title, list.id);

    // Hiding a completed task hides its subtree too.
    let mut hidden_below: Option<u32> = None;
    for record in project.db.active_records(&list.id)? {
        if let Some(depth) = hidden_below {
            if record.indent > depth {
                continue;
            }
            hidden_below = None;
        }
        let task = project.db.get_task(record.task_id)?;
        if open && task.is_completed() {
            hidden_below = Some(record.indent);
            continue;
        }
        let _ = writeln!(out, "{}", format_row(&task, record.task_id, record.indent));
    }
    Ok(out)
}

fn format_row(task: &Task, id: i64, indent: u32) -> String {
    let mark = if task.is_completed() { "x" } else { " " };
    let pad = "  ".repeat(indent as usize);
    let mut row = format!("{:>4}  {}[{}] {}", id, pad, mark, task.title);
    if let Some(due) = task.due {
        let _ = write!(row, "  (due {})", due);
    }
    row
}

#[cfg(test)]
#[path = "show_tests.rs"]
mod tests;
