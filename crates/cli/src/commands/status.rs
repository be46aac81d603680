// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use tm_core::{MirrorStore, SyncState, SyncStatusStore};

use super::Project;
use crate::error::Result;
use crate::sync::has_pending_work;

/// Show remote sync status.
pub fn run() -> Result<()> {
    let project = Project::open()?;
    print!("{}", run_impl(&project)?);
    Ok(())
}

pub(crate) fn run_impl(project: &Project) -> Result<String> {
    let mut out = String::new();
    match project.config.remote_dir(&project.work_dir) {
        Some(dir) => {
            let _ = writeln!(out, "Remote: {}", dir.display());
        }
        None => {
            let _ = writeln!(out, "Remote: not configured");
        }
    }

    let status = project.db.sync_status()?;
    let state = match status.state() {
        SyncState::NeverRun => "never run".to_string(),
        SyncState::Success => "ok".to_string(),
        SyncState::Error => {
            format!("error: {}", status.last_error.as_deref().unwrap_or_default())
        }
    };
    let _ = writeln!(out, "Status: {}", state);
    let _ = writeln!(out, "Last attempt: {}", format_time(status.last_attempt));
    let _ = writeln!(out, "Last success: {}", format_time(status.last_success));

    let (lists, tasks, _) = project.db.counts()?;
    let _ = writeln!(out, "Lists: {}, tasks: {}", lists, tasks);

    let mut pending = Vec::new();
    for list in project.db.lists()? {
        if has_pending_work(&project.db, &list.id)? {
            pending.push(list.title);
        }
    }
    if pending.is_empty() {
        let _ = writeln!(out, "Pending: none");
    } else {
        let _ = writeln!(out, "Pending: {}", pending.join(", "));
    }
    Ok(out)
}

fn format_time(at: Option<DateTime<Utc>>) -> String {
    match at {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => "never".to_string(),
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
