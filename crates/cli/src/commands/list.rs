// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! List commands. Creating, renaming and removing a list goes to the
//! remote first; the local table follows only when the remote agrees.

use std::fmt::Write as _;

use chrono::Utc;
use tm_core::{MirrorStore, TaskList};

use super::sync::open_remote;
use super::{resolve_list, Project};
use crate::error::Result;
use crate::sync::{drop_local_list, RemoteClient, RemoteError};

/// `tm lists`
pub fn show_all() -> Result<()> {
    let project = Project::open()?;
    print!("{}", show_all_impl(&project)?);
    Ok(())
}

pub fn add(title: &str) -> Result<()> {
    let mut project = Project::open()?;
    let list = add_impl(&mut project, title)?;
    println!("Created list {} ({})", list.title, list.id);
    Ok(())
}

pub fn rename(selector: &str, title: &str) -> Result<()> {
    let mut project = Project::open()?;
    let list = rename_impl(&mut project, selector, title)?;
    println!("Renamed list {} to {}", list.id, list.title);
    Ok(())
}

pub fn remove(selector: &str) -> Result<()> {
    let mut project = Project::open()?;
    let list = remove_impl(&mut project, selector)?;
    println!("Removed list {} ({})", list.title, list.id);
    Ok(())
}

pub fn select(selector: &str) -> Result<()> {
    let mut project = Project::open()?;
    let list = select_impl(&mut project, selector)?;
    println!("Default list: {} ({})", list.title, list.id);
    Ok(())
}

pub(crate) fn show_all_impl(project: &Project) -> Result<String> {
    let mut out = String::new();
    let default = project.config.default_list.as_deref();
    for list in project.db.lists()? {
        let marker = if Some(list.id.as_str()) == default { "*" } else { " " };
        let count = project.db.active_records(&list.id)?.len();
        let _ = write!(out, "{} {}  {} ({} task(s))", marker, list.id, list.title, count);
        if list.last_sync.is_none() {
            out.push_str("  never synced");
        }
        out.push('\n');
    }
    if out.is_empty() {
        out.push_str("No lists. Run 'tm sync' or 'tm list add <title>'.\n");
    }
    Ok(out)
}

/// Creates the list remotely and records it locally; the first list
/// created becomes the default.
pub(crate) fn add_impl(project: &mut Project, title: &str) -> Result<TaskList> {
    let mut remote = open_remote(project)?;
    let created = remote.create_list(title.trim())?;

    let mut list = TaskList::new(created.id, created.title);
    list.remote_updated = Some(created.updated);
    project.db.save_list(&list)?;

    if project.config.default_list.is_none() {
        project.config.default_list = Some(list.id.clone());
        project.config.save(&project.work_dir)?;
    }
    Ok(list)
}

pub(crate) fn rename_impl(project: &mut Project, selector: &str, title: &str) -> Result<TaskList> {
    let mut list = resolve_list(&project.db, &project.config, Some(selector))?;
    let mut remote = open_remote(project)?;
    let renamed = remote.rename_list(&list.id, title.trim())?;

    list.title = renamed.title;
    list.remote_updated = Some(renamed.updated);
    project.db.save_list(&list)?;
    Ok(list)
}

/// Deletes the list remotely, then drops it and its tasks locally.
pub(crate) fn remove_impl(project: &mut Project, selector: &str) -> Result<TaskList> {
    let list = resolve_list(&project.db, &project.config, Some(selector))?;
    let mut remote = open_remote(project)?;
    match remote.delete_list(&list.id) {
        Ok(()) | Err(RemoteError::NotFound(_)) => {}
        Err(e) => return Err(e.into()),
    }

    drop_local_list(&mut project.db, &list.id, Utc::now())?;
    if project.config.default_list.as_deref() == Some(list.id.as_str()) {
        project.config.default_list = None;
        project.config.save(&project.work_dir)?;
    }
    Ok(list)
}

pub(crate) fn select_impl(project: &mut Project, selector: &str) -> Result<TaskList> {
    let list = resolve_list(&project.db, &project.config, Some(selector))?;
    project.config.default_list = Some(list.id.clone());
    project.config.save(&project.work_dir)?;
    Ok(list)
}

#[cfg(test)]
#[path = "list_tests.rs"]
mod tests;
