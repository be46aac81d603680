// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod add;
pub mod arrange;
pub mod edit;
pub mod init;
pub mod lifecycle;
pub mod list;
pub mod show;
pub mod status;
pub mod sync;
#[cfg(test)]
#[path = "mod_tests.rs"]
pub mod testing;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tm_core::{Database, MirrorRecord, MirrorStore, TaskId, TaskList, TaskStore};

use crate::config::{find_work_dir, get_db_path, Config};
use crate::error::{Error, Result};

/// An opened replica: its store, its configuration and where it lives.
pub struct Project {
    pub db: Database,
    pub config: Config,
    pub work_dir: PathBuf,
    changed: Arc<AtomicBool>,
}

impl Project {
    /// Opens the replica found by walking up from the current directory.
    pub fn open() -> Result<Self> {
        let work_dir = find_work_dir()?;
        let config = Config::load(&work_dir)?;
        let db = Database::open(&get_db_path(&work_dir))?;
        Ok(Project::new(db, config, work_dir))
    }

    /// Wraps an opened store, watching it for user edits.
    pub fn new(mut db: Database, config: Config, work_dir: PathBuf) -> Self {
        let changed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&changed);
        db.set_change_hook(Box::new(move |_| flag.store(true, Ordering::SeqCst)));
        Project { db, config, work_dir, changed }
    }

    /// Returns true if a task was saved as a user edit since opening.
    pub fn has_changes(&self) -> bool {
        self.changed.load(Ordering::SeqCst)
    }

    /// Records a structural edit, which saves no task.
    pub fn mark_changed(&self) {
        self.changed.store(true, Ordering::SeqCst);
    }

    /// Runs an automatic sync when `sync.auto` is set and a task changed.
    ///
    /// A failed automatic sync is reported but does not fail the command
    /// that triggered it.
    pub fn finish(mut self) -> Result<()> {
        if !self.config.sync.auto || !self.has_changes() || self.config.remote.is_none() {
            return Ok(());
        }
        match sync::run_session(&mut self, &mut sync::Reporter::quiet()) {
            Ok(outcome) if !outcome.success => {
                eprintln!("warning: automatic sync failed: {}", sync::first_error(&outcome));
            }
            Ok(_) => {}
            Err(e) => eprintln!("warning: automatic sync failed: {}", e),
        }
        Ok(())
    }
}

/// Resolves a list by id, then by exact title.
///
/// Without a selector the configured default list is used.
pub fn resolve_list(db: &Database, config: &Config, selector: Option<&str>) -> Result<TaskList> {
    let selector = selector
        .or(config.default_list.as_deref())
        .ok_or(Error::NoListSelected)?;

    if let Some(list) = db.find_list(selector)? {
        return Ok(list);
    }

    let mut matches: Vec<TaskList> =
        db.lists()?.into_iter().filter(|l| l.title == selector).collect();
    match matches.len() {
        0 => Err(Error::ListNotFound(selector.to_string())),
        1 => Ok(matches.remove(0)),
        _ => Err(Error::AmbiguousList {
            name: selector.to_string(),
            matches: matches.into_iter().map(|l| l.id).collect(),
        }),
    }
}

/// Returns the active mirror record of an existing task.
pub fn active_record(db: &Database, id: TaskId) -> Result<MirrorRecord> {
    db.get_task(id)?;
    db.record_for_task(id)?
        .filter(MirrorRecord::is_active)
        .ok_or(Error::NotInList(id))
}
