// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `tm sync`: one sync session against the configured remote.

use std::fs::{File, OpenOptions};
use std::path::Path;

use fs2::FileExt;
use tm_core::SystemClock;

use super::Project;
use crate::config::get_sync_lock_path;
use crate::error::{Error, Result};
use crate::sync::{FileRemote, SyncObserver, SyncOutcome, SyncSession};

pub fn run(quiet: bool) -> Result<()> {
    let mut project = Project::open()?;
    let outcome = run_session(&mut project, &mut Reporter::new(quiet))?;
    if outcome.success {
        Ok(())
    } else {
        Err(Error::SyncFailed(first_error(&outcome)))
    }
}

/// Prints the session summary.
pub struct Reporter {
    quiet: bool,
}

impl Reporter {
    pub fn new(quiet: bool) -> Self {
        Reporter { quiet }
    }

    /// Only failures are printed.
    pub fn quiet() -> Self {
        Reporter::new(true)
    }
}

impl SyncObserver for Reporter {
    fn finished(&mut self, outcome: &SyncOutcome) {
        if !self.quiet {
            for report in &outcome.reports {
                println!(
                    "{}: {} created, {} adopted, {} updated, {} deleted, {} pulled",
                    report.list_id,
                    report.created,
                    report.adopted,
                    report.updated,
                    report.deleted,
                    report.pulled
                );
            }
        }
        for error in &outcome.errors {
            eprintln!("warning: {}", error);
        }
        if !self.quiet && outcome.success {
            println!("Synced {} list(s)", outcome.lists_processed);
        }
    }
}

/// Opens the configured remote.
pub(crate) fn open_remote(project: &Project) -> Result<FileRemote> {
    let dir = project.config.remote_dir(&project.work_dir).ok_or(Error::RemoteNotConfigured)?;
    let token = project.config.remote.as_ref().and_then(|r| r.token.clone());
    Ok(FileRemote::open(&dir, token)?.with_page_size(project.config.sync.page_size))
}

/// Runs one session while holding the replica's sync lock.
pub(crate) fn run_session(project: &mut Project, observer: &mut dyn SyncObserver) -> Result<SyncOutcome> {
    let _lock = acquire_lock(&get_sync_lock_path(&project.work_dir))?;
    let mut remote = open_remote(project)?;
    let settings = project.config.sync.settings();
    let outcome = SyncSession::new(&mut project.db, &mut remote, &SystemClock, settings).run(observer)?;
    Ok(outcome)
}

/// First error of a failed session, for the exit message.
pub(crate) fn first_error(outcome: &SyncOutcome) -> String {
    outcome.errors.first().cloned().unwrap_or_else(|| "unknown error".to_string())
}

fn acquire_lock(lock_path: &Path) -> Result<File> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(lock_path)?;
    file.try_lock_exclusive().map_err(|_| Error::SyncInProgress)?;
    Ok(file)
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
