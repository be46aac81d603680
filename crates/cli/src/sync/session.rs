// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync session: refreshes the list table, then runs the reconciler over
//! every list that needs it.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tm_core::{ClockSource, SaveMode, Store, TaskList};
use tracing::{error, info, warn};

use super::engine::{has_pending_work, ListReport, Reconciler, SyncError, SyncResult, SyncSettings};
use super::remote::{RemoteClient, RemoteList};

/// Cloneable cancellation flag, checked between lists and between tasks.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of a whole session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Every selected list completed all phases. Per-task failures are
    /// reported in `errors` but do not clear this.
    pub success: bool,
    pub lists_processed: usize,
    /// Session and list level errors, plus per-task failures.
    pub errors: Vec<String>,
    pub cancelled: bool,
    pub reports: Vec<ListReport>,
}

/// Notified when a session starts and ends.
pub trait SyncObserver {
    fn started(&mut self) {}
    fn finished(&mut self, _outcome: &SyncOutcome) {}
}

/// Observer that ignores every event.
pub struct NoopObserver;

impl SyncObserver for NoopObserver {}

/// Runs sync sessions against one store and one remote.
pub struct SyncSession<'a, S: ?Sized, R: ?Sized, C: ?Sized> {
    store: &'a mut S,
    remote: &'a mut R,
    clock: &'a C,
    settings: SyncSettings,
    cancel: CancelToken,
}

impl<'a, S, R, C> SyncSession<'a, S, R, C>
where
    S: Store + ?Sized,
    R: RemoteClient + ?Sized,
    C: ClockSource + ?Sized,
{
    pub fn new(store: &'a mut S, remote: &'a mut R, clock: &'a C, settings: SyncSettings) -> Self {
        SyncSession { store, remote, clock, settings, cancel: CancelToken::new() }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Runs one session. Work finished before an error is kept.
    pub fn run(&mut self, observer: &mut dyn SyncObserver) -> SyncResult<SyncOutcome> {
        observer.started();
        self.store.record_sync_start(self.clock.now())?;

        let mut outcome = SyncOutcome::default();
        let aborted = match self.run_lists(&mut outcome) {
            Ok(()) => false,
            Err(SyncError::Cancelled) => {
                outcome.cancelled = true;
                outcome.errors.push("sync cancelled".to_string());
                true
            }
            Err(e @ SyncError::Store(_)) => {
                error!("sync aborted: {}", e);
                outcome.errors.push(e.to_string());
                if let Err(status_err) = self.store.set_sync_error(Some(&e.to_string())) {
                    warn!("could not record sync error: {}", status_err);
                }
                observer.finished(&outcome);
                return Err(e);
            }
            Err(e) => {
                error!("sync aborted: {}", e);
                outcome.errors.push(e.to_string());
                true
            }
        };

        outcome.success = !aborted && outcome.errors.is_empty();
        for report in &outcome.reports {
            outcome.errors.extend(report.failures.iter().cloned());
        }

        if outcome.success {
            self.store.record_sync_success(self.clock.now())?;
            self.store.set_sync_error(None)?;
        } else {
            let summary = outcome.errors.first().cloned().unwrap_or_else(|| "sync failed".to_string());
            self.store.set_sync_error(Some(&summary))?;
        }
        info!(
            success = outcome.success,
            lists = outcome.lists_processed,
            errors = outcome.errors.len(),
            "sync session finished"
        );
        observer.finished(&outcome);
        Ok(outcome)
    }

    fn run_lists(&mut self, outcome: &mut SyncOutcome) -> SyncResult<()> {
        self.refresh_lists()?;

        let mut selected = Vec::new();
        for list in self.store.lists()? {
            if list.remote_is_newer() || has_pending_work(&*self.store, &list.id)? {
                selected.push(list.id);
            }
        }

        for list_id in selected {
            if self.cancel.is_cancelled() {
                return Err(SyncError::Cancelled);
            }
            let mut reconciler = Reconciler::new(
                &mut *self.store,
                &mut *self.remote,
                self.clock,
                self.settings,
                self.cancel.clone(),
            );
            match reconciler.sync_list(&list_id) {
                Ok(report) => {
                    outcome.lists_processed += 1;
                    outcome.reports.push(report);
                }
                Err(e @ (SyncError::Store(_) | SyncError::Remote(_))) => {
                    warn!(list = %list_id, "list aborted: {}", e);
                    outcome.errors.push(format!("list {}: {}", list_id, e));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Mirrors the remote list table locally.
    ///
    /// Lists that vanished remotely are purged and their tasks deleted.
    fn refresh_lists(&mut self) -> SyncResult<()> {
        let mut remote_lists: Vec<RemoteList> = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let page = self.remote.list_lists(token.as_deref())?;
            remote_lists.extend(page.items);
            match page.next_page_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        let seen: HashSet<&str> = remote_lists.iter().map(|l| l.id.as_str()).collect();
        for local in self.store.lists()? {
            if seen.contains(local.id.as_str()) {
                continue;
            }
            info!(list = %local.id, "list removed remotely");
            drop_local_list(&mut *self.store, &local.id, self.clock.now())?;
        }

        for remote in remote_lists {
            let mut list = self
                .store
                .find_list(&remote.id)?
                .unwrap_or_else(|| TaskList::new(remote.id.clone(), remote.title.clone()));
            list.title = remote.title;
            list.remote_updated = Some(remote.updated);
            self.store.save_list(&list)?;
        }
        Ok(())
    }
}

/// Forgets a list that no longer exists remotely.
///
/// Its tasks are marked deleted without notifying the change hook, and the
/// list and all of its records are removed.
pub fn drop_local_list<S: Store + ?Sized>(
    store: &mut S,
    list_id: &str,
    now: DateTime<Utc>,
) -> tm_core::Result<()> {
    for record in store.list_records(list_id)? {
        let mut task = store.get_task(record.task_id)?;
        if !task.is_deleted() {
            task.deleted = Some(now);
            store.save_task(&mut task, now, SaveMode::Suppress)?;
        }
    }
    store.purge_list(list_id)
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
