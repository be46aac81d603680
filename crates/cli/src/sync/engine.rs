// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Per-list reconciliation between the local replica and the remote.
//!
//! A pass over one list fetches the remote changed set once, then runs four
//! phases in order:
//!
//! 1. push created: records with no remote id are adopted by title or created
//! 2. push updated: deleted, moved and modified records are sent
//! 3. pull: the changed set is applied locally, without change notification
//! 4. normalize: order and indent are rebuilt from parents and positions
//!
//! Per-task remote failures are recorded and the phase continues. A failed
//! push keeps the record's `last_sync`, so the task is retried next pass,
//! and its remote entry is not pulled over the unpushed local edit.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use tm_core::merge::{changed_fields, merge_due, truncated_value, FieldLimits};
use tm_core::{
    updater, ClockSource, MirrorRecord, SaveMode, Store, Task, TaskId, TaskList,
    DEFAULT_FUDGE_MS,
};
use tracing::{debug, info, warn};

use super::remote::{NewRemoteTask, RemoteClient, RemoteError, RemoteTask, TaskPatch, TaskQuery};
use super::session::CancelToken;

/// Error type for a sync pass.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Credentials were refused. Ends the session.
    #[error("unauthorized: {0}\n  hint: check the remote token in .taskmirror/config.toml")]
    Unauthorized(String),

    /// Local storage failed. Ends the current list.
    #[error("store error: {0}")]
    Store(#[from] tm_core::Error),

    /// A remote call failed.
    #[error("remote error: {0}")]
    Remote(RemoteError),

    #[error("sync cancelled")]
    Cancelled,
}

impl From<RemoteError> for SyncError {
    fn from(e: RemoteError) -> Self {
        match e {
            RemoteError::Unauthorized(msg) => SyncError::Unauthorized(msg),
            other => SyncError::Remote(other),
        }
    }
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Tunables for a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    /// Added to `last_sync` stamps so a task saved during the pass does not
    /// look locally modified afterwards.
    pub fudge: Duration,
    pub limits: FieldLimits,
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings { fudge: Duration::milliseconds(DEFAULT_FUDGE_MS), limits: FieldLimits::default() }
    }
}

/// What one pass over a list did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListReport {
    pub list_id: String,
    pub created: usize,
    pub adopted: usize,
    pub updated: usize,
    pub deleted: usize,
    pub pulled: usize,
    pub failures: Vec<String>,
}

impl ListReport {
    fn fail(&mut self, what: String, error: &RemoteError) {
        warn!(list = %self.list_id, "{}: {}", what, error);
        self.failures.push(format!("{}: {}", what, error));
    }
}

/// Returns true if the list holds local work the remote has not seen.
pub fn has_pending_work<S: Store + ?Sized>(store: &S, list_id: &str) -> tm_core::Result<bool> {
    for record in store.list_records(list_id)? {
        let task = store.get_task(record.task_id)?;
        if record.remote_id.is_none() && (task.is_deleted() || task.title.is_empty()) {
            if record.deleted.is_some() {
                return Ok(true);
            }
            continue;
        }
        if record.needs_push(&task) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// The remote changed set of one pass, keyed by remote id in fetch order.
#[derive(Debug, Default)]
struct ChangedSet {
    order: Vec<String>,
    entries: HashMap<String, RemoteTask>,
    newest: Option<DateTime<Utc>>,
}

impl ChangedSet {
    fn new(tasks: Vec<RemoteTask>) -> Self {
        let mut set = ChangedSet::default();
        for task in tasks {
            set.newest = set.newest.max(Some(task.updated));
            if set.entries.insert(task.id.clone(), task.clone()).is_none() {
                set.order.push(task.id);
            }
        }
        set
    }

    fn get(&self, id: &str) -> Option<&RemoteTask> {
        self.entries.get(id)
    }

    /// Swaps in the result of a push, if the task was fetched.
    fn replace(&mut self, task: RemoteTask) {
        if let Some(entry) = self.entries.get_mut(&task.id) {
            *entry = task;
        }
    }

    fn mark_deleted(&mut self, id: &str) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.deleted = true;
        }
    }

    fn remove(&mut self, id: &str) {
        self.entries.remove(id);
    }

    /// Entries with deleted first, then completed, each group in fetch order.
    fn into_sorted(mut self) -> Vec<RemoteTask> {
        let mut tasks: Vec<RemoteTask> =
            self.order.iter().filter_map(|id| self.entries.remove(id)).collect();
        tasks.sort_by_key(|t| (!t.deleted, t.completed.is_none()));
        tasks
    }
}

/// Runs passes over single lists.
pub struct Reconciler<'a, S: ?Sized, R: ?Sized, C: ?Sized> {
    store: &'a mut S,
    remote: &'a mut R,
    clock: &'a C,
    settings: SyncSettings,
    cancel: CancelToken,
}

impl<'a, S, R, C> Reconciler<'a, S, R, C>
where
    S: Store + ?Sized,
    R: RemoteClient + ?Sized,
    C: ClockSource + ?Sized,
{
    pub fn new(
        store: &'a mut S,
        remote: &'a mut R,
        clock: &'a C,
        settings: SyncSettings,
        cancel: CancelToken,
    ) -> Self {
        Reconciler { store, remote, clock, settings, cancel }
    }

    /// Synchronizes one list through all four phases.
    pub fn sync_list(&mut self, list_id: &str) -> SyncResult<ListReport> {
        let list = self
            .store
            .find_list(list_id)?
            .ok_or_else(|| tm_core::Error::ListNotFound(list_id.to_string()))?;
        let mut report = ListReport { list_id: list.id.clone(), ..ListReport::default() };

        let mut changed = ChangedSet::new(self.fetch(&list)?);
        let fetched_newest = changed.newest;
        debug!(list = %list.id, fetched = changed.order.len(), "fetched remote changes");

        let mut failed: HashSet<String> = HashSet::new();
        self.push_created(&list, &mut changed, &mut failed, &mut report)?;
        self.push_updated(&list, &mut changed, &mut failed, &mut report)?;
        let skipped = self.pull(&list, changed, &failed, &mut report)?;
        updater::normalize_list(&mut *self.store, &list.id)?;

        let mut watermark = [list.last_sync, fetched_newest, list.remote_updated]
            .into_iter()
            .flatten()
            .max();
        if let Some(oldest_skipped) = skipped {
            let cap = oldest_skipped - Duration::milliseconds(1);
            watermark = watermark.map(|mark| mark.min(cap)).max(list.last_sync);
        }
        let mut list = list;
        list.last_sync = watermark;
        self.store.save_list(&list)?;

        info!(
            list = %list.id,
            created = report.created,
            adopted = report.adopted,
            updated = report.updated,
            deleted = report.deleted,
            pulled = report.pulled,
            failed = report.failures.len(),
            "list synced"
        );
        Ok(report)
    }

    fn check_cancelled(&self) -> SyncResult<()> {
        if self.cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }
        Ok(())
    }

    fn stamp(&self) -> DateTime<Utc> {
        self.clock.now() + self.settings.fudge
    }

    fn fetch(&mut self, list: &TaskList) -> SyncResult<Vec<RemoteTask>> {
        let incremental = list.last_sync.is_some();
        let query = TaskQuery {
            include_deleted: incremental,
            include_hidden: incremental,
            changed_since: list.last_sync,
        };
        let mut tasks = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let page = self.remote.list_tasks(&list.id, &query, token.as_deref())?;
            tasks.extend(page.items);
            match page.next_page_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }
        Ok(tasks)
    }

    /// Runs one task-level step, turning remote failures into report
    /// entries. Authorization and store failures still propagate.
    fn absorb(
        report: &mut ListReport,
        what: impl FnOnce() -> String,
        result: SyncResult<()>,
    ) -> SyncResult<bool> {
        match result {
            Ok(()) => Ok(true),
            Err(SyncError::Remote(e)) => {
                report.fail(what(), &e);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn remote_id_of(&self, task_id: Option<TaskId>) -> SyncResult<Option<String>> {
        let Some(task_id) = task_id else {
            return Ok(None);
        };
        Ok(self.store.record_for_task(task_id)?.and_then(|r| r.remote_id))
    }

    /// Remote id of the nearest earlier sibling that has one.
    fn previous_remote_sibling(&self, record: &MirrorRecord) -> SyncResult<Option<String>> {
        let siblings = self.store.active_records(&record.list_id)?;
        Ok(siblings
            .iter()
            .filter(|r| r.parent == record.parent && r.order < record.order)
            .filter_map(|r| r.remote_id.clone())
            .next_back())
    }

    fn push_created(
        &mut self,
        list: &TaskList,
        changed: &mut ChangedSet,
        failed: &mut HashSet<String>,
        report: &mut ListReport,
    ) -> SyncResult<()> {
        let records: Vec<MirrorRecord> = self
            .store
            .list_records(&list.id)?
            .into_iter()
            .filter(|r| r.remote_id.is_none())
            .collect();
        if records.is_empty() {
            return Ok(());
        }

        let mut unmapped: HashMap<String, String> = HashMap::new();
        for id in &changed.order {
            let Some(entry) = changed.get(id) else { continue };
            if entry.deleted || entry.hidden {
                continue;
            }
            if self.store.record_by_remote_id(&entry.id)?.is_none() {
                unmapped.insert(entry.title.clone(), entry.id.clone());
            }
        }

        for mut record in records {
            self.check_cancelled()?;
            let task = self.store.get_task(record.task_id)?;

            if record.deleted.is_some() {
                debug!(task = record.task_id, "dropping unpushed deleted record");
                self.store.delete_record(record.task_id)?;
                continue;
            }
            if task.is_deleted() || task.title.is_empty() {
                debug!(task = record.task_id, "not pushing untitled or deleted task");
                continue;
            }

            if let Some(remote_id) = unmapped.remove(&task.title) {
                let result = self.adopt(&mut record, &task, &remote_id, changed);
                let label = || format!("adopt task {}", record.task_id);
                if Self::absorb(report, label, result)? {
                    report.adopted += 1;
                } else {
                    failed.insert(remote_id);
                }
                self.store.save_record(&record)?;
                continue;
            }

            let result = self.create(&mut record, &task);
            let label = || format!("create task {}", record.task_id);
            if Self::absorb(report, label, result)? {
                report.created += 1;
            }
            self.store.save_record(&record)?;
        }
        Ok(())
    }

    /// Takes over an existing remote task whose title matches.
    fn adopt(
        &mut self,
        record: &mut MirrorRecord,
        task: &Task,
        remote_id: &str,
        changed: &mut ChangedSet,
    ) -> SyncResult<()> {
        record.remote_id = Some(remote_id.to_string());
        let Some(entry) = changed.get(remote_id).cloned() else {
            return Ok(());
        };
        debug!(task = record.task_id, remote = remote_id, "adopting remote task by title");

        let changes = changed_fields(task, Some(&entry.snapshot()), &self.settings.limits);
        let merged = if changes.any() {
            let patch = TaskPatch::from_task(remote_id, task, &changes, &self.settings.limits);
            self.remote.update_task(&record.list_id, &patch)?
        } else {
            entry
        };

        record.remote_parent = merged.parent.clone();
        record.remote_position = Some(merged.position.clone());
        record.snapshot = Some(merged.snapshot());
        record.last_sync = Some(self.stamp());
        changed.replace(merged);
        Ok(())
    }

    fn create(&mut self, record: &mut MirrorRecord, task: &Task) -> SyncResult<()> {
        let fields = NewRemoteTask::from_task(task, &self.settings.limits);
        let parent = self.remote_id_of(record.parent)?;
        let placed = record.parent.is_none() || parent.is_some();
        let previous = if placed { self.previous_remote_sibling(record)? } else { None };

        let created = match self.remote.create_task(
            &record.list_id,
            &fields,
            parent.as_deref(),
            previous.as_deref(),
        ) {
            Ok(created) => created,
            Err(RemoteError::NotFound(msg)) => {
                debug!(task = record.task_id, "placement not found ({}), creating unplaced", msg);
                let created = self.remote.create_task(&record.list_id, &fields, None, None)?;
                record.moved = true;
                record.remote_id = Some(created.id.clone());
                record.remote_parent = created.parent.clone();
                record.remote_position = Some(created.position.clone());
                record.snapshot = Some(created.snapshot());
                record.last_sync = Some(self.stamp());
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        debug!(task = record.task_id, remote = %created.id, "created remote task");
        record.remote_id = Some(created.id.clone());
        record.remote_parent = created.parent.clone();
        record.remote_position = Some(created.position.clone());
        record.snapshot = Some(created.snapshot());
        record.last_sync = Some(self.stamp());
        record.moved = !placed;
        Ok(())
    }

    fn push_updated(
        &mut self,
        list: &TaskList,
        changed: &mut ChangedSet,
        failed: &mut HashSet<String>,
        report: &mut ListReport,
    ) -> SyncResult<()> {
        let records = self.store.list_records(&list.id)?;
        for record in records {
            let Some(remote_id) = record.remote_id.clone() else {
                continue;
            };
            let task = self.store.get_task(record.task_id)?;
            if !record.needs_push(&task) {
                continue;
            }
            self.check_cancelled()?;

            if record.deleted.is_some() {
                let result = self.push_delete(&record, &remote_id, changed);
                let label = || format!("delete task {}", record.task_id);
                if Self::absorb(report, label, result)? {
                    report.deleted += 1;
                } else {
                    failed.insert(remote_id);
                }
                continue;
            }

            let mut record = record;
            let result = self.push_update(&mut record, &task, &remote_id, changed);
            let label = || format!("update task {}", record.task_id);
            if Self::absorb(report, label, result)? {
                report.updated += 1;
            } else {
                failed.insert(remote_id);
            }
        }
        Ok(())
    }

    fn push_delete(
        &mut self,
        record: &MirrorRecord,
        remote_id: &str,
        changed: &mut ChangedSet,
    ) -> SyncResult<()> {
        match self.remote.delete_task(&record.list_id, remote_id) {
            Ok(()) | Err(RemoteError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
        debug!(task = record.task_id, remote = remote_id, "deleted remote task");
        self.store.delete_record(record.task_id)?;
        changed.mark_deleted(remote_id);
        Ok(())
    }

    fn push_update(
        &mut self,
        record: &mut MirrorRecord,
        task: &Task,
        remote_id: &str,
        changed: &mut ChangedSet,
    ) -> SyncResult<()> {
        if record.moved {
            let parent = self.remote_id_of(record.parent)?;
            let previous = self.previous_remote_sibling(record)?;
            let result = self.remote.move_task(
                &record.list_id,
                remote_id,
                parent.as_deref(),
                previous.as_deref(),
            );
            match result {
                Ok(moved) => {
                    record.remote_parent = moved.parent.clone();
                    record.remote_position = Some(moved.position.clone());
                    changed.replace(moved);
                }
                Err(e @ (RemoteError::Rejected(_) | RemoteError::NotFound(_))) => {
                    warn!(task = record.task_id, "move skipped: {}", e);
                }
                Err(e) => return Err(e.into()),
            }
            record.moved = false;
        }

        let base = record.snapshot.clone().or_else(|| changed.get(remote_id).map(|e| e.snapshot()));
        let changes = changed_fields(task, base.as_ref(), &self.settings.limits);
        if changes.any() {
            let patch = TaskPatch::from_task(remote_id, task, &changes, &self.settings.limits);
            match self.remote.update_task(&record.list_id, &patch) {
                Ok(updated) => {
                    record.snapshot = Some(updated.snapshot());
                    changed.replace(updated);
                }
                Err(RemoteError::NotFound(_)) => {
                    warn!(task = record.task_id, remote = remote_id, "remote task gone, dropping record");
                    self.store.delete_record(record.task_id)?;
                    changed.remove(remote_id);
                    return Ok(());
                }
                Err(e) => {
                    self.store.save_record(record)?;
                    return Err(e.into());
                }
            }
        } else if record.snapshot.is_none() {
            record.snapshot = base;
        }

        record.last_sync = Some(self.stamp());
        self.store.save_record(record)?;
        Ok(())
    }

    /// Applies the changed set. Returns the oldest `updated` among entries
    /// skipped because their push failed.
    fn pull(
        &mut self,
        list: &TaskList,
        changed: ChangedSet,
        failed: &HashSet<String>,
        report: &mut ListReport,
    ) -> SyncResult<Option<DateTime<Utc>>> {
        let mut skipped: Option<DateTime<Utc>> = None;
        let mut pulled: Vec<TaskId> = Vec::new();

        for entry in changed.into_sorted() {
            self.check_cancelled()?;
            if failed.contains(&entry.id) {
                debug!(remote = %entry.id, "not pulling over a failed push");
                skipped = Some(skipped.map_or(entry.updated, |s| s.min(entry.updated)));
                continue;
            }

            let record = self.store.record_by_remote_id(&entry.id)?;
            if entry.deleted || entry.hidden {
                if let Some(record) = record {
                    self.delete_locally(&record)?;
                    report.pulled += 1;
                }
                continue;
            }

            if let Some(task_id) = self.apply_entry(list, record, &entry)? {
                pulled.push(task_id);
                report.pulled += 1;
            }
        }

        for task_id in pulled {
            self.resolve_parent(task_id)?;
        }
        Ok(skipped)
    }

    fn delete_locally(&mut self, record: &MirrorRecord) -> SyncResult<()> {
        let mut task = self.store.get_task(record.task_id)?;
        if !task.is_deleted() {
            let now = self.clock.now();
            task.deleted = Some(now);
            self.store.save_task(&mut task, now, SaveMode::Suppress)?;
        }
        debug!(task = record.task_id, "remote deletion applied");
        self.store.delete_record(record.task_id)?;
        Ok(())
    }

    fn apply_entry(
        &mut self,
        list: &TaskList,
        record: Option<MirrorRecord>,
        entry: &RemoteTask,
    ) -> SyncResult<Option<TaskId>> {
        let now = self.clock.now();
        let limits = self.settings.limits;
        let (mut task, record) = match record {
            Some(record) => (self.store.get_task(record.task_id)?, Some(record)),
            None => {
                if entry.title.is_empty() && entry.notes.as_deref().map_or(true, str::is_empty) {
                    return Ok(None);
                }
                (Task::new(String::new(), now), None)
            }
        };
        let known = record.is_some();

        task.title = truncated_value(known.then_some(task.title.as_str()), &entry.title, limits.title);
        task.notes = entry
            .notes
            .as_deref()
            .filter(|n| !n.is_empty())
            .map(|n| truncated_value(task.notes.as_deref(), n, limits.notes));
        task.completed = entry.completed;
        task.due = merge_due(entry.due, task.due);
        let task_id = self.store.save_task(&mut task, now, SaveMode::Suppress)?;

        let mut record = match record {
            Some(record) => record,
            None => MirrorRecord::new(task_id, list.id.clone(), self.store.next_order(&list.id)?),
        };
        record.list_id = list.id.clone();
        record.remote_id = Some(entry.id.clone());
        record.remote_parent = entry.parent.clone();
        record.remote_position = Some(entry.position.clone());
        record.snapshot = Some(entry.snapshot());
        record.last_sync = Some(now + self.settings.fudge);
        record.moved = false;
        record.deleted = None;
        self.store.save_record(&record)?;
        debug!(task = task_id, remote = %entry.id, new = !known, "pulled remote task");
        Ok(Some(task_id))
    }

    /// Points the record's local parent at the task mirroring its remote
    /// parent. Runs after the whole set is applied so parents pulled later
    /// in the same pass are found.
    fn resolve_parent(&mut self, task_id: TaskId) -> SyncResult<()> {
        let Some(mut record) = self.store.record_for_task(task_id)? else {
            return Ok(());
        };
        let parent = match record.remote_parent.as_deref() {
            Some(remote_parent) => self
                .store
                .record_by_remote_id(remote_parent)?
                .filter(|p| p.list_id == record.list_id && p.is_active())
                .map(|p| p.task_id),
            None => None,
        };
        if parent != record.parent {
            record.parent = parent;
            self.store.save_record(&record)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
