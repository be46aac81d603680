// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

#![allow(clippy::unwrap_used)]

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tm_core::{
    updater, ClockSource, Database, ManualClock, MirrorStore, SaveMode, Task, TaskId, TaskList,
    TaskStore,
};

use super::engine::{ListReport, Reconciler, SyncResult, SyncSettings};
use super::memory::MemoryRemote;
use super::remote::{
    NewRemoteTask, Page, RemoteClient, RemoteError, RemoteList, RemoteResult, RemoteTask,
    TaskPatch, TaskQuery,
};
use super::session::CancelToken;

pub type TestRemote = MemoryRemote<Arc<ManualClock>>;

pub fn start() -> DateTime<Utc> {
    Utc.timestamp_opt(1_767_225_600, 0).unwrap()
}

/// Wraps a remote and injects failures.
pub struct FlakyRemote<R> {
    pub inner: R,
    /// Creates of tasks with these titles fail with an I/O error.
    pub fail_titles: HashSet<String>,
    /// Updates, moves and deletes of these remote ids fail with an I/O error.
    pub fail_ids: HashSet<String>,
    /// Every call addressing these lists is refused as unauthorized.
    pub unauthorized_lists: HashSet<String>,
    /// Fetching this list's tasks cancels the token.
    pub cancel_on_list: Option<(String, CancelToken)>,
}

impl<R: RemoteClient> FlakyRemote<R> {
    pub fn new(inner: R) -> Self {
        FlakyRemote {
            inner,
            fail_titles: HashSet::new(),
            fail_ids: HashSet::new(),
            unauthorized_lists: HashSet::new(),
            cancel_on_list: None,
        }
    }

    fn check_list(&self, list_id: &str) -> RemoteResult<()> {
        if self.unauthorized_lists.contains(list_id) {
            return Err(RemoteError::Unauthorized(format!("revoked for {}", list_id)));
        }
        Ok(())
    }

    fn check_id(&self, task_id: &str) -> RemoteResult<()> {
        if self.fail_ids.contains(task_id) {
            return Err(RemoteError::Io(format!("injected failure for {}", task_id)));
        }
        Ok(())
    }
}

impl<R: RemoteClient> RemoteClient for FlakyRemote<R> {
    fn list_lists(&mut self, page_token: Option<&str>) -> RemoteResult<Page<RemoteList>> {
        self.inner.list_lists(page_token)
    }

    fn list_tasks(
        &mut self,
        list_id: &str,
        query: &TaskQuery,
        page_token: Option<&str>,
    ) -> RemoteResult<Page<RemoteTask>> {
        self.check_list(list_id)?;
        if let Some((list, token)) = &self.cancel_on_list {
            if list == list_id {
                token.cancel();
            }
        }
        self.inner.list_tasks(list_id, query, page_token)
    }

    fn create_task(
        &mut self,
        list_id: &str,
        task: &NewRemoteTask,
        parent: Option<&str>,
        previous: Option<&str>,
    ) -> RemoteResult<RemoteTask> {
        self.check_list(list_id)?;
        if self.fail_titles.contains(&task.title) {
            return Err(RemoteError::Io(format!("injected failure for {}", task.title)));
        }
        self.inner.create_task(list_id, task, parent, previous)
    }

    fn update_task(&mut self, list_id: &str, patch: &TaskPatch) -> RemoteResult<RemoteTask> {
        self.check_list(list_id)?;
        self.check_id(&patch.id)?;
        self.inner.update_task(list_id, patch)
    }

    fn move_task(
        &mut self,
        list_id: &str,
        task_id: &str,
        parent: Option<&str>,
        previous: Option<&str>,
    ) -> RemoteResult<RemoteTask> {
        self.check_list(list_id)?;
        self.check_id(task_id)?;
        self.inner.move_task(list_id, task_id, parent, previous)
    }

    fn delete_task(&mut self, list_id: &str, task_id: &str) -> RemoteResult<()> {
        self.check_list(list_id)?;
        self.check_id(task_id)?;
        self.inner.delete_task(list_id, task_id)
    }

    fn create_list(&mut self, title: &str) -> RemoteResult<RemoteList> {
        self.inner.create_list(title)
    }

    fn rename_list(&mut self, list_id: &str, title: &str) -> RemoteResult<RemoteList> {
        self.check_list(list_id)?;
        self.inner.rename_list(list_id, title)
    }

    fn delete_list(&mut self, list_id: &str) -> RemoteResult<()> {
        self.check_list(list_id)?;
        self.inner.delete_list(list_id)
    }
}

/// One local replica, one remote and a manual clock.
pub struct Harness {
    pub db: Database,
    pub remote: FlakyRemote<TestRemote>,
    pub clock: Arc<ManualClock>,
    pub list: String,
    pub settings: SyncSettings,
}

impl Harness {
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::new(start()));
        let mut remote = MemoryRemote::new(clock.clone());
        let list = remote.create_list("Inbox").unwrap();
        let mut db = Database::open_in_memory().unwrap();
        db.save_list(&TaskList::new(list.id.clone(), list.title)).unwrap();
        Harness {
            db,
            remote: FlakyRemote::new(remote),
            clock,
            list: list.id,
            settings: SyncSettings::default(),
        }
    }

    /// Moves the clock past the sync fudge.
    pub fn tick(&self) {
        self.clock.advance(Duration::seconds(5));
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Adds a task at the end of the list, as a user would.
    pub fn add(&mut self, title: &str) -> TaskId {
        let now = self.now();
        let mut task = Task::new(title, now);
        let id = self.db.save_task(&mut task, now, SaveMode::Notify).unwrap();
        updater::append_task(&mut self.db, &self.list, id).unwrap();
        id
    }

    /// Edits a task as a user would.
    pub fn edit<F: FnOnce(&mut Task)>(&mut self, id: TaskId, edit: F) {
        let mut task = self.db.get_task(id).unwrap();
        edit(&mut task);
        let now = self.now();
        self.db.save_task(&mut task, now, SaveMode::Notify).unwrap();
    }

    pub fn remote_id(&self, id: TaskId) -> String {
        self.db.record_for_task(id).unwrap().unwrap().remote_id.unwrap()
    }

    /// Copies the remote list's updated stamp, like a session's list refresh.
    pub fn refresh(&mut self) {
        let lists = self.remote.list_lists(None).unwrap();
        for remote in lists.items {
            if let Some(mut list) = self.db.find_list(&remote.id).unwrap() {
                list.remote_updated = Some(remote.updated);
                self.db.save_list(&list).unwrap();
            }
        }
    }

    pub fn try_sync(&mut self) -> SyncResult<ListReport> {
        self.try_sync_with(CancelToken::new())
    }

    pub fn try_sync_with(&mut self, cancel: CancelToken) -> SyncResult<ListReport> {
        self.refresh();
        let list = self.list.clone();
        let mut reconciler =
            Reconciler::new(&mut self.db, &mut self.remote, &*self.clock, self.settings, cancel);
        reconciler.sync_list(&list)
    }

    pub fn sync(&mut self) -> ListReport {
        self.try_sync().unwrap()
    }

    /// Active local rows as (indent, title), in list order.
    pub fn local_tree(&self) -> Vec<(u32, String)> {
        self.db
            .active_records(&self.list)
            .unwrap()
            .into_iter()
            .map(|r| (r.indent, self.db.get_task(r.task_id).unwrap().title))
            .collect()
    }

    /// Live remote rows as (depth, title), in sibling order.
    pub fn remote_tree(&self) -> Vec<(u32, String)> {
        self.remote
            .inner
            .visible_tree(&self.list)
            .into_iter()
            .map(|(depth, t)| (depth, t.title))
            .collect()
    }
}

/// Builds (indent, title) rows from string literals.
pub fn rows(items: &[(u32, &str)]) -> Vec<(u32, String)> {
    items.iter().map(|(i, t)| (*i, t.to_string())).collect()
}
