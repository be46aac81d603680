// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! In-process remote task service.
//!
//! Models the behavior sync depends on: strictly increasing `updated`
//! stamps, sparse sortable sibling positions, soft deletion, hidden
//! (cleared) completed tasks and paginated listings filtered by update
//! time. [`super::FileRemote`] persists the same state to disk.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tm_core::ClockSource;

use super::remote::{
    NewRemoteTask, Page, RemoteClient, RemoteError, RemoteList, RemoteResult, RemoteTask,
    TaskPatch, TaskQuery,
};

/// Default number of items per listing page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Gap between freshly assigned sibling positions.
const POSITION_SPACING: u64 = 1 << 32;

/// A list and its tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredList {
    pub id: String,
    pub title: String,
    pub updated: DateTime<Utc>,
    #[serde(default)]
    pub tasks: Vec<RemoteTask>,
}

/// Complete remote state, serializable for [`super::FileRemote`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteState {
    #[serde(default)]
    pub lists: Vec<StoredList>,
    #[serde(default)]
    pub next_id: u64,
    /// Token callers must present, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_stamp: Option<DateTime<Utc>>,
}

/// Remote task service held in memory.
pub struct MemoryRemote<C: ClockSource> {
    state: RemoteState,
    clock: C,
    page_size: usize,
    presented_token: Option<String>,
}

impl<C: ClockSource> MemoryRemote<C> {
    pub fn new(clock: C) -> Self {
        Self::from_state(RemoteState::default(), clock)
    }

    pub fn from_state(state: RemoteState, clock: C) -> Self {
        MemoryRemote { state, clock, page_size: DEFAULT_PAGE_SIZE, presented_token: None }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Token this caller presents on every request.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.presented_token = token;
        self
    }

    /// Requires callers to present `token`.
    pub fn require_token(&mut self, token: Option<String>) {
        self.state.token = token;
    }

    pub fn state(&self) -> &RemoteState {
        &self.state
    }

    pub fn into_state(self) -> RemoteState {
        self.state
    }

    /// Every task of the list, deleted and hidden ones included.
    pub fn tasks(&self, list_id: &str) -> Vec<RemoteTask> {
        self.state
            .lists
            .iter()
            .find(|l| l.id == list_id)
            .map(|l| l.tasks.clone())
            .unwrap_or_default()
    }

    /// Live tasks of the list in sibling order, depth first.
    pub fn visible_tree(&self, list_id: &str) -> Vec<(u32, RemoteTask)> {
        let tasks: Vec<RemoteTask> = self
            .tasks(list_id)
            .into_iter()
            .filter(|t| !t.deleted && !t.hidden)
            .collect();
        let mut out = Vec::new();
        collect_tree(&tasks, None, 0, &mut out);
        out
    }

    /// Applies an edit made by another client of the service.
    pub fn edit_task<F>(&mut self, list_id: &str, task_id: &str, edit: F) -> RemoteResult<RemoteTask>
    where
        F: FnOnce(&mut RemoteTask),
    {
        let stamp = self.stamp();
        let list = self.list_mut(list_id)?;
        let task = find_task_mut(list, task_id)?;
        edit(&mut *task);
        task.updated = stamp;
        let updated = task.clone();
        list.updated = stamp;
        Ok(updated)
    }

    /// Hides every completed task, like a "clear completed" action.
    pub fn clear_completed(&mut self, list_id: &str) -> RemoteResult<usize> {
        let stamp = self.stamp();
        let list = self.list_mut(list_id)?;
        let mut cleared = 0;
        for task in list.tasks.iter_mut().filter(|t| t.completed.is_some() && !t.hidden) {
            task.hidden = true;
            task.updated = stamp;
            cleared += 1;
        }
        if cleared > 0 {
            list.updated = stamp;
        }
        Ok(cleared)
    }

    /// Removes a task without leaving a deleted tombstone.
    pub fn purge_task(&mut self, list_id: &str, task_id: &str) -> RemoteResult<()> {
        let list = self.list_mut(list_id)?;
        let before = list.tasks.len();
        list.tasks.retain(|t| t.id != task_id);
        if list.tasks.len() == before {
            return Err(RemoteError::NotFound(format!("task {}", task_id)));
        }
        Ok(())
    }

    fn authorize(&self) -> RemoteResult<()> {
        match &self.state.token {
            Some(expected) if self.presented_token.as_ref() != Some(expected) => {
                Err(RemoteError::Unauthorized("token rejected".to_string()))
            }
            _ => Ok(()),
        }
    }

    /// Next update stamp, strictly after every earlier one.
    fn stamp(&mut self) -> DateTime<Utc> {
        let now = self.clock.now();
        let stamp = match self.state.last_stamp {
            Some(last) if now <= last => last + Duration::milliseconds(1),
            _ => now,
        };
        self.state.last_stamp = Some(stamp);
        stamp
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.state.next_id += 1;
        format!("{}{}", prefix, self.state.next_id)
    }

    fn list_mut(&mut self, list_id: &str) -> RemoteResult<&mut StoredList> {
        self.state
            .lists
            .iter_mut()
            .find(|l| l.id == list_id)
            .ok_or_else(|| RemoteError::NotFound(format!("list {}", list_id)))
    }

    fn list_ref(&self, list_id: &str) -> RemoteResult<&StoredList> {
        self.state
            .lists
            .iter()
            .find(|l| l.id == list_id)
            .ok_or_else(|| RemoteError::NotFound(format!("list {}", list_id)))
    }

    fn paginate<T: Clone>(&self, items: Vec<T>, page_token: Option<&str>) -> RemoteResult<Page<T>> {
        let offset = match page_token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| RemoteError::Rejected(format!("bad page token: {}", token)))?,
            None => 0,
        };
        let end = (offset + self.page_size).min(items.len());
        let page = items.get(offset..end).map(<[T]>::to_vec).unwrap_or_default();
        let next_page_token = (end < items.len()).then(|| end.to_string());
        Ok(Page { items: page, next_page_token })
    }
}

impl<C: ClockSource> RemoteClient for MemoryRemote<C> {
    fn list_lists(&mut self, page_token: Option<&str>) -> RemoteResult<Page<RemoteList>> {
        self.authorize()?;
        let lists = self
            .state
            .lists
            .iter()
            .map(|l| RemoteList { id: l.id.clone(), title: l.title.clone(), updated: l.updated })
            .collect();
        self.paginate(lists, page_token)
    }

    fn list_tasks(
        &mut self,
        list_id: &str,
        query: &TaskQuery,
        page_token: Option<&str>,
    ) -> RemoteResult<Page<RemoteTask>> {
        self.authorize()?;
        let tasks = self
            .list_ref(list_id)?
            .tasks
            .iter()
            .filter(|t| query.include_deleted || !t.deleted)
            .filter(|t| query.include_hidden || !t.hidden)
            .filter(|t| match query.changed_since {
                Some(since) => t.updated > since,
                None => true,
            })
            .cloned()
            .collect();
        self.paginate(tasks, page_token)
    }

    fn create_task(
        &mut self,
        list_id: &str,
        task: &NewRemoteTask,
        parent: Option<&str>,
        previous: Option<&str>,
    ) -> RemoteResult<RemoteTask> {
        self.authorize()?;
        self.list_ref(list_id)?;
        let id = self.next_id("t");
        let stamp = self.stamp();
        let list = self.list_mut(list_id)?;
        check_parent(list, parent)?;
        let position = place(list, &id, parent, previous, stamp)?;
        let created = RemoteTask {
            id,
            title: task.title.clone(),
            notes: task.notes.clone(),
            due: task.due,
            completed: task.completed,
            deleted: false,
            hidden: false,
            parent: parent.map(String::from),
            position,
            updated: stamp,
        };
        list.tasks.push(created.clone());
        list.updated = stamp;
        Ok(created)
    }

    fn update_task(&mut self, list_id: &str, patch: &TaskPatch) -> RemoteResult<RemoteTask> {
        self.authorize()?;
        self.list_ref(list_id)?;
        let stamp = self.stamp();
        let list = self.list_mut(list_id)?;
        let task = find_task_mut(list, &patch.id)?;
        patch.apply(task);
        if task.completed.is_none() {
            task.hidden = false;
        }
        task.updated = stamp;
        let updated = task.clone();
        list.updated = stamp;
        Ok(updated)
    }

    fn move_task(
        &mut self,
        list_id: &str,
        task_id: &str,
        parent: Option<&str>,
        previous: Option<&str>,
    ) -> RemoteResult<RemoteTask> {
        self.authorize()?;
        self.list_ref(list_id)?;
        let stamp = self.stamp();
        let list = self.list_mut(list_id)?;
        find_task_mut(list, task_id)?;
        check_parent(list, parent)?;
        if creates_cycle(list, task_id, parent) {
            return Err(RemoteError::Rejected(format!(
                "cannot move {} under its own subtree",
                task_id
            )));
        }
        if previous == Some(task_id) {
            return Err(RemoteError::Rejected(format!("{} cannot follow itself", task_id)));
        }
        let position = place(list, task_id, parent, previous, stamp)?;
        let task = find_task_mut(list, task_id)?;
        task.parent = parent.map(String::from);
        task.position = position;
        task.updated = stamp;
        let moved = task.clone();
        list.updated = stamp;
        Ok(moved)
    }

    fn delete_task(&mut self, list_id: &str, task_id: &str) -> RemoteResult<()> {
        self.authorize()?;
        self.list_ref(list_id)?;
        let stamp = self.stamp();
        let list = self.list_mut(list_id)?;
        let task = find_task_mut(list, task_id)?;
        task.deleted = true;
        task.updated = stamp;
        list.updated = stamp;
        Ok(())
    }

    fn create_list(&mut self, title: &str) -> RemoteResult<RemoteList> {
        self.authorize()?;
        let id = self.next_id("l");
        let stamp = self.stamp();
        self.state.lists.push(StoredList {
            id: id.clone(),
            title: title.to_string(),
            updated: stamp,
            tasks: Vec::new(),
        });
        Ok(RemoteList { id, title: title.to_string(), updated: stamp })
    }

    fn rename_list(&mut self, list_id: &str, title: &str) -> RemoteResult<RemoteList> {
        self.authorize()?;
        self.list_ref(list_id)?;
        let stamp = self.stamp();
        let list = self.list_mut(list_id)?;
        list.title = title.to_string();
        list.updated = stamp;
        Ok(RemoteList { id: list.id.clone(), title: list.title.clone(), updated: stamp })
    }

    fn delete_list(&mut self, list_id: &str) -> RemoteResult<()> {
        self.authorize()?;
        self.list_ref(list_id)?;
        self.state.lists.retain(|l| l.id != list_id);
        Ok(())
    }
}

fn find_task_mut<'a>(list: &'a mut StoredList, task_id: &str) -> RemoteResult<&'a mut RemoteTask> {
    list.tasks
        .iter_mut()
        .find(|t| t.id == task_id)
        .ok_or_else(|| RemoteError::NotFound(format!("task {}", task_id)))
}

fn check_parent(list: &StoredList, parent: Option<&str>) -> RemoteResult<()> {
    match parent {
        Some(parent) if !list.tasks.iter().any(|t| t.id == parent && !t.deleted) => {
            Err(RemoteError::NotFound(format!("parent task {}", parent)))
        }
        _ => Ok(()),
    }
}

/// True if `parent` is `task_id` or lies beneath it.
fn creates_cycle(list: &StoredList, task_id: &str, parent: Option<&str>) -> bool {
    let mut seen = HashSet::new();
    let mut current = parent.map(String::from);
    while let Some(id) = current {
        if id == task_id || !seen.insert(id.clone()) {
            return true;
        }
        current = list.tasks.iter().find(|t| t.id == id).and_then(|t| t.parent.clone());
    }
    false
}

fn parse_position(position: &str) -> u64 {
    position.parse().unwrap_or(0)
}

fn format_position(position: u64) -> String {
    format!("{:020}", position)
}

/// Position for `task_id` directly after `previous` among the children of
/// `parent`, or first when `previous` is `None`.
///
/// Renumbers the siblings when no gap is left, stamping the ones that move.
fn place(
    list: &mut StoredList,
    task_id: &str,
    parent: Option<&str>,
    previous: Option<&str>,
    stamp: DateTime<Utc>,
) -> RemoteResult<String> {
    let mut siblings: Vec<(u64, String)> = list
        .tasks
        .iter()
        .filter(|t| !t.deleted && t.id != task_id && t.parent.as_deref() == parent)
        .map(|t| (parse_position(&t.position), t.id.clone()))
        .collect();
    siblings.sort();

    let slot = match previous {
        None => 0,
        Some(prev) => {
            siblings.iter().position(|(_, id)| id == prev).ok_or_else(|| {
                RemoteError::NotFound(format!("previous task {}", prev))
            })? + 1
        }
    };

    let low = slot.checked_sub(1).map(|i| siblings[i].0);
    let high = siblings.get(slot).map(|s| s.0);
    if let Some(position) = between(low, high) {
        return Ok(format_position(position));
    }

    let mut ordered: Vec<String> = siblings.into_iter().map(|(_, id)| id).collect();
    ordered.insert(slot, task_id.to_string());
    let mut assigned = String::new();
    for (i, id) in ordered.iter().enumerate() {
        let position = format_position((i as u64 + 1) * POSITION_SPACING);
        if id == task_id {
            assigned = position;
        } else if let Some(task) = list.tasks.iter_mut().find(|t| &t.id == id) {
            if task.position != position {
                task.position = position;
                task.updated = stamp;
            }
        }
    }
    Ok(assigned)
}

fn between(low: Option<u64>, high: Option<u64>) -> Option<u64> {
    match (low, high) {
        (None, None) => Some(POSITION_SPACING),
        (Some(low), None) => low.checked_add(POSITION_SPACING),
        (None, Some(high)) => (high > 1).then_some(high / 2),
        (Some(low), Some(high)) => (high > low + 1).then(|| low + (high - low) / 2),
    }
}

fn collect_tree(tasks: &[RemoteTask], parent: Option<&str>, depth: u32, out: &mut Vec<(u32, RemoteTask)>) {
    let mut children: Vec<&RemoteTask> =
        tasks.iter().filter(|t| t.parent.as_deref() == parent).collect();
    children.sort_by(|a, b| a.position.cmp(&b.position));
    for child in children {
        out.push((depth, child.clone()));
        collect_tree(tasks, Some(&child.id), depth + 1, out);
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
