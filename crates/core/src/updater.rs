// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Structural edits of one list.
//!
//! Each operation loads the list's active records, builds an
//! [`OrderTree`], applies one mutation and writes back only the rows whose
//! order, indent or parent changed. Local edits mark the target and every
//! re-parented row as moved so the next sync pass repositions them remotely.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::error::Result;
use crate::order::{self, MoveTarget, OrderTree, Placement};
use crate::store::MirrorStore;
use crate::task::{MirrorRecord, TaskId};

/// Appends `task_id` as the last top-level row of the list.
pub fn append_task<S: MirrorStore + ?Sized>(
    store: &mut S,
    list_id: &str,
    task_id: TaskId,
) -> Result<MirrorRecord> {
    let record = MirrorRecord::new(task_id, list_id, store.next_order(list_id)?);
    store.save_record(&record)?;
    Ok(record)
}

/// Indents (`delta > 0`) or outdents (`delta < 0`) a task with its subtree.
///
/// Returns false when the task is not in the list or the new indent would
/// break the list's invariants.
pub fn indent_task<S: MirrorStore + ?Sized>(
    store: &mut S,
    list_id: &str,
    task_id: TaskId,
    delta: i32,
) -> Result<bool> {
    let records = store.active_records(list_id)?;
    let mut tree = OrderTree::from_records(&records);
    if !tree.indent(task_id, delta) {
        return Ok(false);
    }
    flush(store, &records, &tree.placements(), Moves::Track(Some(task_id)))?;
    Ok(true)
}

/// Moves a task with its subtree before another task, or to the end.
pub fn move_task<S: MirrorStore + ?Sized>(
    store: &mut S,
    list_id: &str,
    task_id: TaskId,
    target: MoveTarget,
) -> Result<bool> {
    let records = store.active_records(list_id)?;
    let mut tree = OrderTree::from_records(&records);
    if !tree.move_to(task_id, target) {
        return Ok(false);
    }
    flush(store, &records, &tree.placements(), Moves::Track(Some(task_id)))?;
    Ok(true)
}

/// Takes a task out of the list, promoting its children into its place.
///
/// The task's record is kept, marked deleted, so the next sync pass can
/// delete the remote copy.
pub fn delete_task_cascading<S: MirrorStore + ?Sized>(
    store: &mut S,
    list_id: &str,
    task_id: TaskId,
    now: DateTime<Utc>,
) -> Result<bool> {
    let records = store.active_records(list_id)?;
    let mut tree = OrderTree::from_records(&records);
    if !tree.remove(task_id) {
        return Ok(false);
    }
    flush(store, &records, &tree.placements(), Moves::Track(None))?;

    if let Some(mut record) = records.into_iter().find(|r| r.task_id == task_id) {
        record.deleted = Some(now);
        store.save_record(&record)?;
    }
    Ok(true)
}

/// Calls `f` for every descendant of `task_id`, depth-first.
///
/// Descendants are collected before the first call, so `f` may write to the
/// store. Returns false when the task is not in the list.
pub fn apply_to_descendants<S, F>(
    store: &mut S,
    list_id: &str,
    task_id: TaskId,
    mut f: F,
) -> Result<bool>
where
    S: MirrorStore + ?Sized,
    F: FnMut(&mut S, TaskId) -> Result<()>,
{
    let tree = OrderTree::from_records(&store.active_records(list_id)?);
    if !tree.contains(task_id) {
        return Ok(false);
    }
    for id in tree.descendants(task_id) {
        f(store, id)?;
    }
    Ok(true)
}

/// Rewrites order and indent from parent links and remote positions.
///
/// Used after remote changes are applied; rows are not marked moved.
/// Returns the number of rewritten rows.
pub fn normalize_list<S: MirrorStore + ?Sized>(store: &mut S, list_id: &str) -> Result<usize> {
    let records = store.active_records(list_id)?;
    let tree = OrderTree::build(&order::normalize(&records));
    flush(store, &records, &tree.placements(), Moves::Ignore)
}

enum Moves {
    /// Mark re-parented rows, and the given target, as moved.
    Track(Option<TaskId>),
    Ignore,
}

fn flush<S: MirrorStore + ?Sized>(
    store: &mut S,
    records: &[MirrorRecord],
    placements: &[Placement],
    moves: Moves,
) -> Result<usize> {
    let before: Vec<Placement> = records.iter().map(Placement::from).collect();
    let by_id: HashMap<TaskId, &MirrorRecord> = records.iter().map(|r| (r.task_id, r)).collect();

    let mut dirty: Vec<MirrorRecord> = Vec::new();
    for change in order::changes(&before, placements) {
        let Some(record) = by_id.get(&change.placement.task_id) else {
            continue;
        };
        let mut record = (*record).clone();
        record.order = change.placement.order;
        record.indent = change.placement.indent;
        record.parent = change.placement.parent;
        if change.parent_changed && matches!(moves, Moves::Track(_)) {
            record.moved = true;
        }
        dirty.push(record);
    }

    if let Moves::Track(Some(target)) = moves {
        match dirty.iter_mut().find(|r| r.task_id == target) {
            Some(record) => record.moved = true,
            None => {
                if let Some(record) = by_id.get(&target) {
                    let mut record = (*record).clone();
                    record.moved = true;
                    dirty.push(record);
                }
            }
        }
    }

    store.save_records(&dirty)?;
    Ok(dirty.len())
}

#[cfg(test)]
#[path = "updater_tests.rs"]
mod tests;
