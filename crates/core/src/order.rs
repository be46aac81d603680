// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Order tree engine.
//!
//! A list is stored flat: every mirror record carries an `order` (total
//! sequence within the list), an `indent` (depth, 0 = top level) and a
//! `parent`. [`OrderTree`] rebuilds the implied tree from that flat form,
//! applies one structural mutation, and hands back fresh placements for
//! every row via [`OrderTree::placements`].
//!
//! Flat-form invariants kept by every mutation:
//! - a row's indent is at most the previous row's indent + 1
//! - a parent has indent one less than its child and a smaller order
//! - no row is its own ancestor
//!
//! Mutations on a task the tree does not contain are no-ops and return
//! `false`; the node may have raced with a concurrent delete.

use std::collections::{HashMap, HashSet};

use crate::task::{MirrorRecord, TaskId};

const ROOT: usize = 0;

/// Position of one row in the flat list form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub task_id: TaskId,
    pub order: i64,
    pub indent: u32,
    pub parent: Option<TaskId>,
}

impl From<&MirrorRecord> for Placement {
    fn from(record: &MirrorRecord) -> Self {
        Placement {
            task_id: record.task_id,
            order: record.order,
            indent: record.indent,
            parent: record.parent,
        }
    }
}

/// Destination of a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveTarget {
    /// Directly before this task, under the same parent.
    Before(TaskId),
    /// Last top-level row of the list.
    End,
}

#[derive(Debug, Clone)]
struct Node {
    task_id: TaskId,
    parent: usize,
    children: Vec<usize>,
}

/// Arena tree over one list's rows. Index 0 is the root sentinel.
#[derive(Debug, Clone)]
pub struct OrderTree {
    nodes: Vec<Node>,
    index: HashMap<TaskId, usize>,
}

impl OrderTree {
    /// Builds the tree from rows sorted by ascending `order`.
    ///
    /// Only the indent of each row is consulted: a deeper row becomes a child
    /// of the row before it, an equal row its sibling, and a shallower row
    /// walks up by the difference, clamped at the root. Duplicate task ids
    /// after the first are ignored.
    pub fn build(rows: &[Placement]) -> Self {
        let mut tree = OrderTree {
            nodes: vec![Node { task_id: 0, parent: ROOT, children: Vec::new() }],
            index: HashMap::new(),
        };
        // Depth per arena slot; the root sits at -1 so top-level rows are 0.
        let mut depth: Vec<i64> = vec![-1];
        let mut current = ROOT;

        for row in rows {
            if tree.index.contains_key(&row.task_id) {
                continue;
            }
            let indent = i64::from(row.indent);
            let previous = depth[current];
            let parent = if indent > previous {
                current
            } else if indent == previous {
                tree.nodes[current].parent
            } else {
                let mut parent = tree.nodes[current].parent;
                for _ in indent..previous {
                    if parent == ROOT {
                        break;
                    }
                    parent = tree.nodes[parent].parent;
                }
                parent
            };
            current = tree.attach(row.task_id, parent);
            depth.push(depth[parent] + 1);
        }
        tree
    }

    /// Builds the tree from mirror records in any order.
    pub fn from_records(records: &[MirrorRecord]) -> Self {
        let mut rows: Vec<Placement> = records.iter().map(Placement::from).collect();
        rows.sort_by_key(|r| (r.order, r.task_id));
        Self::build(&rows)
    }

    fn attach(&mut self, task_id: TaskId, parent: usize) -> usize {
        let node = self.nodes.len();
        self.nodes.push(Node { task_id, parent, children: Vec::new() });
        self.nodes[parent].children.push(node);
        self.index.insert(task_id, node);
        node
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, task_id: TaskId) -> bool {
        self.index.contains_key(&task_id)
    }

    /// Parent task of `task_id`, or `None` for top-level and unknown tasks.
    pub fn parent_of(&self, task_id: TaskId) -> Option<TaskId> {
        let node = *self.index.get(&task_id)?;
        let parent = self.nodes[node].parent;
        (parent != ROOT).then(|| self.nodes[parent].task_id)
    }

    /// Renumbers the whole tree depth-first.
    ///
    /// Orders run 0, 1, 2, … in traversal order, indent is depth − 1 and the
    /// parent is the enclosing node. Calling it twice without a mutation in
    /// between yields identical placements.
    pub fn placements(&self) -> Vec<Placement> {
        let mut out = Vec::with_capacity(self.index.len());
        self.renumber(ROOT, 0, &mut out);
        out
    }

    fn renumber(&self, node: usize, indent: u32, out: &mut Vec<Placement>) {
        let parent = (node != ROOT).then(|| self.nodes[node].task_id);
        for &child in &self.nodes[node].children {
            out.push(Placement {
                task_id: self.nodes[child].task_id,
                order: out.len() as i64,
                indent,
                parent,
            });
            self.renumber(child, indent + 1, out);
        }
    }

    /// Shifts `task_id` and its whole subtree by `delta` levels.
    ///
    /// Rejected when the new indent would be negative or deeper than one
    /// past the row immediately before the target. The new parent is the
    /// nearest preceding row at the new indent − 1.
    pub fn indent(&mut self, task_id: TaskId, delta: i32) -> bool {
        let mut rows = self.placements();
        let Some(pos) = rows.iter().position(|r| r.task_id == task_id) else {
            return false;
        };
        let previous = if pos == 0 { -1 } else { i64::from(rows[pos - 1].indent) };
        let indent = i64::from(rows[pos].indent);
        let target = indent + i64::from(delta);
        if delta == 0 || target < 0 || target > previous + 1 {
            return false;
        }

        for (i, row) in rows.iter_mut().enumerate().skip(pos) {
            let current = i64::from(row.indent);
            if i > pos && current <= indent {
                break;
            }
            row.indent = u32::try_from(current + i64::from(delta)).unwrap_or(0);
        }
        *self = OrderTree::build(&rows);
        true
    }

    /// Moves `task_id` with its subtree.
    ///
    /// Rejected when the destination lies inside the moved subtree.
    pub fn move_to(&mut self, task_id: TaskId, target: MoveTarget) -> bool {
        let Some(&node) = self.index.get(&task_id) else {
            return false;
        };
        match target {
            MoveTarget::End => {
                self.detach(node);
                let end = self.nodes[ROOT].children.len();
                self.insert(ROOT, end, node);
            }
            MoveTarget::Before(before) => {
                let Some(&sibling) = self.index.get(&before) else {
                    return false;
                };
                if sibling == node || self.is_ancestor(node, sibling) {
                    return false;
                }
                self.detach(node);
                let parent = self.nodes[sibling].parent;
                let slot = self.slot_of(parent, sibling);
                self.insert(parent, slot, node);
            }
        }
        true
    }

    /// Removes `task_id`, promoting its direct children into its slot.
    pub fn remove(&mut self, task_id: TaskId) -> bool {
        let Some(node) = self.index.remove(&task_id) else {
            return false;
        };
        let parent = self.nodes[node].parent;
        let slot = self.slot_of(parent, node);
        let children = std::mem::take(&mut self.nodes[node].children);
        for &child in &children {
            self.nodes[child].parent = parent;
        }
        self.nodes[parent].children.splice(slot..=slot, children);
        true
    }

    /// Visits every descendant of `task_id` depth-first, target excluded.
    pub fn visit_children<F: FnMut(TaskId)>(&self, task_id: TaskId, mut visitor: F) -> bool {
        let Some(&node) = self.index.get(&task_id) else {
            return false;
        };
        self.visit(node, &mut visitor);
        true
    }

    fn visit<F: FnMut(TaskId)>(&self, node: usize, visitor: &mut F) {
        for &child in &self.nodes[node].children {
            visitor(self.nodes[child].task_id);
            self.visit(child, visitor);
        }
    }

    /// Descendants of `task_id` in traversal order.
    pub fn descendants(&self, task_id: TaskId) -> Vec<TaskId> {
        let mut out = Vec::new();
        self.visit_children(task_id, |id| out.push(id));
        out
    }

    fn is_ancestor(&self, ancestor: usize, mut node: usize) -> bool {
        while node != ROOT {
            node = self.nodes[node].parent;
            if node == ancestor {
                return true;
            }
        }
        false
    }

    fn slot_of(&self, parent: usize, node: usize) -> usize {
        self.nodes[parent].children.iter().position(|&c| c == node).unwrap_or(0)
    }

    fn detach(&mut self, node: usize) {
        let parent = self.nodes[node].parent;
        self.nodes[parent].children.retain(|&c| c != node);
    }

    fn insert(&mut self, parent: usize, slot: usize, node: usize) {
        let slot = slot.min(self.nodes[parent].children.len());
        self.nodes[parent].children.insert(slot, node);
        self.nodes[node].parent = parent;
    }
}

/// A row whose placement differs after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Change {
    pub placement: Placement,
    pub parent_changed: bool,
}

/// Rows of `after` whose order, indent or parent differ from `before`.
///
/// Rows missing from `before` count as changed.
pub fn changes(before: &[Placement], after: &[Placement]) -> Vec<Change> {
    let old: HashMap<TaskId, &Placement> = before.iter().map(|p| (p.task_id, p)).collect();
    after
        .iter()
        .filter_map(|p| match old.get(&p.task_id) {
            Some(o) if *o == p => None,
            Some(o) => Some(Change { placement: *p, parent_changed: o.parent != p.parent }),
            None => Some(Change { placement: *p, parent_changed: p.parent.is_some() }),
        })
        .collect()
}

/// Derives flat placements from parent links.
///
/// Walks depth-first from the top level. Rows whose placement the remote
/// has not confirmed (no remote position yet, or a local move still to
/// push) keep their slot in local order among their siblings; the other
/// slots are filled by remote position. Parents outside the list count as
/// top level, and rows caught in a parent cycle are attached at the top
/// level once, in the same sibling order.
pub fn normalize(records: &[MirrorRecord]) -> Vec<Placement> {
    let known: HashSet<TaskId> = records.iter().map(|r| r.task_id).collect();
    let mut children: HashMap<Option<TaskId>, Vec<&MirrorRecord>> = HashMap::new();
    for record in records {
        let parent = record.parent.filter(|p| *p != record.task_id && known.contains(p));
        children.entry(parent).or_default().push(record);
    }
    for siblings in children.values_mut() {
        arrange_siblings(siblings);
    }

    let mut out = Vec::with_capacity(records.len());
    let mut visited = HashSet::new();
    place(None, 0, &children, &mut visited, &mut out);

    let mut stranded: Vec<&MirrorRecord> =
        records.iter().filter(|r| !visited.contains(&r.task_id)).collect();
    arrange_siblings(&mut stranded);
    for record in stranded {
        if !visited.insert(record.task_id) {
            continue;
        }
        out.push(Placement { task_id: record.task_id, order: out.len() as i64, indent: 0, parent: None });
        place(Some(record.task_id), 1, &children, &mut visited, &mut out);
    }
    out
}

/// Placement not yet agreed with the remote.
fn is_pinned(record: &MirrorRecord) -> bool {
    record.moved || record.remote_position.is_none()
}

fn arrange_siblings(siblings: &mut [&MirrorRecord]) {
    siblings.sort_by_key(|r| (r.order, r.task_id));
    let mut anchored: Vec<&MirrorRecord> =
        siblings.iter().copied().filter(|r| !is_pinned(r)).collect();
    anchored.sort_by(|a, b| {
        (a.remote_position.as_deref(), a.order, a.task_id).cmp(&(
            b.remote_position.as_deref(),
            b.order,
            b.task_id,
        ))
    });
    let mut anchored = anchored.into_iter();
    for slot in siblings.iter_mut().filter(|r| !is_pinned(r)) {
        if let Some(next) = anchored.next() {
            *slot = next;
        }
    }
}

fn place(
    parent: Option<TaskId>,
    indent: u32,
    children: &HashMap<Option<TaskId>, Vec<&MirrorRecord>>,
    visited: &mut HashSet<TaskId>,
    out: &mut Vec<Placement>,
) {
    let Some(siblings) = children.get(&parent) else {
        return;
    };
    for record in siblings {
        if !visited.insert(record.task_id) {
            continue;
        }
        out.push(Placement { task_id: record.task_id, order: out.len() as i64, indent, parent });
        place(Some(record.task_id), indent + 1, children, visited, out);
    }
}

#[cfg(test)]
#[path = "order_tests.rs"]
mod tests;
