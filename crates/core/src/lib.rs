// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tm-core: Shared library for the taskmirror task replica
//!
//! This crate provides the data model, the SQLite store, the order tree
//! engine that keeps a list's flat (order, indent, parent) rows consistent,
//! and the field merge rules used by sync.

pub mod clock;
pub mod db;
pub mod error;
pub mod merge;
pub mod order;
pub mod store;
pub mod task;
pub mod updater;

pub use clock::{ClockSource, ManualClock, SystemClock, DEFAULT_FUDGE_MS};
pub use db::Database;
pub use error::{Error, Result};
pub use merge::{FieldChanges, FieldLimits};
pub use order::{MoveTarget, OrderTree, Placement};
pub use store::{MirrorStore, SaveMode, Store, SyncState, SyncStatus, SyncStatusStore, TaskStore};
pub use task::{DueDate, MirrorRecord, Task, TaskId, TaskList, TaskSnapshot};
