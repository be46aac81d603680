// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Two-way sync between the local replica and a remote task service.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ SyncSession │────►│  Reconciler  │────►│ RemoteClient │
//! │ (all lists) │     │  (one list)  │◄────│   (trait)    │
//! └─────────────┘     └──────────────┘     └──────────────┘
//!        │                   │
//!        ▼                   ▼
//! ┌─────────────────────────────┐
//! │   Store (tm_core::Database) │
//! └─────────────────────────────┘
//! ```
//!
//! # Features
//!
//! - Title adoption of remote tasks created before the first sync
//! - Three-way field merge against the last synced snapshot
//! - Hierarchy pushed as remote moves, pulled as parents plus positions
//! - Per-task failures retried on the next pass
//! - Injectable remote trait with in-memory and directory-backed services

mod engine;
mod file_remote;
mod memory;
mod remote;
mod session;

pub use engine::{has_pending_work, ListReport, Reconciler, SyncError, SyncResult, SyncSettings};
pub use file_remote::FileRemote;
pub use memory::{MemoryRemote, RemoteState, StoredList, DEFAULT_PAGE_SIZE};
pub use remote::{
    NewRemoteTask, Page, RemoteClient, RemoteError, RemoteList, RemoteResult, RemoteTask,
    TaskPatch, TaskQuery,
};
pub use session::{
    drop_local_list, CancelToken, NoopObserver, SyncObserver, SyncOutcome, SyncSession,
};

#[cfg(test)]
pub(crate) mod test_helpers;
