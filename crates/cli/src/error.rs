// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::sync::{RemoteError, SyncError};
use tm_core::TaskId;

/// All possible errors that can occur in the tmrs library.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not initialized: run 'tm init' first")]
    NotInitialized,

    #[error("already initialized at {0}")]
    AlreadyInitialized(String),

    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("list not found: '{0}'\n  hint: run 'tm lists' to see known lists")]
    ListNotFound(String),

    #[error("no list selected\n  hint: pass --list, or set default_list in .taskmirror/config.toml")]
    NoListSelected,

    #[error("list name '{name}' is ambiguous: {}", matches.join(", "))]
    AmbiguousList { name: String, matches: Vec<String> },

    #[error("task {0} is not in any list")]
    NotInList(TaskId),

    #[error("cannot {action} task {id}: {reason}")]
    InvalidPlacement {
        action: &'static str,
        id: TaskId,
        reason: &'static str,
    },

    #[error("{field} cannot be empty")]
    FieldEmpty { field: &'static str },

    #[error("no remote configured\n  hint: run 'tm init --remote DIR' or add a [remote] table to .taskmirror/config.toml")]
    RemoteNotConfigured,

    #[error("another sync is already running")]
    SyncInProgress,

    #[error("sync failed: {0}")]
    SyncFailed(String),

    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("{0}")]
    Sync(#[from] SyncError),

    #[error("{0}")]
    Core(tm_core::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),
}

/// A specialized Result type for tmrs operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<tm_core::Error> for Error {
    fn from(e: tm_core::Error) -> Self {
        match e {
            tm_core::Error::TaskNotFound(id) => Error::TaskNotFound(id),
            tm_core::Error::ListNotFound(id) => Error::ListNotFound(id),
            tm_core::Error::NotMirrored(id) => Error::NotInList(id),
            tm_core::Error::Io(e) => Error::Io(e),
            tm_core::Error::Json(e) => Error::Json(e),
            other => Error::Core(other),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
