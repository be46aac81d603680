// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for tm-core operations.

use thiserror::Error;

use crate::task::TaskId;

/// All possible errors that can occur in tm-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("list not found: {0}")]
    ListNotFound(String),

    #[error("task {0} is not in any list\n  hint: tasks join a list when created with --list or pulled by sync")]
    NotMirrored(TaskId),

    #[error("invalid due date: '{0}'\n  hint: use YYYY-MM-DD or YYYY-MM-DDTHH:MM[:SS]")]
    InvalidDueDate(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

/// A specialized Result type for tm-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
