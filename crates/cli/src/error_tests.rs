// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use yare::parameterized;

#[test]
fn test_error_not_initialized_display() {
    let err = Error::NotInitialized;
    assert!(err.to_string().contains("not initialized"));
    assert!(err.to_string().contains("tm init"));
}

#[test]
fn test_error_already_initialized_display() {
    let err = Error::AlreadyInitialized("/path/to/work".to_string());
    assert!(err.to_string().contains("already initialized"));
    assert!(err.to_string().contains("/path/to/work"));
}

#[test]
fn test_error_ambiguous_list_display() {
    let err = Error::AmbiguousList {
        name: "Home".to_string(),
        matches: vec!["l1".to_string(), "l4".to_string()],
    };
    let msg = err.to_string();
    assert!(msg.contains("'Home'"));
    assert!(msg.contains("l1, l4"));
}

#[test]
fn test_error_remote_not_configured_has_hint() {
    let msg = Error::RemoteNotConfigured.to_string();
    assert!(msg.contains("hint:"));
    assert!(msg.contains("--remote"));
}

#[parameterized(
    task_not_found = { tm_core::Error::TaskNotFound(7), "task not found: 7" },
    list_not_found = { tm_core::Error::ListNotFound("l9".into()), "list not found: 'l9'" },
    not_mirrored = { tm_core::Error::NotMirrored(3), "task 3 is not in any list" },
    invalid_due = { tm_core::Error::InvalidDueDate("soon".into()), "invalid due date: 'soon'" },
)]
fn test_from_core_error(core: tm_core::Error, expected: &str) {
    let err: Error = core.into();
    assert!(err.to_string().starts_with(expected), "got: {}", err);
}

#[test]
fn test_from_sync_error_keeps_message() {
    let err: Error = SyncError::Unauthorized("expired".into()).into();
    assert!(err.to_string().starts_with("unauthorized: expired"));
}

#[test]
fn test_from_io_error() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err: Error = io_err.into();
    assert!(err.to_string().contains("io error"));
}
