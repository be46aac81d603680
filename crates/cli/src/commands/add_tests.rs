// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::run_impl;
use crate::commands::testing::{rows, TestContext, INBOX};
use crate::error::Error;
use chrono::NaiveDate;
use tm_core::DueDate;

#[test]
fn test_add_appends_to_default_list() {
    let mut ctx = TestContext::new();
    ctx.add_task("first");

    let id = run_impl(&mut ctx.project, "second".to_string(), None, None, None).unwrap();

    assert_eq!(ctx.task(id).title, "second");
    assert_eq!(ctx.rows(INBOX), rows(&[(0, "first"), (0, "second")]));
    assert!(ctx.project.has_changes());
}

#[test]
fn test_add_by_list_title() {
    let mut ctx = TestContext::new();
    ctx.add_list("l2", "Work");

    run_impl(&mut ctx.project, "report".to_string(), Some("Work"), None, None).unwrap();

    assert_eq!(ctx.rows("l2"), rows(&[(0, "report")]));
    assert!(ctx.rows(INBOX).is_empty());
}

#[test]
fn test_add_with_notes_and_due() {
    let mut ctx = TestContext::new();
    let id = run_impl(
        &mut ctx.project,
        "call".to_string(),
        None,
        Some("about the lease".to_string()),
        Some("2026-03-01"),
    )
    .unwrap();

    let task = ctx.task(id);
    assert_eq!(task.notes.as_deref(), Some("about the lease"));
    assert_eq!(task.due, Some(DueDate::Day(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap())));
}

#[test]
fn test_add_rejects_bad_due_date() {
    let mut ctx = TestContext::new();
    let err = run_impl(&mut ctx.project, "x".to_string(), None, None, Some("tomorrow")).unwrap_err();
    assert!(err.to_string().contains("invalid due date"));
    assert!(ctx.rows(INBOX).is_empty());
}

#[test]
fn test_add_without_any_list_fails() {
    let mut ctx = TestContext::new();
    ctx.project.config.default_list = None;
    let err = run_impl(&mut ctx.project, "x".to_string(), None, None, None).unwrap_err();
    assert!(matches!(err, Error::NoListSelected));
}

#[test]
fn test_add_unknown_list_fails() {
    let mut ctx = TestContext::new();
    let err = run_impl(&mut ctx.project, "x".to_string(), Some("Nope"), None, None).unwrap_err();
    assert!(matches!(err, Error::ListNotFound(_)));
}
