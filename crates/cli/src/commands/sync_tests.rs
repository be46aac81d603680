// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use crate::commands::testing::{TestContext, INBOX};
use crate::sync::{NoopObserver, RemoteClient, TaskQuery};
use fs2::FileExt;
use tm_core::{MirrorStore, SyncState, SyncStatusStore};

/// Registers the context's inbox with the remote under the same id.
fn remote_inbox(ctx: &mut TestContext) -> String {
    let mut remote = open_remote(&ctx.project).unwrap();
    let list = remote.create_list("Inbox").unwrap();
    ctx.add_list(&list.id, "Inbox");
    list.id
}

#[test]
fn test_session_pushes_local_tasks() {
    let mut ctx = TestContext::with_remote();
    let list = remote_inbox(&mut ctx);
    let id = ctx.add_task_to(&list, "milk");

    let outcome = run_session(&mut ctx.project, &mut NoopObserver).unwrap();

    assert!(outcome.success, "errors: {:?}", outcome.errors);
    let record = ctx.project.db.record_for_task(id).unwrap().unwrap();
    assert!(record.remote_id.is_some());
    assert_eq!(ctx.project.db.sync_status().unwrap().state(), SyncState::Success);
}

#[test]
fn test_session_purges_lists_unknown_to_the_remote() {
    let mut ctx = TestContext::with_remote();
    let id = ctx.add_task("local only");

    run_session(&mut ctx.project, &mut NoopObserver).unwrap();

    assert!(ctx.project.db.find_list(INBOX).unwrap().is_none());
    assert!(ctx.task(id).is_deleted());
}

#[test]
fn test_session_without_remote_fails() {
    let mut ctx = TestContext::new();
    let err = run_session(&mut ctx.project, &mut NoopObserver).unwrap_err();
    assert!(matches!(err, Error::RemoteNotConfigured));
}

#[test]
fn test_session_refuses_to_run_twice() {
    let mut ctx = TestContext::with_remote();
    let lock_path = get_sync_lock_path(&ctx.project.work_dir);
    let held = File::create(&lock_path).unwrap();
    held.lock_exclusive().unwrap();

    let err = run_session(&mut ctx.project, &mut NoopObserver).unwrap_err();
    assert!(matches!(err, Error::SyncInProgress));
}

#[test]
fn test_wrong_token_fails_the_session() {
    let mut ctx = TestContext::with_remote();
    ctx.project.config.remote.as_mut().unwrap().token = Some("right".to_string());
    remote_inbox(&mut ctx);
    ctx.project.config.remote.as_mut().unwrap().token = Some("wrong".to_string());

    let outcome = run_session(&mut ctx.project, &mut NoopObserver).unwrap();

    assert!(!outcome.success);
    assert!(first_error(&outcome).contains("unauthorized"));
    assert_eq!(ctx.project.db.sync_status().unwrap().state(), SyncState::Error);
}

#[test]
fn test_first_error_fallback() {
    assert_eq!(first_error(&SyncOutcome::default()), "unknown error");
}

#[test]
fn test_finish_runs_automatic_sync_after_changes() {
    let mut ctx = TestContext::with_remote();
    ctx.project.config.sync.auto = true;
    let list = remote_inbox(&mut ctx);
    ctx.add_task_to(&list, "milk");
    let mut remote = open_remote(&ctx.project).unwrap();

    let project = ctx.project;
    assert!(project.has_changes());
    project.finish().unwrap();

    let tasks = remote.list_tasks(&list, &TaskQuery::default(), None).unwrap().items;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "milk");
}

#[test]
fn test_finish_skips_sync_when_auto_is_off() {
    let mut ctx = TestContext::with_remote();
    let list = remote_inbox(&mut ctx);
    ctx.add_task_to(&list, "milk");
    let mut remote = open_remote(&ctx.project).unwrap();

    ctx.project.finish().unwrap();

    let tasks = remote.list_tasks(&list, &TaskQuery::default(), None).unwrap().items;
    assert!(tasks.is_empty());
}
