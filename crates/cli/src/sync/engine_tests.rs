// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::sync::test_helpers::{rows, start, Harness};
use chrono::NaiveDate;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tm_core::{DueDate, MirrorStore, MoveTarget, TaskStore};

fn remote_task(id: &str, deleted: bool, completed: bool) -> RemoteTask {
    RemoteTask {
        id: id.to_string(),
        title: id.to_string(),
        notes: None,
        due: None,
        completed: completed.then(start),
        deleted,
        hidden: false,
        parent: None,
        position: "00000000000000000001".to_string(),
        updated: start(),
    }
}

fn new_remote(title: &str) -> NewRemoteTask {
    NewRemoteTask { title: title.to_string(), notes: None, due: None, completed: None }
}

#[test]
fn changed_set_sorts_deleted_then_completed_stably() {
    let set = ChangedSet::new(vec![
        remote_task("new1", false, false),
        remote_task("done1", false, true),
        remote_task("gone1", true, false),
        remote_task("new2", false, false),
        remote_task("done2", false, true),
        remote_task("gone2", true, false),
    ]);
    let ids: Vec<String> = set.into_sorted().into_iter().map(|t| t.id).collect();
    assert_eq!(ids, vec!["gone1", "gone2", "done1", "done2", "new1", "new2"]);
}

#[test]
fn first_sync_creates_hierarchy_remotely() {
    let mut h = Harness::new();
    h.add("a");
    let a1 = h.add("a1");
    h.add("b");
    updater::indent_task(&mut h.db, &h.list.clone(), a1, 1).unwrap();

    let report = h.sync();

    assert_eq!(report.created, 3);
    assert!(report.failures.is_empty());
    assert_eq!(h.remote_tree(), rows(&[(0, "a"), (1, "a1"), (0, "b")]));
    assert_eq!(h.local_tree(), rows(&[(0, "a"), (1, "a1"), (0, "b")]));
    let record = h.db.record_for_task(a1).unwrap().unwrap();
    assert!(!record.moved);
}

#[test]
fn second_pass_with_no_changes_is_quiet() {
    let mut h = Harness::new();
    h.add("a");
    h.sync();
    h.tick();

    let report = h.sync();
    assert_eq!(report.created + report.updated + report.adopted + report.deleted, 0);
    assert_eq!(h.remote_tree(), rows(&[(0, "a")]));
}

#[test]
fn adoption_avoids_duplication() {
    let mut h = Harness::new();
    let list = h.list.clone();
    h.remote.inner.create_task(&list, &new_remote("Buy milk"), None, None).unwrap();
    h.tick();
    let id = h.add("Buy milk");
    h.edit(id, |t| t.notes = Some("2%".to_string()));

    let report = h.sync();

    assert_eq!(report.adopted, 1);
    assert_eq!(report.created, 0);
    let remote = h.remote.inner.tasks(&list);
    assert_eq!(remote.len(), 1);
    assert_eq!(remote[0].notes.as_deref(), Some("2%"));
    assert_eq!(h.remote_id(id), remote[0].id);
    assert_eq!(h.local_tree(), rows(&[(0, "Buy milk")]));
}

#[test]
fn adoption_claims_each_remote_task_once() {
    let mut h = Harness::new();
    let list = h.list.clone();
    h.remote.inner.create_task(&list, &new_remote("dup"), None, None).unwrap();
    h.tick();
    h.add("dup");
    h.add("dup");

    let report = h.sync();

    assert_eq!(report.adopted, 1);
    assert_eq!(report.created, 1);
    assert_eq!(h.remote.inner.tasks(&list).len(), 2);
}

#[test]
fn deleted_remote_tasks_are_never_adopted() {
    let mut h = Harness::new();
    let list = h.list.clone();
    let gone = h.remote.inner.create_task(&list, &new_remote("x"), None, None).unwrap();
    h.remote.inner.delete_task(&list, &gone.id).unwrap();
    h.tick();
    let id = h.add("x");

    let report = h.sync();
    assert_eq!(report.created, 1);
    assert_ne!(h.remote_id(id), gone.id);
}

#[test]
fn untitled_and_deleted_new_tasks_are_not_pushed() {
    let mut h = Harness::new();
    h.add("");
    let gone = h.add("gone");
    h.edit(gone, |t| t.deleted = Some(start()));

    let report = h.sync();
    assert_eq!(report.created, 0);
    assert!(h.remote_tree().is_empty());
}

#[test]
fn pull_creates_local_tasks_with_hierarchy() {
    let mut h = Harness::new();
    let list = h.list.clone();
    // Created first, so the child is listed before its parent.
    let child = h.remote.inner.create_task(&list, &new_remote("child"), None, None).unwrap();
    let parent = h.remote.inner.create_task(&list, &new_remote("parent"), None, None).unwrap();
    h.remote.inner.move_task(&list, &child.id, Some(&parent.id), None).unwrap();
    h.remote.inner.create_task(&list, &new_remote("second"), None, Some(&parent.id)).unwrap();
    h.tick();

    let report = h.sync();

    assert_eq!(report.pulled, 3);
    assert_eq!(h.local_tree(), rows(&[(0, "parent"), (1, "child"), (0, "second")]));
    let record = h.db.record_by_remote_id(&child.id).unwrap().unwrap();
    assert_eq!(record.remote_parent.as_deref(), Some(parent.id.as_str()));
}

#[test]
fn pull_skips_empty_new_tasks() {
    let mut h = Harness::new();
    let list = h.list.clone();
    h.remote.inner.create_task(&list, &new_remote(""), None, None).unwrap();
    h.tick();

    let report = h.sync();
    assert_eq!(report.pulled, 0);
    assert!(h.local_tree().is_empty());
}

#[test]
fn pulled_due_date_keeps_local_time_of_day() {
    let mut h = Harness::new();
    let id = h.add("dentist");
    let day = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
    h.edit(id, |t| t.due = Some(DueDate::DayTime(day.and_hms_opt(14, 30, 0).unwrap())));
    h.sync();
    h.tick();

    let moved_day = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
    let list = h.list.clone();
    let remote_id = h.remote_id(id);
    h.remote.inner.edit_task(&list, &remote_id, |t| t.due = Some(moved_day)).unwrap();
    h.tick();
    h.sync();

    let task = h.db.get_task(id).unwrap();
    assert_eq!(task.due, Some(DueDate::DayTime(moved_day.and_hms_opt(14, 30, 0).unwrap())));
    let remote = h.remote.inner.tasks(&list);
    assert_eq!(remote[0].due, Some(moved_day));
}

#[test]
fn merge_pushes_only_locally_touched_fields() {
    let mut h = Harness::new();
    let id = h.add("a");
    h.sync();
    h.tick();

    let list = h.list.clone();
    let remote_id = h.remote_id(id);
    h.remote.inner.edit_task(&list, &remote_id, |t| t.notes = Some("remote".into())).unwrap();
    h.edit(id, |t| t.title = "a2".to_string());
    h.tick();
    h.sync();

    let remote = &h.remote.inner.tasks(&list)[0];
    assert_eq!(remote.title, "a2");
    assert_eq!(remote.notes.as_deref(), Some("remote"));
    let task = h.db.get_task(id).unwrap();
    assert_eq!(task.title, "a2");
    assert_eq!(task.notes.as_deref(), Some("remote"));
}

#[test]
fn completion_is_pushed_and_pulled() {
    let mut h = Harness::new();
    let a = h.add("a");
    let b = h.add("b");
    h.sync();
    h.tick();

    h.edit(a, |t| t.completed = Some(start()));
    let list = h.list.clone();
    let b_remote = h.remote_id(b);
    h.remote.inner.edit_task(&list, &b_remote, |t| t.completed = Some(start())).unwrap();
    h.tick();
    h.sync();

    let remote = h.remote.inner.tasks(&list);
    assert!(remote.iter().all(|t| t.completed.is_some()));
    assert!(h.db.get_task(b).unwrap().is_completed());
}

#[test]
fn failed_create_is_retried_next_pass() {
    let mut h = Harness::new();
    h.add("a");
    let b = h.add("b");
    h.add("c");
    h.remote.fail_titles.insert("b".to_string());

    let report = h.sync();
    assert_eq!(report.created, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(h.remote_tree(), rows(&[(0, "a"), (0, "c")]));
    assert!(h.db.record_for_task(b).unwrap().unwrap().remote_id.is_none());

    h.remote.fail_titles.clear();
    h.tick();
    let report = h.sync();
    assert_eq!(report.created, 1);
    assert!(report.failures.is_empty());
    assert_eq!(h.remote_tree(), rows(&[(0, "a"), (0, "b"), (0, "c")]));
}

#[test]
fn failed_update_is_not_overwritten_by_pull() {
    let mut h = Harness::new();
    let id = h.add("a");
    h.sync();
    h.tick();

    let list = h.list.clone();
    let remote_id = h.remote_id(id);
    h.edit(id, |t| t.title = "local".to_string());
    h.remote.inner.edit_task(&list, &remote_id, |t| t.notes = Some("remote".into())).unwrap();
    h.remote.fail_ids.insert(remote_id.clone());
    let before = h.db.record_for_task(id).unwrap().unwrap();

    let report = h.sync();
    assert_eq!(report.failures.len(), 1);
    assert_eq!(h.db.get_task(id).unwrap().title, "local");
    let after = h.db.record_for_task(id).unwrap().unwrap();
    assert_eq!(after.last_sync, before.last_sync);

    h.remote.fail_ids.clear();
    h.tick();
    let report = h.sync();
    assert!(report.failures.is_empty());
    assert_eq!(h.remote.inner.tasks(&list)[0].title, "local");
    assert_eq!(h.db.get_task(id).unwrap().notes.as_deref(), Some("remote"));
}

#[test]
fn remote_not_found_orphans_the_record() {
    let mut h = Harness::new();
    let id = h.add("a");
    h.sync();
    h.tick();

    let list = h.list.clone();
    let remote_id = h.remote_id(id);
    h.remote.inner.purge_task(&list, &remote_id).unwrap();
    h.edit(id, |t| t.title = "a2".to_string());
    h.tick();

    let report = h.sync();
    assert!(report.failures.is_empty());
    assert!(h.db.record_for_task(id).unwrap().is_none());
    assert!(h.local_tree().is_empty());
}

#[test]
fn remote_deletion_deletes_locally() {
    let mut h = Harness::new();
    let id = h.add("a");
    h.sync();
    h.tick();

    let list = h.list.clone();
    let remote_id = h.remote_id(id);
    h.remote.inner.delete_task(&list, &remote_id).unwrap();
    h.tick();
    h.sync();

    assert!(h.db.get_task(id).unwrap().is_deleted());
    assert!(h.db.record_for_task(id).unwrap().is_none());
}

#[test]
fn hidden_known_task_is_deleted_locally() {
    let mut h = Harness::new();
    let id = h.add("a");
    h.add("b");
    h.edit(id, |t| t.completed = Some(start()));
    h.sync();
    h.tick();

    let list = h.list.clone();
    h.remote.inner.clear_completed(&list).unwrap();
    h.tick();
    h.sync();

    assert!(h.db.get_task(id).unwrap().is_deleted());
    assert_eq!(h.local_tree(), rows(&[(0, "b")]));
}

#[test]
fn local_delete_is_pushed_and_record_purged() {
    let mut h = Harness::new();
    let a = h.add("a");
    let a1 = h.add("a1");
    let list = h.list.clone();
    updater::indent_task(&mut h.db, &list, a1, 1).unwrap();
    h.sync();
    h.tick();

    let now = h.now();
    updater::delete_task_cascading(&mut h.db, &list, a, now).unwrap();
    h.edit(a, |t| t.deleted = Some(now));
    h.tick();

    let report = h.sync();
    assert_eq!(report.deleted, 1);
    assert!(report.failures.is_empty());
    assert!(h.db.record_for_task(a).unwrap().is_none());
    assert_eq!(h.remote_tree(), rows(&[(0, "a1")]));
    assert_eq!(h.local_tree(), rows(&[(0, "a1")]));
}

#[test]
fn local_move_is_pushed() {
    let mut h = Harness::new();
    h.add("a");
    h.add("b");
    let c = h.add("c");
    h.sync();
    h.tick();

    let list = h.list.clone();
    let first = h.db.active_records(&list).unwrap()[0].task_id;
    updater::move_task(&mut h.db, &list, c, MoveTarget::Before(first)).unwrap();
    h.tick();
    h.sync();

    assert_eq!(h.remote_tree(), rows(&[(0, "c"), (0, "a"), (0, "b")]));
    assert_eq!(h.local_tree(), rows(&[(0, "c"), (0, "a"), (0, "b")]));
    assert!(!h.db.record_for_task(c).unwrap().unwrap().moved);
}

#[test]
fn failed_move_is_kept_and_retried() {
    let mut h = Harness::new();
    h.add("a");
    h.add("b");
    let c = h.add("c");
    h.sync();
    h.tick();

    let list = h.list.clone();
    let first = h.db.active_records(&list).unwrap()[0].task_id;
    updater::move_task(&mut h.db, &list, c, MoveTarget::Before(first)).unwrap();
    let remote_c = h.remote_id(c);
    h.remote.fail_ids.insert(remote_c);
    h.tick();

    let report = h.sync();
    assert_eq!(report.failures.len(), 1);
    assert_eq!(h.remote_tree(), rows(&[(0, "a"), (0, "b"), (0, "c")]));
    assert_eq!(h.local_tree(), rows(&[(0, "c"), (0, "a"), (0, "b")]));
    assert!(h.db.record_for_task(c).unwrap().unwrap().moved);

    h.remote.fail_ids.clear();
    h.tick();
    let report = h.sync();
    assert!(report.failures.is_empty());
    assert_eq!(h.remote_tree(), rows(&[(0, "c"), (0, "a"), (0, "b")]));
    assert_eq!(h.local_tree(), rows(&[(0, "c"), (0, "a"), (0, "b")]));
    assert!(!h.db.record_for_task(c).unwrap().unwrap().moved);
}

#[test]
fn completed_instance_and_new_instance_stay_distinct() {
    let mut h = Harness::new();
    let old = h.add("Water plants");
    h.sync();
    h.tick();

    // A recurring task: the remote completes one instance and creates the next.
    let list = h.list.clone();
    let remote_id = h.remote_id(old);
    let done_at = h.now();
    h.remote.inner.edit_task(&list, &remote_id, |t| t.completed = Some(done_at)).unwrap();
    h.remote
        .inner
        .create_task(&list, &new_remote("Water plants"), None, Some(&remote_id))
        .unwrap();
    h.tick();
    h.sync();

    assert_eq!(h.local_tree(), rows(&[(0, "Water plants"), (0, "Water plants")]));
    let records = h.db.active_records(&list).unwrap();
    assert_eq!(records[0].task_id, old);
    assert!(h.db.get_task(old).unwrap().is_completed());
    assert!(!h.db.get_task(records[1].task_id).unwrap().is_completed());
    assert_ne!(records[0].remote_id, records[1].remote_id);
}

#[test]
fn pull_never_notifies_and_never_looks_modified() {
    let mut h = Harness::new();
    let notified = Arc::new(AtomicUsize::new(0));
    let counter = notified.clone();
    h.db.set_change_hook(Box::new(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));
    let list = h.list.clone();
    h.remote.inner.create_task(&list, &new_remote("from remote"), None, None).unwrap();
    h.tick();

    h.sync();

    assert_eq!(notified.load(Ordering::SeqCst), 0);
    let record = h.db.active_records(&list).unwrap().remove(0);
    let task = h.db.get_task(record.task_id).unwrap();
    assert!(!record.needs_push(&task));
    assert!(!has_pending_work(&h.db, &list).unwrap());
}

#[test]
fn truncated_remote_title_keeps_local_value() {
    let mut h = Harness::new();
    h.settings.limits.title = 5;
    let id = h.add("a long title");
    h.sync();
    let list = h.list.clone();
    assert_eq!(h.remote.inner.tasks(&list)[0].title, "a lon");
    h.tick();

    let remote_id = h.remote_id(id);
    h.remote.inner.edit_task(&list, &remote_id, |t| t.notes = Some("n".into())).unwrap();
    h.tick();
    h.sync();

    let task = h.db.get_task(id).unwrap();
    assert_eq!(task.title, "a long title");
    assert_eq!(task.notes.as_deref(), Some("n"));
}

#[test]
fn watermark_advances_to_newest_remote_change() {
    let mut h = Harness::new();
    let list = h.list.clone();
    let task = h.remote.inner.create_task(&list, &new_remote("x"), None, None).unwrap();
    h.tick();
    h.sync();

    let mark = h.db.find_list(&list).unwrap().unwrap().last_sync.unwrap();
    assert!(mark >= task.updated);
}

#[test]
fn watermark_stays_below_a_skipped_entry() {
    let mut h = Harness::new();
    let id = h.add("a");
    h.sync();
    h.tick();

    let list = h.list.clone();
    let remote_id = h.remote_id(id);
    let edited =
        h.remote.inner.edit_task(&list, &remote_id, |t| t.notes = Some("r".into())).unwrap();
    h.edit(id, |t| t.title = "local".to_string());
    h.remote.fail_ids.insert(remote_id);
    h.tick();
    h.sync();

    let mark = h.db.find_list(&list).unwrap().unwrap().last_sync.unwrap();
    assert!(mark < edited.updated);
}

#[test]
fn cancelled_pass_stops_before_pushing() {
    let mut h = Harness::new();
    h.add("a");
    let cancel = CancelToken::new();
    cancel.cancel();

    let err = h.try_sync_with(cancel).unwrap_err();
    assert!(matches!(err, SyncError::Cancelled));
    assert!(h.remote_tree().is_empty());
}

#[test]
fn unauthorized_aborts_the_pass() {
    let mut h = Harness::new();
    h.add("a");
    let list = h.list.clone();
    h.remote.unauthorized_lists.insert(list);

    let err = h.try_sync().unwrap_err();
    assert!(matches!(err, SyncError::Unauthorized(_)));
}

#[test]
fn pending_work_detects_local_edits() {
    let mut h = Harness::new();
    let id = h.add("a");
    let list = h.list.clone();
    assert!(has_pending_work(&h.db, &list).unwrap());
    h.sync();
    assert!(!has_pending_work(&h.db, &list).unwrap());
    h.tick();
    h.edit(id, |t| t.title = "b".to_string());
    assert!(has_pending_work(&h.db, &list).unwrap());
}

#[test]
fn remote_error_maps_unauthorized() {
    let err: SyncError = RemoteError::Unauthorized("x".into()).into();
    assert!(matches!(err, SyncError::Unauthorized(_)));
    let err: SyncError = RemoteError::Io("x".into()).into();
    assert!(matches!(err, SyncError::Remote(RemoteError::Io(_))));
}
