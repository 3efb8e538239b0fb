// Version history commands: save path, history paging, cache, compare, restore

mod common;

use chrono::Duration;
use common::*;
use folio_core::config::EngineConfig;
use folio_core::errors::ExErrorKind;
use folio_core::model::{Actor, FieldValue};
use folio_core::notifier::ChangeEvent;
use folio_engine::commands::lease::{acquire_lease, lease_status, AcquireOutcome};
use folio_engine::commands::version::{
    compare_versions, count_versions, create_document, create_version, get_history, get_version,
    load_document, restore_version, save_with_version,
};
use folio_engine::EngineContext;
use std::sync::Arc;

#[test]
fn test_version_numbers_are_consecutive() {
    let mut repo = setup_test_repo();
    document_with_versions(&mut repo, "D", 6);

    let page = get_history(&repo.conn, &repo.ctx, "D", 100, 0).unwrap();
    let numbers: Vec<u64> = page.versions.iter().rev().map(|v| v.version).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn test_refetch_is_identical() {
    let mut repo = setup_test_repo();
    document_with_versions(&mut repo, "D", 2);

    let first = get_version(&repo.conn, "D", 1).unwrap();
    save_as(&mut repo, "D", "alice", post("later", "changed", vec!["z"]));
    let again = get_version(&repo.conn, "D", 1).unwrap();

    assert_eq!(first, again);
}

#[test]
fn test_versions_are_per_document() {
    let mut repo = setup_test_repo();
    document_with_versions(&mut repo, "A", 3);
    document_with_versions(&mut repo, "B", 1);

    assert_eq!(count_versions(&repo.conn, "A").unwrap(), 3);
    assert_eq!(count_versions(&repo.conn, "B").unwrap(), 1);
    assert_eq!(get_version(&repo.conn, "B", 1).unwrap().document, "B");
}

#[test]
fn test_save_without_lease_is_forbidden() {
    let mut repo = setup_test_repo();
    create_document(&repo.conn, &repo.ctx, Some("D".into()), title_only("A")).unwrap();

    let err = save_with_version(&mut repo.conn, &repo.ctx, "D", "alice", title_only("B"), None)
        .unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::Forbidden);
    assert_eq!(count_versions(&repo.conn, "D").unwrap(), 0);
}

#[test]
fn test_save_by_non_holder_conflicts() {
    let mut repo = setup_test_repo();
    create_document(&repo.conn, &repo.ctx, Some("D".into()), title_only("A")).unwrap();
    acquire_lease(&mut repo.conn, &repo.ctx, "D", "alice").unwrap();

    let err = save_with_version(&mut repo.conn, &repo.ctx, "D", "bob", title_only("B"), None)
        .unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::Conflict);
    assert_eq!(err.holder(), Some("alice"));
    assert_eq!(load_document(&repo.conn, "D").unwrap().state, title_only("A"));
}

#[test]
fn test_save_updates_state_and_clears_lease() {
    let mut repo = setup_test_repo();
    create_document(&repo.conn, &repo.ctx, Some("D".into()), title_only("A")).unwrap();
    acquire_lease(&mut repo.conn, &repo.ctx, "D", "alice").unwrap();
    repo.clock.advance(Duration::minutes(3));

    save_with_version(&mut repo.conn, &repo.ctx, "D", "alice", title_only("B"), None).unwrap();

    let document = load_document(&repo.conn, "D").unwrap();
    assert_eq!(document.state, title_only("B"));
    assert_eq!(document.updated_at, t0() + Duration::minutes(3));
    assert!(!lease_status(&repo.conn, &repo.ctx, "D").unwrap().locked);
}

#[test]
fn test_overlong_reason_rejected_before_any_write() {
    let mut repo = setup_test_repo();
    create_document(&repo.conn, &repo.ctx, Some("D".into()), title_only("A")).unwrap();
    acquire_lease(&mut repo.conn, &repo.ctx, "D", "alice").unwrap();

    let reason = "x".repeat(501);
    let err = save_with_version(
        &mut repo.conn,
        &repo.ctx,
        "D",
        "alice",
        title_only("B"),
        Some(&reason),
    )
    .unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::Validation);
    assert_eq!(count_versions(&repo.conn, "D").unwrap(), 0);
    assert!(lease_status(&repo.conn, &repo.ctx, "D").unwrap().locked);
}

#[test]
fn test_malformed_state_rejected() {
    let mut repo = setup_test_repo();
    create_document(&repo.conn, &repo.ctx, Some("D".into()), title_only("A")).unwrap();
    acquire_lease(&mut repo.conn, &repo.ctx, "D", "alice").unwrap();

    let mut state = title_only("B");
    state.insert("tags".to_string(), FieldValue::from("not-a-list"));
    let err = save_with_version(&mut repo.conn, &repo.ctx, "D", "alice", state, None).unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::Validation);
}

#[test]
fn test_create_document_generates_id_and_rejects_duplicates() {
    let repo = setup_test_repo();

    let generated = create_document(&repo.conn, &repo.ctx, None, title_only("A")).unwrap();
    assert!(!generated.id.is_empty());
    assert_eq!(generated.created_at, t0());

    let err = create_document(
        &repo.conn,
        &repo.ctx,
        Some(generated.id.clone()),
        title_only("B"),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::AlreadyExists);
}

#[test]
fn test_history_pagination_and_has_more() {
    let mut repo = setup_test_repo();
    document_with_versions(&mut repo, "D", 5);

    let first = get_history(&repo.conn, &repo.ctx, "D", 2, 0).unwrap();
    assert_eq!(
        first.versions.iter().map(|v| v.version).collect::<Vec<_>>(),
        vec![5, 4]
    );
    assert!(first.has_more);
    assert_eq!(first.total, 5);

    let last = get_history(&repo.conn, &repo.ctx, "D", 2, 4).unwrap();
    assert_eq!(last.versions.len(), 1);
    assert!(!last.has_more);

    let beyond = get_history(&repo.conn, &repo.ctx, "D", 2, 10).unwrap();
    assert!(beyond.versions.is_empty());
    assert!(!beyond.has_more);
}

#[test]
fn test_history_of_unknown_document_is_not_found() {
    let repo = setup_test_repo();
    let err = get_history(&repo.conn, &repo.ctx, "ghost", 10, 0).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::NotFound);
}

#[test]
fn test_history_cache_is_invalidated_on_append() {
    let mut repo = setup_test_repo_with(EngineConfig::default().with_default_history_cache());
    document_with_versions(&mut repo, "D", 1);

    let before = get_history(&repo.conn, &repo.ctx, "D", 10, 0).unwrap();
    assert_eq!(before.total, 1);
    assert_eq!(repo.ctx.history_cache().unwrap().len(), 1);

    save_as(&mut repo, "D", "alice", title_only("next"));
    assert!(repo.ctx.history_cache().unwrap().is_empty());

    let after = get_history(&repo.conn, &repo.ctx, "D", 10, 0).unwrap();
    assert_eq!(after.total, 2);
}

#[test]
fn test_history_cache_serves_until_ttl() {
    let mut repo = setup_test_repo_with(EngineConfig::default().with_default_history_cache());
    document_with_versions(&mut repo, "D", 1);
    get_history(&repo.conn, &repo.ctx, "D", 10, 0).unwrap();

    // Written behind the engine's back: only visible once the page expires
    let other = EngineContext::default();
    acquire_lease(&mut repo.conn, &other, "D", "alice").unwrap();
    save_with_version(&mut repo.conn, &other, "D", "alice", title_only("x"), None).unwrap();

    assert_eq!(get_history(&repo.conn, &repo.ctx, "D", 10, 0).unwrap().total, 1);
    repo.clock.advance(Duration::seconds(31));
    assert_eq!(get_history(&repo.conn, &repo.ctx, "D", 10, 0).unwrap().total, 2);
}

#[test]
fn test_history_sees_writes_from_another_context_by_default() {
    let mut repo = setup_test_repo();
    document_with_versions(&mut repo, "D", 1);
    let reader = EngineContext::default();
    let reader_conn = folio_store::db::open_store(repo.db_path()).unwrap();

    assert!(reader.history_cache().is_none());
    assert_eq!(get_history(&reader_conn, &reader, "D", 10, 0).unwrap().total, 1);

    save_as(&mut repo, "D", "alice", title_only("next"));

    let after = get_history(&reader_conn, &reader, "D", 10, 0).unwrap();
    assert_eq!(after.total, 2);
    assert_eq!(after.versions[0].version, 2);
    assert_eq!(count_versions(&reader_conn, "D").unwrap(), 2);
}

#[test]
fn test_get_missing_version_is_not_found() {
    let mut repo = setup_test_repo();
    document_with_versions(&mut repo, "D", 1);

    let err = get_version(&repo.conn, "D", 2).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::NotFound);
    assert_eq!(err.version(), Some(2));
}

#[test]
fn test_compare_versions() {
    let mut repo = setup_test_repo();
    create_document(&repo.conn, &repo.ctx, Some("D".into()), title_only("A")).unwrap();
    save_as(&mut repo, "D", "alice", post("T", "short", vec!["a", "b"]));
    save_as(&mut repo, "D", "alice", post("T", "much longer", vec!["b", "c"]));

    let diff = compare_versions(&repo.conn, &repo.ctx, "D", 1, 2).unwrap();
    assert_eq!(diff.fields_changed, vec!["content", "tags"]);
    assert_eq!(diff.content_length_delta, 6);
    assert_eq!(diff.added_list_items["tags"], vec!["c"]);
    assert_eq!(diff.removed_list_items["tags"], vec!["a"]);

    let same = compare_versions(&repo.conn, &repo.ctx, "D", 2, 2).unwrap();
    assert!(same.is_empty());

    let err = compare_versions(&repo.conn, &repo.ctx, "D", 1, 9).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::NotFound);
}

#[test]
fn test_create_version_leaves_document_untouched() {
    let mut repo = setup_test_repo();
    create_document(&repo.conn, &repo.ctx, Some("D".into()), title_only("A")).unwrap();
    let before = load_document(&repo.conn, "D").unwrap();

    create_version(&mut repo.conn, &repo.ctx, "D", "alice", Some("checkpoint")).unwrap();
    let v2 = create_version(&mut repo.conn, &repo.ctx, "D", "alice", None).unwrap();

    assert_eq!(load_document(&repo.conn, "D").unwrap(), before);
    assert_eq!(v2.version, 2);
    assert!(v2.diff.is_empty());
    assert_eq!(v2.changes_summary, "No changes");
}

#[test]
fn test_restore_with_reason_and_notification() {
    let mut repo = setup_test_repo();
    document_with_versions(&mut repo, "D", 3);

    restore_version(
        &mut repo.conn,
        &repo.ctx,
        "D",
        1,
        &Actor::new("alice"),
        Some("revert spam"),
    )
    .unwrap();

    let v5 = get_version(&repo.conn, "D", 5).unwrap();
    assert_eq!(v5.changes_summary, "revert spam");
    assert!(repo.notifier.events().contains(&ChangeEvent::VersionRestored {
        document_id: "D".to_string(),
        restored_from: 1,
        before_version: 4,
        after_version: 5,
        restored_by: "alice".to_string(),
    }));
}

#[test]
fn test_restore_missing_target_writes_nothing() {
    let mut repo = setup_test_repo();
    document_with_versions(&mut repo, "D", 3);
    let before = load_document(&repo.conn, "D").unwrap();

    let err = restore_version(&mut repo.conn, &repo.ctx, "D", 42, &Actor::new("alice"), None)
        .unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::NotFound);
    assert_eq!(count_versions(&repo.conn, "D").unwrap(), 3);
    assert_eq!(load_document(&repo.conn, "D").unwrap(), before);
}

#[test]
fn test_restore_blocked_by_other_live_lease() {
    let mut repo = setup_test_repo();
    document_with_versions(&mut repo, "D", 2);
    acquire_lease(&mut repo.conn, &repo.ctx, "D", "bob").unwrap();

    let err = restore_version(&mut repo.conn, &repo.ctx, "D", 1, &Actor::new("alice"), None)
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Conflict);
    assert_eq!(count_versions(&repo.conn, "D").unwrap(), 2);

    repo.clock.advance(Duration::minutes(31));
    restore_version(&mut repo.conn, &repo.ctx, "D", 1, &Actor::new("alice"), None).unwrap();
    assert_eq!(count_versions(&repo.conn, "D").unwrap(), 4);
    assert_eq!(
        lease_status(&repo.conn, &repo.ctx, "D").unwrap().holder.as_deref(),
        Some("bob")
    );
}

#[test]
fn test_admin_restore_overrides_live_lease() {
    let mut repo = setup_test_repo();
    document_with_versions(&mut repo, "D", 2);
    acquire_lease(&mut repo.conn, &repo.ctx, "D", "alice").unwrap();

    let restored =
        restore_version(&mut repo.conn, &repo.ctx, "D", 1, &Actor::admin("root"), None).unwrap();

    assert_eq!(restored.state, get_version(&repo.conn, "D", 1).unwrap().snapshot);
    assert_eq!(count_versions(&repo.conn, "D").unwrap(), 4);
    assert_eq!(get_version(&repo.conn, "D", 4).unwrap().edited_by, "root");
    assert_eq!(
        lease_status(&repo.conn, &repo.ctx, "D").unwrap().holder.as_deref(),
        Some("alice")
    );
}

#[test]
fn test_restore_failing_midway_writes_nothing() {
    let mut repo = setup_test_repo();
    document_with_versions(&mut repo, "D", 3);
    let before = load_document(&repo.conn, "D").unwrap();
    // versions 4 (pre-restore) and 5 (restored) are written by one restore
    repo.conn
        .execute_batch(
            "CREATE TEMP TRIGGER fail_restored_snapshot BEFORE INSERT ON document_versions
             WHEN NEW.version = 5
             BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
        )
        .unwrap();

    let err = restore_version(&mut repo.conn, &repo.ctx, "D", 1, &Actor::new("alice"), None)
        .unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::Persistence);
    assert_eq!(count_versions(&repo.conn, "D").unwrap(), 3);
    assert_eq!(get_version(&repo.conn, "D", 4).unwrap_err().kind(), ExErrorKind::NotFound);
    assert_eq!(load_document(&repo.conn, "D").unwrap(), before);
    assert!(repo.notifier.events().is_empty());
}

#[test]
fn test_returned_values_match_stored_values_on_system_clock() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut conn = folio_store::db::open_store(dir.path().join("store.db")).unwrap();
    let ctx = EngineContext::default();

    let created = create_document(&conn, &ctx, Some("D".into()), title_only("A")).unwrap();
    assert_eq!(load_document(&conn, "D").unwrap(), created);

    let granted = acquire_lease(&mut conn, &ctx, "D", "alice").unwrap();
    let AcquireOutcome::Granted { since, .. } = &granted else {
        panic!("expected a grant, got {:?}", granted);
    };
    assert_eq!(lease_status(&conn, &ctx, "D").unwrap().since, Some(*since));

    let saved = save_with_version(&mut conn, &ctx, "D", "alice", title_only("B"), None).unwrap();
    assert_eq!(get_version(&conn, "D", saved.version).unwrap(), saved);
    assert_eq!(load_document(&conn, "D").unwrap().updated_at, saved.created_at);

    let restored =
        restore_version(&mut conn, &ctx, "D", 1, &Actor::new("alice"), None).unwrap();
    assert_eq!(load_document(&conn, "D").unwrap(), restored);
}

#[test]
fn test_restore_by_lease_holder_keeps_lease() {
    let mut repo = setup_test_repo();
    document_with_versions(&mut repo, "D", 2);
    acquire_lease(&mut repo.conn, &repo.ctx, "D", "alice").unwrap();

    restore_version(&mut repo.conn, &repo.ctx, "D", 1, &Actor::new("alice"), None).unwrap();

    let status = lease_status(&repo.conn, &repo.ctx, "D").unwrap();
    assert_eq!(status.holder.as_deref(), Some("alice"));
}

#[test]
fn test_notifier_failure_does_not_undo_restore() {
    let mut repo = setup_test_repo();
    document_with_versions(&mut repo, "D", 2);
    let ctx = EngineContext::default()
        .with_clock(repo.clock.clone())
        .with_notifier(Arc::new(FailingNotifier));

    let restored =
        restore_version(&mut repo.conn, &ctx, "D", 1, &Actor::new("alice"), None).unwrap();

    assert_eq!(restored.state, get_version(&repo.conn, "D", 1).unwrap().snapshot);
    assert_eq!(count_versions(&repo.conn, "D").unwrap(), 4);
}
