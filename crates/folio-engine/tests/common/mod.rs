#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use folio_core::clock::ManualClock;
use folio_core::config::EngineConfig;
use folio_core::errors::{ExError, ExErrorKind};
use folio_core::model::{FieldBag, FieldValue};
use folio_core::notifier::{ChangeEvent, ChangeNotifier};
use folio_engine::EngineContext;
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Records every event it is handed.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<ChangeEvent>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ChangeNotifier for RecordingNotifier {
    fn notify(&self, event: &ChangeEvent) -> Result<(), ExError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Fails every delivery.
pub struct FailingNotifier;

impl ChangeNotifier for FailingNotifier {
    fn notify(&self, _: &ChangeEvent) -> Result<(), ExError> {
        Err(ExError::new(ExErrorKind::Io).with_message("watcher endpoint unreachable"))
    }
}

pub struct TestRepo {
    pub dir: TempDir,
    pub conn: Connection,
    pub clock: Arc<ManualClock>,
    pub notifier: Arc<RecordingNotifier>,
    pub ctx: EngineContext,
}

impl TestRepo {
    pub fn db_path(&self) -> PathBuf {
        self.dir.path().join("store.db")
    }
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
}

pub fn setup_test_repo() -> TestRepo {
    setup_test_repo_with(EngineConfig::default())
}

pub fn setup_test_repo_with(config: EngineConfig) -> TestRepo {
    let dir = TempDir::new().unwrap();
    let conn = folio_store::db::open_store(dir.path().join("store.db")).unwrap();
    let clock = Arc::new(ManualClock::new(t0()));
    let notifier = Arc::new(RecordingNotifier::default());
    let ctx = EngineContext::new(config)
        .with_clock(clock.clone())
        .with_notifier(notifier.clone());
    TestRepo {
        dir,
        conn,
        clock,
        notifier,
        ctx,
    }
}

pub fn post(title: &str, content: &str, tags: Vec<&str>) -> FieldBag {
    let mut state = FieldBag::new();
    state.insert("title".to_string(), FieldValue::from(title));
    state.insert("content".to_string(), FieldValue::from(content));
    state.insert("tags".to_string(), FieldValue::from(tags));
    state
}

pub fn title_only(title: &str) -> FieldBag {
    let mut state = FieldBag::new();
    state.insert("title".to_string(), FieldValue::from(title));
    state
}

/// Acquire the lease as `actor` and save `state`, returning the new version number.
pub fn save_as(repo: &mut TestRepo, document_id: &str, actor: &str, state: FieldBag) -> u64 {
    let outcome =
        folio_engine::commands::lease::acquire_lease(&mut repo.conn, &repo.ctx, document_id, actor)
            .unwrap();
    assert!(outcome.is_granted(), "lease not granted: {:?}", outcome);
    folio_engine::commands::version::save_with_version(
        &mut repo.conn,
        &repo.ctx,
        document_id,
        actor,
        state,
        None,
    )
    .unwrap()
    .version
}

/// Create `document_id` and save `count` versions of it, titled `v1`..`vN`.
pub fn document_with_versions(repo: &mut TestRepo, document_id: &str, count: u64) {
    folio_engine::commands::version::create_document(
        &repo.conn,
        &repo.ctx,
        Some(document_id.to_string()),
        title_only("draft"),
    )
    .unwrap();
    for n in 1..=count {
        save_as(repo, document_id, "alice", post(&format!("v{}", n), "body", vec!["a"]));
    }
}
