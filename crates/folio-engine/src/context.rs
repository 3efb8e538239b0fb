//! Engine context: the injected collaborators every command needs.
//!
//! One context per process (or per test). Nothing here is global; the
//! history cache lives and dies with its context.

use std::sync::Arc;

use chrono::{DateTime, Duration, DurationRound, Utc};
use folio_core::clock::{Clock, SystemClock};
use folio_core::config::EngineConfig;
use folio_core::notifier::{ChangeEvent, ChangeNotifier, NoopChangeNotifier};

use crate::cache::HistoryCache;

pub struct EngineContext {
    pub config: EngineConfig,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn ChangeNotifier>,
    history_cache: Option<HistoryCache>,
}

impl EngineContext {
    /// System clock, no-op notifier
    pub fn new(config: EngineConfig) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let history_cache = HistoryCache::from_config(&config, clock.clone());
        Self {
            config,
            clock,
            notifier: Arc::new(NoopChangeNotifier),
            history_cache,
        }
    }

    /// Replace the clock. The history cache is rebuilt against it.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.history_cache = HistoryCache::from_config(&self.config, clock.clone());
        self.clock = clock;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn ChangeNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Clock time truncated to the store's millisecond resolution, so values
    /// handed back to callers match what a later read returns.
    pub fn now(&self) -> DateTime<Utc> {
        let now = self.clock.now();
        now.duration_trunc(Duration::milliseconds(1)).unwrap_or(now)
    }

    pub fn history_cache(&self) -> Option<&HistoryCache> {
        self.history_cache.as_ref()
    }

    /// Deliver a change event. Failures are logged and dropped.
    pub(crate) fn notify(&self, event: ChangeEvent) {
        if let Err(err) = self.notifier.notify(&event) {
            tracing::warn!(
                notification = event.name(),
                document_id = event.document_id(),
                err_code = err.code(),
                error = %err,
                "change notification failed"
            );
        }
    }

    /// Drop cached history for a document after a version was appended.
    pub(crate) fn invalidate_history(&self, document_id: &str) {
        if let Some(cache) = &self.history_cache {
            cache.invalidate_document(document_id);
        }
    }
}

impl Default for EngineContext {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
