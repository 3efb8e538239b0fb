//! History page cache.
//!
//! Every document carries a generation counter that invalidation bumps. A
//! reader takes the generation before it queries the store and hands it back
//! on insert; a page read before a concurrent append is then discarded
//! instead of being cached over the fresh state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use folio_core::cache::TtlCache;
use folio_core::clock::Clock;
use folio_core::config::EngineConfig;
use folio_core::model::HistoryPage;

/// `(document, limit, offset)`
type HistoryKey = (String, u64, u64);

pub struct HistoryCache {
    pages: TtlCache<HistoryKey, HistoryPage>,
    generations: Mutex<HashMap<String, u64>>,
}

impl HistoryCache {
    pub fn new(ttl: chrono::Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            pages: TtlCache::new(ttl, clock),
            generations: Mutex::new(HashMap::new()),
        }
    }

    /// `None` when the config disables caching
    pub fn from_config(config: &EngineConfig, clock: Arc<dyn Clock>) -> Option<Self> {
        config.history_cache_ttl.map(|ttl| Self::new(ttl, clock))
    }

    /// Current generation of `document_id`; take it before reading the store.
    pub fn generation(&self, document_id: &str) -> u64 {
        self.generations
            .lock()
            .map(|g| g.get(document_id).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn get(&self, document_id: &str, limit: u64, offset: u64) -> Option<HistoryPage> {
        self.pages.get(&(document_id.to_string(), limit, offset))
    }

    /// Cache `page` unless the document was invalidated since `generation`
    /// was taken. Returns whether the page was stored.
    pub fn insert(
        &self,
        document_id: &str,
        limit: u64,
        offset: u64,
        generation: u64,
        page: HistoryPage,
    ) -> bool {
        let Ok(generations) = self.generations.lock() else {
            return false;
        };
        if generations.get(document_id).copied().unwrap_or(0) != generation {
            return false;
        }
        // Held across the insert so an invalidation cannot slip in between.
        self.pages
            .insert((document_id.to_string(), limit, offset), page);
        drop(generations);
        true
    }

    pub fn invalidate_document(&self, document_id: &str) {
        if let Ok(mut generations) = self.generations.lock() {
            *generations.entry(document_id.to_string()).or_insert(0) += 1;
            self.pages.invalidate_where(|(doc, _, _)| doc == document_id);
        }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
