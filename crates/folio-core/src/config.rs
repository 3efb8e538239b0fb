//! Engine configuration.

use chrono::Duration;

use crate::diff::DiffSchema;
use crate::lease::default_lease_timeout;

/// Default upper bound on edit reason length, in characters
pub const DEFAULT_MAX_REASON_LEN: usize = 500;

/// Lifetime of a cached history page when caching is switched on, in seconds
pub const DEFAULT_HISTORY_CACHE_TTL_SECS: i64 = 30;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Lease age after which another actor may reclaim a document
    pub lease_timeout: Duration,
    pub max_reason_len: usize,
    /// `None` (the default) disables history caching. A cached page only
    /// sees writes made through the same engine context.
    pub history_cache_ttl: Option<Duration>,
    pub diff_schema: DiffSchema,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lease_timeout: default_lease_timeout(),
            max_reason_len: DEFAULT_MAX_REASON_LEN,
            history_cache_ttl: None,
            diff_schema: DiffSchema::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_lease_timeout(mut self, timeout: Duration) -> Self {
        self.lease_timeout = timeout;
        self
    }

    pub fn with_history_cache(mut self, ttl: Duration) -> Self {
        self.history_cache_ttl = Some(ttl);
        self
    }

    /// Cache history pages for the default TTL
    pub fn with_default_history_cache(self) -> Self {
        self.with_history_cache(Duration::seconds(DEFAULT_HISTORY_CACHE_TTL_SECS))
    }
}
