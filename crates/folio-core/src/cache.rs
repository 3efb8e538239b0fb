//! Explicit TTL cache with an injected clock.
//!
//! Owned by whoever constructs it (the engine context); there is no
//! process-wide instance. Expiry is checked on read.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use crate::clock::Clock;

struct Entry<V> {
    value: V,
    stored_at: DateTime<Utc>,
}

pub struct TtlCache<K, V> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fresh value for `key`; stale entries are evicted on the way out.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().ok()?;
        match entries.get(key) {
            Some(entry) if now - entry.stored_at <= self.ttl => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store `value`, sweeping out every entry that has already expired.
    pub fn insert(&self, key: K, value: V) {
        let stored_at = self.clock.now();
        if let Ok(mut entries) = self.entries.lock() {
            entries.retain(|_, entry| stored_at - entry.stored_at <= self.ttl);
            entries.insert(key, Entry { value, stored_at });
        }
    }

    /// Drop every entry whose key matches `predicate`.
    pub fn invalidate_where<F>(&self, predicate: F)
    where
        F: Fn(&K) -> bool,
    {
        if let Ok(mut entries) = self.entries.lock() {
            entries.retain(|k, _| !predicate(k));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
