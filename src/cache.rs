//! Process-wide TTL cache for dashboard aggregates.
//!
//! Flat key -> (value, expiry) map. Entries are evicted lazily on read and
//! eagerly via [`TtlCache::invalidate_prefix`] when the tables they summarize
//! are written. Per-process only; a horizontally scaled deployment would see
//! stale reads across instances, which is acceptable for a single-user tool.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Cache key for the lifetime revenue aggregate.
pub const KEY_LIFETIME_REVENUE: &str = "dashboard:lifetime_revenue";
/// Cache key prefix for all dashboard aggregates.
pub const PREFIX_DASHBOARD: &str = "dashboard:";

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// A flat TTL cache.
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, Entry<V>>>,
    default_ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    /// Create a cache with the given default TTL.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            default_ttl,
        }
    }

    /// Look up a key, evicting it if expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if Instant::now() < entry.expires_at => {
                tracing::trace!(key, "cache hit");
                Some(entry.value.clone())
            }
            Some(_) => {
                tracing::trace!(key, "cache expired");
                entries.remove(key);
                None
            }
            None => {
                tracing::trace!(key, "cache miss");
                None
            }
        }
    }

    /// Store a value under the default TTL.
    pub fn set(&self, key: &str, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    /// Store a value with an explicit TTL.
    pub fn set_with_ttl(&self, key: &str, value: V, ttl: Duration) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Drop every entry whose key starts with `prefix`.
    pub fn invalidate_prefix(&self, prefix: &str) {
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|key, _| !key.starts_with(prefix));
    }

    /// Drop all entries.
    pub fn clear(&self) {
        let mut entries = self.entries.lock().unwrap();
        let count = entries.len();
        entries.clear();
        if count > 0 {
            tracing::trace!(count, "cache cleared");
        }
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let cache: TtlCache<i64> = TtlCache::new(Duration::from_secs(60));
        cache.set("dashboard:mrr", 1200);
        assert_eq!(cache.get("dashboard:mrr"), Some(1200));
        assert_eq!(cache.get("dashboard:other"), None);
    }

    #[test]
    fn test_expiry() {
        let cache: TtlCache<i64> = TtlCache::new(Duration::from_secs(60));
        cache.set_with_ttl("short", 1, Duration::from_millis(0));
        assert_eq!(cache.get("short"), None);
    }

    #[test]
    fn test_prefix_invalidation() {
        let cache: TtlCache<i64> = TtlCache::new(Duration::from_secs(60));
        cache.set("dashboard:revenue", 5000);
        cache.set("dashboard:charts", 3);
        cache.set("reports:monthly", 7);

        cache.invalidate_prefix("dashboard:");

        assert_eq!(cache.get("dashboard:revenue"), None);
        assert_eq!(cache.get("dashboard:charts"), None);
        assert_eq!(cache.get("reports:monthly"), Some(7));
    }
}
