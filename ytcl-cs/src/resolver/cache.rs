//! TTL cache for consensus lookups
//!
//! A small read-mostly map in front of the consensus store. The clock is
//! injected so tests can expire entries deterministically instead of
//! sleeping. Expired entries are dropped lazily on access; there is no
//! sweeper task.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

/// Time source for cache expiry
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock time, the production clock
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// Key-value cache whose entries expire a fixed TTL after insertion
///
/// Values are cloned out on read; keep them cheap to clone.
pub struct TtlCache<V> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Fresh value for a key, or None when absent or expired
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();

        {
            let entries = self.entries.read().unwrap();
            match entries.get(key) {
                Some(entry) if now.duration_since(entry.inserted_at) < self.ttl => {
                    return Some(entry.value.clone());
                }
                Some(_) => {} // expired, drop below
                None => return None,
            }
        }

        // Upgrade to a write lock to evict the expired entry. Re-check age:
        // another writer may have refreshed the key in between.
        let mut entries = self.entries.write().unwrap();
        if let Some(entry) = entries.get(key) {
            if now.duration_since(entry.inserted_at) < self.ttl {
                return Some(entry.value.clone());
            }
            entries.remove(key);
        }
        None
    }

    /// Insert or refresh a key; the TTL window restarts now
    pub fn insert(&self, key: String, value: V) {
        let entry = CacheEntry {
            value,
            inserted_at: self.clock.now(),
        };
        self.entries.write().unwrap().insert(key, entry);
    }

    /// Drop one entry, or everything when no key is given
    pub fn invalidate(&self, key: Option<&str>) {
        let mut entries = self.entries.write().unwrap();
        match key {
            Some(key) => {
                entries.remove(key);
            }
            None => entries.clear(),
        }
    }

    /// Number of entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::ManualClock;
    use super::*;

    fn cache_with_manual_clock(ttl_secs: u64) -> (TtlCache<i32>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = TtlCache::new(Duration::from_secs(ttl_secs), clock.clone());
        (cache, clock)
    }

    #[test]
    fn test_hit_within_ttl() {
        let (cache, clock) = cache_with_manual_clock(300);

        cache.insert("key".to_string(), 7);
        assert_eq!(cache.get("key"), Some(7));

        clock.advance(Duration::from_secs(299));
        assert_eq!(cache.get("key"), Some(7));
    }

    #[test]
    fn test_expiry_after_ttl() {
        let (cache, clock) = cache_with_manual_clock(300);

        cache.insert("key".to_string(), 7);
        clock.advance(Duration::from_secs(300));

        assert_eq!(cache.get("key"), None);
        // Expired entry was evicted, not just hidden
        assert!(cache.is_empty());
    }

    #[test]
    fn test_insert_restarts_ttl() {
        let (cache, clock) = cache_with_manual_clock(300);

        cache.insert("key".to_string(), 1);
        clock.advance(Duration::from_secs(200));
        cache.insert("key".to_string(), 2);
        clock.advance(Duration::from_secs(200));

        // 400s after the first insert, 200s after the refresh
        assert_eq!(cache.get("key"), Some(2));
    }

    #[test]
    fn test_invalidate_single_key() {
        let (cache, _clock) = cache_with_manual_clock(300);

        cache.insert("a".to_string(), 1);
        cache.insert("b".to_string(), 2);

        cache.invalidate(Some("a"));
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(2));
    }

    #[test]
    fn test_invalidate_all() {
        let (cache, _clock) = cache_with_manual_clock(300);

        cache.insert("a".to_string(), 1);
        cache.insert("b".to_string(), 2);

        cache.invalidate(None);
        assert!(cache.is_empty());
    }
}
