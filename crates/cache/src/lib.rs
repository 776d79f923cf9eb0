//! Questlog Cache - In-memory caching for immutable reference data
//!
//! Quest and challenge definitions change rarely, so the HTTP client keeps
//! them here between refreshes. Per-player state is never cached.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default TTL for definition lists
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Default entry bound
pub const DEFAULT_MAX_ENTRIES: usize = 500;

/// Cached item with expiration
struct CacheEntry<T> {
    value: T,
    inserted_at: Instant,
    ttl: Duration,
}

impl<T> CacheEntry<T> {
    fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() > self.ttl
    }
}

/// Thread-safe keyed cache with TTL and max-entry bounds
pub struct TtlCache<T: Clone> {
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
    default_ttl: Duration,
    max_entries: usize,
}

impl<T: Clone> TtlCache<T> {
    pub fn with_capacity(default_ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn new(default_ttl: Duration) -> Self {
        Self::with_capacity(default_ttl, DEFAULT_MAX_ENTRIES)
    }

    /// Get a value if present and not expired
    pub fn get(&self, key: &str) -> Option<T> {
        let entries = self.entries.read().ok()?;
        let entry = entries.get(key)?;

        if entry.is_expired() {
            debug!("Cache entry '{}' expired", key);
            None
        } else {
            Some(entry.value.clone())
        }
    }

    /// Insert with the default TTL
    pub fn insert(&self, key: impl Into<String>, value: T) {
        self.insert_with_ttl(key, value, self.default_ttl);
    }

    /// Insert with a custom TTL. Evicts expired entries, then the oldest, when full.
    pub fn insert_with_ttl(&self, key: impl Into<String>, value: T, ttl: Duration) {
        let key = key.into();
        if let Ok(mut entries) = self.entries.write() {
            if !entries.contains_key(&key) && entries.len() >= self.max_entries {
                entries.retain(|_, entry| !entry.is_expired());
            }

            if !entries.contains_key(&key) && entries.len() >= self.max_entries {
                if let Some(oldest_key) = entries
                    .iter()
                    .min_by_key(|(_, e)| e.inserted_at)
                    .map(|(k, _)| k.clone())
                {
                    entries.remove(&oldest_key);
                }
            }

            entries.insert(
                key,
                CacheEntry {
                    value,
                    inserted_at: Instant::now(),
                    ttl,
                },
            );
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone> Default for TtlCache<T> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_TTL, DEFAULT_MAX_ENTRIES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_entries_are_misses() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60));
        cache.insert_with_ttl("a", 1, Duration::ZERO);
        cache.insert("b", 2);

        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(2));
    }

    #[test]
    fn full_cache_drops_expired_before_oldest() {
        let cache: TtlCache<u32> = TtlCache::with_capacity(Duration::from_secs(60), 2);
        cache.insert("old", 1);
        std::thread::sleep(Duration::from_millis(2));
        cache.insert_with_ttl("stale", 2, Duration::ZERO);
        std::thread::sleep(Duration::from_millis(5));
        cache.insert("new", 3);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("old"), Some(1));
        assert_eq!(cache.get("new"), Some(3));
    }

    #[test]
    fn full_cache_evicts_oldest() {
        let cache: TtlCache<&str> = TtlCache::with_capacity(Duration::from_secs(60), 2);
        cache.insert("first", "1");
        std::thread::sleep(Duration::from_millis(2));
        cache.insert("second", "2");
        std::thread::sleep(Duration::from_millis(2));
        cache.insert("third", "3");

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("first"), None);
        assert_eq!(cache.get("third"), Some("3"));
    }

    #[test]
    fn overwriting_a_key_does_not_evict() {
        let cache: TtlCache<u8> = TtlCache::with_capacity(Duration::from_secs(60), 2);
        cache.insert("x", 1);
        cache.insert("y", 2);
        cache.insert("y", 3);

        assert_eq!(cache.get("x"), Some(1));
        assert_eq!(cache.get("y"), Some(3));
        assert!(!cache.is_empty());
    }
}
