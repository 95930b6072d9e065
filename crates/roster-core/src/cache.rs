//! # Response Cache
//!
//! A bounded LRU map with per-entry expiry, used by the HTTP layer to keep
//! rendered GET responses for the configured `max-age`.
//!
//! ## Design
//!
//! - `BTreeMap` storage, so iteration and eviction order are deterministic
//! - access recency is a logical counter, not wall time
//! - expiry is a caller-supplied tick (seconds since server start in the app);
//!   the cache never reads a clock itself

use std::collections::BTreeMap;

/// Default maximum number of entries.
pub const DEFAULT_CACHE_SIZE: usize = 1000;

/// Entries evicted at once when the cache is full.
pub const DEFAULT_EVICTION_BATCH: usize = 100;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    /// Tick at which the entry was stored.
    stored_at: u64,
    /// First tick at which the entry is stale.
    expires_at: u64,
    last_access: u64,
}

/// LRU cache with per-entry expiry.
#[derive(Debug)]
pub struct LruCache<K: Ord + Clone, V: Clone> {
    entries: BTreeMap<K, CacheEntry<V>>,
    max_size: usize,
    eviction_batch: usize,
    logical_clock: u64,
    hits: u64,
    misses: u64,
}

impl<K: Ord + Clone, V: Clone> Default for LruCache<K, V> {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_SIZE)
    }
}

/// A cache hit: the value and how many ticks ago it was stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cached<V> {
    pub value: V,
    pub age: u64,
}

impl<K: Ord + Clone, V: Clone> LruCache<K, V> {
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            max_size: max_size.max(1),
            eviction_batch: DEFAULT_EVICTION_BATCH,
            logical_clock: 0,
            hits: 0,
            misses: 0,
        }
    }

    #[must_use]
    pub fn with_eviction_batch(mut self, batch_size: usize) -> Self {
        self.eviction_batch = batch_size.max(1);
        self
    }

    /// Look up `key` at tick `now`. Stale entries count as a miss and are dropped.
    pub fn get(&mut self, key: &K, now: u64) -> Option<Cached<V>> {
        self.logical_clock = self.logical_clock.saturating_add(1);
        let stamp = self.logical_clock;

        let expired = match self.entries.get_mut(key) {
            Some(entry) if now < entry.expires_at => {
                entry.last_access = stamp;
                self.hits = self.hits.saturating_add(1);
                return Some(Cached {
                    value: entry.value.clone(),
                    age: now.saturating_sub(entry.stored_at),
                });
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove(key);
        }
        self.misses = self.misses.saturating_add(1);
        None
    }

    /// Store `value` at tick `now`, valid for `ttl` ticks. A zero ttl is a no-op.
    pub fn insert(&mut self, key: K, value: V, now: u64, ttl: u64) {
        if ttl == 0 {
            return;
        }
        self.logical_clock = self.logical_clock.saturating_add(1);
        let entry = CacheEntry {
            value,
            stored_at: now,
            expires_at: now.saturating_add(ttl),
            last_access: self.logical_clock,
        };

        if self.entries.len() >= self.max_size && !self.entries.contains_key(&key) {
            self.purge_expired(now);
            if self.entries.len() >= self.max_size {
                self.evict();
            }
        }
        self.entries.insert(key, entry);
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|e| e.value)
    }

    /// Drop every entry. Statistics are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.len(),
            max_size: self.max_size,
            hits: self.hits,
            misses: self.misses,
            hit_rate_percent: self.hit_rate_percent(),
        }
    }

    /// Hit rate as an integer percentage (0-100).
    #[must_use]
    pub fn hit_rate_percent(&self) -> u8 {
        let total = self.hits.saturating_add(self.misses);
        if total == 0 {
            return 0;
        }
        u8::try_from(self.hits.saturating_mul(100) / total).unwrap_or(100)
    }

    fn purge_expired(&mut self, now: u64) {
        self.entries.retain(|_, entry| now < entry.expires_at);
    }

    /// Evict the least recently used batch.
    fn evict(&mut self) {
        let to_evict = self.eviction_batch.min(self.entries.len());
        let mut by_access: Vec<(u64, K)> = self
            .entries
            .iter()
            .map(|(key, entry)| (entry.last_access, key.clone()))
            .collect();
        by_access.sort_by_key(|(stamp, _)| *stamp);

        for (_, key) in by_access.into_iter().take(to_evict) {
            self.entries.remove(&key);
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate_percent: u8,
}

/// Strong entity tag for a response body: hex of the first 16 bytes of its
/// BLAKE3 hash, quoted.
#[must_use]
pub fn etag(body: &[u8]) -> String {
    let hash = blake3::hash(body);
    let hex: String = hash.as_bytes()[..16]
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect();
    format!("\"{hex}\"")
}

/// Whether an `If-None-Match` header value matches `tag`.
///
/// Handles `*`, lists, and weak validators (`W/"..."`).
#[must_use]
pub fn if_none_match(header: &str, tag: &str) -> bool {
    header.split(',').map(str::trim).any(|candidate| {
        candidate == "*" || candidate.strip_prefix("W/").unwrap_or(candidate) == tag
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get_within_ttl() {
        let mut cache = LruCache::new(10);
        cache.insert(1u64, "a", 100, 120);

        assert_eq!(
            cache.get(&1, 130),
            Some(Cached { value: "a", age: 30 })
        );
        assert_eq!(cache.get(&2, 130), None);
    }

    #[test]
    fn expired_entry_is_a_miss_and_removed() {
        let mut cache = LruCache::new(10);
        cache.insert(1u64, "a", 0, 120);

        assert_eq!(cache.get(&1, 120), None);
        assert!(!cache.contains(&1));
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn zero_ttl_is_not_stored() {
        let mut cache = LruCache::new(10);
        cache.insert(1u64, "a", 0, 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn evicts_least_recently_used() {
        let mut cache = LruCache::new(3).with_eviction_batch(1);
        cache.insert(1u64, "a", 0, 100);
        cache.insert(2u64, "b", 0, 100);
        cache.insert(3u64, "c", 0, 100);

        let _ = cache.get(&1, 1);
        let _ = cache.get(&2, 1);
        cache.insert(4u64, "d", 1, 100);

        assert!(cache.contains(&1));
        assert!(cache.contains(&2));
        assert!(!cache.contains(&3));
        assert!(cache.contains(&4));
    }

    #[test]
    fn stale_entries_are_purged_before_evicting_live_ones() {
        let mut cache = LruCache::new(2).with_eviction_batch(1);
        cache.insert(1u64, "live", 0, 100);
        cache.insert(2u64, "stale", 0, 5);
        cache.insert(3u64, "new", 10, 100);

        assert!(cache.contains(&1));
        assert!(!cache.contains(&2));
        assert!(cache.contains(&3));
    }

    #[test]
    fn clear_keeps_stats() {
        let mut cache = LruCache::new(10);
        cache.insert(1u64, "a", 0, 10);
        let _ = cache.get(&1, 1);
        let _ = cache.get(&9, 1);
        cache.clear();

        assert!(cache.is_empty());
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.hit_rate_percent), (1, 1, 50));
    }

    #[test]
    fn overwrite_replaces_value() {
        let mut cache = LruCache::new(10);
        cache.insert(1u64, "old", 0, 10);
        cache.insert(1u64, "new", 5, 10);
        assert_eq!(cache.get(&1, 6).map(|c| c.value), Some("new"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn etag_is_stable_and_quoted() {
        let tag = etag(b"[]");
        assert_eq!(tag, etag(b"[]"));
        assert_ne!(tag, etag(b"{}"));
        assert_eq!(tag.len(), 34);
        assert!(tag.starts_with('"') && tag.ends_with('"'));
    }

    #[test]
    fn if_none_match_forms() {
        let tag = etag(b"body");
        assert!(if_none_match(&tag, &tag));
        assert!(if_none_match(&format!("\"x\", W/{tag}"), &tag));
        assert!(if_none_match("*", &tag));
        assert!(!if_none_match("\"other\"", &tag));
    }
}
