//! @dose
//! purpose: Memoization for scans. A DeclarationCache maps (file, scan options) to the last
//!     declaration list produced for that file, tagged with a fingerprint of the source it
//!     was produced from. A lookup only hits when the fingerprint of the current source
//!     matches; otherwise the caller rescans and stores the replacement. Capacity is bounded
//!     by least-recently-used eviction through LruMap, which the pattern cache shares.
//!
//! when-editing:
//!     - !A lookup hit must never rescan and a fingerprint mismatch must never hit
//!     - !Capacity 0 disables storage entirely; every lookup misses
//!     - The fingerprint detects change, nothing more. Do not use it for identity across files
//!
//! invariants:
//!     - len() <= capacity() after every insert
//!     - Eviction removes the entry with the oldest access tick
//!
//! gotchas:
//!     - Eviction scans all entries for the oldest tick, so an insert at capacity is O(n)

use std::borrow::Borrow;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHasher};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::scanner::ScanOptions;
use crate::types::Declaration;

/// Default number of files a DeclarationCache retains
pub const DEFAULT_CACHE_CAPACITY: usize = 512;

/// Fast, order-sensitive content hash used to detect source changes
pub fn fingerprint(source: &str) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(source.as_bytes());
    hasher.write_usize(source.len());
    hasher.finish()
}

/// A bounded map that evicts the least recently accessed entry
#[derive(Debug)]
pub struct LruMap<K, V> {
    entries: FxHashMap<K, (V, u64)>,
    capacity: usize,
    clock: u64,
}

impl<K: Eq + Hash + Clone, V> LruMap<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: FxHashMap::default(),
            capacity,
            clock: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up `key`, marking it as most recently used
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.clock += 1;
        let clock = self.clock;
        let entry = self.entries.get_mut(key)?;
        entry.1 = clock;
        Some(&entry.0)
    }

    /// Insert or replace `key`; returns the key evicted to make room, if any
    pub fn insert(&mut self, key: K, value: V) -> Option<K> {
        if self.capacity == 0 {
            return None;
        }
        self.clock += 1;
        let mut evicted = None;
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, (_, tick))| *tick)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                self.entries.remove(&oldest);
                evicted = Some(oldest);
            }
        }
        self.entries.insert(key, (value, self.clock));
        evicted
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    file: String,
    options: ScanOptions,
}

#[derive(Debug)]
struct CachedScan {
    fingerprint: u64,
    declarations: Arc<[Declaration]>,
}

/// Hit, miss and eviction counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Declaration lists keyed by (file, options) and validated by content fingerprint
#[derive(Debug)]
pub struct DeclarationCache {
    entries: LruMap<CacheKey, CachedScan>,
    stats: CacheStats,
}

impl Default for DeclarationCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl DeclarationCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: LruMap::new(capacity),
            stats: CacheStats::default(),
        }
    }

    /// The cached declarations for `file`, if they were produced from source with the
    /// same fingerprint
    pub fn lookup(
        &mut self,
        file: &str,
        options: ScanOptions,
        fingerprint: u64,
    ) -> Option<Arc<[Declaration]>> {
        let key = CacheKey {
            file: file.to_string(),
            options,
        };
        match self.entries.get(&key) {
            Some(entry) if entry.fingerprint == fingerprint => {
                self.stats.hits += 1;
                Some(Arc::clone(&entry.declarations))
            }
            _ => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Store a fresh scan, replacing any stale entry for the same key
    pub fn store(
        &mut self,
        file: &str,
        options: ScanOptions,
        fingerprint: u64,
        declarations: Vec<Declaration>,
    ) -> Arc<[Declaration]> {
        let declarations: Arc<[Declaration]> = declarations.into();
        let key = CacheKey {
            file: file.to_string(),
            options,
        };
        let entry = CachedScan {
            fingerprint,
            declarations: Arc::clone(&declarations),
        };
        if let Some(evicted) = self.entries.insert(key, entry) {
            debug!(file = %evicted.file, "cache entry evicted");
            self.stats.evictions += 1;
        }
        declarations
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DeclarationDetail;

    fn decl(name: &str) -> Declaration {
        Declaration::new(
            name,
            DeclarationDetail::Type {
                generics: None,
                definition: "string".to_string(),
            },
            0,
            1,
        )
    }

    #[test]
    fn test_fingerprint_is_order_sensitive() {
        assert_eq!(fingerprint("ab"), fingerprint("ab"));
        assert_ne!(fingerprint("ab"), fingerprint("ba"));
        assert_ne!(fingerprint(""), fingerprint(" "));
    }

    #[test]
    fn test_lru_evicts_least_recently_used() {
        let mut map = LruMap::new(2);
        assert_eq!(map.insert("a", 1), None);
        assert_eq!(map.insert("b", 2), None);
        assert_eq!(map.get("a"), Some(&1));
        assert_eq!(map.insert("c", 3), Some("b"));
        assert_eq!(map.len(), 2);
        assert!(map.get("b").is_none());
        // Replacing an existing key never evicts
        assert_eq!(map.insert("a", 10), None);
        assert_eq!(map.get("a"), Some(&10));
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let mut map = LruMap::new(0);
        assert_eq!(map.insert(1, "x"), None);
        assert!(map.is_empty());
        assert!(map.get(&1).is_none());
    }

    #[test]
    fn test_lookup_requires_matching_fingerprint() {
        let mut cache = DeclarationCache::new(4);
        let options = ScanOptions::default();
        assert!(cache.lookup("a.ts", options, 1).is_none());
        cache.store("a.ts", options, 1, vec![decl("A")]);

        let hit = cache.lookup("a.ts", options, 1).expect("cached");
        assert_eq!(hit[0].name, "A");
        assert!(cache.lookup("a.ts", options, 2).is_none());

        let commented = ScanOptions {
            keep_comments: true,
            ..Default::default()
        };
        assert!(cache.lookup("a.ts", commented, 1).is_none());
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 3,
                evictions: 0
            }
        );
    }

    #[test]
    fn test_store_replaces_stale_entry_and_counts_evictions() {
        let mut cache = DeclarationCache::new(1);
        let options = ScanOptions::default();
        cache.store("a.ts", options, 1, vec![decl("Old")]);
        cache.store("a.ts", options, 2, vec![decl("New")]);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().evictions, 0);
        assert_eq!(cache.lookup("a.ts", options, 2).expect("fresh")[0].name, "New");

        cache.store("b.ts", options, 3, vec![]);
        assert_eq!(cache.stats().evictions, 1);
        assert!(cache.lookup("a.ts", options, 2).is_none());
    }
}
