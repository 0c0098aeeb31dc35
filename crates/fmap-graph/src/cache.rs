//! Bounded LRU cache of topology snapshots.
//!
//! Redraws happen far more often than fetches: every filter toggle wants
//! the current graph back immediately while the next fetch is still in
//! flight. The cache keeps the two entry kinds the builder writes per
//! fetch — a generic per-application entry (active channel + channel
//! list) and a channel-scoped entry (nodes, links, clusters, YAML) — and
//! evicts least-recently-used entries once the capacity bound is hit.
//!
//! The cache is plain injected state owned by the caller. There is no
//! global store and no interior mutability; a caller that wants sharing
//! across views decides the wrapping itself.

use std::num::NonZeroUsize;

use lru::LruCache;

use fmap_model::{Link, Node};

/// Default number of stored entries (two per viewed application).
pub const DEFAULT_CACHE_CAPACITY: usize = 32;

/// Generic per-application entry: which channel was last active.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoredChannels {
    pub active_channel: Option<String>,
    pub channels: Vec<String>,
}

/// Channel-scoped entry: the drawable graph itself.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StoredElements {
    pub clusters: Vec<String>,
    pub links: Vec<Link>,
    pub nodes: Vec<Node>,
    pub yaml: String,
}

#[derive(Debug, Clone)]
enum StoredEntry {
    Channels(StoredChannels),
    Elements(StoredElements),
}

/// Counters describing cache effectiveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
    pub capacity: usize,
}

impl CacheStats {
    /// Fraction of lookups served from the cache (0.0 to 1.0).
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// LRU store for topology snapshots, keyed by caller-supplied strings.
///
/// Keys are stored whole rather than hashed: serving a colliding entry
/// here would hand the caller a wrong graph, not a wrong integer.
/// Writing under an existing key overwrites the value and refreshes its
/// recency; that overwrite is the only invalidation that exists.
#[derive(Debug)]
pub struct SnapshotCache {
    cache: LruCache<String, StoredEntry>,
    hits: u64,
    misses: u64,
}

impl SnapshotCache {
    /// Create a cache bounded to `capacity` entries (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Create a cache with [`DEFAULT_CACHE_CAPACITY`] entries.
    #[must_use]
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }

    /// Key of the channel-scoped entry for a store key + active channel.
    #[must_use]
    pub fn element_key(store_key: &str, channel: &str) -> String {
        format!("{store_key}-{channel}")
    }

    /// Store the generic per-application entry.
    pub fn store_channels(&mut self, store_key: &str, entry: StoredChannels) {
        self.cache
            .put(store_key.to_string(), StoredEntry::Channels(entry));
    }

    /// Store a channel-scoped graph entry.
    pub fn store_elements(&mut self, key: &str, entry: StoredElements) {
        self.cache.put(key.to_string(), StoredEntry::Elements(entry));
    }

    /// Fetch the generic entry for a store key, counting hit/miss.
    pub fn channels(&mut self, store_key: &str) -> Option<&StoredChannels> {
        match self.cache.get(store_key) {
            Some(StoredEntry::Channels(entry)) => {
                self.hits += 1;
                Some(entry)
            }
            _ => {
                self.misses += 1;
                None
            }
        }
    }

    /// Fetch a channel-scoped entry, counting hit/miss.
    pub fn elements(&mut self, key: &str) -> Option<&StoredElements> {
        match self.cache.get(key) {
            Some(StoredEntry::Elements(entry)) => {
                self.hits += 1;
                Some(entry)
            }
            _ => {
                self.misses += 1;
                None
            }
        }
    }

    /// Current statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            size: self.cache.len(),
            capacity: self.cache.cap().get(),
        }
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&mut self) {
        self.cache.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
