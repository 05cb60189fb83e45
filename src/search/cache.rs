//! LRU cache of canonical forms shared by batch workers.
//!
//! ## Cache Key Design
//!
//! The key is the xxh64 of the input's native notation, which covers
//! every field that affects the canonical form: labels, adjacency,
//! endpoint decorations and framing. The input diagram itself is stored
//! next to the cached form and compared on lookup (structure and
//! diagram attributes), so a key collision is a miss, never a wrong
//! answer.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use xxhash_rust::xxh64::xxh64;

use crate::canonical::{canonical, CanonicalError};
use crate::notation::to_native;
use crate::types::PlanarDiagram;

/// Configuration for the canonical-form cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries in the cache.
    pub max_entries: usize,
    /// Whether to enable the cache.
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            enabled: true,
        }
    }
}

impl CacheConfig {
    /// A configuration with caching turned off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Current number of entries in the cache.
    pub len: usize,
    /// Maximum capacity of the cache.
    pub cap: usize,
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that computed the canonical form.
    pub misses: u64,
}

type Entries = LruCache<u64, (PlanarDiagram, PlanarDiagram)>;

/// Memoizing wrapper around [`canonical`].
///
/// Cloning shares the underlying cache.
#[derive(Debug, Clone, Default)]
pub struct CanonicalCache {
    entries: Option<Arc<Mutex<Entries>>>,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl CanonicalCache {
    /// Create a cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let entries = config.enabled.then(|| {
            let size = NonZeroUsize::new(config.max_entries).unwrap_or(NonZeroUsize::MIN);
            Arc::new(Mutex::new(LruCache::new(size)))
        });
        Self {
            entries,
            hits: Arc::default(),
            misses: Arc::default(),
        }
    }

    /// Canonical form of `k`, from the cache when possible.
    pub fn canonical(&self, k: &PlanarDiagram) -> Result<PlanarDiagram, CanonicalError> {
        let Some(entries) = &self.entries else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return canonical(k);
        };

        let key = xxh64(to_native(k).as_bytes(), 0);
        if let Some((stored, form)) = entries.lock().get(&key) {
            if stored == k && stored.attrs() == k.attrs() {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(form.clone());
            }
        }

        // Computed outside the lock so workers do not serialize on it.
        self.misses.fetch_add(1, Ordering::Relaxed);
        let form = canonical(k)?;
        entries.lock().put(key, (k.clone(), form.clone()));
        Ok(form)
    }

    /// Get cache statistics.
    ///
    /// Returns `None` if caching is disabled.
    pub fn stats(&self) -> Option<CacheStats> {
        self.entries.as_ref().map(|entries| {
            let entries = entries.lock();
            CacheStats {
                len: entries.len(),
                cap: entries.cap().get(),
                hits: self.hits.load(Ordering::Relaxed),
                misses: self.misses.load(Ordering::Relaxed),
            }
        })
    }

    /// Clear the cache.
    ///
    /// Does nothing if caching is disabled.
    pub fn clear(&self) {
        if let Some(entries) = &self.entries {
            entries.lock().clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notation::parse_native;
    use crate::types::Endpoint;

    const TREFOIL: &str = "a=X(b3 c0 c3 b0) b=X(a3 c2 c1 a0) c=X(a1 b2 b1 a2)";

    #[test]
    fn test_cache_hit_returns_same_form() {
        let cache = CanonicalCache::new(&CacheConfig::default());
        let k = parse_native(TREFOIL).unwrap();

        let first = cache.canonical(&k).unwrap();
        let second = cache.canonical(&k).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, canonical(&k).unwrap());

        let stats = cache.stats().unwrap();
        assert_eq!(stats.len, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_cache_eviction() {
        let config = CacheConfig {
            max_entries: 1,
            enabled: true,
        };
        let cache = CanonicalCache::new(&config);
        let trefoil = parse_native(TREFOIL).unwrap();
        let mut unknot = PlanarDiagram::new();
        unknot.add_unknot().unwrap();

        cache.canonical(&trefoil).unwrap();
        cache.canonical(&unknot).unwrap();
        cache.canonical(&trefoil).unwrap();

        let stats = cache.stats().unwrap();
        assert_eq!(stats.len, 1);
        assert_eq!(stats.cap, 1);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 3);
    }

    #[test]
    fn test_disabled_cache() {
        let cache = CanonicalCache::new(&CacheConfig::disabled());
        let k = parse_native(TREFOIL).unwrap();
        assert_eq!(cache.canonical(&k).unwrap(), canonical(&k).unwrap());
        assert!(cache.stats().is_none());
        cache.clear();
    }

    #[test]
    fn test_clear_cache() {
        let cache = CanonicalCache::new(&CacheConfig::default());
        let shared = cache.clone();
        cache.canonical(&parse_native(TREFOIL).unwrap()).unwrap();
        assert_eq!(shared.stats().unwrap().len, 1);
        shared.clear();
        assert_eq!(cache.stats().unwrap().len, 0);
    }

    #[test]
    fn test_distinct_diagrams_get_distinct_forms() {
        // A loop on slots 10 and 11 of a 12-slot hub, next to an unknot.
        let mut split = PlanarDiagram::new();
        split.add_vertex("a", 12).unwrap();
        for p in 0..5 {
            split
                .set_arc(Endpoint::new("a", 2 * p), Endpoint::new("a", 2 * p + 1))
                .unwrap();
        }
        split
            .set_arc(Endpoint::new("a", 10), Endpoint::new("a", 11))
            .unwrap();
        let mut joined = split.clone();
        split.add_unknot().unwrap();
        // The same hub with slots 10 and 11 routed through a second vertex.
        joined.add_vertex("ab", 2).unwrap();
        joined
            .set_arc(Endpoint::new("a", 10), Endpoint::new("ab", 0))
            .unwrap();
        joined
            .set_arc(Endpoint::new("a", 11), Endpoint::new("ab", 1))
            .unwrap();
        assert!(split.sanity_check().is_ok());
        assert!(joined.sanity_check().is_ok());
        assert_ne!(to_native(&split), to_native(&joined));

        let cache = CanonicalCache::new(&CacheConfig::default());
        cache.canonical(&split).unwrap();
        let form = cache.canonical(&joined).unwrap();
        assert_eq!(form, canonical(&joined).unwrap());
        assert_eq!(form.component_count(), 1);
        assert_eq!(parse_native(&to_native(&split)).unwrap(), split);
    }

    #[test]
    fn test_attributes_are_part_of_the_lookup() {
        let cache = CanonicalCache::new(&CacheConfig::default());
        let plain = parse_native(TREFOIL).unwrap();
        let named = parse_native(&format!("{TREFOIL} [name=trefoil]")).unwrap();
        assert_eq!(cache.canonical(&plain).unwrap().name(), None);
        assert_eq!(cache.canonical(&named).unwrap().name(), Some("trefoil"));
    }
}
