use crate::core::geo::{TileCoord, TileKey};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const DEFAULT_CAPACITY: usize = 1024;

/// In-memory tile byte cache using LRU eviction.
///
/// Clones share the same storage, so a source can hand one clone to its
/// loader task and keep serving reads from another.
#[derive(Debug, Clone)]
pub struct TileCache {
    cache: Arc<Mutex<LruCache<TileKey, Arc<Vec<u8>>>>>,
    stats: Arc<CacheCounters>,
}

#[derive(Debug, Default)]
struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Snapshot of cache usage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
}

impl TileCache {
    /// Create a new tile cache with the given capacity
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .or_else(|| NonZeroUsize::new(DEFAULT_CAPACITY))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Arc::new(Mutex::new(LruCache::new(capacity))),
            stats: Arc::new(CacheCounters::default()),
        }
    }

    /// Create a new tile cache with default capacity (1024 tiles)
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    /// Get a tile from the cache, refreshing its recency
    pub fn get(&self, coord: &TileCoord) -> Option<Arc<Vec<u8>>> {
        let hit = self.lock().get(&coord.key()).cloned();
        let counter = if hit.is_some() {
            &self.stats.hits
        } else {
            &self.stats.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        hit
    }

    /// Insert a tile into the cache
    pub fn insert(&self, coord: &TileCoord, data: Vec<u8>) {
        self.put(coord, Arc::new(data));
    }

    /// Insert a tile into the cache (using Arc directly)
    pub fn put(&self, coord: &TileCoord, data: Arc<Vec<u8>>) {
        self.lock().put(coord.key(), data);
    }

    /// Check if a tile is in the cache without touching its recency
    pub fn contains(&self, coord: &TileCoord) -> bool {
        self.lock().contains(&coord.key())
    }

    /// Remove a tile from the cache
    pub fn remove(&self, coord: &TileCoord) -> Option<Arc<Vec<u8>>> {
        self.lock().pop(&coord.key())
    }

    /// Clear all tiles from the cache
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Get the current number of cached tiles
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get cache capacity
    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            size: self.len(),
        }
    }

    // LRU operations don't unwind midway, so a poisoned cache is still usable.
    fn lock(&self) -> MutexGuard<'_, LruCache<TileKey, Arc<Vec<u8>>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TileCache {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_cache_basic_operations() {
        let cache = TileCache::new(2);
        let coord1 = TileCoord::new(1, 2, 3);
        let coord2 = TileCoord::new(4, 5, 6);
        let data1 = vec![1, 2, 3];
        let data2 = vec![4, 5, 6];

        // Initially empty
        assert!(cache.is_empty());
        assert_eq!(cache.len(), 0);

        // Insert and retrieve
        cache.insert(&coord1, data1.clone());
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&coord1));

        let retrieved = cache.get(&coord1).unwrap();
        assert_eq!(*retrieved, data1);

        // Insert second item
        cache.insert(&coord2, data2);
        assert_eq!(cache.len(), 2);

        // Clear cache
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_tile_cache_lru_eviction() {
        let cache = TileCache::new(2);
        let coord1 = TileCoord::new(1, 1, 1);
        let coord2 = TileCoord::new(2, 2, 2);
        let coord3 = TileCoord::new(3, 3, 3);

        // Fill cache to capacity
        cache.insert(&coord1, vec![1]);
        cache.insert(&coord2, vec![2]);
        assert_eq!(cache.len(), 2);

        // Insert third item should evict first
        cache.insert(&coord3, vec![3]);
        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(&coord1)); // Evicted
        assert!(cache.contains(&coord2));
        assert!(cache.contains(&coord3));
    }

    #[test]
    fn test_scale_is_part_of_identity() {
        let cache = TileCache::new(8);
        cache.insert(&TileCoord::with_scale(1, 1, 1, 2.0), vec![2]);
        assert!(cache.get(&TileCoord::new(1, 1, 1)).is_none());
        assert!(cache.get(&TileCoord::with_scale(1, 1, 1, 2.0)).is_some());
    }

    #[test]
    fn test_clones_share_storage_and_stats() {
        let cache = TileCache::new(4);
        let clone = cache.clone();
        let coord = TileCoord::new(0, 0, 0);

        clone.insert(&coord, vec![7]);
        assert!(cache.get(&coord).is_some());
        assert!(cache.get(&TileCoord::new(0, 0, 1)).is_none());

        let stats = clone.stats();
        assert_eq!(stats, CacheStats { hits: 1, misses: 1, size: 1 });
    }

    #[test]
    fn test_cache_survives_a_panicking_holder() {
        let cache = TileCache::new(4);
        let coord = TileCoord::new(2, 1, 3);
        cache.insert(&coord, vec![1]);

        let poisoner = cache.clone();
        let result = std::thread::spawn(move || {
            let _guard = poisoner.cache.lock().unwrap();
            panic!("poison the cache lock");
        })
        .join();
        assert!(result.is_err());
        assert!(cache.cache.is_poisoned());

        assert_eq!(*cache.get(&coord).unwrap(), vec![1]);
        cache.insert(&TileCoord::new(0, 0, 0), vec![2]);
        assert_eq!(cache.len(), 2);
        assert!(cache.remove(&coord).is_some());
    }

    #[test]
    fn test_zero_capacity_uses_default() {
        assert_eq!(TileCache::new(0).capacity(), DEFAULT_CAPACITY);
    }
}
