//! Per-call-site slot caches for object access.
//!
//! Each `PUSH_FROM_OBJECT` / `POP_INTO_OBJECT` site remembers the last map
//! it resolved against and the slot offset it found. Because identical
//! transition histories yield identical maps, a matching map id guarantees
//! the cached offset is still right - no chain walk needed.

use basalt_runtime::MapId;
use rustc_hash::FxHashMap;

/// Monomorphic slot cache for one call site.
///
/// `MapId::EMPTY` doubles as the invalid sentinel: the empty map has no
/// slots, so a lookup against it can never produce a cacheable hit.
#[derive(Debug, Clone, Copy)]
pub struct SlotCache {
    cached_map: MapId,
    cached_offset: u16,
    hits: u32,
    misses: u32,
}

impl SlotCache {
    /// An empty (invalid) cache.
    #[inline]
    pub const fn empty() -> SlotCache {
        SlotCache {
            cached_map: MapId::EMPTY,
            cached_offset: 0,
            hits: 0,
            misses: 0,
        }
    }

    /// The cached offset, if the cache covers the given map.
    #[inline]
    pub fn check(&mut self, map: MapId) -> Option<u16> {
        if self.cached_map == map && map != MapId::EMPTY {
            self.hits = self.hits.saturating_add(1);
            Some(self.cached_offset)
        } else {
            self.misses = self.misses.saturating_add(1);
            None
        }
    }

    /// Install a resolution.
    #[inline]
    pub fn update(&mut self, map: MapId, offset: u16) {
        self.cached_map = map;
        self.cached_offset = offset;
    }

    /// Hit rate over the cache's lifetime, as a fraction.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits as u64 + self.misses as u64;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl Default for SlotCache {
    fn default() -> SlotCache {
        SlotCache::empty()
    }
}

/// Cache storage for a context, keyed by `(function index, pc)`.
#[derive(Debug, Default)]
pub struct SlotCacheStore {
    caches: FxHashMap<(u32, u32), SlotCache>,
}

impl SlotCacheStore {
    pub fn new() -> SlotCacheStore {
        SlotCacheStore::default()
    }

    /// The cache for a call site, created on first use.
    #[inline]
    pub fn site(&mut self, function: u32, pc: u32) -> &mut SlotCache {
        self.caches.entry((function, pc)).or_default()
    }

    /// Number of sites seen so far.
    pub fn len(&self) -> usize {
        self.caches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_cache_never_hits() {
        let mut cache = SlotCache::empty();
        assert_eq!(cache.check(MapId::EMPTY), None);
        assert_eq!(cache.check(MapId(3)), None);
    }

    #[test]
    fn test_hit_after_update() {
        let mut cache = SlotCache::empty();
        cache.update(MapId(5), 2);
        assert_eq!(cache.check(MapId(5)), Some(2));
        assert_eq!(cache.check(MapId(6)), None);
        assert!(cache.hit_rate() > 0.0);
    }

    #[test]
    fn test_empty_map_is_not_cacheable() {
        let mut cache = SlotCache::empty();
        cache.update(MapId::EMPTY, 0);
        assert_eq!(cache.check(MapId::EMPTY), None);
    }

    #[test]
    fn test_store_sites_are_distinct() {
        let mut store = SlotCacheStore::new();
        store.site(0, 4).update(MapId(1), 0);
        store.site(0, 9).update(MapId(2), 1);

        assert_eq!(store.site(0, 4).check(MapId(1)), Some(0));
        assert_eq!(store.site(0, 9).check(MapId(2)), Some(1));
        assert_eq!(store.len(), 2);
    }
}
