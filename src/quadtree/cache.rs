use ahash::AHashMap as HashMap;
use std::hash::Hash;

struct CacheEntry<V> {
    value: V,
    /// logical generation of the last read or write
    last_access: u64,
}

/// Content-addressed map that remembers when each entry was last used.
///
/// Time is the engine's generation counter, passed in as `now`, so eviction
/// is deterministic: [`GenerationCache::prune`] drops exactly the entries
/// not touched during the trailing window.
pub(super) struct GenerationCache<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    hits: u64,
    misses: u64,
}

impl<K: Copy + Eq + Hash, V: Copy> GenerationCache<K, V> {
    pub(super) fn new() -> Self {
        Self {
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Looks the key up and refreshes its access time on a hit.
    pub(super) fn get(&mut self, key: &K, now: u64) -> Option<V> {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.last_access = now;
                self.hits += 1;
                Some(entry.value)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub(super) fn insert(&mut self, key: K, value: V, now: u64) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                last_access: now,
            },
        );
    }

    /// Evicts every entry last accessed before `now - window`.
    /// Returns the number of evicted entries.
    pub(super) fn prune(&mut self, now: u64, window: u64) -> usize {
        self.evict(now, window).len()
    }

    /// Same as [`GenerationCache::prune`], but hands the evicted entries back.
    pub(super) fn evict(&mut self, now: u64, window: u64) -> Vec<(K, V)> {
        let threshold = now.saturating_sub(window);
        let mut evicted = vec![];
        self.entries.retain(|&k, e| {
            let keep = e.last_access >= threshold;
            if !keep {
                evicted.push((k, e.value));
            }
            keep
        });
        evicted
    }

    pub(super) fn iter(&self) -> impl Iterator<Item = (K, V)> + '_ {
        self.entries.iter().map(|(&k, e)| (k, e.value))
    }

    pub(super) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(super) fn hits(&self) -> u64 {
        self.hits
    }

    pub(super) fn misses(&self) -> u64 {
        self.misses
    }

    pub(super) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(super) fn bytes_total(&self) -> usize {
        self.entries.capacity() * (std::mem::size_of::<K>() + std::mem::size_of::<CacheEntry<V>>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_refreshes_access() {
        let mut cache = GenerationCache::<u32, u32>::new();
        cache.insert(1, 10, 0);
        cache.insert(2, 20, 0);
        assert_eq!(cache.get(&1, 300), Some(10));

        assert_eq!(cache.prune(300, 256), 1);
        assert_eq!(cache.get(&1, 300), Some(10));
        assert_eq!(cache.get(&2, 300), None);
        assert_eq!((cache.hits(), cache.misses()), (2, 1));
    }

    #[test]
    fn test_prune_keeps_window() {
        let mut cache = GenerationCache::<u32, ()>::new();
        for gen in 0..10 {
            cache.insert(gen as u32, (), gen);
        }
        // entries accessed at generations 6..=9 survive
        assert_eq!(cache.prune(9, 3), 6);
        let mut left: Vec<_> = cache.iter().map(|(k, _)| k).collect();
        left.sort_unstable();
        assert_eq!(left, vec![6, 7, 8, 9]);
    }

    #[test]
    fn test_evict_returns_entries() {
        let mut cache = GenerationCache::<u32, u32>::new();
        cache.insert(1, 10, 0);
        cache.insert(2, 20, 5);
        assert_eq!(cache.evict(6, 1), vec![(1, 10)]);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_prune_early_generations() {
        let mut cache = GenerationCache::<u32, ()>::new();
        cache.insert(7, (), 0);
        assert_eq!(cache.prune(100, 256), 0);
        assert_eq!(cache.len(), 1);
    }
}
