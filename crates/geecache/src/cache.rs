//! Mutex-guarded LRU shared by every caller of a group

use parking_lot::Mutex;

use crate::byteview::ByteView;
use crate::lru::{LruCache, OnEvicted};

/// Thread-safe wrapper around an [`LruCache`] of [`ByteView`]s
///
/// Each operation holds the lock only for the LRU bookkeeping itself, never
/// across a load.
pub(crate) struct Cache {
    lru: Mutex<LruCache<ByteView>>,
}

impl Cache {
    /// Create a cache holding at most `cache_bytes`, reporting evictions
    pub(crate) fn new(cache_bytes: usize, on_evicted: OnEvicted<ByteView>) -> Self {
        Self {
            lru: Mutex::new(LruCache::with_eviction_callback(cache_bytes, on_evicted)),
        }
    }

    pub(crate) fn add(&self, key: &str, value: ByteView) {
        self.lru.lock().add(key.to_owned(), value);
    }

    pub(crate) fn get(&self, key: &str) -> Option<ByteView> {
        self.lru.lock().get(key).cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.lru.lock().len()
    }

    pub(crate) fn used_bytes(&self) -> usize {
        self.lru.lock().used_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    fn counting_cache(cache_bytes: usize) -> (Cache, Arc<AtomicUsize>) {
        let evictions = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&evictions);
        let cache = Cache::new(
            cache_bytes,
            Box::new(move |_key: String, _value: ByteView| {
                counter.fetch_add(1, Ordering::Relaxed);
            }),
        );
        (cache, evictions)
    }

    #[test]
    fn test_cache_add_get() {
        let (cache, _) = counting_cache(0);
        cache.add("Tom", ByteView::copy_from_slice(b"630"));

        assert_eq!(cache.get("Tom").unwrap().as_slice(), b"630");
        assert!(cache.get("Jack").is_none());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.used_bytes(), 6);
    }

    #[test]
    fn test_cache_concurrent_adds_respect_budget() {
        let (cache, evictions) = counting_cache(256);
        let cache = Arc::new(cache);

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..500 {
                        let key = format!("t{}-{}", t, i);
                        cache.add(&key, ByteView::copy_from_slice(b"0123456789"));
                        cache.get(&key);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(cache.used_bytes() <= 256);
        assert_eq!(evictions.load(Ordering::Relaxed) + cache.len(), 8 * 500);
    }
}
