//! LRU (Least Recently Used) store bounded by bytes
//!
//! Uses an index-linked list over a slab of nodes for O(1) promotion and
//! eviction. Not thread-safe; the group cache wraps it in a mutex.

use std::collections::HashMap;

use ahash::RandomState;

/// Values stored in the LRU must report their size in bytes
pub trait Value {
    /// Number of bytes this value accounts for
    fn len(&self) -> usize;
}

/// Callback fired with the key and value of every evicted entry
///
/// Runs synchronously inside the store. When the store sits behind a lock the
/// callback runs while that lock is held, so it must not call back into the
/// same cache.
pub type OnEvicted<V> = Box<dyn FnMut(String, V) + Send>;

/// Node in the LRU doubly-linked list
struct Node<V> {
    key: String,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

impl<V: Value> Node<V> {
    fn size(&self) -> usize {
        self.key.len() + self.value.len()
    }
}

/// LRU store holding at most `max_bytes` of keys plus values
pub struct LruCache<V> {
    map: HashMap<String, usize, RandomState>,
    nodes: Vec<Option<Node<V>>>,
    head: Option<usize>,
    tail: Option<usize>,
    free_list: Vec<usize>,
    max_bytes: usize,
    used_bytes: usize,
    on_evicted: Option<OnEvicted<V>>,
}

impl<V: Value> LruCache<V> {
    /// Create a store with the given byte budget; `0` means unbounded
    pub fn new(max_bytes: usize) -> Self {
        Self {
            map: HashMap::with_hasher(RandomState::new()),
            nodes: Vec::new(),
            head: None,
            tail: None,
            free_list: Vec::new(),
            max_bytes,
            used_bytes: 0,
            on_evicted: None,
        }
    }

    /// Create a store that reports evictions to `on_evicted`
    pub fn with_eviction_callback(max_bytes: usize, on_evicted: OnEvicted<V>) -> Self {
        let mut cache = Self::new(max_bytes);
        cache.on_evicted = Some(on_evicted);
        cache
    }

    /// Look up a value and mark it most recently used
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let idx = *self.map.get(key)?;
        self.move_to_front(idx);
        self.nodes[idx].as_ref().map(|node| &node.value)
    }

    /// Insert or replace a value, then evict until the budget holds
    pub fn add(&mut self, key: String, value: V) {
        if let Some(&idx) = self.map.get(&key) {
            if let Some(node) = &mut self.nodes[idx] {
                self.used_bytes = self.used_bytes + value.len() - node.value.len();
                node.value = value;
            }
            self.move_to_front(idx);
        } else {
            let idx = self.alloc_node();
            let node = Node {
                key: key.clone(),
                value,
                prev: None,
                next: None,
            };
            self.used_bytes += node.size();
            self.nodes[idx] = Some(node);
            self.push_front(idx);
            self.map.insert(key, idx);
        }

        while self.max_bytes != 0 && self.used_bytes > self.max_bytes {
            self.remove_oldest();
        }
    }

    /// Drop the least recently used entry, if any
    pub fn remove_oldest(&mut self) {
        let Some(tail_idx) = self.tail else {
            return;
        };
        self.unlink(tail_idx);
        self.free_list.push(tail_idx);

        if let Some(node) = self.nodes[tail_idx].take() {
            self.map.remove(&node.key);
            self.used_bytes -= node.size();
            if let Some(on_evicted) = self.on_evicted.as_mut() {
                on_evicted(node.key, node.value);
            }
        }
    }

    /// Number of entries held
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Bytes currently accounted for (keys plus values)
    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    /// Configured byte budget
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    fn push_front(&mut self, idx: usize) {
        if let Some(node) = &mut self.nodes[idx] {
            node.prev = None;
            node.next = self.head;
        }

        if let Some(head_idx) = self.head {
            if let Some(head) = &mut self.nodes[head_idx] {
                head.prev = Some(idx);
            }
        }

        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }
        self.unlink(idx);
        self.push_front(idx);
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = match &self.nodes[idx] {
            Some(node) => (node.prev, node.next),
            None => return,
        };

        match prev {
            Some(prev_idx) => {
                if let Some(prev_node) = &mut self.nodes[prev_idx] {
                    prev_node.next = next;
                }
            }
            None => self.head = next,
        }

        match next {
            Some(next_idx) => {
                if let Some(next_node) = &mut self.nodes[next_idx] {
                    next_node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }

    fn alloc_node(&mut self) -> usize {
        if let Some(idx) = self.free_list.pop() {
            idx
        } else {
            self.nodes.push(None);
            self.nodes.len() - 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    impl Value for String {
        fn len(&self) -> usize {
            str::len(self)
        }
    }

    fn s(v: &str) -> String {
        v.to_string()
    }

    #[test]
    fn test_lru_get() {
        let mut cache = LruCache::new(0);
        cache.add(s("key1"), s("1234"));

        assert_eq!(cache.get("key1"), Some(&s("1234")));
        assert_eq!(cache.get("key2"), None);
        assert_eq!(cache.used_bytes(), 8);
    }

    #[test]
    fn test_lru_remove_oldest() {
        let (k1, k2, k3) = ("key1", "key2", "k3");
        let (v1, v2, v3) = ("value1", "value2", "v3");
        let budget = k1.len() + k2.len() + v1.len() + v2.len();
        let mut cache = LruCache::new(budget);

        cache.add(s(k1), s(v1));
        cache.add(s(k2), s(v2));
        cache.add(s(k3), s(v3));

        assert_eq!(cache.get(k1), None);
        assert_eq!(cache.len(), 2);
        assert!(cache.used_bytes() <= budget);
    }

    #[test]
    fn test_lru_recency() {
        // Each entry is 2 bytes; room for exactly three.
        let mut cache = LruCache::new(6);
        cache.add(s("a"), s("1"));
        cache.add(s("b"), s("2"));
        cache.add(s("c"), s("3"));
        cache.get("a");
        cache.add(s("d"), s("4"));

        assert_eq!(cache.get("b"), None);
        assert!(cache.get("a").is_some());
        assert!(cache.get("c").is_some());
        assert!(cache.get("d").is_some());
    }

    #[test]
    fn test_lru_on_evicted() {
        let evicted = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&evicted);
        let mut cache = LruCache::with_eviction_callback(
            10,
            Box::new(move |key: String, value: String| sink.lock().unwrap().push((key, value))),
        );

        cache.add(s("key1"), s("123456"));
        cache.add(s("k2"), s("k2"));
        cache.add(s("k3"), s("k3"));
        cache.add(s("k4"), s("k4"));

        let evicted = evicted.lock().unwrap();
        assert_eq!(
            *evicted,
            vec![(s("key1"), s("123456")), (s("k2"), s("k2"))]
        );
    }

    #[test]
    fn test_lru_overwrite_adjusts_bytes() {
        let evicted = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&evicted);
        let mut cache = LruCache::with_eviction_callback(
            0,
            Box::new(move |key: String, value: String| sink.lock().unwrap().push((key, value))),
        );

        cache.add(s("k"), s("short"));
        cache.add(s("k"), s("much longer"));
        assert_eq!(cache.used_bytes(), 1 + 11);
        assert_eq!(cache.len(), 1);

        cache.add(s("k"), s("x"));
        assert_eq!(cache.used_bytes(), 2);
        assert_eq!(cache.get("k"), Some(&s("x")));

        cache.remove_oldest();
        assert_eq!(*evicted.lock().unwrap(), vec![(s("k"), s("x"))]);
        assert_eq!(cache.used_bytes(), 0);
    }

    #[test]
    fn test_lru_budget_holds_after_every_add() {
        let mut cache = LruCache::new(32);
        for i in 0..200 {
            let value = "v".repeat(i % 13);
            cache.add(format!("key{}", i), value);
            assert!(cache.used_bytes() <= cache.max_bytes());
            // Every entry fits on its own, so the newest one always survives.
            assert!(cache.get(&format!("key{}", i)).is_some());
        }
    }

    #[test]
    fn test_lru_oversized_entry_is_dropped() {
        let mut cache = LruCache::new(4);
        cache.add(s("big"), s("value"));

        assert!(cache.is_empty());
        assert_eq!(cache.used_bytes(), 0);
    }

    #[test]
    fn test_lru_remove_oldest_on_empty() {
        let mut cache: LruCache<String> = LruCache::new(10);
        cache.remove_oldest();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_lru_reuses_slots() {
        let mut cache = LruCache::new(4);
        for i in 0..50 {
            cache.add(format!("k{}", i % 10), s("v"));
        }
        assert!(cache.nodes.len() <= 3);
        assert_eq!(cache.len(), 1);
    }
}
