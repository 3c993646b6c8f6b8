//! Consistent hashing ring with virtual replicas
//!
//! Every real node is placed on the ring `replicas` times, at the hash of
//! `"{i}{node}"` for `i` in `0..replicas`. A key belongs to the first point
//! at or after its own hash, wrapping around past the largest point.

use std::collections::HashMap;

use ahash::RandomState;

/// Hash function placing keys and replicas on the ring
pub type Hash = fn(&[u8]) -> u32;

/// Ring of hashed virtual nodes
pub struct HashRing {
    hash: Hash,
    replicas: usize,
    /// Sorted ring points; may hold duplicates when hashes collide
    keys: Vec<u32>,
    hash_map: HashMap<u32, String, RandomState>,
}

impl HashRing {
    /// Create an empty ring hashing with CRC-32 (IEEE)
    pub fn new(replicas: usize) -> Self {
        Self::with_hasher(replicas, crc32fast::hash)
    }

    /// Create an empty ring with a custom hash function
    pub fn with_hasher(replicas: usize, hash: Hash) -> Self {
        Self {
            hash,
            replicas,
            keys: Vec::new(),
            hash_map: HashMap::with_hasher(RandomState::new()),
        }
    }

    /// Place each node on the ring `replicas` times
    ///
    /// A point already owned by another node is taken over by the later one.
    pub fn add<I, S>(&mut self, nodes: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for node in nodes {
            let node = node.as_ref();
            for i in 0..self.replicas {
                let hash = self.replica_hash(i, node);
                self.keys.push(hash);
                self.hash_map.insert(hash, node.to_string());
            }
        }
        self.keys.sort_unstable();
    }

    /// Take a node's replicas off the ring
    ///
    /// Points that a later node has taken over are left alone.
    pub fn remove(&mut self, node: &str) {
        for i in 0..self.replicas {
            let hash = self.replica_hash(i, node);
            if self.hash_map.get(&hash).map(String::as_str) == Some(node) {
                self.hash_map.remove(&hash);
            }
        }
        let hash_map = &self.hash_map;
        self.keys.retain(|point| hash_map.contains_key(point));
    }

    /// Find the node owning `key`, or `None` on an empty ring
    pub fn get(&self, key: &str) -> Option<&str> {
        if self.keys.is_empty() {
            return None;
        }

        let hash = (self.hash)(key.as_bytes());
        let idx = self.keys.partition_point(|&point| point < hash);
        let point = self.keys[idx % self.keys.len()];
        self.hash_map.get(&point).map(String::as_str)
    }

    /// Number of points on the ring
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Check if the ring has no points
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn replica_hash(&self, i: usize, node: &str) -> u32 {
        (self.hash)(format!("{}{}", i, node).as_bytes())
    }
}
