//! Registry of named groups

use std::collections::HashMap;
use std::sync::Arc;

use ahash::RandomState;
use parking_lot::RwLock;
use tracing::info;

use crate::group::{Getter, Group};

/// Owns every group created in this process, keyed by name
///
/// Build one at startup and share it (usually behind an `Arc`) with whatever
/// needs to create or resolve groups.
#[derive(Default)]
pub struct Registry {
    groups: RwLock<HashMap<String, Arc<Group>, RandomState>>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a group and register it under `name`
    ///
    /// A group already registered under the same name is replaced.
    ///
    /// # Arguments
    /// * `name` - Namespace name
    /// * `cache_bytes` - Budget for keys plus values in the local cache; `0` is unbounded
    /// * `getter` - Source of truth consulted on a complete miss
    pub fn new_group<G>(&self, name: impl Into<String>, cache_bytes: usize, getter: G) -> Arc<Group>
    where
        G: Getter + 'static,
    {
        let name = name.into();
        let group = Arc::new(Group::new(name.clone(), cache_bytes, Arc::new(getter)));
        info!("Registered group {} ({} cache bytes)", name, cache_bytes);
        self.groups.write().insert(name, Arc::clone(&group));
        group
    }

    /// Find the group registered under `name`
    pub fn get_group(&self, name: &str) -> Option<Arc<Group>> {
        self.groups.read().get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;

    fn constant(_key: &str) -> Result<Vec<u8>, BoxError> {
        Ok(b"v".to_vec())
    }

    #[test]
    fn test_get_group() {
        let registry = Registry::new();
        let group = registry.new_group("scores", 2 << 10, constant);

        let found = registry.get_group("scores").unwrap();
        assert!(Arc::ptr_eq(&group, &found));
        assert_eq!(found.name(), "scores");
        assert!(registry.get_group("scores-missing").is_none());
    }

    #[test]
    fn test_same_name_replaces() {
        let registry = Registry::new();
        let first = registry.new_group("scores", 0, constant);
        let second = registry.new_group("scores", 0, constant);

        let found = registry.get_group("scores").unwrap();
        assert!(Arc::ptr_eq(&second, &found));
        assert!(!Arc::ptr_eq(&first, &found));
    }
}
