//! Group: a named cache namespace and its load path

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{debug, warn};

use crate::byteview::ByteView;
use crate::cache::Cache;
use crate::error::{BoxError, Error, Result};
use crate::peers::{PeerGetter, PeerPicker, Request};
use crate::singleflight::SingleFlight;
use crate::stats::GroupStats;

/// Application data source consulted on a complete miss
pub trait Getter: Send + Sync {
    /// Load the value for `key` from the source of truth
    fn get(&self, key: &str) -> std::result::Result<Vec<u8>, BoxError>;
}

impl<F> Getter for F
where
    F: Fn(&str) -> std::result::Result<Vec<u8>, BoxError> + Send + Sync,
{
    fn get(&self, key: &str) -> std::result::Result<Vec<u8>, BoxError> {
        self(key)
    }
}

/// A cache namespace
///
/// Lookups are served from the local cache, then from the peer owning the
/// key, then from the group's [`Getter`]. Concurrent misses on one key share
/// a single load.
pub struct Group {
    name: String,
    getter: Arc<dyn Getter>,
    main_cache: Cache,
    peers: OnceCell<Arc<dyn PeerPicker>>,
    loader: SingleFlight<Result<ByteView>>,
    stats: Arc<GroupStats>,
}

impl Group {
    pub(crate) fn new(name: String, cache_bytes: usize, getter: Arc<dyn Getter>) -> Self {
        let stats = Arc::new(GroupStats::new());
        let eviction_stats = Arc::clone(&stats);
        let main_cache = Cache::new(
            cache_bytes,
            Box::new(move |_key: String, _value: ByteView| eviction_stats.record_eviction()),
        );

        Self {
            name,
            getter,
            main_cache,
            peers: OnceCell::new(),
            loader: SingleFlight::new(),
            stats,
        }
    }

    /// Name of this group
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attach the peer picker used to route misses
    ///
    /// # Panics
    /// If peers were already registered for this group.
    pub fn register_peers(&self, peers: Arc<dyn PeerPicker>) {
        if self.peers.set(peers).is_err() {
            panic!("register_peers called more than once for group {}", self.name);
        }
    }

    /// Look up `key`
    ///
    /// # Returns
    /// * `Ok(ByteView)` - Value from the local cache, a peer, or the source
    /// * `Err(Error::EmptyKey)` - `key` was empty
    /// * `Err(Error::Source)` - The backing source failed
    pub fn get(&self, key: &str) -> Result<ByteView> {
        if key.is_empty() {
            return Err(Error::EmptyKey);
        }

        self.stats.record_get();
        if let Some(value) = self.main_cache.get(key) {
            debug!("[{}] cache hit for {}", self.name, key);
            self.stats.record_hit();
            return Ok(value);
        }

        self.load(key)
    }

    /// Group statistics
    pub fn stats(&self) -> &GroupStats {
        &self.stats
    }

    /// Entries held in the local cache
    pub fn cache_len(&self) -> usize {
        self.main_cache.len()
    }

    /// Bytes held in the local cache
    pub fn cache_bytes(&self) -> usize {
        self.main_cache.used_bytes()
    }

    fn load(&self, key: &str) -> Result<ByteView> {
        self.loader.run(key, || {
            if let Some(peer) = self.peers.get().and_then(|peers| peers.pick_peer(key)) {
                match self.get_from_peer(peer.as_ref(), key) {
                    Ok(value) => {
                        self.stats.record_peer_load();
                        return Ok(value);
                    }
                    Err(err) => {
                        self.stats.record_peer_error();
                        warn!("[{}] failed to get {} from peer: {}", self.name, key, err);
                    }
                }
            }
            self.get_locally(key)
        })
    }

    fn get_from_peer(&self, peer: &dyn PeerGetter, key: &str) -> Result<ByteView> {
        let req = Request {
            group: self.name.clone(),
            key: key.to_owned(),
        };
        let res = peer.get(&req)?;
        Ok(ByteView::from(res.value))
    }

    fn get_locally(&self, key: &str) -> Result<ByteView> {
        let bytes = self.getter.get(key).map_err(|err| {
            self.stats.record_local_load_err();
            Error::from_source(err)
        })?;
        debug!("[{}] loaded {} from source", self.name, key);
        self.stats.record_local_load();

        let value = ByteView::copy_from_slice(&bytes);
        self.populate_cache(key, value.clone());
        Ok(value)
    }

    fn populate_cache(&self, key: &str, value: ByteView) {
        self.main_cache.add(key, value);
    }
}
