//! Peer selection and remote fetch capabilities

use std::collections::HashMap;
use std::sync::Arc;

use ahash::RandomState;
use parking_lot::RwLock;
use tracing::debug;

use crate::consistenthash::HashRing;
use crate::error::Result;

/// Request sent to the peer owning a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Group (namespace) the key lives in
    pub group: String,
    /// Key to fetch
    pub key: String,
}

/// Value returned by a peer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Response {
    /// Raw value bytes
    pub value: Vec<u8>,
}

/// Fetches values from one remote peer
pub trait PeerGetter: Send + Sync {
    /// Ask the peer for `req.key` in `req.group`
    fn get(&self, req: &Request) -> Result<Response>;
}

/// Chooses the peer that owns a key
pub trait PeerPicker: Send + Sync {
    /// Return the owning peer, or `None` when the key should be loaded locally
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>>;
}

struct PickerState {
    ring: HashRing,
    getters: HashMap<String, Arc<dyn PeerGetter>, RandomState>,
}

/// [`PeerPicker`] routing keys over a consistent hash ring of peer ids
///
/// Keys owned by this node itself are reported as "no peer".
pub struct RingPeerPicker {
    self_id: String,
    replicas: usize,
    state: RwLock<PickerState>,
}

impl RingPeerPicker {
    /// Create a picker for the node identified by `self_id`
    ///
    /// # Arguments
    /// * `self_id` - This node's identity as it appears in the peer list
    /// * `replicas` - Virtual nodes placed on the ring per peer
    pub fn new(self_id: impl Into<String>, replicas: usize) -> Self {
        Self {
            self_id: self_id.into(),
            replicas,
            state: RwLock::new(PickerState {
                ring: HashRing::new(replicas),
                getters: HashMap::with_hasher(RandomState::new()),
            }),
        }
    }

    /// Replace the peer set
    ///
    /// The ring is rebuilt from scratch; `peers` should include this node so
    /// that it owns its share of keys.
    pub fn set_peers<I>(&self, peers: I)
    where
        I: IntoIterator<Item = (String, Arc<dyn PeerGetter>)>,
    {
        let mut ring = HashRing::new(self.replicas);
        let mut getters = HashMap::with_hasher(RandomState::new());
        for (id, getter) in peers {
            ring.add([id.as_str()]);
            getters.insert(id, getter);
        }

        let mut state = self.state.write();
        state.ring = ring;
        state.getters = getters;
    }

    /// This node's identity
    pub fn self_id(&self) -> &str {
        &self.self_id
    }
}

impl PeerPicker for RingPeerPicker {
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerGetter>> {
        let state = self.state.read();
        let peer = state.ring.get(key)?;
        if peer == self.self_id {
            return None;
        }
        debug!("[{}] pick peer {} for key {}", self.self_id, peer, key);
        state.getters.get(peer).cloned()
    }
}
