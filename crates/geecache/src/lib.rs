//! # geecache
//!
//! Distributed read-through cache engine.
//!
//! ## Architecture
//! - **HashRing**: consistent hashing with virtual replicas to route keys to peers
//! - **LruCache**: byte-budgeted LRU store, O(1) lookups and evictions
//! - **Cache**: mutex-guarded LRU shared by all callers of a group
//! - **SingleFlight**: collapses concurrent loads of the same key into one
//! - **Group**: a named namespace tying the above into a single `get` path
//!
//! A lookup checks the local cache first. On a miss, one load per key runs at a
//! time: the key's owning peer is asked first, and the application's [`Getter`]
//! is the fallback when no peer applies or the peer fails.

#![warn(missing_docs)]

mod byteview;
mod cache;
pub mod consistenthash;
mod error;
mod group;
pub mod lru;
mod peers;
mod registry;
pub mod singleflight;
mod stats;

pub use byteview::ByteView;
pub use error::{BoxError, Error, Result};
pub use group::{Getter, Group};
pub use peers::{PeerGetter, PeerPicker, Request, Response, RingPeerPicker};
pub use registry::Registry;
pub use stats::GroupStats;
