//! Error types for geecache

use std::sync::Arc;

/// Boxed error returned by application-supplied data sources and peer transports
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias for geecache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by [`Group::get`](crate::Group::get)
///
/// Cloneable so a single failed load can be handed to every caller waiting on it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Lookup with an empty key
    #[error("key is required")]
    EmptyKey,

    /// The backing data source failed to produce a value
    #[error("source error: {0}")]
    Source(Arc<dyn std::error::Error + Send + Sync>),

    /// A remote peer could not serve the request
    #[error("peer error: {0}")]
    Peer(String),

    /// No group registered under the requested name
    #[error("no such group: {0}")]
    GroupNotFound(String),
}

impl Error {
    /// Wrap a data source failure
    pub fn from_source(err: BoxError) -> Self {
        Error::Source(Arc::from(err))
    }
}
