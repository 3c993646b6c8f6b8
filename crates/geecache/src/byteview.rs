//! Immutable view over cached bytes

use std::fmt;

use bytes::Bytes;

use crate::lru::Value;

/// Read-only snapshot of a cached value
///
/// Cloning is cheap and shares the underlying buffer. There is no way to
/// obtain a mutable reference to the bytes, so values handed out to callers
/// can never alter what is held in the cache.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ByteView {
    b: Bytes,
}

impl ByteView {
    /// Build a view by copying `data`
    pub fn copy_from_slice(data: &[u8]) -> Self {
        Self {
            b: Bytes::copy_from_slice(data),
        }
    }

    /// Length of the value in bytes
    pub fn len(&self) -> usize {
        self.b.len()
    }

    /// Whether the value is empty
    pub fn is_empty(&self) -> bool {
        self.b.is_empty()
    }

    /// Copy the bytes out into a fresh vector
    pub fn byte_slice(&self) -> Vec<u8> {
        self.b.to_vec()
    }

    /// Borrow the bytes without copying
    pub fn as_slice(&self) -> &[u8] {
        &self.b
    }
}

impl From<Vec<u8>> for ByteView {
    /// Takes ownership of `data`; nobody else can hold a mutable alias to it.
    fn from(data: Vec<u8>) -> Self {
        Self { b: Bytes::from(data) }
    }
}

impl Value for ByteView {
    fn len(&self) -> usize {
        self.b.len()
    }
}

impl fmt::Display for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.b))
    }
}

impl fmt::Debug for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ByteView").field(&self.b).finish()
    }
}
