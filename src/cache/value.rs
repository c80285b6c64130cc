//! Cache Value Module
//!
//! Defines the sizing capability every cached value must provide, and
//! `ByteView`, the immutable byte value the cache is normally used with.

use std::fmt;

use bytes::Bytes;

// == Value Trait ==
/// A value that can report how many bytes it occupies.
///
/// The reported size must be positive and must not change while the value
/// is stored. The cache charges `key.len() + size()` for every entry.
pub trait Value {
    fn size(&self) -> i64;
}

impl Value for String {
    fn size(&self) -> i64 {
        self.len() as i64
    }
}

impl Value for Vec<u8> {
    fn size(&self) -> i64 {
        self.len() as i64
    }
}

impl Value for Bytes {
    fn size(&self) -> i64 {
        self.len() as i64
    }
}

// == Byte View ==
/// An immutable view over a byte buffer.
///
/// Cloning is cheap (reference counted). Callers never get mutable access
/// to the cached bytes; `byte_slice` hands out a copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ByteView {
    bytes: Bytes,
}

impl ByteView {
    // == Constructor ==
    /// Creates a view over a copy of `data`.
    pub fn copy_from_slice(data: &[u8]) -> Self {
        Self {
            bytes: Bytes::copy_from_slice(data),
        }
    }

    // == Length ==
    /// Returns the number of bytes in the view.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    // == Byte Slice ==
    /// Returns an owned copy of the data.
    pub fn byte_slice(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    /// Borrows the underlying bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Value for ByteView {
    fn size(&self) -> i64 {
        self.bytes.len() as i64
    }
}

impl From<Vec<u8>> for ByteView {
    fn from(data: Vec<u8>) -> Self {
        Self {
            bytes: Bytes::from(data),
        }
    }
}

impl From<&[u8]> for ByteView {
    fn from(data: &[u8]) -> Self {
        Self::copy_from_slice(data)
    }
}

impl From<String> for ByteView {
    fn from(data: String) -> Self {
        Self {
            bytes: Bytes::from(data),
        }
    }
}

impl From<&str> for ByteView {
    fn from(data: &str) -> Self {
        Self::copy_from_slice(data.as_bytes())
    }
}

impl From<Bytes> for ByteView {
    fn from(bytes: Bytes) -> Self {
        Self { bytes }
    }
}

impl fmt::Display for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.bytes))
    }
}
