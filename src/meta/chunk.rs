use std::ops::Deref;

use bytes::Bytes;

/// Marker at the start of every metadata region
pub const SIGNATURE: &[u8] = b"CUSTOM-META";

/// Size of the descriptor length field that follows the signature
pub const DESCRIPTOR_LEN_SIZE: usize = 4;

/// Bytes before the descriptor text
pub const HEADER_LEN: usize = SIGNATURE.len() + DESCRIPTOR_LEN_SIZE;

/// A finished metadata region: signature, descriptor length, descriptor and
/// packed values. Immutable and cheap to clone, so it can be handed to the
/// pipeline as the backing store of a new memory region without copying.
///
/// Only the codec creates these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedChunk {
    data: Bytes,
}

impl EncodedChunk {
    pub(crate) fn new(data: Bytes) -> Self {
        Self { data }
    }

    /// Total length, which is also the size of the region to allocate
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}

impl AsRef<[u8]> for EncodedChunk {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl Deref for EncodedChunk {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl From<EncodedChunk> for Bytes {
    fn from(chunk: EncodedChunk) -> Self {
        chunk.data
    }
}
