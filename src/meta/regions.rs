//! Views over a buffer's ordered list of memory regions
//!
//! The pipeline framework owns the regions. Reading copies bytes out, appending
//! hands a finished chunk over as the new last region.

use bytes::Bytes;

use super::chunk::EncodedChunk;
use super::error::MetaError;

/// Read access to an ordered list of memory regions
pub trait RegionList {
    fn region_count(&self) -> usize;

    /// Copy out the bytes of region `index`
    fn read_region(&self, index: usize) -> Result<Bytes, MetaError>;
}

/// Append access to an ordered list of memory regions
pub trait RegionListMut {
    /// Add `chunk` after every existing region
    fn append_region(&mut self, chunk: EncodedChunk);
}

impl<T: AsRef<[u8]>> RegionList for [T] {
    fn region_count(&self) -> usize {
        self.len()
    }

    fn read_region(&self, index: usize) -> Result<Bytes, MetaError> {
        self.get(index)
            .map(|region| Bytes::copy_from_slice(region.as_ref()))
            .ok_or(MetaError::RegionUnreadable { index })
    }
}

impl<T: AsRef<[u8]>> RegionList for Vec<T> {
    fn region_count(&self) -> usize {
        self.as_slice().region_count()
    }

    fn read_region(&self, index: usize) -> Result<Bytes, MetaError> {
        self.as_slice().read_region(index)
    }
}

impl RegionListMut for Vec<Bytes> {
    fn append_region(&mut self, chunk: EncodedChunk) {
        self.push(chunk.into_bytes());
    }
}

#[cfg(feature = "gstreamer-pipeline")]
mod gst_impl {
    use gstreamer as gst;

    use super::*;

    impl RegionList for gst::BufferRef {
        fn region_count(&self) -> usize {
            self.n_memory()
        }

        fn read_region(&self, index: usize) -> Result<Bytes, MetaError> {
            if index >= self.n_memory() {
                return Err(MetaError::RegionUnreadable { index });
            }
            let map = self
                .peek_memory(index)
                .map_readable()
                .map_err(|_| MetaError::RegionUnreadable { index })?;
            Ok(Bytes::copy_from_slice(map.as_slice()))
        }
    }

    impl RegionListMut for gst::BufferRef {
        fn append_region(&mut self, chunk: EncodedChunk) {
            self.append_memory(gst::Memory::from_slice(chunk));
        }
    }
}
