//! Self-describing per-frame metadata carried as the last memory region of a
//! buffer
//!
//! Wire layout, little-endian, no padding:
//!
//! ```text
//! | "CUSTOM-META" | descriptor len (u32) | descriptor (UTF-8) | packed values |
//! ```

pub mod chunk;
pub mod codec;
pub mod error;
pub mod format;
pub mod regions;
pub mod value;

pub use chunk::{EncodedChunk, SIGNATURE};
pub use codec::MetadataCodec;
pub use error::MetaError;
pub use format::{FieldKind, FormatSpec};
pub use regions::{RegionList, RegionListMut};
pub use value::{DisplayValues, Value};
