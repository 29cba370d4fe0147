use thiserror::Error;

/// Everything that can go wrong while building a codec, packing values or
/// reading a chunk back out of a buffer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetaError {
    #[error("invalid format descriptor {descriptor:?}: {reason}")]
    InvalidFormatSpec { descriptor: String, reason: String },

    #[error("failed to pack value at position {position}: {reason}")]
    ValuePack { position: usize, reason: String },

    #[error("no metadata memory chunk found (expected at least 2 regions, got {count})")]
    NoMetadataChunk { count: usize },

    #[error(
        "invalid metadata signature (expected {}, got {})",
        hex(.expected),
        hex(.actual)
    )]
    SignatureMismatch { expected: Vec<u8>, actual: Vec<u8> },

    #[error("malformed format descriptor: {reason}")]
    MalformedDescriptor { reason: String },

    #[error("format mismatch: expected {expected:?}, got {actual:?}")]
    FormatMismatch { expected: String, actual: String },

    #[error("truncated payload: expected {expected} bytes, got {actual}")]
    TruncatedPayload { expected: usize, actual: usize },

    #[error("failed to map region {index} for reading")]
    RegionUnreadable { index: usize },
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
