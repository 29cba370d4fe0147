//! Appends a metadata chunk carrying a running frame count to every buffer

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use color_eyre::{eyre::eyre, Result};
use gstreamer as gst;
use gstreamer::prelude::*;
use tracing::{debug, error};

use crate::meta::{FieldKind, MetaError, MetadataCodec, RegionListMut, Value};

/// Pad probe state for the producer side of a metadata channel
///
/// The codec must describe exactly two fields: an integer for the frame count
/// and a float for the constant value. The frame counter lives here, one per
/// attacher, and is shared by clones.
#[derive(Debug, Clone)]
pub struct MetadataAttacher {
    codec: Arc<MetadataCodec>,
    value: f64,
    frames: Arc<AtomicU64>,
}

impl MetadataAttacher {
    pub fn new(codec: Arc<MetadataCodec>, value: f64) -> Result<Self> {
        match codec.fields() {
            [count, value_kind] if is_integer(*count) && is_float(*value_kind) => {}
            _ => {
                return Err(eyre!(
                    "Descriptor {:?} does not describe a (frame count, value) pair",
                    codec.descriptor()
                ))
            }
        }

        Ok(Self {
            codec,
            value,
            frames: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Number of buffers tagged so far
    pub fn frame_count(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    pub fn codec(&self) -> &Arc<MetadataCodec> {
        &self.codec
    }

    /// Tag one buffer with the next frame number. Returns that number.
    ///
    /// The counter only advances once a chunk has been encoded, so a buffer
    /// that fails leaves no gap in the numbering.
    pub fn attach(&self, buffer: &mut gst::BufferRef) -> Result<u64, MetaError> {
        let (frame, chunk) = loop {
            let current = self.frames.load(Ordering::Acquire);
            let frame = current + 1;
            let chunk = self.codec.encode(&self.frame_values(frame)?)?;
            if self
                .frames
                .compare_exchange(current, frame, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                break (frame, chunk);
            }
        };
        let len = chunk.len();
        buffer.append_region(chunk);

        debug!(
            frame,
            chunk_len = len,
            buffer_size = buffer.size(),
            regions = buffer.n_memory(),
            "metadata attached"
        );
        Ok(frame)
    }

    /// Install a buffer probe on `pad` that tags everything passing through.
    /// Buffers that cannot be tagged are dropped.
    pub fn install(&self, pad: &gst::Pad) -> Result<gst::PadProbeId> {
        let attacher = self.clone();
        pad.add_probe(gst::PadProbeType::BUFFER, move |_pad, info| {
            if let Some(gst::PadProbeData::Buffer(ref mut buffer)) = info.data {
                if let Err(e) = attacher.attach(buffer.make_mut()) {
                    error!("Failed to attach metadata: {}", e);
                    return gst::PadProbeReturn::Drop;
                }
            }
            gst::PadProbeReturn::Ok
        })
        .ok_or_else(|| eyre!("Failed to add metadata probe to pad {}", pad.name()))
    }

    fn frame_values(&self, frame: u64) -> Result<Vec<Value>, MetaError> {
        let fields = self.codec.fields();
        let overflow = |kind: FieldKind| MetaError::ValuePack {
            position: 0,
            reason: format!("frame {frame} does not fit in {kind}"),
        };

        let count = match fields[0] {
            FieldKind::I32 => Value::I32(i32::try_from(frame).map_err(|_| overflow(fields[0]))?),
            FieldKind::U32 => Value::U32(u32::try_from(frame).map_err(|_| overflow(fields[0]))?),
            FieldKind::I64 => Value::I64(i64::try_from(frame).map_err(|_| overflow(fields[0]))?),
            FieldKind::U64 => Value::U64(frame),
            FieldKind::I16 => Value::I16(i16::try_from(frame).map_err(|_| overflow(fields[0]))?),
            FieldKind::U16 => Value::U16(u16::try_from(frame).map_err(|_| overflow(fields[0]))?),
            kind => return Err(overflow(kind)),
        };
        let value = match fields[1] {
            FieldKind::F64 => Value::F64(self.value),
            _ => Value::F32(self.value as f32),
        };

        Ok(vec![count, value])
    }
}

fn is_integer(kind: FieldKind) -> bool {
    matches!(
        kind,
        FieldKind::I16
            | FieldKind::U16
            | FieldKind::I32
            | FieldKind::U32
            | FieldKind::I64
            | FieldKind::U64
    )
}

fn is_float(kind: FieldKind) -> bool {
    matches!(kind, FieldKind::F32 | FieldKind::F64)
}
