//! Reads metadata back out of buffers on a pad and logs it

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use color_eyre::{eyre::eyre, Result};
use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_video as gst_video;
use tracing::{debug, info, warn, Level};

use crate::meta::{DisplayValues, MetaError, MetadataCodec, Value};

/// Decode tally
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InspectStats {
    pub decoded: u64,
    pub failed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    decoded: AtomicU64,
    failed: AtomicU64,
}

/// Consumer side of a metadata channel. Never interrupts the stream: decode
/// failures are logged and counted, the buffer is passed on untouched.
#[derive(Debug, Clone)]
pub struct MetadataInspector {
    codec: Arc<MetadataCodec>,
    counters: Arc<Counters>,
}

impl MetadataInspector {
    pub fn new(codec: Arc<MetadataCodec>) -> Self {
        Self {
            codec,
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn stats(&self) -> InspectStats {
        InspectStats {
            decoded: self.counters.decoded.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }

    /// Decode one buffer and record the result
    pub fn inspect(&self, buffer: &gst::BufferRef) -> Result<Vec<Value>, MetaError> {
        debug!(
            buffer_size = buffer.size(),
            regions = buffer.n_memory(),
            "inspecting buffer"
        );

        match self.codec.decode(buffer) {
            Ok(values) => {
                self.counters.decoded.fetch_add(1, Ordering::Relaxed);
                info!("Metadata: {}", DisplayValues(&values));
                Ok(values)
            }
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!("Metadata error: {}", e);
                Err(e)
            }
        }
    }

    /// Install a buffer probe on `pad` that inspects everything reaching it
    pub fn install(&self, pad: &gst::Pad) -> Result<gst::PadProbeId> {
        let inspector = self.clone();
        pad.add_probe(gst::PadProbeType::BUFFER, move |pad, info| {
            if let Some(gst::PadProbeData::Buffer(ref buffer)) = info.data {
                if tracing::enabled!(Level::DEBUG) {
                    log_video_info(pad);
                }
                // failures are logged and counted by inspect, the buffer passes on
                inspector.inspect(buffer).ok();
            }
            gst::PadProbeReturn::Ok
        })
        .ok_or_else(|| eyre!("Failed to add inspection probe to pad {}", pad.name()))
    }
}

fn log_video_info(pad: &gst::Pad) {
    let Some(caps) = pad.current_caps() else {
        return;
    };
    match gst_video::VideoInfo::from_caps(&caps) {
        Ok(info) => debug!(
            width = info.width(),
            height = info.height(),
            format = ?info.format(),
            "video frame"
        ),
        Err(_) => debug!("caps {} are not raw video", caps),
    }
}
