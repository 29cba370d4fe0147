//! GStreamer glue around the metadata codec

pub mod attach;
pub mod bus;
pub mod inspect;
pub mod looper;

pub use attach::MetadataAttacher;
pub use bus::{request_shutdown, run_bus, EosAction, PipelineStats, RunOutcome};
pub use inspect::{InspectStats, MetadataInspector};
pub use looper::PipelineLooper;
pub use metadata_test::MetadataPipeline;

use color_eyre::{eyre::eyre, Result};
use gstreamer as gst;

/// Initialize GStreamer, safe to call more than once
pub fn init() -> Result<()> {
    gst::init().map_err(|e| eyre!("Failed to initialize GStreamer: {}", e))
}
