//! Play an arbitrary launch description over and over

use color_eyre::{eyre::eyre, Result};
use gstreamer as gst;
use gstreamer::prelude::*;
use tracing::info;

use super::bus::{run_bus, EosAction, RunOutcome};

/// Pipeline built from a `gst-launch` style description that seeks back to
/// the start on every EOS
pub struct PipelineLooper {
    pipeline: gst::Pipeline,
}

impl PipelineLooper {
    pub fn new(description: &str) -> Result<Self> {
        info!("Pipeline: {}", description);

        let element = gst::parse::launch(description)
            .map_err(|e| eyre!("Failed to parse pipeline: {}", e))?;

        // A single element comes back bare, anything bigger is already a pipeline
        let pipeline = match element.downcast::<gst::Pipeline>() {
            Ok(pipeline) => pipeline,
            Err(element) => {
                let pipeline = gst::Pipeline::with_name("loop");
                pipeline.add(&element)?;
                pipeline
            }
        };

        Ok(Self { pipeline })
    }

    pub fn pipeline(&self) -> &gst::Pipeline {
        &self.pipeline
    }

    /// Block until an error or a shutdown request
    pub fn run(&self) -> Result<RunOutcome> {
        run_bus(&self.pipeline, EosAction::Rewind)
    }
}
