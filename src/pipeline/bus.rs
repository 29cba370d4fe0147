//! Blocking bus loop shared by the metadata test pipeline and the looper

use color_eyre::{eyre::eyre, Result};
use gstreamer as gst;
use gstreamer::prelude::*;
use tracing::{debug, error, info, warn};

/// Name of the application message that asks `run_bus` to return
pub const SHUTDOWN_MESSAGE: &str = "framemeta-shutdown";

/// What to do when the pipeline reaches end of stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EosAction {
    Stop,
    /// Flush-seek back to the start and keep playing
    Rewind,
}

/// Why `run_bus` returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Eos,
    Shutdown,
}

/// Set `pipeline` to Playing and handle bus messages until EOS (with
/// `EosAction::Stop`), an error or a shutdown request. The pipeline is back in
/// the Null state when this returns, whatever the outcome.
pub fn run_bus(pipeline: &gst::Pipeline, on_eos: EosAction) -> Result<RunOutcome> {
    let bus = pipeline
        .bus()
        .ok_or_else(|| eyre!("Pipeline has no bus"))?;

    info!("Starting pipeline {}", pipeline.name());
    pipeline
        .set_state(gst::State::Playing)
        .map_err(|e| eyre!("Failed to start pipeline: {:?}", e))?;

    let result = handle_messages(pipeline, &bus, on_eos);

    info!("Stopping pipeline {}", pipeline.name());
    pipeline
        .set_state(gst::State::Null)
        .map_err(|e| eyre!("Failed to stop pipeline: {:?}", e))?;

    result
}

fn handle_messages(
    pipeline: &gst::Pipeline,
    bus: &gst::Bus,
    on_eos: EosAction,
) -> Result<RunOutcome> {
    for msg in bus.iter_timed(gst::ClockTime::NONE) {
        use gst::MessageView;

        match msg.view() {
            MessageView::Eos(..) => match on_eos {
                EosAction::Stop => {
                    info!("End of stream");
                    return Ok(RunOutcome::Eos);
                }
                EosAction::Rewind => {
                    info!("End of stream reached, seeking back to start");
                    if let Err(e) = pipeline.seek_simple(
                        gst::SeekFlags::FLUSH | gst::SeekFlags::KEY_UNIT,
                        gst::ClockTime::ZERO,
                    ) {
                        error!("Seek operation failed: {}", e);
                        return Err(eyre!("Failed to rewind pipeline: {}", e));
                    }
                }
            },
            MessageView::Error(err) => {
                return Err(eyre!(
                    "Error from {:?}: {} ({:?})",
                    err.src().map(|s| s.path_string()),
                    err.error(),
                    err.debug()
                ));
            }
            MessageView::Warning(warning) => {
                warn!(
                    "Warning from {:?}: {} ({:?})",
                    warning.src().map(|s| s.path_string()),
                    warning.error(),
                    warning.debug()
                );
            }
            MessageView::StateChanged(change) => {
                if change.src() == Some(pipeline.upcast_ref::<gst::Object>()) {
                    debug!(
                        "Pipeline state changed {:?} -> {:?}",
                        change.old(),
                        change.current()
                    );
                }
            }
            MessageView::Application(app) => {
                if app
                    .structure()
                    .is_some_and(|s| s.has_name(SHUTDOWN_MESSAGE))
                {
                    info!("Shutdown requested");
                    return Ok(RunOutcome::Shutdown);
                }
            }
            _ => {}
        }
    }

    Err(eyre!("Bus closed unexpectedly"))
}

/// Ask a running `run_bus` on `pipeline` to return. Callable from any thread.
pub fn request_shutdown(pipeline: &gst::Pipeline) -> Result<()> {
    let bus = pipeline
        .bus()
        .ok_or_else(|| eyre!("Pipeline has no bus"))?;
    let msg = gst::message::Application::new(gst::Structure::new_empty(SHUTDOWN_MESSAGE));
    bus.post(msg)
        .map_err(|e| eyre!("Failed to post shutdown message: {}", e))
}

/// Pipeline statistics for monitoring
#[derive(Debug)]
pub struct PipelineStats {
    pub position: Option<u64>,
    pub state: String,
}

impl PipelineStats {
    pub fn query(pipeline: &gst::Pipeline) -> Self {
        let position = pipeline.query_position::<gst::ClockTime>();

        Self {
            position: position.map(|p| p.mseconds()),
            state: format!("{:?}", pipeline.current_state()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_shutdown_message_stops_bus_loop() {
        crate::pipeline::init().unwrap();
        let pipeline = gst::Pipeline::new();

        let remote = pipeline.clone();
        let poster = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            request_shutdown(&remote).unwrap();
        });
        let outcome = run_bus(&pipeline, EosAction::Stop).unwrap();

        poster.join().unwrap();
        assert_eq!(outcome, RunOutcome::Shutdown);
        assert_eq!(pipeline.current_state(), gst::State::Null);
    }
}
