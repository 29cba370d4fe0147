//! framemeta: tag video buffers with self-describing metadata, or loop a
//! pipeline forever

use std::path::PathBuf;

use color_eyre::{eyre::eyre, Result};
use gstreamer as gst;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use framemeta::pipeline::{self, MetadataPipeline, PipelineLooper, PipelineStats, RunOutcome};
use framemeta::{Config, PipelineMode};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling and logging
    color_eyre::install()?;

    // Load configuration
    let path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = Config::load(path.as_deref())?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .init();

    info!("framemeta launching in {:?} mode", config.pipeline.mode);
    pipeline::init()?;

    let (pipeline, runner): (gst::Pipeline, Box<dyn FnOnce() -> Result<RunOutcome> + Send>) =
        match config.pipeline.mode {
            PipelineMode::MetadataTest => {
                let test = MetadataPipeline::new(&config)?;
                (test.pipeline().clone(), Box::new(move || test.run()))
            }
            PipelineMode::Loop => {
                let launch = config
                    .pipeline
                    .launch
                    .as_deref()
                    .ok_or_else(|| eyre!("pipeline.launch is required in loop mode"))?;
                let looper = PipelineLooper::new(launch)?;
                (looper.pipeline().clone(), Box::new(move || looper.run()))
            }
        };

    let mut handle = tokio::task::spawn_blocking(runner);

    let outcome = tokio::select! {
        res = &mut handle => res?,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, stats: {:?}", PipelineStats::query(&pipeline));
            pipeline::request_shutdown(&pipeline)?;
            handle.await?
        }
    };

    match outcome {
        Ok(outcome) => info!("framemeta shutting down ({:?})", outcome),
        Err(e) => {
            error!("Pipeline failed: {}", e);
            return Err(e);
        }
    }

    Ok(())
}
