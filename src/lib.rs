pub mod meta;

#[cfg(feature = "gstreamer-pipeline")]
pub mod pipeline;

use std::path::Path;

use color_eyre::Result;
use serde::{Deserialize, Serialize};

pub use meta::{MetaError, MetadataCodec, Value};

/// Prefix for environment overrides, e.g. `FRAMEMETA__PIPELINE__NUM_BUFFERS=10`
pub const ENV_PREFIX: &str = "FRAMEMETA";

/// System configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub metadata: MetadataConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Format descriptor shared by the attacher and the inspector
    pub descriptor: String,
    /// Float stored next to the frame counter in every chunk
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineMode {
    /// videotestsrc -> attach -> sink, with the inspector on the sink pad
    MetadataTest,
    /// Run `launch` forever, seeking back to the start on EOS
    Loop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub mode: PipelineMode,
    pub num_buffers: i32,
    pub pattern: String,
    pub sink: String,
    pub launch: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            descriptor: "if".into(),
            value: 3.14,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: PipelineMode::MetadataTest,
            num_buffers: 100,
            pattern: "smpte".into(),
            sink: "autovideosink".into(),
            launch: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "framemeta=info".into(),
        }
    }
}

impl Config {
    /// Layer an optional TOML file and `FRAMEMETA__*` environment variables
    /// over the defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let config = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Parse a TOML document on top of the defaults
    pub fn from_toml(text: &str) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Codec for the configured metadata channel
    pub fn codec(&self) -> Result<MetadataCodec, MetaError> {
        MetadataCodec::new(&self.metadata.descriptor)
    }
}
