//! Serializable segment and graph descriptions.

use segmix_core::{Channel, ChannelSegment, Distribute, Mixer, SegmentNode};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::validation::{validate_graph, validate_segment};

/// Kind-specific settings of a segment, tagged by `kind` in TOML.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SegmentKind {
    /// Splits an interleaved capture endpoint into per-channel buffers.
    Source {
        /// Channel count of the endpoint.
        channels: usize,
        /// Frame capacity of the endpoint.
        frames: usize,
    },
    /// Joins per-channel buffers into an interleaved playback endpoint.
    Drain {
        /// Channel count of the endpoint.
        channels: usize,
        /// Frame capacity of the endpoint.
        frames: usize,
    },
    /// One-to-many fan-out over a shared input buffer.
    Distribute,
    /// Many-to-one averaging mix.
    Mixer,
}

impl SegmentKind {
    /// The kind name used in TOML and by the registry.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Source { .. } => "source",
            Self::Drain { .. } => "drain",
            Self::Distribute => "distribute",
            Self::Mixer => "mixer",
        }
    }
}

/// One named segment in a graph description.
///
/// # TOML Format
///
/// ```toml
/// name = "capture"
/// kind = "source"
/// channels = 2
/// frames = 256
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SegmentConfig {
    /// Unique name within the graph.
    pub name: String,

    /// Kind and kind-specific settings.
    #[serde(flatten)]
    pub kind: SegmentKind,
}

impl SegmentConfig {
    /// Create a segment description.
    pub fn new(name: impl Into<String>, kind: SegmentKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// A source with `channels` channels and room for `frames` frames.
    pub fn source(name: impl Into<String>, channels: usize, frames: usize) -> Self {
        Self::new(name, SegmentKind::Source { channels, frames })
    }

    /// A drain with `channels` channels and room for `frames` frames.
    pub fn drain(name: impl Into<String>, channels: usize, frames: usize) -> Self {
        Self::new(name, SegmentKind::Drain { channels, frames })
    }

    /// A distribute segment.
    pub fn distribute(name: impl Into<String>) -> Self {
        Self::new(name, SegmentKind::Distribute)
    }

    /// A mixer segment.
    pub fn mixer(name: impl Into<String>) -> Self {
        Self::new(name, SegmentKind::Mixer)
    }

    /// Validate and construct the segment, unwired.
    pub fn build(&self) -> Result<SegmentNode, ConfigError> {
        validate_segment(self)?;
        let node = match self.kind {
            SegmentKind::Source { channels, frames } => {
                ChannelSegment::source(Channel::new(channels, frames)?)?.into()
            }
            SegmentKind::Drain { channels, frames } => {
                ChannelSegment::drain(Channel::new(channels, frames)?)?.into()
            }
            SegmentKind::Distribute => Distribute::new().into(),
            SegmentKind::Mixer => Mixer::new().into(),
        };
        Ok(node)
    }
}

/// A graph description: tick size plus the segments to construct.
///
/// Wiring between segments is left to the caller; the description only
/// fixes which segments exist and how their endpoints are sized.
///
/// # TOML Format
///
/// ```toml
/// block_size = 256
///
/// [[segments]]
/// name = "capture"
/// kind = "source"
/// channels = 2
/// frames = 256
///
/// [[segments]]
/// name = "bus"
/// kind = "mixer"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphConfig {
    /// Samples per tick.
    #[serde(default = "default_block_size")]
    pub block_size: usize,

    /// Segments in declaration order.
    #[serde(default)]
    pub segments: Vec<SegmentConfig>,
}

fn default_block_size() -> usize {
    256
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self::new(default_block_size())
    }
}

impl GraphConfig {
    /// Create an empty graph with the given tick size.
    pub fn new(block_size: usize) -> Self {
        Self {
            block_size,
            segments: Vec::new(),
        }
    }

    /// Add a segment to the graph.
    pub fn with_segment(mut self, segment: SegmentConfig) -> Self {
        self.segments.push(segment);
        self
    }

    /// Load a graph from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml_str(&content)
    }

    /// Parse a graph from a TOML string.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the graph to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml_string()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the graph to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Look up a segment by name.
    pub fn get(&self, name: &str) -> Option<&SegmentConfig> {
        self.segments.iter().find(|s| s.name == name)
    }

    /// Validate the graph and construct every segment in declaration order.
    pub fn build(&self) -> Result<Vec<SegmentNode>, ConfigError> {
        validate_graph(self)?;
        self.segments.iter().map(SegmentConfig::build).collect()
    }
}
