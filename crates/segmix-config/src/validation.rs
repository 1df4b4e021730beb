//! Structural checks for segment and graph descriptions.
//!
//! Validation runs before anything is allocated, so a bad file is rejected
//! with every problem listed instead of failing on the first segment that
//! cannot be built.
//!
//! # Example
//!
//! ```rust
//! use segmix_config::{GraphConfig, SegmentConfig, validate_graph};
//!
//! let graph = GraphConfig::new(256)
//!     .with_segment(SegmentConfig::source("capture", 2, 256))
//!     .with_segment(SegmentConfig::mixer("bus"));
//! validate_graph(&graph).expect("graph should be valid");
//! ```

use std::collections::HashSet;
use thiserror::Error;

use crate::segment_config::{GraphConfig, SegmentConfig, SegmentKind};

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Segment has an empty name.
    #[error("segment name must not be empty")]
    EmptyName,

    /// Two segments share a name.
    #[error("duplicate segment name: {0}")]
    DuplicateName(String),

    /// Channel endpoint with no channels.
    #[error("segment '{0}' must have at least one channel")]
    ZeroChannels(String),

    /// Channel endpoint with no frame capacity.
    #[error("segment '{0}' must hold at least one frame")]
    ZeroFrames(String),

    /// Graph tick size of zero.
    #[error("block size must be non-zero")]
    ZeroBlockSize,

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn collect(errors: &mut Vec<ValidationError>, segment: &SegmentConfig) {
    if segment.name.is_empty() {
        errors.push(ValidationError::EmptyName);
    }
    if let SegmentKind::Source { channels, frames } | SegmentKind::Drain { channels, frames } =
        segment.kind
    {
        if channels == 0 {
            errors.push(ValidationError::ZeroChannels(segment.name.clone()));
        }
        if frames == 0 {
            errors.push(ValidationError::ZeroFrames(segment.name.clone()));
        }
    }
}

fn finish(mut errors: Vec<ValidationError>) -> ValidationResult<()> {
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

/// Validate a single segment description.
pub fn validate_segment(segment: &SegmentConfig) -> ValidationResult<()> {
    let mut errors = Vec::new();
    collect(&mut errors, segment);
    finish(errors)
}

/// Validate a whole graph: block size, every segment, and name uniqueness.
pub fn validate_graph(graph: &GraphConfig) -> ValidationResult<()> {
    let mut errors = Vec::new();
    if graph.block_size == 0 {
        errors.push(ValidationError::ZeroBlockSize);
    }

    let mut seen = HashSet::new();
    for segment in &graph.segments {
        collect(&mut errors, segment);
        if !segment.name.is_empty() && !seen.insert(segment.name.as_str()) {
            errors.push(ValidationError::DuplicateName(segment.name.clone()));
        }
    }
    finish(errors)
}
