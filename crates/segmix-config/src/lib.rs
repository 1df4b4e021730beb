//! Graph descriptions for segmix.
//!
//! Describes which segments a mixing graph contains in TOML, validates the
//! description, and constructs the segments. Wiring buffers between them is
//! left to the caller.
//!
//! # Features
//!
//! - **Graph Files**: Load and save graph descriptions as TOML
//! - **Validation**: Reject zero-sized endpoints and duplicate names up front
//! - **Construction**: Build [`SegmentNode`]s from descriptions
//! - **Kind Registry**: Name, description, and arity of every segment kind
//!
//! # Example
//!
//! ```rust
//! use segmix_config::{GraphConfig, describe_kind};
//! use segmix_core::Segment;
//!
//! let graph = GraphConfig::from_toml_str(r#"
//!     block_size = 64
//!
//!     [[segments]]
//!     name = "capture"
//!     kind = "source"
//!     channels = 2
//!     frames = 64
//!
//!     [[segments]]
//!     name = "bus"
//!     kind = "mixer"
//! "#).unwrap();
//!
//! let nodes = graph.build().unwrap();
//! assert_eq!(nodes[1].describe().name, "mixer");
//! assert!(describe_kind("distribute").is_some());
//! ```

mod error;
mod segment_config;

/// Segment kind catalogue.
pub mod registry;

/// Segment and graph validation.
pub mod validation;

pub use error::ConfigError;
pub use registry::{KindDescriptor, Ports, describe_kind, segment_kinds};
pub use segment_config::{GraphConfig, SegmentConfig, SegmentKind};
pub use validation::{ValidationError, ValidationResult, validate_graph, validate_segment};

/// Re-export of the node type configs build into.
pub use segmix_core::SegmentNode;
