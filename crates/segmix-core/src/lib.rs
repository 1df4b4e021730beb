//! Segmix Core - the segment layer of a real-time mixing pipeline
//!
//! Segments are processing nodes that read from and write to ring-buffered
//! sample streams. An external builder wires them into a graph and a scheduler
//! drives them one block ("tick") at a time in topological order. Segments
//! never call each other; data moves through a shared [`BufferArena`].
//!
//! # Core Abstractions
//!
//! - [`Segment`] - Uniform lifecycle, data-flow, and introspection contract
//! - [`SegmentNode`] - Closed set of the segment kinds below
//! - [`BufferArena`] / [`SampleBuffer`] - Bip-buffer sample streams addressed by [`BufferId`]
//! - [`BufferVec`] - Order-preserving slot list for variable-arity segments
//! - [`Channel`] - Interleaved multichannel endpoint
//!
//! # Segments
//!
//! - [`ChannelSegment`] - Source/drain between a [`Channel`] and per-channel buffers
//! - [`Distribute`] - Zero-copy fan-out gated by the slowest consumer
//! - [`Mixer`] - Equal-weight fan-in
//!
//! # Example
//!
//! ```rust
//! use segmix_core::{BufferArena, Field, Mixer, MONO, Segment};
//!
//! let mut arena = BufferArena::new();
//! let a = arena.create(64).unwrap();
//! let b = arena.create(64).unwrap();
//! let out = arena.create(64).unwrap();
//! arena.write(a, &[1.0; 8]).unwrap();
//! arena.write(b, &[0.0; 8]).unwrap();
//!
//! let mut mixer = Mixer::new();
//! mixer.set_input(Field::Buffer, 0, Some(a), &mut arena).unwrap();
//! mixer.set_input(Field::Buffer, 1, Some(b), &mut arena).unwrap();
//! mixer.set_output(Field::Buffer, MONO, Some(out), &mut arena).unwrap();
//!
//! mixer.start(&mut arena).unwrap();
//! mixer.mix(8, &mut arena).unwrap();
//! assert_eq!(arena.read_window(out).unwrap(), &[0.5; 8]);
//! ```
//!
//! # Errors
//!
//! Every fallible operation returns [`Result`]. Failures leave the segment
//! unchanged and are also recorded per thread, readable with [`last_error()`].
//!
//! # Design Principles
//!
//! - **Real-time safe**: `mix` never allocates or blocks
//! - **Handles, not pointers**: segments hold [`BufferId`]s; the arena owns memory
//! - **No output by default**: enable the `tracing` feature for setup-time events

pub mod buffer;
pub mod channel;
pub mod error;
pub mod segment;
pub mod segments;
pub mod vector;

pub use buffer::{BufferArena, BufferId, SampleBuffer};
pub use channel::{Channel, channel_join, channel_split};
pub use error::{Result, SegmentError, last_error};
pub use segment::{
    Arity, Field, FieldFlags, FieldInfo, Segment, SegmentInfo, SegmentNode, ValueKind,
};
pub use segments::{ChannelRole, ChannelSegment, Distribute, MONO, Mixer};
pub use vector::BufferVec;
