//! The segment kinds provided by this crate.
//!
//! - [`ChannelSegment`]: source/drain adapter between a multichannel
//!   [`Channel`](crate::Channel) and one mono buffer per channel.
//! - [`Distribute`]: one input fanned out to any number of virtual outputs.
//! - [`Mixer`]: any number of inputs averaged into one output.

pub mod channel;
pub mod distribute;
pub mod mixer;

pub use channel::{ChannelRole, ChannelSegment};
pub use distribute::Distribute;
pub use mixer::{MONO, Mixer};
