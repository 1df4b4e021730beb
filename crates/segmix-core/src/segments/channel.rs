//! Boundary segments between a multichannel endpoint and mono buffers.
//!
//! A source splits the endpoint window into one output buffer per channel; a
//! drain joins one input buffer per channel back into the endpoint. The slot
//! array is sized to the endpoint's channel count at construction and never
//! grows.

use crate::buffer::{BufferArena, BufferId};
use crate::channel::{Channel, channel_join, channel_split};
use crate::error::{Result, SegmentError, fail, invalid_location};
use crate::segment::{Arity, Field, FieldFlags, FieldInfo, Segment, SegmentInfo, buffer_field};

const SOURCE_FIELDS: &[FieldInfo] = &[buffer_field(FieldFlags::OUTPUT.union(FieldFlags::SET))];
const DRAIN_FIELDS: &[FieldInfo] = &[buffer_field(FieldFlags::INPUT.union(FieldFlags::SET))];

/// Which side of the endpoint the segment sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRole {
    /// Endpoint → per-channel output buffers.
    Source,
    /// Per-channel input buffers → endpoint.
    Drain,
}

/// Channel adapter segment.
#[derive(Debug)]
pub struct ChannelSegment {
    role: ChannelRole,
    channel: Channel,
    buffers: Vec<Option<BufferId>>,
}

impl ChannelSegment {
    /// Creates a source reading from `channel`.
    pub fn source(channel: Channel) -> Result<Self> {
        Self::new(ChannelRole::Source, channel)
    }

    /// Creates a drain writing into `channel`.
    pub fn drain(channel: Channel) -> Result<Self> {
        Self::new(ChannelRole::Drain, channel)
    }

    fn new(role: ChannelRole, channel: Channel) -> Result<Self> {
        let mut buffers = Vec::new();
        if buffers.try_reserve_exact(channel.channels()).is_err() {
            return fail(SegmentError::OutOfMemory);
        }
        buffers.resize(channel.channels(), None);
        #[cfg(feature = "tracing")]
        tracing::debug!("segment_make: {role:?} with {} channels", channel.channels());
        Ok(Self {
            role,
            channel,
            buffers,
        })
    }

    /// The segment's role.
    pub fn role(&self) -> ChannelRole {
        self.role
    }

    /// The endpoint, for device code to read after a drain tick.
    pub fn endpoint(&self) -> &Channel {
        &self.channel
    }

    /// The endpoint, for device code to fill before a source tick.
    pub fn endpoint_mut(&mut self) -> &mut Channel {
        &mut self.channel
    }

    /// The per-channel slots in channel order.
    pub fn buffers(&self) -> &[Option<BufferId>] {
        &self.buffers
    }

    fn set_buffer(&mut self, field: Field, location: usize, value: Option<BufferId>) -> Result<()> {
        if field != Field::Buffer {
            return fail(SegmentError::InvalidField(field));
        }
        let limit = self.buffers.len();
        let Some(slot) = self.buffers.get_mut(location) else {
            return invalid_location(location, limit);
        };
        *slot = value;
        #[cfg(feature = "tracing")]
        tracing::debug!("segment_set: {:?}[{location}] = {value:?}", self.role);
        Ok(())
    }

    fn buffer(&self, field: Field, location: usize) -> Option<BufferId> {
        if field != Field::Buffer {
            return None;
        }
        self.buffers.get(location).copied().flatten()
    }
}

impl Segment for ChannelSegment {
    fn release(&mut self) {
        self.buffers.fill(None);
    }

    fn mix(&mut self, samples: usize, buffers: &mut BufferArena) -> Result<()> {
        match self.role {
            ChannelRole::Source => channel_split(&self.channel, &self.buffers, samples, buffers)?,
            ChannelRole::Drain => channel_join(&self.buffers, &mut self.channel, samples, buffers)?,
        };
        Ok(())
    }

    fn set_input(
        &mut self,
        field: Field,
        location: usize,
        value: Option<BufferId>,
        _buffers: &mut BufferArena,
    ) -> Result<()> {
        match self.role {
            ChannelRole::Drain => self.set_buffer(field, location, value),
            ChannelRole::Source => fail(SegmentError::InvalidField(field)),
        }
    }

    fn set_output(
        &mut self,
        field: Field,
        location: usize,
        value: Option<BufferId>,
        _buffers: &mut BufferArena,
    ) -> Result<()> {
        match self.role {
            ChannelRole::Source => self.set_buffer(field, location, value),
            ChannelRole::Drain => fail(SegmentError::InvalidField(field)),
        }
    }

    fn input(&self, field: Field, location: usize) -> Option<BufferId> {
        match self.role {
            ChannelRole::Drain => self.buffer(field, location),
            ChannelRole::Source => None,
        }
    }

    fn output(&self, field: Field, location: usize) -> Option<BufferId> {
        match self.role {
            ChannelRole::Source => self.buffer(field, location),
            ChannelRole::Drain => None,
        }
    }

    fn describe(&self) -> SegmentInfo {
        let channels = self.channel.channels();
        match self.role {
            ChannelRole::Source => SegmentInfo {
                name: "source",
                description: "Segment acting as an audio source.",
                min_inputs: 0,
                max_inputs: Arity::Fixed(0),
                outputs: Arity::Fixed(channels),
                fields: SOURCE_FIELDS,
            },
            ChannelRole::Drain => SegmentInfo {
                name: "drain",
                description: "Segment acting as an audio drain.",
                min_inputs: channels,
                max_inputs: Arity::Fixed(channels),
                outputs: Arity::Fixed(0),
                fields: DRAIN_FIELDS,
            },
        }
    }
}
