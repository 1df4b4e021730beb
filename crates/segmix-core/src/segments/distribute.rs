//! Fan-out of one stream to many consumers without copying.
//!
//! Every output is a virtual buffer aliasing the input's storage. Consumers
//! advance their own read cursors; on each tick the segment reclaims from the
//! input only what the *slowest* consumer has passed, then republishes the
//! input's primary region to every output.
//!
//! # Flow control
//!
//! With `previous` the input's readable amount published last tick and
//! `remaining` the largest unread amount across outputs, the input's read
//! cursor advances by `previous - remaining`, so no consumer ever loses data
//! it has not read.
//!
//! # Limitations
//!
//! Only the input's primary region is mirrored. When unread data spans both
//! bip regions, the wrapped part is not visible to consumers until the primary
//! region drains and the secondary region is promoted.

use crate::buffer::{BufferArena, BufferId};
use crate::error::{Result, SegmentError, fail, invalid_location};
use crate::segment::{Arity, Field, FieldFlags, FieldInfo, Segment, SegmentInfo, buffer_field};
use crate::vector::BufferVec;

const FIELDS: &[FieldInfo] = &[buffer_field(
    FieldFlags::INPUT.union(FieldFlags::OUTPUT).union(FieldFlags::SET),
)];

/// One-to-many fan-out segment.
#[derive(Debug, Default)]
pub struct Distribute {
    input: Option<BufferId>,
    outputs: BufferVec,
    previous_available: usize,
}

impl Distribute {
    /// Creates a distribute segment with no input and no outputs.
    pub fn new() -> Self {
        #[cfg(feature = "tracing")]
        tracing::debug!("segment_make: distribute");
        Self::default()
    }

    /// The attached output handles in slot order.
    pub fn outputs(&self) -> &[BufferId] {
        self.outputs.as_slice()
    }

    /// Readable amount published to the outputs on the last tick.
    pub fn previous_available(&self) -> usize {
        self.previous_available
    }
}

impl Segment for Distribute {
    fn release(&mut self) {
        self.outputs.release();
        self.input = None;
    }

    fn start(&mut self, buffers: &mut BufferArena) -> Result<()> {
        let Some(input) = self.input else {
            return fail(SegmentError::BufferMissing);
        };
        if !buffers.get(input)?.has_storage() {
            return fail(SegmentError::BufferMissing);
        }
        for output in self.outputs.iter() {
            buffers.get(output)?;
        }
        for output in self.outputs.iter() {
            buffers.alias(output, input)?;
        }
        self.previous_available = 0;
        #[cfg(feature = "tracing")]
        tracing::debug!("distribute_start: {input} -> {} outputs", self.outputs.len());
        Ok(())
    }

    fn mix(&mut self, _samples: usize, buffers: &mut BufferArena) -> Result<()> {
        let Some(input) = self.input else {
            return fail(SegmentError::BufferMissing);
        };
        let mut remaining = 0;
        for output in self.outputs.iter() {
            remaining = remaining.max(buffers.available_read(output)?);
        }
        let reclaimed = self.previous_available.saturating_sub(remaining);
        buffers.finish_read(input, reclaimed)?;

        self.previous_available = buffers.available_read(input)?;
        for output in self.outputs.iter() {
            buffers.mirror_region(output, input)?;
        }
        Ok(())
    }

    fn set_input(
        &mut self,
        field: Field,
        location: usize,
        value: Option<BufferId>,
        buffers: &mut BufferArena,
    ) -> Result<()> {
        if field != Field::Buffer {
            return fail(SegmentError::InvalidField(field));
        }
        if !self.describe().max_inputs.admits(location.saturating_add(1)) {
            return invalid_location(location, 1);
        }
        if let Some(id) = value
            && buffers.get(id)?.has_storage()
        {
            return fail(SegmentError::BufferAllocated);
        }
        self.input = value;
        #[cfg(feature = "tracing")]
        tracing::debug!("distribute_set_in: {value:?}");
        Ok(())
    }

    fn set_output(
        &mut self,
        field: Field,
        location: usize,
        value: Option<BufferId>,
        buffers: &mut BufferArena,
    ) -> Result<()> {
        if field != Field::Buffer {
            return fail(SegmentError::InvalidField(field));
        }
        match value {
            Some(id) => {
                buffers.get(id)?;
                // Late attach: join a running fan-out with an empty cursor.
                let target = match self.input {
                    Some(input) => buffers.get(input)?.has_storage().then_some(input),
                    None => None,
                };
                self.outputs.reserve(1)?;
                buffers.mark_virtual(id)?;
                if let Some(input) = target {
                    buffers.alias(id, input)?;
                }
                let _slot = self.outputs.attach(location, id)?;
                #[cfg(feature = "tracing")]
                tracing::debug!("distribute_set_out: [{_slot}] = {id}");
            }
            None => {
                let Some(id) = self.outputs.get(location) else {
                    return invalid_location(location, self.outputs.len());
                };
                buffers.release(id)?;
                self.outputs.remove(location)?;
                #[cfg(feature = "tracing")]
                tracing::debug!("distribute_set_out: removed [{location}] {id}");
            }
        }
        Ok(())
    }

    fn input(&self, field: Field, location: usize) -> Option<BufferId> {
        if field == Field::Buffer && location == 0 {
            self.input
        } else {
            None
        }
    }

    fn output(&self, field: Field, location: usize) -> Option<BufferId> {
        if field == Field::Buffer {
            self.outputs.get(location)
        } else {
            None
        }
    }

    fn describe(&self) -> SegmentInfo {
        SegmentInfo {
            name: "distribute",
            description: "Multiplexes a buffer to multiple outputs to consume it from.",
            min_inputs: 1,
            max_inputs: Arity::Fixed(1),
            outputs: Arity::Unbounded,
            fields: FIELDS,
        }
    }
}
