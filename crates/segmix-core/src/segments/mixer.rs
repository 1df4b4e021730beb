//! Fan-in of any number of streams into one mono output.
//!
//! The mix is a plain arithmetic mean: every input is weighted `1 / count`,
//! with no clipping and no per-input gain. Gain staging belongs to upstream
//! segments.

use crate::buffer::{BufferArena, BufferId};
use crate::error::{Result, SegmentError, fail, invalid_location};
use crate::segment::{Arity, Field, FieldFlags, FieldInfo, Segment, SegmentInfo, buffer_field};
use crate::vector::BufferVec;

/// Location of the mixer's single output.
pub const MONO: usize = 0;

const FIELDS: &[FieldInfo] = &[buffer_field(
    FieldFlags::INPUT.union(FieldFlags::OUTPUT).union(FieldFlags::SET),
)];

/// Many-to-one averaging segment.
#[derive(Debug, Default)]
pub struct Mixer {
    output: Option<BufferId>,
    inputs: BufferVec,
}

impl Mixer {
    /// Creates a mixer with no output and no inputs.
    pub fn new() -> Self {
        #[cfg(feature = "tracing")]
        tracing::debug!("segment_make: mixer");
        Self::default()
    }

    /// Creates a mixer pre-wired to `output` and `inputs` (in slot order).
    pub fn with_buffers(output: BufferId, inputs: &[BufferId]) -> Result<Self> {
        let mut mixer = Self::default();
        mixer.inputs.reserve(inputs.len())?;
        for &input in inputs {
            mixer.inputs.push(input)?;
        }
        mixer.output = Some(output);
        #[cfg(feature = "tracing")]
        tracing::debug!("segment_make: mixer with {} inputs", inputs.len());
        Ok(mixer)
    }

    /// The attached input handles in slot order.
    pub fn inputs(&self) -> &[BufferId] {
        self.inputs.as_slice()
    }
}

impl Segment for Mixer {
    fn release(&mut self) {
        self.inputs.release();
        self.output = None;
    }

    fn mix(&mut self, samples: usize, buffers: &mut BufferArena) -> Result<()> {
        let count = self.inputs.len();
        if count == 0 {
            return Ok(());
        }
        let Some(output) = self.output else {
            return fail(SegmentError::BufferMissing);
        };

        let mut ready = samples;
        for input in self.inputs.iter() {
            ready = ready.min(buffers.read_window(input)?.len());
        }
        let inputs = self.inputs.as_slice();
        let gain = 1.0 / count as f32;
        let written = buffers.with_write_window(output, |window, arena| -> Result<usize> {
            let n = ready.min(window.len());
            let window = &mut window[..n];
            window.fill(0.0);
            for &input in inputs {
                let source = arena.read_window(input)?;
                for (dst, src) in window.iter_mut().zip(source) {
                    *dst += *src;
                }
            }
            for sample in window.iter_mut() {
                *sample *= gain;
            }
            Ok(n)
        })??;

        for input in self.inputs.iter() {
            buffers.finish_read(input, written)?;
        }
        buffers.finish_write(output, written)?;
        Ok(())
    }

    fn set_input(
        &mut self,
        field: Field,
        location: usize,
        value: Option<BufferId>,
        _buffers: &mut BufferArena,
    ) -> Result<()> {
        if field != Field::Buffer {
            return fail(SegmentError::InvalidField(field));
        }
        match value {
            Some(id) => {
                self.inputs.attach(location, id)?;
            }
            None => {
                self.inputs.remove(location)?;
            }
        }
        #[cfg(feature = "tracing")]
        tracing::debug!("mixer_set_in: [{location}] = {value:?}");
        Ok(())
    }

    fn set_output(
        &mut self,
        field: Field,
        location: usize,
        value: Option<BufferId>,
        _buffers: &mut BufferArena,
    ) -> Result<()> {
        if field != Field::Buffer {
            return fail(SegmentError::InvalidField(field));
        }
        if !self.describe().outputs.admits(location.saturating_add(1)) {
            return invalid_location(location, MONO + 1);
        }
        self.output = value;
        #[cfg(feature = "tracing")]
        tracing::debug!("mixer_set_out: {value:?}");
        Ok(())
    }

    fn input(&self, field: Field, location: usize) -> Option<BufferId> {
        if field == Field::Buffer {
            self.inputs.get(location)
        } else {
            None
        }
    }

    fn output(&self, field: Field, location: usize) -> Option<BufferId> {
        if field == Field::Buffer && location == MONO {
            self.output
        } else {
            None
        }
    }

    fn describe(&self) -> SegmentInfo {
        SegmentInfo {
            name: "mixer",
            description: "Mixes multiple buffers together",
            min_inputs: 0,
            max_inputs: Arity::Unbounded,
            outputs: Arity::Fixed(1),
            fields: FIELDS,
        }
    }
}
