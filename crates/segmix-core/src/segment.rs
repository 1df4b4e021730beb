//! The uniform contract every pipeline segment implements.
//!
//! A segment is wired by an external builder through
//! [`set_input()`](Segment::set_input) / [`set_output()`](Segment::set_output),
//! prepared once with [`start()`](Segment::start), then driven one block at a
//! time with [`mix()`](Segment::mix). Segments never call each other; all data
//! flows through buffers in the [`BufferArena`].
//!
//! Only [`mix()`](Segment::mix) and [`describe()`](Segment::describe) are
//! required. The remaining operations default to "nothing to do" (release,
//! start) or "no such field" (the `set_*` family).
//!
//! # Introspection
//!
//! [`describe()`](Segment::describe) returns a static [`SegmentInfo`] the
//! builder uses to validate wiring before connecting segments: arity bounds and
//! a list of [`FieldInfo`] descriptors with [`FieldFlags`] direction bits.

use crate::buffer::{BufferArena, BufferId};
use crate::error::{Result, SegmentError, fail};
use crate::segments::{ChannelSegment, Distribute, Mixer};

/// Identifier of a settable field on a segment.
///
/// Only [`Field::Buffer`] is accepted by the segments in this crate. The other
/// fields belong to effect segments and are rejected here with
/// [`SegmentError::InvalidField`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// The sample buffer attached at a location.
    Buffer,
    /// Linear gain applied by an effect segment.
    Volume,
    /// Whether an effect segment passes audio through untouched.
    Bypass,
}

impl Field {
    /// The kind of value this field carries.
    pub const fn value_kind(self) -> ValueKind {
        match self {
            Self::Buffer => ValueKind::BufferHandle,
            Self::Volume => ValueKind::Float,
            Self::Bypass => ValueKind::Bool,
        }
    }
}

/// The kind of value a field carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// A [`BufferId`] handle.
    BufferHandle,
    /// A single `f32`.
    Float,
    /// A boolean toggle.
    Bool,
}

/// Direction and mutability bits for a [`FieldInfo`].
///
/// # Example
///
/// ```rust
/// use segmix_core::FieldFlags;
///
/// let flags = FieldFlags::INPUT.union(FieldFlags::SET);
/// assert!(flags.contains(FieldFlags::INPUT));
/// assert!(!flags.contains(FieldFlags::OUTPUT));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldFlags(u8);

impl FieldFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// The field exists on input locations (readable by the segment).
    pub const INPUT: Self = Self(1 << 0);
    /// The field exists on output locations (written by the segment).
    pub const OUTPUT: Self = Self(1 << 1);
    /// The field can be set by the builder.
    pub const SET: Self = Self(1 << 2);

    /// Returns `true` if all bits in `other` are set in `self`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the union of two flag sets.
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// Static description of one settable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    /// Which field this describes.
    pub field: Field,
    /// Type of the value carried per location.
    pub kind: ValueKind,
    /// Number of values per location.
    pub count: usize,
    /// Direction and mutability.
    pub flags: FieldFlags,
    /// Human-readable description.
    pub description: &'static str,
}

/// Upper bound on a segment's input or output count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many.
    Fixed(usize),
    /// Any number.
    Unbounded,
}

impl Arity {
    /// Returns `true` if `count` does not exceed this bound.
    #[inline]
    pub fn admits(self, count: usize) -> bool {
        match self {
            Self::Fixed(max) => count <= max,
            Self::Unbounded => true,
        }
    }
}

/// Metadata returned by [`Segment::describe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentInfo {
    /// Short kind name, e.g. `"mixer"`.
    pub name: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// Fewest inputs the segment can run with.
    pub min_inputs: usize,
    /// Most inputs the segment accepts.
    pub max_inputs: Arity,
    /// Number of outputs.
    pub outputs: Arity,
    /// Settable fields.
    pub fields: &'static [FieldInfo],
}

impl SegmentInfo {
    /// Looks up the descriptor for `field`.
    pub fn field(&self, field: Field) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.field == field)
    }
}

/// Descriptor shared by every segment that wires plain buffers.
pub(crate) const fn buffer_field(flags: FieldFlags) -> FieldInfo {
    FieldInfo {
        field: Field::Buffer,
        kind: Field::Buffer.value_kind(),
        count: 1,
        flags,
        description: "The buffer for audio data attached to the location.",
    }
}

/// Uniform lifecycle, data-flow, and introspection contract of a segment.
///
/// `mix` runs on the audio path: implementations must not allocate or block.
/// Allocation is confined to construction and the `set_*` operations, which
/// only run during graph setup. On failure an operation leaves the segment
/// unchanged and records the error (see [`last_error()`](crate::last_error)).
pub trait Segment {
    /// Frees auxiliary state such as slot vectors. Idempotent.
    fn release(&mut self) {}

    /// Prepares the segment before the first [`mix()`](Self::mix) of a run.
    fn start(&mut self, _buffers: &mut BufferArena) -> Result<()> {
        Ok(())
    }

    /// Processes one block of up to `samples` samples.
    fn mix(&mut self, samples: usize, buffers: &mut BufferArena) -> Result<()>;

    /// Attaches (`Some`) or detaches (`None`) an input at `location`.
    fn set_input(
        &mut self,
        field: Field,
        _location: usize,
        _value: Option<BufferId>,
        _buffers: &mut BufferArena,
    ) -> Result<()> {
        fail(SegmentError::InvalidField(field))
    }

    /// Attaches (`Some`) or detaches (`None`) an output at `location`.
    fn set_output(
        &mut self,
        field: Field,
        _location: usize,
        _value: Option<BufferId>,
        _buffers: &mut BufferArena,
    ) -> Result<()> {
        fail(SegmentError::InvalidField(field))
    }

    /// Returns the input attached at `location`.
    fn input(&self, _field: Field, _location: usize) -> Option<BufferId> {
        None
    }

    /// Returns the output attached at `location`.
    fn output(&self, _field: Field, _location: usize) -> Option<BufferId> {
        None
    }

    /// Static metadata about this segment.
    fn describe(&self) -> SegmentInfo;
}

/// Closed set of segment kinds, dispatched without boxing.
#[derive(Debug)]
pub enum SegmentNode {
    /// Channel adapter, in either source or drain role.
    Channel(ChannelSegment),
    /// One-to-many fan-out.
    Distribute(Distribute),
    /// Many-to-one fan-in.
    Mixer(Mixer),
}

impl From<ChannelSegment> for SegmentNode {
    fn from(segment: ChannelSegment) -> Self {
        Self::Channel(segment)
    }
}

impl From<Distribute> for SegmentNode {
    fn from(segment: Distribute) -> Self {
        Self::Distribute(segment)
    }
}

impl From<Mixer> for SegmentNode {
    fn from(segment: Mixer) -> Self {
        Self::Mixer(segment)
    }
}

impl SegmentNode {
    fn inner(&self) -> &dyn Segment {
        match self {
            Self::Channel(s) => s,
            Self::Distribute(s) => s,
            Self::Mixer(s) => s,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Segment {
        match self {
            Self::Channel(s) => s,
            Self::Distribute(s) => s,
            Self::Mixer(s) => s,
        }
    }
}

impl Segment for SegmentNode {
    fn release(&mut self) {
        self.inner_mut().release();
    }

    fn start(&mut self, buffers: &mut BufferArena) -> Result<()> {
        self.inner_mut().start(buffers)
    }

    fn mix(&mut self, samples: usize, buffers: &mut BufferArena) -> Result<()> {
        self.inner_mut().mix(samples, buffers)
    }

    fn set_input(
        &mut self,
        field: Field,
        location: usize,
        value: Option<BufferId>,
        buffers: &mut BufferArena,
    ) -> Result<()> {
        self.inner_mut().set_input(field, location, value, buffers)
    }

    fn set_output(
        &mut self,
        field: Field,
        location: usize,
        value: Option<BufferId>,
        buffers: &mut BufferArena,
    ) -> Result<()> {
        self.inner_mut().set_output(field, location, value, buffers)
    }

    fn input(&self, field: Field, location: usize) -> Option<BufferId> {
        self.inner().input(field, location)
    }

    fn output(&self, field: Field, location: usize) -> Option<BufferId> {
        self.inner().output(field, location)
    }

    fn describe(&self) -> SegmentInfo {
        self.inner().describe()
    }
}
