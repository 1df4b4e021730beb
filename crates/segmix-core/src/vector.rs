//! Growable, order-preserving list of buffer handles.
//!
//! [`BufferVec`] backs every variable-arity side of a segment (distribute
//! outputs, mixer inputs). The slot index is the wiring location. The vector
//! owns only its slot bookkeeping: dropping or releasing it never touches the
//! buffers the handles refer to, which stay owned by the
//! [`BufferArena`](crate::BufferArena).

use crate::buffer::BufferId;
use crate::error::{Result, SegmentError, fail, invalid_location};

/// Ordered collection of [`BufferId`]s keyed by slot position.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BufferVec {
    slots: Vec<BufferId>,
}

impl BufferVec {
    /// Creates an empty vector without allocating.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of occupied slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if no slot is occupied.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the handle at `pos`, if any.
    #[inline]
    pub fn get(&self, pos: usize) -> Option<BufferId> {
        self.slots.get(pos).copied()
    }

    /// Iterates the handles in slot order.
    pub fn iter(&self) -> impl Iterator<Item = BufferId> + '_ {
        self.slots.iter().copied()
    }

    /// The handles in slot order.
    pub fn as_slice(&self) -> &[BufferId] {
        &self.slots
    }

    /// Reserves room for `additional` more slots so a following
    /// [`attach()`](Self::attach) cannot fail on allocation.
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        if self.slots.try_reserve(additional).is_err() {
            return fail(SegmentError::OutOfMemory);
        }
        Ok(())
    }

    /// Appends a handle, returning its slot index.
    pub fn push(&mut self, id: BufferId) -> Result<usize> {
        self.reserve(1)?;
        self.slots.push(id);
        Ok(self.slots.len() - 1)
    }

    /// Overwrites the handle at `pos`, which must be in bounds.
    pub fn set(&mut self, pos: usize, id: BufferId) -> Result<()> {
        match self.slots.get_mut(pos) {
            Some(slot) => {
                *slot = id;
                Ok(())
            }
            None => invalid_location(pos, self.slots.len()),
        }
    }

    /// Overwrites the slot at `location` if it exists, otherwise appends.
    ///
    /// Returns the slot index the handle ended up in; an append past the end
    /// lands at `len()`, not at `location`.
    pub fn attach(&mut self, location: usize, id: BufferId) -> Result<usize> {
        if location < self.slots.len() {
            self.set(location, id)?;
            Ok(location)
        } else {
            self.push(id)
        }
    }

    /// Removes the handle at `pos`, shifting later slots down by one.
    pub fn remove(&mut self, pos: usize) -> Result<BufferId> {
        if pos >= self.slots.len() {
            return invalid_location(pos, self.slots.len());
        }
        Ok(self.slots.remove(pos))
    }

    /// Frees the slot storage. Safe to call repeatedly.
    pub fn release(&mut self) {
        self.slots = Vec::new();
    }
}
