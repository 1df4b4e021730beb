//! Ring-buffered sample streams shared between segments.
//!
//! Segments never talk to each other directly; they read and write through
//! [`SampleBuffer`]s held in a [`BufferArena`] and addressed by [`BufferId`].
//! The arena owns every buffer, so a segment only stores handles.
//!
//! # Bip-buffer layout
//!
//! Each buffer keeps readable data in up to two contiguous regions:
//!
//! ```text
//!  0        r2_len        r1_start          r1_start + r1_len    capacity
//!  |==========|..............|=====================|...............|
//!   secondary      free              primary              free
//! ```
//!
//! Readers always consume the primary region. Writers append after the primary
//! region until the end of storage, then wrap and fill the secondary region in
//! front of it. When the primary region drains, the secondary region is
//! promoted. [`available_read()`](SampleBuffer::available_read) therefore only
//! reports the primary region.
//!
//! # Virtual buffers
//!
//! A virtual buffer owns no memory. Once aliased onto a real buffer it holds a
//! [`BufferId`] of that target and reads the target's storage through its own,
//! independent cursor. Virtual buffers are read-only views: their write window
//! is always empty. Releasing a view drops only the alias, and releasing the
//! target leaves any view reading an empty window.

use core::fmt;

use crate::error::{Result, SegmentError, fail};

/// Handle to a buffer stored in a [`BufferArena`].
///
/// IDs are assigned sequentially and never reused within an arena, so a stale
/// handle fails with [`SegmentError::BufferMissing`] instead of aliasing a
/// newer buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub(crate) u32);

impl BufferId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BufferId({})", self.0)
    }
}

/// Backing memory of a buffer.
#[derive(Debug, Default)]
enum Storage {
    /// No memory assigned yet.
    #[default]
    Unallocated,
    /// Samples owned by this buffer.
    Owned(Vec<f32>),
    /// Borrowed view of another buffer's samples.
    Aliased(BufferId),
}

/// A single ring-buffered sample stream.
#[derive(Debug, Default)]
pub struct SampleBuffer {
    storage: Storage,
    is_virtual: bool,
    capacity: usize,
    r1_start: usize,
    r1_len: usize,
    r2_len: usize,
}

impl SampleBuffer {
    /// Returns true if memory (owned or aliased) is currently assigned.
    #[inline]
    pub fn has_storage(&self) -> bool {
        !matches!(self.storage, Storage::Unallocated)
    }

    /// Returns true if this buffer borrows another buffer's storage.
    #[inline]
    pub fn is_virtual(&self) -> bool {
        self.is_virtual
    }

    /// Returns the number of samples the backing storage holds.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns `(start, len)` of the primary readable region.
    #[inline]
    pub fn primary_region(&self) -> (usize, usize) {
        (self.r1_start, self.r1_len)
    }

    /// Returns the length of the secondary (wrapped) region, which starts at 0.
    #[inline]
    pub fn secondary_len(&self) -> usize {
        self.r2_len
    }

    /// Number of samples readable as one contiguous window.
    #[inline]
    pub fn available_read(&self) -> usize {
        self.r1_len
    }

    /// Total unread samples across both regions.
    #[inline]
    pub fn unread(&self) -> usize {
        self.r1_len + self.r2_len
    }

    /// Number of samples writable as one contiguous window.
    ///
    /// Always 0 for virtual buffers and buffers without storage.
    pub fn available_write(&self) -> usize {
        if self.is_virtual || !matches!(self.storage, Storage::Owned(_)) {
            return 0;
        }
        if self.r2_len > 0 {
            return self.r1_start - self.r2_len;
        }
        let tail = self.capacity - (self.r1_start + self.r1_len);
        if tail > 0 { tail } else { self.r1_start }
    }

    /// Offset of the write window into the backing storage.
    fn write_offset(&self) -> usize {
        if self.r2_len > 0 || self.r1_start + self.r1_len == self.capacity {
            self.r2_len
        } else {
            self.r1_start + self.r1_len
        }
    }

    /// Commits `count` samples written into the write window.
    ///
    /// Clamps to [`available_write()`](Self::available_write) and returns the
    /// amount actually committed.
    pub fn finish_write(&mut self, count: usize) -> usize {
        let count = count.min(self.available_write());
        if count == 0 {
            return 0;
        }
        if self.r2_len > 0 || self.r1_start + self.r1_len == self.capacity {
            self.r2_len += count;
        } else {
            self.r1_len += count;
        }
        count
    }

    /// Consumes `count` samples from the front of the primary region.
    ///
    /// Clamps to [`available_read()`](Self::available_read) and returns the
    /// amount actually consumed. A drained primary region is replaced by the
    /// secondary region.
    pub fn finish_read(&mut self, count: usize) -> usize {
        let count = count.min(self.r1_len);
        self.r1_start += count;
        self.r1_len -= count;
        if self.r1_len == 0 {
            self.r1_start = 0;
            self.r1_len = self.r2_len;
            self.r2_len = 0;
        }
        count
    }

    /// Drops all unread data.
    pub fn clear(&mut self) {
        self.r1_start = 0;
        self.r1_len = 0;
        self.r2_len = 0;
    }
}

/// Owner of every buffer in a pipeline.
///
/// Segments hold [`BufferId`]s and receive `&mut BufferArena` on each call, so
/// the borrow checker enforces exclusive access for the duration of a tick.
#[derive(Debug, Default)]
pub struct BufferArena {
    buffers: Vec<Option<SampleBuffer>>,
}

impl BufferArena {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live buffers.
    pub fn len(&self) -> usize {
        self.buffers.iter().filter(|b| b.is_some()).count()
    }

    /// Returns true if the arena holds no live buffers.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Creates a real buffer owning `capacity` zeroed samples.
    pub fn create(&mut self, capacity: usize) -> Result<BufferId> {
        let data = allocate_samples(capacity)?;
        self.insert(SampleBuffer {
            storage: Storage::Owned(data),
            capacity,
            ..SampleBuffer::default()
        })
    }

    /// Creates a buffer with no storage, to be backed later by
    /// [`allocate()`](Self::allocate) or [`alias()`](Self::alias).
    pub fn create_unallocated(&mut self) -> Result<BufferId> {
        self.insert(SampleBuffer::default())
    }

    fn insert(&mut self, buffer: SampleBuffer) -> Result<BufferId> {
        let Ok(index) = u32::try_from(self.buffers.len()) else {
            return fail(SegmentError::OutOfMemory);
        };
        if self.buffers.try_reserve(1).is_err() {
            return fail(SegmentError::OutOfMemory);
        }
        self.buffers.push(Some(buffer));
        #[cfg(feature = "tracing")]
        tracing::debug!("buffer_create: BufferId({index})");
        Ok(BufferId(index))
    }

    /// Assigns `capacity` owned samples to a buffer without storage.
    pub fn allocate(&mut self, id: BufferId, capacity: usize) -> Result<()> {
        if self.get(id)?.has_storage() {
            return fail(SegmentError::BufferAllocated);
        }
        let data = allocate_samples(capacity)?;
        let buffer = self.get_mut(id)?;
        buffer.storage = Storage::Owned(data);
        buffer.is_virtual = false;
        buffer.capacity = capacity;
        buffer.clear();
        Ok(())
    }

    /// Frees the buffer's own storage (never an alias target's) and resets it.
    pub fn release(&mut self, id: BufferId) -> Result<()> {
        *self.get_mut(id)? = SampleBuffer::default();
        #[cfg(feature = "tracing")]
        tracing::debug!("buffer_release: {id}");
        Ok(())
    }

    /// Removes a buffer from the arena and returns it.
    pub fn remove(&mut self, id: BufferId) -> Result<SampleBuffer> {
        match self.buffers.get_mut(id.0 as usize).and_then(Option::take) {
            Some(buffer) => Ok(buffer),
            None => fail(SegmentError::BufferMissing),
        }
    }

    /// Returns the buffer behind `id`.
    pub fn get(&self, id: BufferId) -> Result<&SampleBuffer> {
        match self.buffers.get(id.0 as usize).and_then(Option::as_ref) {
            Some(buffer) => Ok(buffer),
            None => fail(SegmentError::BufferMissing),
        }
    }

    /// Returns the buffer behind `id` mutably.
    pub fn get_mut(&mut self, id: BufferId) -> Result<&mut SampleBuffer> {
        match self.buffers.get_mut(id.0 as usize).and_then(Option::as_mut) {
            Some(buffer) => Ok(buffer),
            None => fail(SegmentError::BufferMissing),
        }
    }

    /// See [`SampleBuffer::available_read`].
    pub fn available_read(&self, id: BufferId) -> Result<usize> {
        Ok(self.get(id)?.available_read())
    }

    /// See [`SampleBuffer::available_write`].
    pub fn available_write(&self, id: BufferId) -> Result<usize> {
        Ok(self.get(id)?.available_write())
    }

    /// See [`SampleBuffer::finish_read`].
    pub fn finish_read(&mut self, id: BufferId, count: usize) -> Result<usize> {
        Ok(self.get_mut(id)?.finish_read(count))
    }

    /// See [`SampleBuffer::finish_write`].
    pub fn finish_write(&mut self, id: BufferId, count: usize) -> Result<usize> {
        Ok(self.get_mut(id)?.finish_write(count))
    }

    /// Marks a buffer as a virtual view, dropping any storage it owned.
    pub fn mark_virtual(&mut self, id: BufferId) -> Result<()> {
        let buffer = self.get_mut(id)?;
        if matches!(buffer.storage, Storage::Owned(_)) {
            buffer.storage = Storage::Unallocated;
            buffer.capacity = 0;
            buffer.clear();
        }
        buffer.is_virtual = true;
        Ok(())
    }

    /// Points `view` at the storage of `target` with an empty cursor.
    ///
    /// If `target` is itself a view, the alias is made onto its owner so that
    /// views never chain. Fails with [`SegmentError::BufferMissing`] if the
    /// target has no storage.
    pub fn alias(&mut self, view: BufferId, target: BufferId) -> Result<()> {
        let target_buffer = self.get(target)?;
        let (owner, capacity) = match target_buffer.storage {
            Storage::Owned(_) => (target, target_buffer.capacity),
            Storage::Aliased(owner) => (owner, target_buffer.capacity),
            Storage::Unallocated => return fail(SegmentError::BufferMissing),
        };
        let buffer = self.get_mut(view)?;
        buffer.storage = Storage::Aliased(owner);
        buffer.is_virtual = true;
        buffer.capacity = capacity;
        buffer.clear();
        Ok(())
    }

    /// Copies the primary region of `target` onto `view`.
    ///
    /// The secondary region is not mirrored: data that wrapped around only
    /// becomes visible through the view once it is promoted in the target.
    /// A view without storage stays empty.
    pub fn mirror_region(&mut self, view: BufferId, target: BufferId) -> Result<()> {
        let (start, len) = self.get(target)?.primary_region();
        let buffer = self.get_mut(view)?;
        if !buffer.has_storage() {
            buffer.clear();
            return Ok(());
        }
        buffer.r1_start = start;
        buffer.r1_len = len;
        buffer.r2_len = 0;
        Ok(())
    }

    /// Full backing storage of a buffer, resolving aliases.
    fn backing(&self, id: BufferId) -> Result<&[f32]> {
        let buffer = self.get(id)?;
        let owner = match buffer.storage {
            Storage::Aliased(owner) => self.buffers.get(owner.0 as usize).and_then(Option::as_ref),
            _ => Some(buffer),
        };
        match owner.map(|b| &b.storage) {
            Some(Storage::Owned(data)) => Ok(data.as_slice()),
            _ => Ok(&[][..]),
        }
    }

    /// The primary readable region of a buffer.
    pub fn read_window(&self, id: BufferId) -> Result<&[f32]> {
        let (start, len) = self.get(id)?.primary_region();
        Ok(self.backing(id)?.get(start..start + len).unwrap_or(&[]))
    }

    /// The contiguous writable region of a buffer. Empty for virtual buffers.
    pub fn write_window(&mut self, id: BufferId) -> Result<&mut [f32]> {
        let buffer = self.get_mut(id)?;
        let offset = buffer.write_offset();
        let len = buffer.available_write();
        Ok(match &mut buffer.storage {
            Storage::Owned(data) => &mut data[offset..offset + len],
            _ => &mut [][..],
        })
    }

    /// Runs `f` with the write window of `id` and shared access to every
    /// other buffer.
    ///
    /// The window's storage is moved out for the duration of the call, so a
    /// view aliasing `id` reads an empty window inside `f`.
    pub(crate) fn with_write_window<R>(
        &mut self,
        id: BufferId,
        f: impl FnOnce(&mut [f32], &Self) -> R,
    ) -> Result<R> {
        let buffer = self.get_mut(id)?;
        let offset = buffer.write_offset();
        let len = buffer.available_write();
        let mut storage = core::mem::take(&mut buffer.storage);
        let result = match &mut storage {
            Storage::Owned(data) => f(&mut data[offset..offset + len], self),
            _ => f(&mut [][..], self),
        };
        self.get_mut(id)?.storage = storage;
        Ok(result)
    }

    /// Copies as many samples as fit into the write window and commits them.
    pub fn write(&mut self, id: BufferId, samples: &[f32]) -> Result<usize> {
        let window = self.write_window(id)?;
        let count = window.len().min(samples.len());
        window[..count].copy_from_slice(&samples[..count]);
        self.finish_write(id, count)
    }

    /// Copies up to `out.len()` samples from the read window and consumes them.
    pub fn read(&mut self, id: BufferId, out: &mut [f32]) -> Result<usize> {
        let window = self.read_window(id)?;
        let count = window.len().min(out.len());
        out[..count].copy_from_slice(&window[..count]);
        self.finish_read(id, count)
    }
}

/// Allocates `capacity` zeroed samples, reporting failure instead of aborting.
pub(crate) fn allocate_samples(capacity: usize) -> Result<Vec<f32>> {
    let mut data = Vec::new();
    if data.try_reserve_exact(capacity).is_err() {
        return fail(SegmentError::OutOfMemory);
    }
    data.resize(capacity, 0.0);
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trip() {
        let mut arena = BufferArena::new();
        let id = arena.create(8).unwrap();

        assert_eq!(arena.write(id, &[1.0, 2.0, 3.0]).unwrap(), 3);
        assert_eq!(arena.available_read(id).unwrap(), 3);
        assert_eq!(arena.read_window(id).unwrap(), &[1.0, 2.0, 3.0]);

        let mut out = [0.0; 2];
        assert_eq!(arena.read(id, &mut out).unwrap(), 2);
        assert_eq!(out, [1.0, 2.0]);
        assert_eq!(arena.read_window(id).unwrap(), &[3.0]);
    }

    #[test]
    fn writer_wraps_into_secondary_region() {
        let mut arena = BufferArena::new();
        let id = arena.create(4).unwrap();

        arena.write(id, &[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(arena.available_write(id).unwrap(), 0);

        arena.finish_read(id, 2).unwrap();
        assert_eq!(arena.available_write(id).unwrap(), 2);
        assert_eq!(arena.write(id, &[5.0, 6.0, 7.0]).unwrap(), 2);

        let buffer = arena.get(id).unwrap();
        assert_eq!(buffer.primary_region(), (2, 2));
        assert_eq!(buffer.secondary_len(), 2);
        assert_eq!(buffer.unread(), 4);
        assert_eq!(buffer.available_read(), 2);
        assert_eq!(arena.read_window(id).unwrap(), &[3.0, 4.0]);
    }

    #[test]
    fn drained_primary_promotes_secondary() {
        let mut arena = BufferArena::new();
        let id = arena.create(4).unwrap();
        arena.write(id, &[1.0, 2.0, 3.0, 4.0]).unwrap();
        arena.finish_read(id, 3).unwrap();
        arena.write(id, &[5.0, 6.0]).unwrap();

        assert_eq!(arena.finish_read(id, 1).unwrap(), 1);
        assert_eq!(arena.get(id).unwrap().primary_region(), (0, 2));
        assert_eq!(arena.read_window(id).unwrap(), &[5.0, 6.0]);
        assert_eq!(arena.available_write(id).unwrap(), 2);
    }

    #[test]
    fn cursors_clamp_to_available() {
        let mut arena = BufferArena::new();
        let id = arena.create(4).unwrap();
        assert_eq!(arena.finish_read(id, 10).unwrap(), 0);
        assert_eq!(arena.finish_write(id, 10).unwrap(), 4);
        assert_eq!(arena.finish_read(id, 10).unwrap(), 4);
        assert_eq!(arena.available_read(id).unwrap(), 0);
    }

    #[test]
    fn allocate_rejects_buffer_with_storage() {
        let mut arena = BufferArena::new();
        let id = arena.create(4).unwrap();
        assert_eq!(arena.allocate(id, 8), Err(SegmentError::BufferAllocated));
        assert_eq!(arena.get(id).unwrap().capacity(), 4);

        let empty = arena.create_unallocated().unwrap();
        assert!(!arena.get(empty).unwrap().has_storage());
        arena.allocate(empty, 8).unwrap();
        assert_eq!(arena.get(empty).unwrap().capacity(), 8);
    }

    #[test]
    fn alias_reads_target_through_own_cursor() {
        let mut arena = BufferArena::new();
        let real = arena.create(8).unwrap();
        let view = arena.create_unallocated().unwrap();
        arena.write(real, &[1.0, 2.0, 3.0]).unwrap();

        arena.alias(view, real).unwrap();
        arena.mirror_region(view, real).unwrap();
        assert!(arena.get(view).unwrap().is_virtual());
        assert_eq!(arena.get(view).unwrap().capacity(), 8);
        assert_eq!(arena.read_window(view).unwrap(), &[1.0, 2.0, 3.0]);

        arena.finish_read(view, 2).unwrap();
        assert_eq!(arena.read_window(view).unwrap(), &[3.0]);
        assert_eq!(arena.available_read(real).unwrap(), 3);
    }

    #[test]
    fn virtual_buffer_has_no_write_window() {
        let mut arena = BufferArena::new();
        let real = arena.create(8).unwrap();
        let view = arena.create(8).unwrap();
        arena.mark_virtual(view).unwrap();
        assert!(!arena.get(view).unwrap().has_storage());

        arena.alias(view, real).unwrap();
        assert_eq!(arena.available_write(view).unwrap(), 0);
        assert!(arena.write_window(view).unwrap().is_empty());
        assert_eq!(arena.write(view, &[1.0]).unwrap(), 0);
    }

    #[test]
    fn released_target_leaves_view_empty() {
        let mut arena = BufferArena::new();
        let real = arena.create(4).unwrap();
        let view = arena.create_unallocated().unwrap();
        arena.write(real, &[1.0, 2.0]).unwrap();
        arena.alias(view, real).unwrap();
        arena.mirror_region(view, real).unwrap();

        arena.release(real).unwrap();
        assert!(arena.read_window(view).unwrap().is_empty());
    }

    #[test]
    fn alias_of_view_resolves_to_owner() {
        let mut arena = BufferArena::new();
        let real = arena.create(4).unwrap();
        let first = arena.create_unallocated().unwrap();
        let second = arena.create_unallocated().unwrap();
        arena.write(real, &[7.0]).unwrap();

        arena.alias(first, real).unwrap();
        arena.alias(second, first).unwrap();
        arena.mirror_region(second, real).unwrap();
        assert_eq!(arena.read_window(second).unwrap(), &[7.0]);
    }

    #[test]
    fn alias_onto_unallocated_target_fails() {
        let mut arena = BufferArena::new();
        let target = arena.create_unallocated().unwrap();
        let view = arena.create_unallocated().unwrap();
        assert_eq!(arena.alias(view, target), Err(SegmentError::BufferMissing));
    }

    #[test]
    fn mirror_onto_unaliased_view_stays_empty() {
        let mut arena = BufferArena::new();
        let target = arena.create(8).unwrap();
        arena.write(target, &[1.0, 2.0, 3.0]).unwrap();
        let view = arena.create_unallocated().unwrap();
        arena.mark_virtual(view).unwrap();

        arena.mirror_region(view, target).unwrap();
        assert_eq!(arena.available_read(view).unwrap(), 0);
        assert!(arena.read_window(view).unwrap().is_empty());

        arena.alias(view, target).unwrap();
        arena.mirror_region(view, target).unwrap();
        assert_eq!(arena.read_window(view).unwrap(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn removed_ids_are_not_reused() {
        let mut arena = BufferArena::new();
        let a = arena.create(1).unwrap();
        arena.remove(a).unwrap();
        let b = arena.create(1).unwrap();
        assert_ne!(a, b);
        assert_eq!(arena.get(a).err(), Some(SegmentError::BufferMissing));
        assert_eq!(arena.len(), 1);
    }
}
