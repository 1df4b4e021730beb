//! Error types for segment and buffer operations.
//!
//! Every fallible operation returns a [`Result`]. Failures are also recorded in
//! a per-thread "last error" slot readable through [`last_error()`], for
//! tooling that polls for the most recent failure after a `false`-style return.
//! The slot is overwritten by the next failure and never cleared on success.

use core::cell::Cell;

use crate::segment::Field;

/// Errors that can occur while wiring or running segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SegmentError {
    /// Backing storage could not be allocated.
    #[error("out of memory")]
    OutOfMemory,

    /// The segment does not accept this field in the requested direction.
    #[error("invalid field: {0:?}")]
    InvalidField(Field),

    /// The slot index is outside the range the segment accepts.
    #[error("invalid location {location} (limit {limit})")]
    InvalidLocation {
        /// Requested slot index.
        location: usize,
        /// First index that is out of range.
        limit: usize,
    },

    /// A required buffer is not attached, has no storage, or does not exist.
    #[error("buffer missing")]
    BufferMissing,

    /// The buffer already owns storage and cannot be attached here.
    #[error("buffer already allocated")]
    BufferAllocated,
}

/// Convenience result type for segment operations.
pub type Result<T> = core::result::Result<T, SegmentError>;

thread_local! {
    static LAST_ERROR: Cell<Option<SegmentError>> = const { Cell::new(None) };
}

/// Returns the most recent error recorded on the calling thread.
pub fn last_error() -> Option<SegmentError> {
    LAST_ERROR.with(Cell::get)
}

/// Records `err` in the last-error slot and returns it as an `Err`.
pub(crate) fn fail<T>(err: SegmentError) -> Result<T> {
    LAST_ERROR.with(|slot| slot.set(Some(err)));
    Err(err)
}

/// Shorthand for an out-of-range slot failure.
pub(crate) fn invalid_location<T>(location: usize, limit: usize) -> Result<T> {
    fail(SegmentError::InvalidLocation { location, limit })
}
