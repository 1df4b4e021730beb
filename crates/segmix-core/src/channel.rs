//! Interleaved multichannel endpoint and per-channel conversions.
//!
//! A [`Channel`] stands in for a device or codec block: a window of
//! interleaved frames with a fixed channel count. Device code fills it (for
//! capture) or drains it (for playback); segments move samples between it and
//! one mono [`SampleBuffer`](crate::SampleBuffer) per channel with
//! [`channel_split`] and [`channel_join`].

use crate::buffer::{BufferArena, BufferId, allocate_samples};
use crate::error::{Result, SegmentError, fail};

/// Interleaved sample window shared with a device or codec.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    data: Vec<f32>,
    channels: usize,
    frame_capacity: usize,
    frames: usize,
}

impl Channel {
    /// Creates an endpoint holding up to `frame_capacity` frames of
    /// `channels` interleaved samples. The window starts empty.
    pub fn new(channels: usize, frame_capacity: usize) -> Result<Self> {
        let Some(len) = channels.checked_mul(frame_capacity) else {
            return fail(SegmentError::OutOfMemory);
        };
        Ok(Self {
            data: allocate_samples(len)?,
            channels,
            frame_capacity,
            frames: 0,
        })
    }

    /// Number of interleaved channels.
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Maximum frames the window can hold.
    #[inline]
    pub fn frame_capacity(&self) -> usize {
        self.frame_capacity
    }

    /// Number of valid frames in the current window.
    #[inline]
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Sets the number of valid frames, clamped to the capacity.
    pub fn set_frames(&mut self, frames: usize) {
        self.frames = frames.min(self.frame_capacity);
    }

    /// The valid interleaved samples.
    pub fn samples(&self) -> &[f32] {
        &self.data[..self.frames * self.channels]
    }

    /// The full interleaved storage, for device code to fill before
    /// calling [`set_frames()`](Self::set_frames).
    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Copies interleaved samples in and marks the whole frames as valid.
    /// Returns the number of frames taken.
    pub fn fill(&mut self, interleaved: &[f32]) -> usize {
        let frames = if self.channels == 0 {
            0
        } else {
            (interleaved.len() / self.channels).min(self.frame_capacity)
        };
        let len = frames * self.channels;
        self.data[..len].copy_from_slice(&interleaved[..len]);
        self.frames = frames;
        frames
    }
}

/// Deinterleaves the endpoint window into one buffer per channel.
///
/// Each buffer receives `min(samples, channel.frames(), available_write)`
/// samples of its channel, committed with `finish_write`. Returns the number
/// of samples written to the emptiest buffer.
pub fn channel_split(
    channel: &Channel,
    buffers: &[Option<BufferId>],
    samples: usize,
    arena: &mut BufferArena,
) -> Result<usize> {
    let channels = channel.channels();
    check_attached(buffers, channels)?;
    for id in buffers[..channels].iter().flatten() {
        arena.get(*id)?;
    }
    let count = samples.min(channel.frames());
    let mut written = count;
    for (c, id) in buffers[..channels].iter().flatten().copied().enumerate() {
        let window = arena.write_window(id)?;
        let n = count.min(window.len());
        for (i, out) in window[..n].iter_mut().enumerate() {
            *out = channel.data[i * channels + c];
        }
        written = written.min(arena.finish_write(id, n)?);
    }
    Ok(written)
}

/// Interleaves one buffer per channel into the endpoint window.
///
/// Moves `min(samples, frame capacity, available_read of every buffer)` frames,
/// consumes them from each buffer, and sets the endpoint's valid frame count.
/// Returns the number of frames written.
pub fn channel_join(
    buffers: &[Option<BufferId>],
    channel: &mut Channel,
    samples: usize,
    arena: &mut BufferArena,
) -> Result<usize> {
    let channels = channel.channels();
    check_attached(buffers, channels)?;
    let mut count = samples.min(channel.frame_capacity());
    for id in buffers[..channels].iter().flatten() {
        count = count.min(arena.read_window(*id)?.len());
    }
    for (c, id) in buffers[..channels].iter().flatten().copied().enumerate() {
        let window = arena.read_window(id)?;
        for (i, sample) in window[..count].iter().enumerate() {
            channel.data[i * channels + c] = *sample;
        }
        arena.finish_read(id, count)?;
    }
    channel.frames = count;
    Ok(count)
}

/// Fails unless the first `channels` slots all hold a buffer.
fn check_attached(buffers: &[Option<BufferId>], channels: usize) -> Result<()> {
    if buffers.len() < channels || buffers[..channels].iter().any(Option::is_none) {
        return fail(SegmentError::BufferMissing);
    }
    Ok(())
}
