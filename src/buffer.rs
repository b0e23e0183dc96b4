//! Buffer freshness selection.
//!
//! The writer fills its data buffers round-robin and bumps each buffer's tick
//! count when it is done. A reader that picks the highest tick may land on a
//! buffer the writer is already overwriting for the next tick, so ordinary
//! reads use the buffer ranked *second* by tick count. Selection sorts by tick
//! count; the storage order of the descriptors never matters.
//!
//! Multi-field reads that must come from one tick take a [`FrozenBuffer`]: a
//! private copy of the most recent buffer.

use crate::schema::header::BufferDescriptor;
use crate::{Result, TelemetryError};

/// Descriptors ranked from most to least recent.
fn ranked(buffers: &[BufferDescriptor]) -> Vec<BufferDescriptor> {
    let mut ranked = buffers.to_vec();
    ranked.sort_by(|a, b| b.tick_count.cmp(&a.tick_count));
    ranked
}

/// The buffer ordinary reads use: second-most-recent by tick count.
///
/// With a single buffer there is nothing settled behind it, so that buffer is
/// returned. Disk recordings and one-buffer writers take this path.
pub fn select_settled(buffers: &[BufferDescriptor]) -> Option<BufferDescriptor> {
    let ranked = ranked(buffers);
    ranked.get(1).or_else(|| ranked.first()).copied()
}

/// The most recently completed buffer.
pub fn select_latest(buffers: &[BufferDescriptor]) -> Option<BufferDescriptor> {
    buffers.iter().max_by_key(|b| b.tick_count).copied()
}

/// Borrow `buf_len` bytes of `descriptor` out of the mapped region.
pub fn buffer_slice<'a>(
    memory: &'a [u8],
    descriptor: &BufferDescriptor,
    buf_len: usize,
) -> Result<&'a [u8]> {
    let start = descriptor.offset();
    memory
        .get(start..start + buf_len)
        .ok_or(TelemetryError::Memory { offset: start })
}

/// Private byte-for-byte copy of one buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrozenBuffer {
    tick_count: i32,
    data: Vec<u8>,
}

impl FrozenBuffer {
    /// Copy the most recent buffer out of `memory`.
    pub fn capture(memory: &[u8], buffers: &[BufferDescriptor], buf_len: usize) -> Result<Self> {
        let latest = select_latest(buffers)
            .ok_or_else(|| TelemetryError::malformed_header("header lists no data buffers"))?;
        let data = buffer_slice(memory, &latest, buf_len)?.to_vec();
        Ok(Self { tick_count: latest.tick_count, data })
    }

    pub fn tick_count(&self) -> i32 {
        self.tick_count
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}
