//! # Buffer State Module
//!
//! GPU buffer management for chunk meshes.
//!
//! ## Key Features
//!
//! * The [`GpuBuffers`] trait: allocate, map-and-write, flush, copy and destroy,
//!   which is everything the mesher needs to stage and upload vertex data
//! * [`BufferState`], a host-memory implementation with per-buffer analytics,
//!   used when running headless and in tests
//!
//! ## Architecture
//!
//! Buffers are referenced by [`BufferId`]. Mesh data is written into a
//! [`BufferUsage::Staging`] buffer, flushed, then copied into a
//! [`BufferUsage::Vertex`] buffer owned by a render object. The staging buffer
//! is destroyed once the copy is recorded.

use std::collections::HashMap;

use log::{error, warn};

/// Handle to a GPU buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u64);

/// What a buffer is bound as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    Vertex,
    Index,
    /// CPU-writable source of a copy.
    Staging,
}

/// A GPU buffer allocator.
pub trait GpuBuffers {
    /// Allocates a zeroed buffer of `size` bytes.
    fn create_buffer(&mut self, usage: BufferUsage, size: u64) -> BufferId;

    /// Maps the buffer and writes `data` at `offset`.
    fn write_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8]);

    /// Makes previous writes visible to the device.
    fn flush_buffer(&mut self, buffer: BufferId);

    /// Copies `size` bytes from the start of `source` to the start of `destination`.
    fn copy_buffer(&mut self, source: BufferId, destination: BufferId, size: u64);

    fn destroy_buffer(&mut self, buffer: BufferId);
}

/// Analytics data for a buffer
///
/// Tracks memory allocation, usage, and write operations for a buffer
/// to help identify optimization opportunities.
#[derive(Debug, Clone, Copy, Default)]
pub struct BufferAnalytics {
    /// Total memory allocated for the buffer in bytes
    pub allocated_memory: u64,
    /// Highest byte written so far
    pub used_memory: u64,
    /// Number of writes and copies into the buffer
    pub times_written: u64,
    /// Number of flushes
    pub times_flushed: u64,
}

#[derive(Debug)]
struct HostBuffer {
    usage: BufferUsage,
    data: Vec<u8>,
    analytics: BufferAnalytics,
}

/// Host-memory buffer manager.
///
/// # Examples
///
/// ```
/// use voxel_world::buffer_state::{BufferState, BufferUsage, GpuBuffers};
///
/// let mut buffers = BufferState::new();
/// let staging = buffers.create_buffer(BufferUsage::Staging, 4);
/// let vertices = buffers.create_buffer(BufferUsage::Vertex, 4);
///
/// buffers.write_buffer(staging, 0, &[1, 2, 3, 4]);
/// buffers.flush_buffer(staging);
/// buffers.copy_buffer(staging, vertices, 4);
/// buffers.destroy_buffer(staging);
///
/// assert_eq!(buffers.contents(vertices), Some(&[1u8, 2, 3, 4][..]));
/// assert_eq!(buffers.live_buffers(), 1);
/// ```
#[derive(Debug, Default)]
pub struct BufferState {
    buffers: HashMap<BufferId, HostBuffer>,
    next_id: u64,
    total_created: u64,
}

impl BufferState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current bytes of a buffer, if it exists.
    pub fn contents(&self, buffer: BufferId) -> Option<&[u8]> {
        self.buffers.get(&buffer).map(|host| host.data.as_slice())
    }

    pub fn usage(&self, buffer: BufferId) -> Option<BufferUsage> {
        self.buffers.get(&buffer).map(|host| host.usage)
    }

    pub fn analytics(&self, buffer: BufferId) -> Option<BufferAnalytics> {
        self.buffers.get(&buffer).map(|host| host.analytics)
    }

    /// Number of buffers that have not been destroyed.
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Number of live buffers with the given usage.
    pub fn live_buffers_with(&self, usage: BufferUsage) -> usize {
        self.buffers.values().filter(|host| host.usage == usage).count()
    }

    /// Number of buffers ever created.
    pub fn total_created(&self) -> u64 {
        self.total_created
    }

    /// Gets the total allocated memory across all buffers
    ///
    /// # Returns
    ///
    /// Total allocated memory in bytes
    pub fn get_total_allocated_memory(&self) -> u64 {
        self.buffers
            .values()
            .fold(0, |acc, host| acc + host.analytics.allocated_memory)
    }

    /// Gets the total used memory across all buffers
    ///
    /// # Returns
    ///
    /// Total used memory in bytes
    pub fn get_total_used_memory(&self) -> u64 {
        self.buffers
            .values()
            .fold(0, |acc, host| acc + host.analytics.used_memory)
    }
}

impl GpuBuffers for BufferState {
    fn create_buffer(&mut self, usage: BufferUsage, size: u64) -> BufferId {
        let id = BufferId(self.next_id);
        self.next_id += 1;
        self.total_created += 1;

        self.buffers.insert(
            id,
            HostBuffer {
                usage,
                data: vec![0; size as usize],
                analytics: BufferAnalytics {
                    allocated_memory: size,
                    ..BufferAnalytics::default()
                },
            },
        );
        id
    }

    fn write_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8]) {
        let Some(host) = self.buffers.get_mut(&buffer) else {
            error!("Write to unknown buffer {:?}", buffer);
            return;
        };

        let end = offset + data.len() as u64;
        if end > host.analytics.allocated_memory {
            error!(
                "Buffer write out of bounds for {:?}: {}..{} of {}",
                buffer, offset, end, host.analytics.allocated_memory
            );
            return;
        }

        host.data[offset as usize..end as usize].copy_from_slice(data);
        host.analytics.used_memory = host.analytics.used_memory.max(end);
        host.analytics.times_written += 1;
    }

    fn flush_buffer(&mut self, buffer: BufferId) {
        match self.buffers.get_mut(&buffer) {
            Some(host) => host.analytics.times_flushed += 1,
            None => warn!("Flush of unknown buffer {:?}", buffer),
        }
    }

    fn copy_buffer(&mut self, source: BufferId, destination: BufferId, size: u64) {
        let Some(bytes) = self
            .buffers
            .get(&source)
            .and_then(|host| host.data.get(..size as usize))
            .map(<[u8]>::to_vec)
        else {
            error!("Invalid copy source {:?} ({} bytes)", source, size);
            return;
        };
        self.write_buffer(destination, 0, &bytes);
    }

    fn destroy_buffer(&mut self, buffer: BufferId) {
        if self.buffers.remove(&buffer).is_none() {
            warn!("Destroying unknown buffer {:?}", buffer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_bounds_write_is_dropped() {
        let mut buffers = BufferState::new();
        let id = buffers.create_buffer(BufferUsage::Index, 2);

        buffers.write_buffer(id, 1, &[7, 7]);

        assert_eq!(buffers.contents(id), Some(&[0u8, 0][..]));
        assert_eq!(buffers.analytics(id).unwrap().times_written, 0);
    }

    #[test]
    fn test_memory_totals() {
        let mut buffers = BufferState::new();
        let a = buffers.create_buffer(BufferUsage::Vertex, 16);
        let b = buffers.create_buffer(BufferUsage::Staging, 8);
        buffers.write_buffer(a, 4, &[1; 4]);

        assert_eq!(buffers.get_total_allocated_memory(), 24);
        assert_eq!(buffers.get_total_used_memory(), 8);
        assert_eq!(buffers.live_buffers_with(BufferUsage::Staging), 1);

        buffers.destroy_buffer(b);
        assert_eq!(buffers.live_buffers(), 1);
        assert_eq!(buffers.total_created(), 2);
    }
}
