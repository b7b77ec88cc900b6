//! # Chunk Module
//!
//! A chunk is a 32x32x32 cube of [`Voxel`] ids plus the bookkeeping the world
//! needs to stream it: its chunk-grid position, owning structure, render object
//! and lifecycle state.
//!
//! Voxels are stored flat, x fastest, then y, then z:
//! `index = x + y * CHUNK_LENGTH + z * CHUNK_PLANE_SIZE`.

use std::fmt;

use cgmath::Point3;

use crate::engine_state::render_objects::RenderObjectId;
use crate::engine_state::voxels::voxel::{Voxel, NULL_VOXEL};

pub mod coordinates;

/// Side length of a chunk in voxels.
pub const CHUNK_LENGTH: usize = 32;
/// Half of [`CHUNK_LENGTH`].
pub const CHUNK_HALF_LENGTH: usize = CHUNK_LENGTH / 2;
/// Voxels in one z-plane of a chunk.
pub const CHUNK_PLANE_SIZE: usize = CHUNK_LENGTH * CHUNK_LENGTH;
/// Voxels in a chunk.
pub const CHUNK_SIZE: usize = CHUNK_PLANE_SIZE * CHUNK_LENGTH;

/// Streaming lifecycle of a chunk. States are ordered by progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChunkState {
    /// Fresh or recycled; content is not valid yet.
    #[default]
    Allocated,
    /// A generation task is in flight.
    Generating,
    /// Content is valid.
    Generated,
    /// A mesh task is in flight.
    Meshing,
    /// A mesh (possibly empty) is attached to the render object.
    Meshed,
}

#[derive(Clone)]
pub struct Chunk {
    voxels: Box<[Voxel]>,
    /// Position on the chunk grid, not in voxels.
    pub position: Point3<i32>,
    pub structure_id: u32,
    pub render_object: Option<RenderObjectId>,
    pub state: ChunkState,
    /// True when no cell holds anything but [`NULL_VOXEL`].
    pub is_empty: bool,
}

impl Chunk {
    /// Creates a chunk with every cell set to `voxel`.
    pub fn new(voxel: Voxel, position: Point3<i32>, structure_id: u32) -> Self {
        Chunk {
            voxels: vec![voxel; CHUNK_SIZE].into_boxed_slice(),
            position,
            structure_id,
            render_object: None,
            state: ChunkState::Allocated,
            is_empty: voxel == NULL_VOXEL,
        }
    }

    #[inline]
    pub const fn index(x: usize, y: usize, z: usize) -> usize {
        x + y * CHUNK_LENGTH + z * CHUNK_PLANE_SIZE
    }

    /// # Panics
    /// Panics if a coordinate is not below [`CHUNK_LENGTH`].
    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> Voxel {
        self.voxels[Self::index(x, y, z)]
    }

    /// Sets one cell. Does not update `is_empty`.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, voxel: Voxel) {
        self.voxels[Self::index(x, y, z)] = voxel;
    }

    pub fn fill(&mut self, voxel: Voxel) {
        self.voxels.fill(voxel);
        self.is_empty = voxel == NULL_VOXEL;
    }

    pub fn voxels(&self) -> &[Voxel] {
        &self.voxels
    }

    pub fn voxels_mut(&mut self) -> &mut [Voxel] {
        &mut self.voxels
    }

    /// Copies voxel content and emptiness from `other`, leaving identity and
    /// state untouched.
    pub fn copy_content_from(&mut self, other: &Chunk) {
        self.voxels.copy_from_slice(&other.voxels);
        self.is_empty = other.is_empty;
    }

    /// Rescans the content and updates `is_empty`.
    pub fn refresh_is_empty(&mut self) -> bool {
        self.is_empty = self.voxels.iter().all(|&voxel| voxel == NULL_VOXEL);
        self.is_empty
    }
}

impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk")
            .field("position", &self.position)
            .field("structure_id", &self.structure_id)
            .field("render_object", &self.render_object)
            .field("state", &self.state)
            .field("is_empty", &self.is_empty)
            .finish_non_exhaustive()
    }
}
