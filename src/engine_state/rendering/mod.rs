//! Chunk meshing for the voxel world.
//!
//! This module turns generated chunk content into GPU-ready vertex data. It
//! does not draw anything itself: meshes are uploaded through
//! [`GpuBuffers`](crate::engine_state::buffer_state::GpuBuffers) and attached to
//! render objects owned by the host renderer.

pub mod meshing;
pub mod tasks;
pub mod vertex;

// Re-export commonly used types
pub use meshing::{ChunkMesh, Mesher};
pub use vertex::ChunkVertex;
