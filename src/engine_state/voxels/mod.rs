//! # Voxel World Model
//!
//! Everything the world is made of, independent of how it is drawn.
//!
//! ## Architecture
//!
//! * **Voxel**: 16-bit type IDs and the registry describing how each type is drawn
//! * **Chunk**: a 32³ block of voxels plus its lifecycle state
//! * **Cluster**: a chunk bound to its six face neighbors, the unit of meshing
//! * **Structure**: a sparse grid of chunks with slot recycling
//! * **Generation**: background filling of chunk content
//!
//! ## Chunk Lifecycle
//!
//! 1. `Allocated`: a slot exists, content is meaningless
//! 2. `Generating`: a generation task is in flight
//! 3. `Generated`: content is valid
//! 4. `Meshing`: a mesh task is in flight
//! 5. `Meshed`: a mesh is attached to the chunk's render object
//!
//! Results arriving for a chunk that has since moved to another state are
//! discarded; the chunk was evicted or recycled in the meantime.

pub mod chunk;
pub mod cluster;
pub mod generation;
pub mod structure;
pub mod tasks;
pub mod voxel;
