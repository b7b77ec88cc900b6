//! Mesh generation for voxel chunks.
//!
//! Every visible face of every cell becomes one quad. Visibility comes from the
//! cluster's face mask, and [`sides::GENERATE_SIDES`] turns the mask into
//! vertices with a single table lookup per cell.
//!
//! # Architecture
//! - `Mesher`: publishes mesh tasks and hands finished meshes back to the main thread
//! - `sides`: the 64-entry face emission table
//! - `mesh`: `ChunkMesh` upload and the shared quad index buffer
//!
//! All meshes share one index buffer. Its content only depends on the number
//! of quads, so the mesher grows it whenever a mesh needs more indices than it
//! holds.

pub mod mesh;
pub mod sides;

use std::sync::{Arc, Mutex};

use log::{debug, error, info};

pub use mesh::{ChunkMesh, IndexType, QuadIndices, SharedIndexBuffer};

use crate::{
    core::MtResource,
    engine_state::{
        buffer_state::{BufferId, GpuBuffers},
        rendering::{
            tasks::chunk_mesh_generation_task::{ChunkMeshGenerationTask, VertexScratch},
            vertex::ChunkVertex,
        },
        task_management::TaskManager,
        voxels::{
            chunk::{CHUNK_LENGTH, CHUNK_PLANE_SIZE},
            cluster::Cluster,
            voxel::registry::VoxelRegistry,
        },
    },
};
use sides::{GENERATE_SIDES, VOXEL_INDEX_COUNT, VOXEL_VERTEX_COUNT};

/// Initial size of the shared index buffer, in indices.
pub const INITIAL_INDEX_COUNT: u32 = (VOXEL_INDEX_COUNT * CHUNK_PLANE_SIZE) as u32;

/// Appends the quads of every visible face of the cluster's center chunk.
///
/// Cells are visited with `x` fastest, then `y`, then `z`. Returns the number
/// of vertices appended.
pub fn generate_chunk_vertices(
    cluster: &Cluster<'_>,
    registry: &VoxelRegistry,
    vertices: &mut Vec<ChunkVertex>,
) -> usize {
    let mut count = 0;
    for z in 0..CHUNK_LENGTH {
        for y in 0..CHUNK_LENGTH {
            for x in 0..CHUNK_LENGTH {
                let mask = cluster.near_mask(x, y, z, registry);
                count += GENERATE_SIDES[mask as usize](vertices, x as u32, y as u32, z as u32);
            }
        }
    }
    count
}

/// Turns generated clusters into uploaded chunk meshes.
pub struct Mesher {
    task_manager: Arc<TaskManager>,
    registry: Arc<VoxelRegistry>,
    scratch: VertexScratch,
    meshes: MtResource<Vec<ChunkMesh>>,
    index_buffer: Option<SharedIndexBuffer>,
}

impl Mesher {
    /// Creates a mesher publishing to `task_manager`.
    ///
    /// The registry must be finalized; workers read it without locking.
    pub fn new(task_manager: Arc<TaskManager>, registry: Arc<VoxelRegistry>) -> Self {
        debug_assert!(registry.is_finalized(), "meshing with an open registry");

        let scratch = (0..task_manager.worker_slots())
            .map(|_| Mutex::new(Vec::with_capacity(CHUNK_PLANE_SIZE * VOXEL_VERTEX_COUNT)))
            .collect();

        Mesher {
            task_manager,
            registry,
            scratch: Arc::new(scratch),
            meshes: MtResource::new(Vec::new()),
            index_buffer: None,
        }
    }

    /// Creates the shared index buffer if it does not exist yet.
    pub fn initialize(&mut self, gpu: &mut impl GpuBuffers) {
        if self.index_buffer.is_none() {
            self.index_buffer = Some(SharedIndexBuffer::new(gpu, INITIAL_INDEX_COUNT));
        }
    }

    /// Queues a mesh task for the cluster's center chunk.
    ///
    /// The cluster is deep-copied, so it can be released right after this call.
    /// Returns false, without queueing anything, if a neighbor has no content yet.
    pub fn generate_mesh(&self, cluster: &Cluster<'_>) -> bool {
        debug_assert!(
            cluster.is_meshing_ready(),
            "meshing chunk {:?} before its neighbors are generated",
            cluster.c.position
        );
        if !cluster.is_meshing_ready() {
            error!("Refusing to mesh chunk {:?}: neighbors not generated", cluster.c.position);
            return false;
        }

        self.task_manager.publish_task(Box::new(ChunkMeshGenerationTask::new(
            cluster.deep_copy(),
            self.registry.clone(),
            self.scratch.clone(),
            self.meshes.clone(),
        )));
        true
    }

    /// Hands every finished mesh to `on_mesh` on the calling thread.
    ///
    /// The callback receives the mesh and its index count and decides whether
    /// to [`ChunkMesh::upload`] it. Afterwards the shared index buffer is grown
    /// to cover the largest mesh seen.
    pub fn flush<G: GpuBuffers>(
        &mut self,
        gpu: &mut G,
        mut on_mesh: impl FnMut(&mut G, &ChunkMesh, u32),
    ) -> usize {
        let meshes: Vec<ChunkMesh> = self.meshes.get_mut().drain(..).collect();
        if meshes.is_empty() {
            return 0;
        }

        let mut max_index_count = 0;
        for mesh in &meshes {
            let index_count = mesh.index_count();
            max_index_count = max_index_count.max(index_count);
            on_mesh(gpu, mesh, index_count);
        }

        match &mut self.index_buffer {
            Some(index_buffer) => {
                if index_buffer.grow_to(gpu, max_index_count) {
                    info!(
                        "Grew shared index buffer to {} indices ({:?})",
                        index_buffer.index_count(),
                        index_buffer.index_type()
                    );
                }
            }
            None => {
                self.index_buffer = Some(SharedIndexBuffer::new(gpu, max_index_count.max(INITIAL_INDEX_COUNT)));
            }
        }

        debug!("Flushed {} chunk meshes", meshes.len());
        meshes.len()
    }

    /// Number of finished meshes waiting for `flush`.
    pub fn pending_meshes(&self) -> usize {
        self.meshes.get().len()
    }

    pub fn index_buffer(&self) -> Option<BufferId> {
        self.index_buffer.as_ref().map(SharedIndexBuffer::buffer)
    }

    /// Number of indices the shared index buffer holds.
    pub fn index_buffer_count(&self) -> u32 {
        self.index_buffer
            .as_ref()
            .map_or(0, SharedIndexBuffer::index_count)
    }

    pub fn index_type(&self) -> Option<IndexType> {
        self.index_buffer.as_ref().map(SharedIndexBuffer::index_type)
    }

    /// Destroys the shared index buffer.
    pub fn release(&mut self, gpu: &mut impl GpuBuffers) {
        if let Some(index_buffer) = self.index_buffer.take() {
            index_buffer.destroy(gpu);
        }
    }
}
