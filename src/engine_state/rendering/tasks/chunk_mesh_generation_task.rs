//! Task for generating mesh data for chunks in a background thread.
//!
//! The task owns a deep copy of the cluster it meshes, so the main thread can
//! keep editing, recycling or evicting the original chunks while it runs.

use std::sync::{Arc, Mutex, PoisonError};

use log::trace;
use web_time::Instant;

use crate::{
    core::MtResource,
    engine_state::{
        rendering::{
            meshing::{generate_chunk_vertices, ChunkMesh},
            vertex::ChunkVertex,
        },
        task_management::task::Task,
        voxels::{cluster::ClusterCopy, voxel::registry::VoxelRegistry},
    },
};

/// Per-worker vertex scratch buffers, indexed by worker index.
pub type VertexScratch = Arc<Vec<Mutex<Vec<ChunkVertex>>>>;

/// A task that meshes one chunk in a background thread.
pub struct ChunkMeshGenerationTask {
    cluster: ClusterCopy,
    registry: Arc<VoxelRegistry>,
    scratch: VertexScratch,
    /// Where the finished mesh is pushed for the main thread
    meshes: MtResource<Vec<ChunkMesh>>,
}

impl ChunkMeshGenerationTask {
    /// Creates a new chunk mesh generation task.
    ///
    /// # Arguments
    /// * `cluster` - Owned copy of the chunk and its six neighbors
    /// * `registry` - Finalized voxel registry
    /// * `scratch` - Vertex buffers shared by all mesh tasks, one per worker
    /// * `meshes` - Result list drained by the mesher's flush
    pub fn new(
        cluster: ClusterCopy,
        registry: Arc<VoxelRegistry>,
        scratch: VertexScratch,
        meshes: MtResource<Vec<ChunkMesh>>,
    ) -> Self {
        ChunkMeshGenerationTask {
            cluster,
            registry,
            scratch,
            meshes,
        }
    }
}

impl Task for ChunkMeshGenerationTask {
    fn process(self: Box<Self>, worker_index: usize) {
        let started = Instant::now();
        let center = self.cluster.center();

        let vertices = {
            let mut scratch = self.scratch[worker_index % self.scratch.len()]
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            scratch.clear();
            generate_chunk_vertices(&self.cluster.as_cluster(), &self.registry, &mut scratch);
            scratch.to_vec()
        };

        trace!(
            "Meshed chunk {:?} on worker {}: {} vertices in {:?}",
            center.position,
            worker_index,
            vertices.len(),
            started.elapsed()
        );

        let mesh = ChunkMesh::new(center.position, center.structure_id, vertices);
        self.meshes.get_mut().push(mesh);
    }
}
