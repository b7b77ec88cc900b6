//! # Chunk Generation Task
//!
//! Generates the content of one chunk on a worker. The task builds a transient
//! chunk and pushes it to the generator's result list; the main thread copies
//! the content into the authoritative chunk if it still wants it.

use std::sync::Arc;

use cgmath::Point3;
use log::trace;

use crate::{
    core::MtResource,
    engine_state::{
        task_management::task::Task,
        voxels::{
            chunk::{Chunk, ChunkState},
            generation::{GenType, GeneratorContext},
            voxel::NULL_VOXEL,
        },
    },
};

/// A task that generates chunk data asynchronously.
pub struct ChunkGenerationTask {
    /// The position of the chunk to generate (in chunk coordinates)
    position: Point3<i32>,
    structure_id: u32,
    gen_type: GenType,
    context: Arc<GeneratorContext>,
    chunks: MtResource<Vec<Chunk>>,
}

impl ChunkGenerationTask {
    /// Creates a new chunk generation task.
    ///
    /// # Arguments
    /// * `position` - The chunk coordinates where the chunk should be generated
    /// * `structure_id` - Structure the chunk belongs to
    /// * `gen_type` - Algorithm filling the chunk
    /// * `context` - Noise sources and terrain parameters
    /// * `chunks` - Result list drained by the generator's flush
    pub fn new(
        position: Point3<i32>,
        structure_id: u32,
        gen_type: GenType,
        context: Arc<GeneratorContext>,
        chunks: MtResource<Vec<Chunk>>,
    ) -> Self {
        ChunkGenerationTask {
            position,
            structure_id,
            gen_type,
            context,
            chunks,
        }
    }
}

impl Task for ChunkGenerationTask {
    fn process(self: Box<Self>, worker_index: usize) {
        let mut chunk = Chunk::new(NULL_VOXEL, self.position, self.structure_id);

        chunk.state = if self.context.generate(self.gen_type, &mut chunk, worker_index) {
            ChunkState::Generated
        } else {
            ChunkState::Allocated
        };
        trace!("Generated chunk {:?}: {:?}", self.position, chunk.state);

        self.chunks.get_mut().push(chunk);
    }
}
