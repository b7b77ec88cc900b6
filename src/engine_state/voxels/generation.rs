//! # Chunk Generation
//!
//! Fills chunks with content on the worker pool. Results are collected in a
//! locked list and handed to the main thread by [`Generator::flush`].
//!
//! Generation algorithms:
//! - `DebugSphere`: a hollow-looking test pattern (chunk shell plus a centered ball)
//! - `Terrain`: a 2D Simplex heightmap with surface, soil and stone layers
//! - `Solid` / `Empty`: uniform chunks

use std::sync::Arc;

use cgmath::Point3;
use log::trace;
use noise::{NoiseFn, Simplex};
use serde::{Deserialize, Serialize};

use super::chunk::coordinates::{is_chunk_pos_valid, pos_to_chunk_hash};
use super::chunk::{Chunk, CHUNK_HALF_LENGTH, CHUNK_LENGTH};
use super::tasks::chunk_generation_task::ChunkGenerationTask;
use super::voxel::{Voxel, DEBUG_VOXEL, NULL_VOXEL, UNKNOWN_VOXEL};
use crate::core::MtResource;
use crate::engine_state::task_management::TaskManager;

/// Which algorithm fills a chunk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenType {
    #[default]
    DebugSphere,
    Terrain,
    Solid,
    Empty,
}

/// Parameters of [`GenType::Terrain`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Noise frequency in samples per voxel.
    pub scale: f64,
    /// World height of the noise midpoint, in voxels.
    pub base_height: f64,
    /// Maximum deviation from `base_height`, in voxels.
    pub amplitude: f64,
    /// Voxels of soil under the surface layer.
    pub soil_depth: i32,
    pub surface_voxel: Voxel,
    pub soil_voxel: Voxel,
    pub stone_voxel: Voxel,
    /// Voxel scattered through stone.
    pub sprinkle_voxel: Voxel,
    /// Probability of a stone cell being replaced by `sprinkle_voxel`.
    pub sprinkle_chance: f64,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        TerrainConfig {
            scale: 0.01,
            base_height: 0.0,
            amplitude: 48.0,
            soil_depth: 3,
            surface_voxel: DEBUG_VOXEL,
            soil_voxel: DEBUG_VOXEL,
            stone_voxel: UNKNOWN_VOXEL,
            sprinkle_voxel: DEBUG_VOXEL,
            sprinkle_chance: 0.02,
        }
    }
}

/// Read-only state shared by every generation task.
#[derive(Debug)]
pub struct GeneratorContext {
    /// One noise source per worker.
    noise: Vec<Simplex>,
    pub terrain: TerrainConfig,
    pub seed: u32,
}

impl GeneratorContext {
    pub fn new(worker_slots: usize, seed: u32, terrain: TerrainConfig) -> Self {
        GeneratorContext {
            noise: (0..worker_slots.max(1)).map(|_| Simplex::new(seed)).collect(),
            terrain,
            seed,
        }
    }

    pub fn noise(&self, worker_index: usize) -> &Simplex {
        &self.noise[worker_index % self.noise.len()]
    }

    /// Fills `chunk` according to `gen_type` and returns whether it succeeded.
    ///
    /// Chunks outside the representable structure cube cannot be generated.
    pub fn generate(&self, gen_type: GenType, chunk: &mut Chunk, worker_index: usize) -> bool {
        if !is_chunk_pos_valid(chunk.position) {
            return false;
        }

        match gen_type {
            GenType::DebugSphere => generate_debug_sphere(chunk),
            GenType::Terrain => {
                generate_terrain(chunk, self.noise(worker_index), &self.terrain, self.seed)
            }
            GenType::Solid => chunk.fill(DEBUG_VOXEL),
            GenType::Empty => chunk.fill(NULL_VOXEL),
        }
        chunk.refresh_is_empty();
        true
    }
}

/// Chunk shell plus every cell closer than half a chunk to the center.
pub fn generate_debug_sphere(chunk: &mut Chunk) {
    const LAST: usize = CHUNK_LENGTH - 1;
    let center = CHUNK_HALF_LENGTH as i64;
    let max_dist2 = center * center;

    for z in 0..CHUNK_LENGTH {
        for y in 0..CHUNK_LENGTH {
            for x in 0..CHUNK_LENGTH {
                let on_border =
                    x == 0 || x == LAST || y == 0 || y == LAST || z == 0 || z == LAST;
                let (dx, dy, dz) = (x as i64 - center, y as i64 - center, z as i64 - center);

                if on_border || dx * dx + dy * dy + dz * dz < max_dist2 {
                    chunk.set(x, y, z, DEBUG_VOXEL);
                }
            }
        }
    }
}

/// Heightmap terrain. Columns are sampled in world space, so neighboring
/// chunks line up.
pub fn generate_terrain(chunk: &mut Chunk, noise: &Simplex, terrain: &TerrainConfig, seed: u32) {
    let origin = chunk.position.map(|c| c as i64 * CHUNK_LENGTH as i64);
    let mut rng = fastrand::Rng::with_seed(pos_to_chunk_hash(chunk.position) ^ u64::from(seed));

    for z in 0..CHUNK_LENGTH {
        for x in 0..CHUNK_LENGTH {
            let sample = noise.get([
                (origin.x + x as i64) as f64 * terrain.scale,
                (origin.z + z as i64) as f64 * terrain.scale,
            ]);
            let height = (terrain.base_height + sample * terrain.amplitude).floor() as i64;

            for y in 0..CHUNK_LENGTH {
                let world_y = origin.y + y as i64;
                let depth = height - world_y;

                let voxel = if depth <= 0 {
                    NULL_VOXEL
                } else if depth == 1 {
                    terrain.surface_voxel
                } else if depth <= 1 + i64::from(terrain.soil_depth) {
                    terrain.soil_voxel
                } else if rng.f64() < terrain.sprinkle_chance {
                    terrain.sprinkle_voxel
                } else {
                    terrain.stone_voxel
                };
                chunk.set(x, y, z, voxel);
            }
        }
    }
}

/// Runs chunk generation on the worker pool.
pub struct Generator {
    task_manager: Arc<TaskManager>,
    context: Arc<GeneratorContext>,
    chunks: MtResource<Vec<Chunk>>,
}

impl Generator {
    pub fn new(task_manager: Arc<TaskManager>, seed: u32, terrain: TerrainConfig) -> Self {
        let context = GeneratorContext::new(task_manager.worker_slots(), seed, terrain);
        Generator {
            task_manager,
            context: Arc::new(context),
            chunks: MtResource::new(Vec::new()),
        }
    }

    pub fn context(&self) -> &GeneratorContext {
        &self.context
    }

    /// Queues generation of the chunk at `position`.
    ///
    /// The result is a fresh chunk, delivered through [`Generator::flush`].
    pub fn generate_chunk(&self, position: Point3<i32>, structure_id: u32, gen_type: GenType) {
        trace!("Requesting {:?} generation of chunk {:?}", gen_type, position);
        self.task_manager.publish_task(Box::new(ChunkGenerationTask::new(
            position,
            structure_id,
            gen_type,
            self.context.clone(),
            self.chunks.clone(),
        )));
    }

    /// Hands every finished chunk to `on_chunk`, then drops it.
    ///
    /// A chunk whose state is not [`Generated`](super::chunk::ChunkState::Generated) failed to generate.
    pub fn flush(&self, mut on_chunk: impl FnMut(&Chunk)) -> usize {
        let chunks: Vec<Chunk> = self.chunks.get_mut().drain(..).collect();
        for chunk in &chunks {
            on_chunk(chunk);
        }
        chunks.len()
    }

    /// Number of finished chunks waiting for `flush`.
    pub fn pending_chunks(&self) -> usize {
        self.chunks.get().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::chunk::coordinates::STRUCTURE_POS_MAX;
    use crate::engine_state::voxels::chunk::ChunkState;

    fn generated(gen_type: GenType, position: Point3<i32>) -> Vec<Chunk> {
        let generator = Generator::new(Arc::new(TaskManager::new(0).unwrap()), 7, TerrainConfig::default());
        generator.generate_chunk(position, 3, gen_type);

        let mut chunks = Vec::new();
        assert_eq!(generator.flush(|chunk| chunks.push(chunk.clone())), 1);
        assert_eq!(generator.pending_chunks(), 0);
        chunks
    }

    #[test]
    fn test_debug_sphere_content() {
        let chunks = generated(GenType::DebugSphere, Point3::new(1, -2, 3));
        let chunk = &chunks[0];

        assert_eq!(chunk.state, ChunkState::Generated);
        assert_eq!(chunk.position, Point3::new(1, -2, 3));
        assert_eq!(chunk.structure_id, 3);
        assert!(!chunk.is_empty);

        assert_eq!(chunk.get(16, 16, 16), DEBUG_VOXEL);
        assert_eq!(chunk.get(0, 7, 9), DEBUG_VOXEL);
        assert_eq!(chunk.get(31, 31, 31), DEBUG_VOXEL);
        assert_eq!(chunk.get(3, 3, 3), NULL_VOXEL);
        assert_eq!(chunk.get(16, 16, 1), DEBUG_VOXEL);
        assert_eq!(chunk.get(16, 1, 1), NULL_VOXEL);
    }

    #[test]
    fn test_debug_sphere_is_deterministic() {
        let a = generated(GenType::DebugSphere, Point3::new(0, 0, 0));
        let b = generated(GenType::DebugSphere, Point3::new(5, 5, 5));
        assert_eq!(a[0].voxels(), b[0].voxels());
    }

    #[test]
    fn test_uniform_generators() {
        let empty = generated(GenType::Empty, Point3::new(0, 0, 0));
        assert!(empty[0].is_empty);
        assert_eq!(empty[0].state, ChunkState::Generated);

        let solid = generated(GenType::Solid, Point3::new(0, 0, 0));
        assert!(!solid[0].is_empty);
        assert!(solid[0].voxels().iter().all(|&v| v == DEBUG_VOXEL));
    }

    #[test]
    fn test_terrain_layers() {
        let terrain = TerrainConfig {
            amplitude: 0.0,
            base_height: 8.0,
            sprinkle_chance: 0.0,
            ..TerrainConfig::default()
        };
        let context = GeneratorContext::new(1, 1, terrain.clone());
        let mut chunk = Chunk::new(NULL_VOXEL, Point3::new(0, 0, 0), 0);

        assert!(context.generate(GenType::Terrain, &mut chunk, 0));

        assert_eq!(chunk.get(4, 8, 4), NULL_VOXEL);
        assert_eq!(chunk.get(4, 7, 4), terrain.surface_voxel);
        assert_eq!(chunk.get(4, 4, 4), terrain.soil_voxel);
        assert_eq!(chunk.get(4, 3, 4), terrain.stone_voxel);
        assert_eq!(chunk.get(4, 0, 4), terrain.stone_voxel);
    }

    #[test]
    fn test_terrain_is_seeded() {
        let context = GeneratorContext::new(2, 42, TerrainConfig::default());
        let mut a = Chunk::new(NULL_VOXEL, Point3::new(2, -1, 4), 0);
        let mut b = Chunk::new(NULL_VOXEL, Point3::new(2, -1, 4), 0);

        assert!(context.generate(GenType::Terrain, &mut a, 0));
        assert!(context.generate(GenType::Terrain, &mut b, 1));

        assert_eq!(a.voxels(), b.voxels());
    }

    #[test]
    fn test_unrepresentable_chunk_fails() {
        let chunks = generated(GenType::Solid, Point3::new(STRUCTURE_POS_MAX + 1, 0, 0));
        assert_eq!(chunks[0].state, ChunkState::Allocated);
    }
}
