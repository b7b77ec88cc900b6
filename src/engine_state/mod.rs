//! # Engine State Module
//!
//! The streaming loop that keeps a sphere of chunks around the viewer
//! generated and meshed.
//!
//! ## Key Components
//!
//! * `World` - Owns the structure, generator and mesher and drives them once per frame
//! * `buffer_state` - GPU buffer interface and its host-memory implementation
//! * `render_objects` - Render-object interface chunk meshes are attached to
//! * `rendering` - Chunk meshing
//! * `task_management` - Worker pool running generation and meshing
//! * `voxels` - Voxel data, chunks, structures and generation
//!
//! ## Frame Flow
//!
//! 1. Clamp the viewer to the world borders and find its chunk
//! 2. Evict chunks more than one chunk beyond the view radius
//! 3. Apply finished generation results
//! 4. Upload finished meshes and attach them to render objects
//! 5. Walk the view sphere nearest-first and request the next step for each chunk
//!
//! The structure is only ever touched on the thread calling [`World::update`].
//! Workers receive copies and hand results back through locked lists.

pub mod buffer_state;
pub mod render_objects;
pub mod rendering;
pub mod task_management;
pub mod voxels;

use std::sync::Arc;

use buffer_state::GpuBuffers;
use cgmath::{Point3, Vector3};
use log::{debug, info, trace, warn};
use render_objects::RenderObjects;
use rendering::Mesher;
use task_management::TaskManager;
use voxels::{
    chunk::{
        coordinates::{is_chunk_pos_valid, world_to_chunk_pos},
        ChunkState,
    },
    generation::Generator,
    structure::Structure,
    voxel::{registry::VoxelRegistry, NULL_VOXEL},
};

use crate::{
    config::{WorldConfig, MAX_VIEW_RADIUS},
    error::WorldError,
};

/// Work done by the last call to [`World::update`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Chunks dropped for being out of view.
    pub evicted: usize,
    /// Generation results copied into the structure.
    pub generated: usize,
    /// Meshes attached to render objects.
    pub meshed: usize,
    /// Results discarded because their chunk moved on.
    pub discarded: usize,
    pub generation_requests: usize,
    pub mesh_requests: usize,
}

impl FrameStats {
    fn is_idle(&self) -> bool {
        *self == FrameStats::default()
    }
}

/// Scan order for a view sphere of `radius` chunks.
///
/// Each axis expands 0, +1, -1, +2, -2, ... with `z` outermost and `x`
/// innermost. Offsets outside the sphere are dropped and the rest are stably
/// sorted by squared distance, so the nearest chunks come first. `radius` is
/// capped at [`MAX_VIEW_RADIUS`].
pub fn scan_offsets(radius: u32) -> Vec<Vector3<i32>> {
    let radius = radius.min(MAX_VIEW_RADIUS) as i32;
    let axis: Vec<i32> = std::iter::once(0)
        .chain((1..=radius).flat_map(|i| [i, -i]))
        .collect();
    let radius2 = radius as i64 * radius as i64;
    let length2 = |offset: &Vector3<i32>| {
        let (x, y, z) = (offset.x as i64, offset.y as i64, offset.z as i64);
        x * x + y * y + z * z
    };

    let mut offsets = Vec::new();
    for &z in &axis {
        for &y in &axis {
            for &x in &axis {
                let offset = Vector3::new(x, y, z);
                if length2(&offset) <= radius2 {
                    offsets.push(offset);
                }
            }
        }
    }
    offsets.sort_by_key(length2);
    offsets
}

/// A streamed voxel world.
///
/// `G` uploads mesh data and `R` owns the render objects meshes are attached
/// to. Both are driven exclusively from [`World::update`].
///
/// # Examples
///
/// ```
/// use cgmath::Point3;
/// use voxel_world::buffer_state::BufferState;
/// use voxel_world::render_objects::RenderObjectState;
/// use voxel_world::voxels::voxel::registry::VoxelRegistry;
/// use voxel_world::{World, WorldConfig};
///
/// let config = WorldConfig { view_radius: 1, worker_count: 0, ..WorldConfig::default() };
/// let mut world = World::new(config, VoxelRegistry::new(), BufferState::new(), RenderObjectState::new()).unwrap();
///
/// for _ in 0..4 {
///     world.update(Point3::new(0.0, 0.0, 0.0));
/// }
/// assert!(world.objects().enabled_count() > 0);
/// ```
pub struct World<G: GpuBuffers, R: RenderObjects> {
    config: WorldConfig,
    task_manager: Arc<TaskManager>,
    structure: Structure,
    generator: Generator,
    mesher: Mesher,
    gpu: G,
    objects: R,
    scan_offsets: Vec<Vector3<i32>>,
    initialized: bool,
    viewer_chunk: Point3<i32>,
    last_frame: FrameStats,
}

impl<G: GpuBuffers, R: RenderObjects> World<G, R> {
    /// Creates a world with its own worker pool of `config.worker_count` threads.
    ///
    /// The registry is finalized if it is not already.
    pub fn new(config: WorldConfig, registry: VoxelRegistry, gpu: G, objects: R) -> Result<Self, WorldError> {
        config.validate()?;
        let task_manager = Arc::new(TaskManager::new(config.worker_count)?);
        Self::with_task_manager(config, registry, task_manager, gpu, objects)
    }

    /// Creates a world sharing an existing worker pool.
    pub fn with_task_manager(
        config: WorldConfig,
        mut registry: VoxelRegistry,
        task_manager: Arc<TaskManager>,
        gpu: G,
        objects: R,
    ) -> Result<Self, WorldError> {
        config.validate()?;
        registry.finalize();
        let registry = Arc::new(registry);

        let generator = Generator::new(task_manager.clone(), config.seed, config.terrain.clone());
        let mesher = Mesher::new(task_manager.clone(), registry);

        Ok(World {
            scan_offsets: scan_offsets(config.view_radius),
            config,
            task_manager,
            structure: Structure::new(0),
            generator,
            mesher,
            gpu,
            objects,
            initialized: false,
            viewer_chunk: Point3::new(0, 0, 0),
            last_frame: FrameStats::default(),
        })
    }

    /// Runs one frame of streaming for a viewer at `viewer` (world units).
    ///
    /// Returns the viewer position clamped to the world borders; callers
    /// should move their camera there.
    pub fn update(&mut self, viewer: Point3<f32>) -> Point3<f32> {
        if !self.initialized {
            self.initialize();
        }

        let min = self.config.min_border();
        let max = self.config.max_border();
        let viewer = Point3::new(
            viewer.x.clamp(min.x, max.x),
            viewer.y.clamp(min.y, max.y),
            viewer.z.clamp(min.z, max.z),
        );
        let center = world_to_chunk_pos(viewer);
        self.viewer_chunk = center;

        let mut stats = FrameStats {
            evicted: self.evict(center),
            ..FrameStats::default()
        };
        self.apply_generated(&mut stats);
        self.apply_meshes(&mut stats);
        self.scan(center, &mut stats);

        if !stats.is_idle() {
            debug!("World frame at chunk {:?}: {:?}", center, stats);
        }
        self.last_frame = stats;
        viewer
    }

    fn initialize(&mut self) {
        self.mesher.initialize(&mut self.gpu);
        self.initialized = true;
        info!(
            "World initialized: view radius {} ({} chunks per scan), {:?} generation, seed {}, {} workers",
            self.config.view_radius,
            self.scan_offsets.len(),
            self.config.gen_type,
            self.config.seed,
            self.task_manager.worker_count()
        );
    }

    fn evict(&mut self, center: Point3<i32>) -> usize {
        let radius = self.config.view_radius.saturating_add(1);
        let evicted = self
            .structure
            .remove_out_of_view(&mut self.objects, center, radius);

        for buffer in self.structure.take_released_buffers() {
            self.gpu.destroy_buffer(buffer);
        }
        evicted
    }

    fn apply_generated(&mut self, stats: &mut FrameStats) {
        let structure = &mut self.structure;
        let structure_id = structure.id();

        self.generator.flush(|result| {
            let chunk = match structure.try_get_chunk_mut(result.position) {
                Some(chunk)
                    if result.structure_id == structure_id && chunk.state == ChunkState::Generating =>
                {
                    chunk
                }
                _ => {
                    debug!("Discarding stale generation result for chunk {:?}", result.position);
                    stats.discarded += 1;
                    return;
                }
            };

            if result.state == ChunkState::Generated {
                chunk.copy_content_from(result);
                chunk.state = ChunkState::Generated;
                stats.generated += 1;
            } else {
                warn!("Generation failed for chunk {:?}, retrying", result.position);
                chunk.state = ChunkState::Allocated;
            }
        });
    }

    fn apply_meshes(&mut self, stats: &mut FrameStats) {
        let structure = &mut self.structure;
        let structure_id = structure.id();
        let objects = &mut self.objects;

        self.mesher.flush(&mut self.gpu, |gpu, mesh, index_count| {
            let chunk = match structure.try_get_chunk_mut(mesh.position) {
                Some(chunk) if mesh.structure_id == structure_id && chunk.state == ChunkState::Meshing => {
                    chunk
                }
                _ => {
                    debug!("Discarding stale mesh for chunk {:?}", mesh.position);
                    stats.discarded += 1;
                    return;
                }
            };

            if let Some(object) = chunk.render_object {
                let vertex_buffer = mesh.upload(gpu);
                if let Some(previous) = objects.attach_mesh(object, vertex_buffer, index_count) {
                    gpu.destroy_buffer(previous);
                }
                objects.set_enabled(object, vertex_buffer.is_some());
            }
            chunk.state = ChunkState::Meshed;
            stats.meshed += 1;
            trace!("Chunk {:?} meshed with {} indices", mesh.position, index_count);
        });
    }

    fn scan(&mut self, center: Point3<i32>, stats: &mut FrameStats) {
        let structure_id = self.structure.id();
        let gen_type = self.config.gen_type;

        for offset in &self.scan_offsets {
            let position = center + *offset;
            if !is_chunk_pos_valid(position) {
                continue;
            }

            let id = match self
                .structure
                .get_or_add_chunk(&mut self.objects, position, NULL_VOXEL)
            {
                Ok(id) => id,
                Err(err) => {
                    warn!("Skipping chunk {:?}: {}", position, err);
                    continue;
                }
            };

            match self.structure.chunk(id).state {
                ChunkState::Allocated => {
                    self.generator.generate_chunk(position, structure_id, gen_type);
                    self.structure.chunk_mut(id).state = ChunkState::Generating;
                    stats.generation_requests += 1;
                }
                ChunkState::Generated => {
                    let neighbors = self
                        .structure
                        .add_neighbors(&mut self.objects, position, NULL_VOXEL);

                    for neighbor in neighbors {
                        let chunk = self.structure.chunk_mut(neighbor);
                        if chunk.state == ChunkState::Allocated {
                            self.generator.generate_chunk(chunk.position, structure_id, gen_type);
                            chunk.state = ChunkState::Generating;
                            stats.generation_requests += 1;
                        }
                    }

                    let mesher = &self.mesher;
                    let queued = self
                        .structure
                        .cluster(position)
                        .is_some_and(|cluster| cluster.is_meshing_ready() && mesher.generate_mesh(&cluster));
                    if queued {
                        self.structure.chunk_mut(id).state = ChunkState::Meshing;
                        stats.mesh_requests += 1;
                    }
                }
                ChunkState::Generating | ChunkState::Meshing | ChunkState::Meshed => {}
            }
        }
    }

    /// Drops every chunk and releases all GPU resources the world owns.
    ///
    /// Results still in flight are discarded when they arrive.
    pub fn clear(&mut self) {
        for buffer in self.structure.clear(&mut self.objects) {
            self.gpu.destroy_buffer(buffer);
        }
        self.mesher.release(&mut self.gpu);
        self.initialized = false;
    }

    /// True when no task is running and no result is waiting to be applied.
    pub fn is_idle(&self) -> bool {
        self.task_manager.tasks_in_flight() == 0
            && self.generator.pending_chunks() == 0
            && self.mesher.pending_meshes() == 0
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn structure(&self) -> &Structure {
        &self.structure
    }

    pub fn mesher(&self) -> &Mesher {
        &self.mesher
    }

    pub fn gpu(&self) -> &G {
        &self.gpu
    }

    pub fn objects(&self) -> &R {
        &self.objects
    }

    pub fn task_manager(&self) -> &Arc<TaskManager> {
        &self.task_manager
    }

    /// Chunk the viewer was in during the last update.
    pub fn viewer_chunk(&self) -> Point3<i32> {
        self.viewer_chunk
    }

    pub fn last_frame(&self) -> FrameStats {
        self.last_frame
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn scan_offsets(&self) -> &[Vector3<i32>] {
        &self.scan_offsets
    }
}
