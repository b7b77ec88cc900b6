#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel World
//!
//! The world core of a voxel engine: chunk storage, background generation,
//! face-culled meshing and the per-frame streaming loop that keeps a sphere of
//! chunks around the viewer ready to draw.
//!
//! ## Key Modules
//!
//! * `core` - Shared-state utilities used between the main thread and workers
//! * `engine_state` - The streaming [`World`] and every subsystem it drives
//! * `config` - [`WorldConfig`], loadable from JSON
//! * `error` - Error types of the public API
//!
//! ## Architecture
//!
//! The crate draws nothing. Mesh data leaves through the [`GpuBuffers`] trait and
//! is attached to objects of a [`RenderObjects`] implementation, so any renderer
//! can host the world. Host-memory implementations of both
//! ([`BufferState`](buffer_state::BufferState) and
//! [`RenderObjectState`](render_objects::RenderObjectState)) run the world
//! headless.
//!
//! ## Usage
//!
//! ```rust
//! use cgmath::Point3;
//! use voxel_world::buffer_state::BufferState;
//! use voxel_world::render_objects::RenderObjectState;
//! use voxel_world::voxels::voxel::registry::VoxelRegistry;
//! use voxel_world::{World, WorldConfig};
//!
//! let config = WorldConfig { view_radius: 2, worker_count: 0, ..WorldConfig::default() };
//! let mut world = World::new(config, VoxelRegistry::new(), BufferState::new(), RenderObjectState::new())?;
//!
//! let camera = world.update(Point3::new(10.0, 20.0, 30.0));
//! assert_eq!(camera, Point3::new(10.0, 20.0, 30.0));
//! # Ok::<(), voxel_world::error::WorldError>(())
//! ```

use std::path::Path;

use cgmath::Point3;
use log::info;
use web_time::Instant;

pub mod config;
pub mod core;
pub mod engine_state;
pub mod error;

pub use config::WorldConfig;
pub use engine_state::buffer_state::{self, BufferId, GpuBuffers};
pub use engine_state::render_objects::{self, RenderObjectId, RenderObjects};
pub use engine_state::voxels::generation::GenType;
pub use engine_state::voxels::structure::Structure;
pub use engine_state::{rendering, task_management, voxels, FrameStats, World};

use buffer_state::BufferState;
use error::WorldError;
use render_objects::RenderObjectState;
use voxels::voxel::registry::VoxelRegistry;

/// Frames the headless demo simulates.
pub const DEMO_FRAMES: usize = 240;

/// Runs the headless demo: streams a world around a viewer flying along +x.
///
/// `config_path` points at a JSON [`WorldConfig`]; without one the defaults
/// are used.
pub fn run(config_path: Option<&Path>) -> Result<(), WorldError> {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();
    info!("Logger initialized");

    let config = match config_path {
        Some(path) => WorldConfig::from_json_file(path)?,
        None => WorldConfig::default(),
    };

    let started = Instant::now();
    let mut world = World::new(config, VoxelRegistry::new(), BufferState::new(), RenderObjectState::new())?;

    let mut viewer = Point3::new(0.0, 0.0, 0.0);
    for _ in 0..DEMO_FRAMES {
        viewer = world.update(viewer);
        viewer.x += 2.0;
    }

    let gpu = world.gpu();
    info!(
        "Streamed {} frames in {:?}: {} chunks ({} slots, {} recycled), {} visible meshes, {} buffers using {} bytes",
        DEMO_FRAMES,
        started.elapsed(),
        world.structure().len(),
        world.structure().allocated_count(),
        world.structure().recycled_count(),
        world.objects().enabled_count(),
        gpu.live_buffers(),
        gpu.get_total_used_memory()
    );

    world.clear();
    Ok(())
}
