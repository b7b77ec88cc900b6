//! # Voxel Module
//!
//! Voxel ids and the per-type properties the mesher culls faces with.
//!
//! ## Components
//! - [`Voxel`]: 16-bit type id stored in every chunk cell
//! - [`VoxelData`]: draw mode, hollowness and texture of one type
//! - [`VoxelRegistry`](registry::VoxelRegistry): id → data table
//! - [`VoxelSide`](voxel_side::VoxelSide): the six cube faces and their mask bits

use serde::{Deserialize, Serialize};

pub mod registry;
pub mod voxel_side;

/// A voxel type id.
pub type Voxel = u16;

/// Empty space.
pub const NULL_VOXEL: Voxel = 0;
/// Fallback for ids the registry does not know.
pub const UNKNOWN_VOXEL: Voxel = 1;
/// Placeholder solid used by debug generators.
pub const DEBUG_VOXEL: Voxel = 2;

/// How a voxel type takes part in face culling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawMode {
    /// Hides every face that touches it.
    #[default]
    Opaque,
    /// Visible, but does not hide neighboring faces.
    Translucent,
    /// Not drawn and never hides anything.
    Transparent,
}

fn default_hollow() -> bool {
    true
}

/// Properties of a single voxel type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoxelData {
    /// Assigned by the registry on registration.
    #[serde(skip)]
    pub id: Voxel,
    #[serde(default)]
    pub draw_mode: DrawMode,
    /// A hollow type hides the faces between two cells of the same type.
    #[serde(default = "default_hollow")]
    pub is_hollow: bool,
    #[serde(default)]
    pub texture_id: u32,
}

impl VoxelData {
    /// Creates hollow type data. The id is assigned when it is registered.
    pub const fn new(draw_mode: DrawMode, texture_id: u32) -> Self {
        VoxelData {
            id: NULL_VOXEL,
            draw_mode,
            is_hollow: true,
            texture_id,
        }
    }

    pub const fn with_hollow(mut self, is_hollow: bool) -> Self {
        self.is_hollow = is_hollow;
        self
    }

    /// Whether the face of `self` that touches `near` must be drawn.
    ///
    /// Opaque neighbors always hide the face. A hollow type also hides faces
    /// shared with cells of its own type.
    #[inline]
    pub fn should_draw(&self, near: &VoxelData) -> bool {
        if near.draw_mode == DrawMode::Opaque {
            return false;
        }
        !(self.id == near.id && self.is_hollow)
    }
}
