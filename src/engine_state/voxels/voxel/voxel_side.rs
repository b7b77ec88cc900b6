//! # Voxel Side Module
//!
//! The six faces of a voxel cell, in face-mask bit order.

use cgmath::Vector3;

/// One face of a voxel cell.
///
/// The discriminant is the face's bit in a face-visibility mask. Quads are
/// emitted in this order: [NegX, NegZ, NegY, PosX, PosZ, PosY].
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum VoxelSide {
    /// Facing negative X
    NegX = 0,
    /// Facing negative Z
    NegZ = 1,
    /// Facing negative Y
    NegY = 2,
    /// Facing positive X
    PosX = 3,
    /// Facing positive Z
    PosZ = 4,
    /// Facing positive Y
    PosY = 5,
}

impl VoxelSide {
    /// All faces in mask bit order.
    pub const ALL: [VoxelSide; 6] = [
        VoxelSide::NegX,
        VoxelSide::NegZ,
        VoxelSide::NegY,
        VoxelSide::PosX,
        VoxelSide::PosZ,
        VoxelSide::PosY,
    ];

    #[inline]
    pub const fn mask_bit(self) -> u8 {
        1 << self as u8
    }

    /// The 3-bit normal tag stored in every vertex of this face.
    ///
    /// Tags are grouped per axis: -x 0, +x 1, -y 2, +y 3, -z 4, +z 5.
    #[inline]
    pub const fn normal(self) -> u8 {
        match self {
            VoxelSide::NegX => 0,
            VoxelSide::PosX => 1,
            VoxelSide::NegY => 2,
            VoxelSide::PosY => 3,
            VoxelSide::NegZ => 4,
            VoxelSide::PosZ => 5,
        }
    }

    /// Unit step from a cell to the cell across this face.
    pub fn offset(self) -> Vector3<i32> {
        match self {
            VoxelSide::NegX => Vector3::new(-1, 0, 0),
            VoxelSide::PosX => Vector3::new(1, 0, 0),
            VoxelSide::NegY => Vector3::new(0, -1, 0),
            VoxelSide::PosY => Vector3::new(0, 1, 0),
            VoxelSide::NegZ => Vector3::new(0, 0, -1),
            VoxelSide::PosZ => Vector3::new(0, 0, 1),
        }
    }

    /// Faces whose bit is set in `mask`, in emission order.
    pub fn from_mask(mask: u8) -> impl Iterator<Item = VoxelSide> {
        Self::ALL
            .into_iter()
            .filter(move |side| mask & side.mask_bit() != 0)
    }
}
