//! Face emission table.
//!
//! [`GENERATE_SIDES`] holds one function per 6-bit face mask. Each entry is a
//! monomorphization of [`generate_sides`] whose face tests are constants, so a
//! call emits exactly the quads named by its mask and nothing else.

use crate::engine_state::rendering::vertex::{ChunkVertex, CHUNK_VERT_UV_MASK};
use crate::engine_state::voxels::voxel::voxel_side::VoxelSide;

/// Vertices per quad.
pub const QUAD_VERTEX_COUNT: usize = 4;
/// Indices per quad (two triangles).
pub const QUAD_INDEX_COUNT: usize = 6;
/// Vertices of a cube with all six faces.
pub const VOXEL_VERTEX_COUNT: usize = QUAD_VERTEX_COUNT * 6;
/// Indices of a cube with all six faces.
pub const VOXEL_INDEX_COUNT: usize = QUAD_INDEX_COUNT * 6;

/// Corner offsets of each face quad in winding order, indexed by mask bit.
pub const SIDE_CORNERS: [[[u32; 3]; 4]; 6] = [
    // NegX
    [[0, 0, 1], [0, 1, 1], [0, 1, 0], [0, 0, 0]],
    // NegZ
    [[0, 0, 0], [0, 1, 0], [1, 1, 0], [1, 0, 0]],
    // NegY
    [[0, 0, 1], [0, 0, 0], [1, 0, 0], [1, 0, 1]],
    // PosX
    [[1, 0, 0], [1, 1, 0], [1, 1, 1], [1, 0, 1]],
    // PosZ
    [[1, 0, 1], [1, 1, 1], [0, 1, 1], [0, 0, 1]],
    // PosY
    [[0, 1, 0], [0, 1, 1], [1, 1, 1], [1, 1, 0]],
];

/// Texture coordinates of the four corners of every quad.
pub const QUAD_UVS: [[u32; 2]; 4] = [
    [0, 0],
    [0, CHUNK_VERT_UV_MASK],
    [CHUNK_VERT_UV_MASK, CHUNK_VERT_UV_MASK],
    [CHUNK_VERT_UV_MASK, 0],
];

/// Emits the quad of one face of the cell at `(x, y, z)`.
#[inline(always)]
pub fn generate_side(vertices: &mut Vec<ChunkVertex>, side: VoxelSide, x: u32, y: u32, z: u32) {
    let normal = side.normal();
    for (corner, uv) in SIDE_CORNERS[side as usize].iter().zip(QUAD_UVS) {
        vertices.push(ChunkVertex::new(
            x + corner[0],
            y + corner[1],
            z + corner[2],
            normal,
            uv[0],
            uv[1],
        ));
    }
}

/// Appends the quads of every face in `MASK` and returns the vertex count.
fn generate_sides<const MASK: u8>(vertices: &mut Vec<ChunkVertex>, x: u32, y: u32, z: u32) -> usize {
    for side in VoxelSide::ALL {
        if MASK & side.mask_bit() != 0 {
            generate_side(vertices, side, x, y, z);
        }
    }
    MASK.count_ones() as usize * QUAD_VERTEX_COUNT
}

pub type SideGenerator = fn(&mut Vec<ChunkVertex>, u32, u32, u32) -> usize;

/// Face emitters indexed by face mask.
pub static GENERATE_SIDES: [SideGenerator; 64] = [
    generate_sides::<0>, generate_sides::<1>, generate_sides::<2>, generate_sides::<3>,
    generate_sides::<4>, generate_sides::<5>, generate_sides::<6>, generate_sides::<7>,
    generate_sides::<8>, generate_sides::<9>, generate_sides::<10>, generate_sides::<11>,
    generate_sides::<12>, generate_sides::<13>, generate_sides::<14>, generate_sides::<15>,
    generate_sides::<16>, generate_sides::<17>, generate_sides::<18>, generate_sides::<19>,
    generate_sides::<20>, generate_sides::<21>, generate_sides::<22>, generate_sides::<23>,
    generate_sides::<24>, generate_sides::<25>, generate_sides::<26>, generate_sides::<27>,
    generate_sides::<28>, generate_sides::<29>, generate_sides::<30>, generate_sides::<31>,
    generate_sides::<32>, generate_sides::<33>, generate_sides::<34>, generate_sides::<35>,
    generate_sides::<36>, generate_sides::<37>, generate_sides::<38>, generate_sides::<39>,
    generate_sides::<40>, generate_sides::<41>, generate_sides::<42>, generate_sides::<43>,
    generate_sides::<44>, generate_sides::<45>, generate_sides::<46>, generate_sides::<47>,
    generate_sides::<48>, generate_sides::<49>, generate_sides::<50>, generate_sides::<51>,
    generate_sides::<52>, generate_sides::<53>, generate_sides::<54>, generate_sides::<55>,
    generate_sides::<56>, generate_sides::<57>, generate_sides::<58>, generate_sides::<59>,
    generate_sides::<60>, generate_sides::<61>, generate_sides::<62>, generate_sides::<63>,
];
