//! Packed vertex format for chunk meshes.
//!
//! Every vertex is two 32-bit words:
//!
//! | word | bits 0..14 | bits 14..28 | bits 28..31 |
//! |------|------------|-------------|-------------|
//! | `x`  | position x | position y  | normal tag  |
//!
//! | word | bits 0..14 | bits 14..23 | bits 23..32 |
//! |------|------------|-------------|-------------|
//! | `y`  | position z | texcoord u  | texcoord v  |
//!
//! Positions are in voxels relative to the chunk origin (0..=32).

/// Bits per position axis.
pub const CHUNK_VERT_POS_BITS: u32 = 14;
/// Bits of the face normal tag.
pub const CHUNK_VERT_NORM_BITS: u32 = 3;
/// Bits per texture coordinate.
pub const CHUNK_VERT_UV_BITS: u32 = 9;

pub const CHUNK_VERT_POS_MASK: u32 = (1 << CHUNK_VERT_POS_BITS) - 1;
pub const CHUNK_VERT_NORM_MASK: u32 = (1 << CHUNK_VERT_NORM_BITS) - 1;
pub const CHUNK_VERT_UV_MASK: u32 = (1 << CHUNK_VERT_UV_BITS) - 1;

/// A vertex of a chunk mesh, laid out exactly as the vertex shader reads it.
///
/// Total size: 8 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ChunkVertex {
    x: u32,
    y: u32,
}

impl ChunkVertex {
    /// Packs a vertex. Out-of-range fields are truncated to their bit width.
    ///
    /// # Arguments
    /// * `x`, `y`, `z` - Position inside the chunk, in voxels
    /// * `normal` - Face normal tag (0..6)
    /// * `u`, `v` - Texture coordinates, where [`CHUNK_VERT_UV_MASK`] is 1.0
    #[inline]
    pub const fn new(x: u32, y: u32, z: u32, normal: u8, u: u32, v: u32) -> Self {
        ChunkVertex {
            x: (x & CHUNK_VERT_POS_MASK)
                | (y & CHUNK_VERT_POS_MASK) << CHUNK_VERT_POS_BITS
                | (normal as u32 & CHUNK_VERT_NORM_MASK) << (CHUNK_VERT_POS_BITS * 2),
            y: (z & CHUNK_VERT_POS_MASK)
                | (u & CHUNK_VERT_UV_MASK) << CHUNK_VERT_POS_BITS
                | (v & CHUNK_VERT_UV_MASK) << (CHUNK_VERT_POS_BITS + CHUNK_VERT_UV_BITS),
        }
    }

    pub const fn position(&self) -> [u32; 3] {
        [
            self.x & CHUNK_VERT_POS_MASK,
            (self.x >> CHUNK_VERT_POS_BITS) & CHUNK_VERT_POS_MASK,
            self.y & CHUNK_VERT_POS_MASK,
        ]
    }

    pub const fn normal(&self) -> u8 {
        ((self.x >> (CHUNK_VERT_POS_BITS * 2)) & CHUNK_VERT_NORM_MASK) as u8
    }

    pub const fn tex_coords(&self) -> [u32; 2] {
        [
            (self.y >> CHUNK_VERT_POS_BITS) & CHUNK_VERT_UV_MASK,
            (self.y >> (CHUNK_VERT_POS_BITS + CHUNK_VERT_UV_BITS)) & CHUNK_VERT_UV_MASK,
        ]
    }

    /// The two packed words, as uploaded.
    pub const fn words(&self) -> [u32; 2] {
        [self.x, self.y]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_layout() {
        let vertex = ChunkVertex::new(1, 2, 3, 5, 0, CHUNK_VERT_UV_MASK);

        assert_eq!(vertex.words(), [1 | 2 << 14 | 5 << 28, 3 | 511 << 23]);
        assert_eq!(vertex.position(), [1, 2, 3]);
        assert_eq!(vertex.normal(), 5);
        assert_eq!(vertex.tex_coords(), [0, 511]);
    }

    #[test]
    fn test_chunk_extent_fits() {
        let vertex = ChunkVertex::new(32, 32, 32, 7, 511, 511);

        assert_eq!(vertex.position(), [32, 32, 32]);
        assert_eq!(vertex.normal(), 7);
        assert_eq!(vertex.tex_coords(), [511, 511]);
        assert_eq!(std::mem::size_of::<ChunkVertex>(), 8);
        assert_eq!(bytemuck::bytes_of(&vertex).len(), 8);
    }
}
