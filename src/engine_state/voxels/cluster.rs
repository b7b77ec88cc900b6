//! # Cluster Module
//!
//! A center chunk bound to its six face neighbors. Clusters decide whether a
//! chunk can be meshed and compute per-cell face visibility across chunk
//! borders.
//!
//! [`Cluster`] borrows chunks from a structure and only lives for one query.
//! [`ClusterCopy`] owns deep copies of all seven chunks so a mesh task can run
//! while the originals keep changing on the main thread.

use super::chunk::{Chunk, ChunkState, CHUNK_LENGTH};
use super::voxel::registry::VoxelRegistry;
use super::voxel::voxel_side::VoxelSide;
use super::voxel::DrawMode;

const LAST: usize = CHUNK_LENGTH - 1;

/// Borrowed view of a chunk and its six face neighbors.
#[derive(Clone, Copy, Debug)]
pub struct Cluster<'a> {
    pub c: &'a Chunk,
    pub nx: &'a Chunk,
    pub px: &'a Chunk,
    pub ny: &'a Chunk,
    pub py: &'a Chunk,
    pub nz: &'a Chunk,
    pub pz: &'a Chunk,
}

impl<'a> Cluster<'a> {
    pub fn new(
        c: &'a Chunk,
        nx: &'a Chunk,
        px: &'a Chunk,
        ny: &'a Chunk,
        py: &'a Chunk,
        nz: &'a Chunk,
        pz: &'a Chunk,
    ) -> Self {
        Cluster { c, nx, px, ny, py, nz, pz }
    }

    pub fn neighbors(&self) -> [&'a Chunk; 6] {
        [self.nx, self.px, self.ny, self.py, self.nz, self.pz]
    }

    /// True once every neighbor has valid content.
    pub fn is_meshing_ready(&self) -> bool {
        self.neighbors()
            .iter()
            .all(|chunk| chunk.state >= ChunkState::Generated)
    }

    /// Face-visibility mask of the center chunk's cell at `(x, y, z)`.
    ///
    /// Bit `side.mask_bit()` is set when that face must be drawn. Cells on the
    /// chunk border compare against the adjacent cell of the neighbor chunk.
    /// Transparent cells have no faces.
    pub fn near_mask(&self, x: usize, y: usize, z: usize, registry: &VoxelRegistry) -> u8 {
        let data = registry.get_voxel_data(self.c.get(x, y, z));
        if data.draw_mode == DrawMode::Transparent {
            return 0;
        }

        let near = [
            if x > 0 { self.c.get(x - 1, y, z) } else { self.nx.get(LAST, y, z) },
            if z > 0 { self.c.get(x, y, z - 1) } else { self.nz.get(x, y, LAST) },
            if y > 0 { self.c.get(x, y - 1, z) } else { self.ny.get(x, LAST, z) },
            if x < LAST { self.c.get(x + 1, y, z) } else { self.px.get(0, y, z) },
            if z < LAST { self.c.get(x, y, z + 1) } else { self.pz.get(x, y, 0) },
            if y < LAST { self.c.get(x, y + 1, z) } else { self.py.get(x, 0, z) },
        ];

        VoxelSide::ALL
            .iter()
            .zip(near)
            .fold(0, |mask, (side, voxel)| {
                if data.should_draw(registry.get_voxel_data(voxel)) {
                    mask | side.mask_bit()
                } else {
                    mask
                }
            })
    }

    /// Deep-copies all seven chunks.
    pub fn deep_copy(&self) -> ClusterCopy {
        ClusterCopy {
            chunks: [
                self.c.clone(),
                self.nx.clone(),
                self.px.clone(),
                self.ny.clone(),
                self.py.clone(),
                self.nz.clone(),
                self.pz.clone(),
            ],
        }
    }
}

/// Owned copy of a cluster, safe to move to a worker thread.
#[derive(Clone, Debug)]
pub struct ClusterCopy {
    chunks: [Chunk; 7],
}

impl ClusterCopy {
    pub fn center(&self) -> &Chunk {
        &self.chunks[0]
    }

    pub fn as_cluster(&self) -> Cluster<'_> {
        let [c, nx, px, ny, py, nz, pz] = &self.chunks;
        Cluster::new(c, nx, px, ny, py, nz, pz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::voxel::{DEBUG_VOXEL, NULL_VOXEL};
    use cgmath::Point3;

    fn chunk(voxel: u16, state: ChunkState) -> Chunk {
        let mut chunk = Chunk::new(voxel, Point3::new(0, 0, 0), 0);
        chunk.state = state;
        chunk
    }

    fn copy_with(center: Chunk, neighbor: Chunk) -> ClusterCopy {
        Cluster::new(
            &center, &neighbor, &neighbor, &neighbor, &neighbor, &neighbor, &neighbor,
        )
        .deep_copy()
    }

    #[test]
    fn test_meshing_ready_requires_generated_neighbors() {
        let center = chunk(DEBUG_VOXEL, ChunkState::Generated);
        let ready = chunk(NULL_VOXEL, ChunkState::Meshed);
        let pending = chunk(NULL_VOXEL, ChunkState::Generating);

        let cluster = Cluster::new(&center, &ready, &ready, &ready, &ready, &ready, &ready);
        assert!(cluster.is_meshing_ready());

        let cluster = Cluster::new(&center, &ready, &ready, &ready, &pending, &ready, &ready);
        assert!(!cluster.is_meshing_ready());
    }

    #[test]
    fn test_isolated_solid_cell_shows_every_face() {
        let registry = VoxelRegistry::new();
        let mut center = chunk(NULL_VOXEL, ChunkState::Generated);
        center.set(10, 11, 12, DEBUG_VOXEL);
        let copy = copy_with(center, chunk(NULL_VOXEL, ChunkState::Generated));

        assert_eq!(copy.as_cluster().near_mask(10, 11, 12, &registry), 0b11_1111);
        assert_eq!(copy.as_cluster().near_mask(0, 0, 0, &registry), 0);
    }

    #[test]
    fn test_border_cells_read_neighbor_chunks() {
        let registry = VoxelRegistry::new();
        let center = chunk(DEBUG_VOXEL, ChunkState::Generated);
        let copy = copy_with(center, chunk(NULL_VOXEL, ChunkState::Generated));
        let cluster = copy.as_cluster();

        assert_eq!(cluster.near_mask(5, 5, 5, &registry), 0);
        assert_eq!(cluster.near_mask(0, 5, 5, &registry), VoxelSide::NegX.mask_bit());
        assert_eq!(cluster.near_mask(LAST, 5, 5, &registry), VoxelSide::PosX.mask_bit());
        assert_eq!(cluster.near_mask(5, 0, 5, &registry), VoxelSide::NegY.mask_bit());
        assert_eq!(cluster.near_mask(5, LAST, 5, &registry), VoxelSide::PosY.mask_bit());
        assert_eq!(cluster.near_mask(5, 5, 0, &registry), VoxelSide::NegZ.mask_bit());
        assert_eq!(cluster.near_mask(5, 5, LAST, &registry), VoxelSide::PosZ.mask_bit());
        assert_eq!(
            cluster.near_mask(0, 0, 0, &registry),
            VoxelSide::NegX.mask_bit() | VoxelSide::NegY.mask_bit() | VoxelSide::NegZ.mask_bit()
        );
    }

    #[test]
    fn test_solid_neighbors_hide_border_faces() {
        let registry = VoxelRegistry::new();
        let copy = copy_with(
            chunk(DEBUG_VOXEL, ChunkState::Generated),
            chunk(DEBUG_VOXEL, ChunkState::Generated),
        );

        assert_eq!(copy.as_cluster().near_mask(0, LAST, 0, &registry), 0);
        assert_eq!(copy.center().get(0, 0, 0), DEBUG_VOXEL);
    }
}
