//! Finished chunk meshes and the shared quad index buffer.

use cgmath::Point3;

use super::sides::{QUAD_INDEX_COUNT, QUAD_VERTEX_COUNT};
use crate::engine_state::buffer_state::{BufferId, BufferUsage, GpuBuffers};
use crate::engine_state::rendering::vertex::ChunkVertex;

/// Vertex data produced for one chunk, waiting to be uploaded.
#[derive(Debug, Clone)]
pub struct ChunkMesh {
    /// Chunk position of the meshed chunk.
    pub position: Point3<i32>,
    pub structure_id: u32,
    vertices: Vec<ChunkVertex>,
}

impl ChunkMesh {
    pub fn new(position: Point3<i32>, structure_id: u32, vertices: Vec<ChunkVertex>) -> Self {
        ChunkMesh {
            position,
            structure_id,
            vertices,
        }
    }

    pub fn vertices(&self) -> &[ChunkVertex] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    /// Indices needed to draw every quad of this mesh.
    pub fn index_count(&self) -> u32 {
        index_count_for(self.vertex_count())
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Uploads the vertices into a new vertex buffer.
    ///
    /// The data goes through a staging buffer which is destroyed once the copy
    /// is recorded. Empty meshes allocate nothing and return `None`.
    pub fn upload(&self, gpu: &mut impl GpuBuffers) -> Option<BufferId> {
        if self.vertices.is_empty() {
            return None;
        }

        let bytes: &[u8] = bytemuck::cast_slice(&self.vertices);
        let size = bytes.len() as u64;

        let staging = gpu.create_buffer(BufferUsage::Staging, size);
        gpu.write_buffer(staging, 0, bytes);
        gpu.flush_buffer(staging);

        let vertex_buffer = gpu.create_buffer(BufferUsage::Vertex, size);
        gpu.copy_buffer(staging, vertex_buffer, size);
        gpu.destroy_buffer(staging);

        Some(vertex_buffer)
    }
}

/// Number of indices drawing `vertex_count` quad vertices.
pub const fn index_count_for(vertex_count: u32) -> u32 {
    vertex_count / QUAD_VERTEX_COUNT as u32 * QUAD_INDEX_COUNT as u32
}

/// Element type of the shared index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    U16,
    U32,
}

impl IndexType {
    /// Narrowest type able to address the vertices behind `index_count` indices.
    pub fn for_count(index_count: u32) -> Self {
        if index_count <= u16::MAX as u32 {
            IndexType::U16
        } else {
            IndexType::U32
        }
    }

    pub const fn size(self) -> u64 {
        match self {
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}

/// Quad indices in their upload type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuadIndices {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl QuadIndices {
    /// Builds `index_count` indices, two triangles per quad:
    /// `j, j+1, j+2, j+2, j+3, j` for each quad starting at vertex `j`.
    pub fn generate(index_count: u32) -> Self {
        let quads = index_count as usize / QUAD_INDEX_COUNT;
        match IndexType::for_count(index_count) {
            IndexType::U16 => QuadIndices::U16(quad_pattern(quads, |i| i as u16)),
            IndexType::U32 => QuadIndices::U32(quad_pattern(quads, |i| i)),
        }
    }

    pub fn index_type(&self) -> IndexType {
        match self {
            QuadIndices::U16(_) => IndexType::U16,
            QuadIndices::U32(_) => IndexType::U32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            QuadIndices::U16(indices) => indices.len(),
            QuadIndices::U32(indices) => indices.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            QuadIndices::U16(indices) => bytemuck::cast_slice(indices),
            QuadIndices::U32(indices) => bytemuck::cast_slice(indices),
        }
    }
}

fn quad_pattern<T>(quads: usize, convert: impl Fn(u32) -> T) -> Vec<T> {
    let mut indices = Vec::with_capacity(quads * QUAD_INDEX_COUNT);
    for quad in 0..quads as u32 {
        let j = quad * QUAD_VERTEX_COUNT as u32;
        indices.extend([j, j + 1, j + 2, j + 2, j + 3, j].map(&convert));
    }
    indices
}

/// The index buffer every chunk mesh is drawn with.
#[derive(Debug)]
pub struct SharedIndexBuffer {
    buffer: BufferId,
    index_count: u32,
    index_type: IndexType,
}

impl SharedIndexBuffer {
    /// Creates and fills a buffer holding `index_count` indices.
    pub fn new(gpu: &mut impl GpuBuffers, index_count: u32) -> Self {
        let indices = QuadIndices::generate(index_count);
        let bytes = indices.as_bytes();

        let buffer = gpu.create_buffer(BufferUsage::Index, bytes.len() as u64);
        gpu.write_buffer(buffer, 0, bytes);
        gpu.flush_buffer(buffer);

        SharedIndexBuffer {
            buffer,
            index_count,
            index_type: indices.index_type(),
        }
    }

    pub fn buffer(&self) -> BufferId {
        self.buffer
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    /// Replaces the buffer with one holding `index_count` indices if the
    /// current one is smaller. Returns true when it grew.
    pub fn grow_to(&mut self, gpu: &mut impl GpuBuffers, index_count: u32) -> bool {
        if index_count <= self.index_count {
            return false;
        }
        gpu.destroy_buffer(self.buffer);
        *self = SharedIndexBuffer::new(gpu, index_count);
        true
    }

    pub fn destroy(self, gpu: &mut impl GpuBuffers) {
        gpu.destroy_buffer(self.buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::buffer_state::BufferState;

    #[test]
    fn test_quad_pattern() {
        let QuadIndices::U16(indices) = QuadIndices::generate(12) else {
            panic!("small counts use 16-bit indices");
        };
        assert_eq!(indices, vec![0, 1, 2, 2, 3, 0, 4, 5, 6, 6, 7, 4]);
    }

    #[test]
    fn test_index_type_threshold() {
        assert_eq!(IndexType::for_count(u16::MAX as u32), IndexType::U16);
        assert_eq!(IndexType::for_count(u16::MAX as u32 + 1), IndexType::U32);

        let indices = QuadIndices::generate(36 * 32 * 32 * 2);
        assert_eq!(indices.index_type(), IndexType::U32);
        assert_eq!(indices.as_bytes().len(), indices.len() * 4);
    }

    #[test]
    fn test_index_count_for_vertices() {
        assert_eq!(index_count_for(0), 0);
        assert_eq!(index_count_for(24), 36);
        assert_eq!(index_count_for(4), 6);
    }

    #[test]
    fn test_upload_releases_staging() {
        let mut gpu = BufferState::new();
        let mesh = ChunkMesh::new(
            Point3::new(0, 0, 0),
            0,
            vec![ChunkVertex::new(1, 2, 3, 0, 0, 0); 4],
        );

        let vertex_buffer = mesh.upload(&mut gpu).unwrap();

        assert_eq!(gpu.live_buffers(), 1);
        assert_eq!(gpu.usage(vertex_buffer), Some(BufferUsage::Vertex));
        assert_eq!(
            gpu.contents(vertex_buffer),
            Some(bytemuck::cast_slice::<ChunkVertex, u8>(mesh.vertices()))
        );
        assert_eq!(gpu.total_created(), 2);
    }

    #[test]
    fn test_empty_mesh_uploads_nothing() {
        let mut gpu = BufferState::new();
        let mesh = ChunkMesh::new(Point3::new(0, 0, 0), 0, Vec::new());

        assert_eq!(mesh.upload(&mut gpu), None);
        assert_eq!(gpu.total_created(), 0);
    }

    #[test]
    fn test_shared_index_buffer_grows() {
        let mut gpu = BufferState::new();
        let mut indices = SharedIndexBuffer::new(&mut gpu, 36);
        let first = indices.buffer();

        assert!(!indices.grow_to(&mut gpu, 12));
        assert!(indices.grow_to(&mut gpu, 72));

        assert_ne!(indices.buffer(), first);
        assert_eq!(indices.index_count(), 72);
        assert_eq!(gpu.live_buffers_with(BufferUsage::Index), 1);
        assert_eq!(gpu.contents(indices.buffer()).map(<[u8]>::len), Some(72 * 2));
    }
}
