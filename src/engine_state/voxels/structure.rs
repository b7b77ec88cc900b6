//! # Structure Module
//!
//! The sparse chunk container of one voxel world.
//!
//! ## Architecture
//!
//! Chunks live in slots of an arena and are referenced by [`ChunkId`]. The
//! structure maps each chunk hash (see [`coordinates`](super::chunk::coordinates))
//! to the slot holding it. Removing a chunk only unmaps it and pushes the slot on
//! a free-list; the next [`add_chunk`](Structure::add_chunk) refills that slot
//! instead of allocating another 64 KiB of voxels. Every slot keeps its render
//! object for its whole life, and a reverse index maps live render objects back
//! to their chunk.
//!
//! ## Performance Considerations
//!
//! - Lookup is one hash map probe
//! - [`remove_out_of_view`](Structure::remove_out_of_view) is a single pass over
//!   the live chunks, independent of the view volume

use std::collections::HashMap;

use bitvec::vec::BitVec;
use cgmath::Point3;
use log::trace;

use super::chunk::coordinates::{
    chunk_to_world_pos, distance2, hash_to_chunk_pos, is_chunk_pos_valid, try_pos_to_chunk_hash,
};
use super::chunk::{Chunk, ChunkState};
use super::cluster::Cluster;
use super::voxel::voxel_side::VoxelSide;
use super::voxel::Voxel;
use crate::engine_state::buffer_state::BufferId;
use crate::engine_state::render_objects::{RenderObjectId, RenderObjects};
use crate::error::StructureError;

/// Index of a chunk slot inside a [`Structure`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId(pub usize);

#[derive(Debug, Default)]
struct ChunkArena {
    slots: Vec<Chunk>,
    free_slots: Vec<ChunkId>,
    live_slots: BitVec,
    object_index: HashMap<RenderObjectId, ChunkId>,
    released_buffers: Vec<BufferId>,
}

impl ChunkArena {
    /// Returns a slot to the free-list and hides its render object.
    fn release(&mut self, id: ChunkId, objects: &mut impl RenderObjects) {
        debug_assert!(self.live_slots[id.0], "releasing free slot {id:?}");

        let chunk = &mut self.slots[id.0];
        chunk.state = ChunkState::Allocated;
        if let Some(object) = chunk.render_object {
            objects.set_enabled(object, false);
            self.released_buffers.extend(objects.detach_mesh(object));
            self.object_index.remove(&object);
        }

        trace!("Released chunk {:?} from slot {}", chunk.position, id.0);
        self.live_slots.set(id.0, false);
        self.free_slots.push(id);
    }
}

#[derive(Debug)]
pub struct Structure {
    id: u32,
    chunks: HashMap<u64, ChunkId>,
    arena: ChunkArena,
    recycled_count: usize,
}

impl Structure {
    pub fn new(id: u32) -> Self {
        Structure {
            id,
            chunks: HashMap::new(),
            arena: ChunkArena::default(),
            recycled_count: 0,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Number of live chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Number of chunk slots ever allocated.
    pub fn allocated_count(&self) -> usize {
        self.arena.slots.len()
    }

    /// Number of slots waiting on the free-list.
    pub fn free_count(&self) -> usize {
        self.arena.free_slots.len()
    }

    /// Number of adds served from the free-list.
    pub fn recycled_count(&self) -> usize {
        self.recycled_count
    }

    /// # Panics
    /// Panics if `id` was not handed out by this structure.
    pub fn chunk(&self, id: ChunkId) -> &Chunk {
        &self.arena.slots[id.0]
    }

    /// # Panics
    /// Panics if `id` was not handed out by this structure.
    pub fn chunk_mut(&mut self, id: ChunkId) -> &mut Chunk {
        &mut self.arena.slots[id.0]
    }

    pub fn chunk_id(&self, position: Point3<i32>) -> Option<ChunkId> {
        let hash = try_pos_to_chunk_hash(position).ok()?;
        self.chunks.get(&hash).copied()
    }

    /// The live chunk paired with a render object.
    pub fn chunk_for_object(&self, object: RenderObjectId) -> Option<ChunkId> {
        self.arena.object_index.get(&object).copied()
    }

    pub fn get_chunk(&self, position: Point3<i32>) -> Result<&Chunk, StructureError> {
        self.get_chunk_by_hash(try_pos_to_chunk_hash(position)?)
    }

    pub fn get_chunk_by_hash(&self, hash: u64) -> Result<&Chunk, StructureError> {
        self.chunks
            .get(&hash)
            .map(|id| &self.arena.slots[id.0])
            .ok_or(StructureError::ChunkMissing(hash_to_chunk_pos(hash)))
    }

    pub fn get_chunk_mut(&mut self, position: Point3<i32>) -> Result<&mut Chunk, StructureError> {
        let hash = try_pos_to_chunk_hash(position)?;
        match self.chunks.get(&hash) {
            Some(id) => Ok(&mut self.arena.slots[id.0]),
            None => Err(StructureError::ChunkMissing(position)),
        }
    }

    pub fn try_get_chunk(&self, position: Point3<i32>) -> Option<&Chunk> {
        self.chunk_id(position).map(|id| self.chunk(id))
    }

    pub fn try_get_chunk_mut(&mut self, position: Point3<i32>) -> Option<&mut Chunk> {
        self.chunk_id(position).map(|id| self.chunk_mut(id))
    }

    /// Adds a chunk filled with `voxel` in the Allocated state.
    ///
    /// A free-listed slot is reused when available. Otherwise a new slot is
    /// allocated together with a render object.
    ///
    /// # Errors
    /// Fails if the position is already present or cannot be hashed.
    pub fn add_chunk(
        &mut self,
        objects: &mut impl RenderObjects,
        position: Point3<i32>,
        voxel: Voxel,
    ) -> Result<ChunkId, StructureError> {
        let hash = try_pos_to_chunk_hash(position)?;
        if self.chunks.contains_key(&hash) {
            return Err(StructureError::ChunkExists(position));
        }

        let arena = &mut self.arena;
        let id = match arena.free_slots.pop() {
            Some(id) => {
                let chunk = &mut arena.slots[id.0];
                chunk.fill(voxel);
                chunk.position = position;
                chunk.state = ChunkState::Allocated;
                self.recycled_count += 1;
                id
            }
            None => {
                let id = ChunkId(arena.slots.len());
                let mut chunk = Chunk::new(voxel, position, self.id);
                chunk.render_object = Some(objects.create_object());
                arena.slots.push(chunk);
                arena.live_slots.push(false);
                id
            }
        };

        if let Some(object) = arena.slots[id.0].render_object {
            objects.set_transform(object, chunk_to_world_pos(position));
            arena.object_index.insert(object, id);
        }
        arena.live_slots.set(id.0, true);
        self.chunks.insert(hash, id);

        trace!("Added chunk {:?} in slot {}", position, id.0);
        Ok(id)
    }

    /// Returns the chunk at `position`, adding it first if needed.
    pub fn get_or_add_chunk(
        &mut self,
        objects: &mut impl RenderObjects,
        position: Point3<i32>,
        voxel: Voxel,
    ) -> Result<ChunkId, StructureError> {
        match self.chunk_id(position) {
            Some(id) => Ok(id),
            None => self.add_chunk(objects, position, voxel),
        }
    }

    /// Removes a chunk and free-lists its slot. Its render object is disabled
    /// and its vertex buffer queued in [`take_released_buffers`](Self::take_released_buffers).
    pub fn remove_chunk(
        &mut self,
        objects: &mut impl RenderObjects,
        position: Point3<i32>,
    ) -> Result<(), StructureError> {
        let hash = try_pos_to_chunk_hash(position)?;
        self.remove_chunk_by_hash(objects, hash)
    }

    pub fn remove_chunk_by_hash(
        &mut self,
        objects: &mut impl RenderObjects,
        hash: u64,
    ) -> Result<(), StructureError> {
        let id = self
            .chunks
            .remove(&hash)
            .ok_or(StructureError::ChunkMissing(hash_to_chunk_pos(hash)))?;
        self.arena.release(id, objects);
        Ok(())
    }

    /// Removes a chunk if present. Returns whether one was removed.
    pub fn try_remove_chunk(&mut self, objects: &mut impl RenderObjects, position: Point3<i32>) -> bool {
        self.remove_chunk(objects, position).is_ok()
    }

    /// Removes every chunk farther than `radius` chunks from `center`.
    ///
    /// Returns the number of chunks removed.
    pub fn remove_out_of_view(
        &mut self,
        objects: &mut impl RenderObjects,
        center: Point3<i32>,
        radius: u32,
    ) -> usize {
        let radius2 = radius as i64 * radius as i64;
        let arena = &mut self.arena;
        let before = self.chunks.len();

        self.chunks.retain(|&hash, &mut id| {
            if distance2(hash_to_chunk_pos(hash), center) <= radius2 {
                return true;
            }
            arena.release(id, objects);
            false
        });

        before - self.chunks.len()
    }

    /// Vertex buffers detached from removed chunks since the last call.
    pub fn take_released_buffers(&mut self) -> Vec<BufferId> {
        std::mem::take(&mut self.arena.released_buffers)
    }

    /// Whether `id` holds a live chunk rather than a free-listed slot.
    pub fn is_live(&self, id: ChunkId) -> bool {
        self.arena.live_slots.get(id.0).is_some_and(|live| *live)
    }

    /// Live chunks, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Chunk> + '_ {
        self.arena
            .live_slots
            .iter_ones()
            .map(move |slot| &self.arena.slots[slot])
    }

    /// Borrows the cluster centered at `position`, if all seven chunks exist.
    pub fn cluster(&self, position: Point3<i32>) -> Option<Cluster<'_>> {
        let get = |side: VoxelSide| self.try_get_chunk(position + side.offset());
        Some(Cluster::new(
            self.try_get_chunk(position)?,
            get(VoxelSide::NegX)?,
            get(VoxelSide::PosX)?,
            get(VoxelSide::NegY)?,
            get(VoxelSide::PosY)?,
            get(VoxelSide::NegZ)?,
            get(VoxelSide::PosZ)?,
        ))
    }

    /// Adds any missing face neighbors of `position` and returns every
    /// neighbor present afterwards.
    ///
    /// Neighbors outside the representable range are skipped, so at the edge
    /// of the world fewer than six ids come back.
    pub fn add_neighbors(
        &mut self,
        objects: &mut impl RenderObjects,
        position: Point3<i32>,
        voxel: Voxel,
    ) -> Vec<ChunkId> {
        VoxelSide::ALL
            .into_iter()
            .map(|side| position + side.offset())
            .filter(|&neighbor| is_chunk_pos_valid(neighbor))
            .filter_map(|neighbor| self.get_or_add_chunk(objects, neighbor, voxel).ok())
            .collect()
    }

    /// Removes every chunk and destroys all render objects.
    pub fn clear(&mut self, objects: &mut impl RenderObjects) -> Vec<BufferId> {
        let mut buffers = self.take_released_buffers();
        for chunk in self.arena.slots.drain(..) {
            if let Some(object) = chunk.render_object {
                buffers.extend(objects.detach_mesh(object));
                objects.destroy_object(object);
            }
        }
        self.chunks.clear();
        self.arena = ChunkArena::default();
        buffers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::chunk::coordinates::STRUCTURE_POS_MAX;
    use crate::engine_state::render_objects::RenderObjectState;
    use crate::engine_state::voxels::voxel::{DEBUG_VOXEL, NULL_VOXEL};
    use std::collections::HashSet;

    fn cube(radius: i32) -> impl Iterator<Item = Point3<i32>> {
        (-radius..=radius).flat_map(move |z| {
            (-radius..=radius).flat_map(move |y| (-radius..=radius).map(move |x| Point3::new(x, y, z)))
        })
    }

    #[test]
    fn test_add_and_get() {
        let mut objects = RenderObjectState::new();
        let mut structure = Structure::new(3);

        let id = structure.add_chunk(&mut objects, Point3::new(1, 2, -3), DEBUG_VOXEL).unwrap();
        let chunk = structure.get_chunk(Point3::new(1, 2, -3)).unwrap();

        assert_eq!(chunk.position, Point3::new(1, 2, -3));
        assert_eq!(chunk.structure_id, 3);
        assert_eq!(chunk.state, ChunkState::Allocated);
        assert_eq!(chunk.get(0, 0, 0), DEBUG_VOXEL);
        assert_eq!(structure.chunk_for_object(chunk.render_object.unwrap()), Some(id));
        assert_eq!(
            objects.get(chunk.render_object.unwrap()).unwrap().origin,
            Point3::new(32.0, 64.0, -96.0)
        );
    }

    #[test]
    fn test_contract_violations_are_errors() {
        let mut objects = RenderObjectState::new();
        let mut structure = Structure::new(0);
        let origin = Point3::new(0, 0, 0);
        let outside = Point3::new(STRUCTURE_POS_MAX + 1, 0, 0);

        structure.add_chunk(&mut objects, origin, NULL_VOXEL).unwrap();

        assert_eq!(
            structure.add_chunk(&mut objects, origin, NULL_VOXEL),
            Err(StructureError::ChunkExists(origin))
        );
        assert_eq!(
            structure.remove_chunk(&mut objects, Point3::new(0, 1, 0)),
            Err(StructureError::ChunkMissing(Point3::new(0, 1, 0)))
        );
        assert_eq!(
            structure.add_chunk(&mut objects, outside, NULL_VOXEL),
            Err(StructureError::OutOfBounds(outside))
        );
        assert!(structure.get_chunk(Point3::new(5, 5, 5)).is_err());
        assert!(structure.try_get_chunk(outside).is_none());
        assert!(!structure.try_remove_chunk(&mut objects, outside));
    }

    #[test]
    fn test_get_or_add_is_idempotent() {
        let mut objects = RenderObjectState::new();
        let mut structure = Structure::new(0);
        let position = Point3::new(-4, 0, 9);

        let first = structure.get_or_add_chunk(&mut objects, position, NULL_VOXEL).unwrap();
        let len = structure.len();
        let second = structure.get_or_add_chunk(&mut objects, position, DEBUG_VOXEL).unwrap();

        assert_eq!(first, second);
        assert_eq!(structure.len(), len);
        assert_eq!(structure.chunk(second).get(0, 0, 0), NULL_VOXEL);
        assert_eq!(objects.len(), 1);
    }

    #[test]
    fn test_remove_out_of_view_keeps_exact_sphere() {
        let mut objects = RenderObjectState::new();
        let mut structure = Structure::new(0);
        let center = Point3::new(1, 0, -1);

        for position in cube(3) {
            structure.add_chunk(&mut objects, position, NULL_VOXEL).unwrap();
        }
        let total = structure.len();

        let removed = structure.remove_out_of_view(&mut objects, center, 2);

        let expected: HashSet<Point3<i32>> =
            cube(3).filter(|p| distance2(*p, center) <= 4).collect();
        let kept: HashSet<Point3<i32>> = structure.iter().map(|chunk| chunk.position).collect();
        assert_eq!(kept, expected);
        assert_eq!(removed, total - expected.len());
        assert_eq!(structure.free_count(), removed);
    }

    #[test]
    fn test_removed_chunks_are_recycled() {
        let mut objects = RenderObjectState::new();
        let mut structure = Structure::new(0);
        let position = Point3::new(7, 7, 7);

        let id = structure.add_chunk(&mut objects, position, DEBUG_VOXEL).unwrap();
        let object = structure.chunk(id).render_object.unwrap();
        structure.chunk_mut(id).state = ChunkState::Meshed;
        objects.set_enabled(object, true);

        structure.remove_chunk(&mut objects, position).unwrap();
        assert!(!objects.get(object).unwrap().enabled);
        assert_eq!(structure.chunk_for_object(object), None);
        assert_eq!(structure.recycled_count(), 0);

        let again = structure.add_chunk(&mut objects, Point3::new(-1, 0, 0), NULL_VOXEL).unwrap();

        assert_eq!(again, id);
        assert_eq!(structure.recycled_count(), 1);
        assert_eq!(structure.allocated_count(), 1);
        assert_eq!(objects.len(), 1);

        let chunk = structure.chunk(again);
        assert_eq!(chunk.position, Point3::new(-1, 0, 0));
        assert_eq!(chunk.state, ChunkState::Allocated);
        assert!(chunk.is_empty);
        assert_eq!(chunk.get(3, 3, 3), NULL_VOXEL);
        assert_eq!(structure.chunk_for_object(object), Some(again));
        assert_eq!(objects.get(object).unwrap().origin, Point3::new(-32.0, 0.0, 0.0));
    }

    #[test]
    fn test_removal_releases_attached_buffers() {
        let mut objects = RenderObjectState::new();
        let mut structure = Structure::new(0);
        let id = structure.add_chunk(&mut objects, Point3::new(0, 0, 0), DEBUG_VOXEL).unwrap();
        let object = structure.chunk(id).render_object.unwrap();
        objects.attach_mesh(object, Some(BufferId(11)), 36);

        assert_eq!(structure.remove_out_of_view(&mut objects, Point3::new(5, 0, 0), 1), 1);
        assert_eq!(structure.take_released_buffers(), vec![BufferId(11)]);
        assert!(structure.take_released_buffers().is_empty());
    }

    #[test]
    fn test_cluster_needs_all_neighbors() {
        let mut objects = RenderObjectState::new();
        let mut structure = Structure::new(0);
        let center = Point3::new(0, 0, 0);

        structure.add_chunk(&mut objects, center, DEBUG_VOXEL).unwrap();
        assert!(structure.cluster(center).is_none());

        assert_eq!(structure.add_neighbors(&mut objects, center, NULL_VOXEL).len(), 6);
        let cluster = structure.cluster(center).unwrap();

        assert_eq!(cluster.px.position, Point3::new(1, 0, 0));
        assert_eq!(cluster.nz.position, Point3::new(0, 0, -1));
        assert_eq!(structure.len(), 7);
    }

    #[test]
    fn test_iter_skips_free_slots() {
        let mut objects = RenderObjectState::new();
        let mut structure = Structure::new(0);
        let ids: Vec<ChunkId> = (0..4)
            .map(|x| structure.add_chunk(&mut objects, Point3::new(x, 0, 0), NULL_VOXEL).unwrap())
            .collect();

        structure.remove_chunk(&mut objects, Point3::new(1, 0, 0)).unwrap();

        assert!(!structure.is_live(ids[1]));
        assert!(structure.is_live(ids[2]));
        assert!(!structure.is_live(ChunkId(99)));
        let xs: Vec<i32> = structure.iter().map(|chunk| chunk.position.x).collect();
        assert_eq!(xs, vec![0, 2, 3]);

        structure.add_chunk(&mut objects, Point3::new(9, 0, 0), NULL_VOXEL).unwrap();
        let xs: Vec<i32> = structure.iter().map(|chunk| chunk.position.x).collect();
        assert_eq!(xs, vec![0, 9, 2, 3]);
    }

    #[test]
    fn test_neighbors_at_world_edge_are_skipped() {
        let mut objects = RenderObjectState::new();
        let mut structure = Structure::new(0);
        let edge = Point3::new(STRUCTURE_POS_MAX, 0, 0);
        structure.add_chunk(&mut objects, edge, DEBUG_VOXEL).unwrap();

        let neighbors = structure.add_neighbors(&mut objects, edge, NULL_VOXEL);

        assert_eq!(neighbors.len(), 5);
        assert_eq!(structure.len(), 6);
        assert!(neighbors.iter().all(|&id| structure.chunk(id).position.x <= STRUCTURE_POS_MAX));
        assert!(structure.cluster(edge).is_none());

        // Calling again adds nothing new.
        assert_eq!(structure.add_neighbors(&mut objects, edge, NULL_VOXEL), neighbors);
        assert_eq!(structure.len(), 6);
    }

    #[test]
    fn test_clear_destroys_objects() {
        let mut objects = RenderObjectState::new();
        let mut structure = Structure::new(0);
        for position in cube(1) {
            structure.add_chunk(&mut objects, position, NULL_VOXEL).unwrap();
        }

        structure.clear(&mut objects);

        assert!(structure.is_empty());
        assert_eq!(structure.allocated_count(), 0);
        assert!(objects.is_empty());
    }
}
