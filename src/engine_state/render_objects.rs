//! # Render Objects
//!
//! The renderable-object side of the world core. Every chunk is paired with one
//! render object that carries its transform, its vertex buffer and index count,
//! and an enabled flag. The world drives objects through the [`RenderObjects`]
//! trait; [`RenderObjectState`] is the in-process implementation used by the
//! headless binary and the tests.

use std::collections::HashMap;

use cgmath::Point3;
use log::warn;

use super::buffer_state::BufferId;

/// Handle to a render object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderObjectId(pub u32);

/// A render-object system the world can attach chunk meshes to.
pub trait RenderObjects {
    /// Creates a disabled object with no mesh.
    fn create_object(&mut self) -> RenderObjectId;

    fn destroy_object(&mut self, object: RenderObjectId);

    /// Places the object's origin in world space.
    fn set_transform(&mut self, object: RenderObjectId, origin: Point3<f32>);

    /// Attaches a mesh, returning the vertex buffer it replaces.
    ///
    /// `vertex_buffer` is `None` for an empty mesh.
    fn attach_mesh(
        &mut self,
        object: RenderObjectId,
        vertex_buffer: Option<BufferId>,
        index_count: u32,
    ) -> Option<BufferId>;

    /// Removes the mesh, returning its vertex buffer for release.
    fn detach_mesh(&mut self, object: RenderObjectId) -> Option<BufferId>;

    fn set_enabled(&mut self, object: RenderObjectId, enabled: bool);
}

/// State of one render object.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderObject {
    pub origin: Point3<f32>,
    pub vertex_buffer: Option<BufferId>,
    pub index_count: u32,
    pub enabled: bool,
}

impl Default for RenderObject {
    fn default() -> Self {
        RenderObject {
            origin: Point3::new(0.0, 0.0, 0.0),
            vertex_buffer: None,
            index_count: 0,
            enabled: false,
        }
    }
}

/// Table of render objects kept in host memory.
#[derive(Debug, Default)]
pub struct RenderObjectState {
    objects: HashMap<RenderObjectId, RenderObject>,
    next_id: u32,
}

impl RenderObjectState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, object: RenderObjectId) -> Option<&RenderObject> {
        self.objects.get(&object)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Number of objects that would currently be drawn.
    pub fn enabled_count(&self) -> usize {
        self.objects.values().filter(|object| object.enabled).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RenderObjectId, &RenderObject)> {
        self.objects.iter()
    }

    fn object_mut(&mut self, object: RenderObjectId) -> Option<&mut RenderObject> {
        let found = self.objects.get_mut(&object);
        if found.is_none() {
            warn!("Unknown render object {:?}", object);
        }
        found
    }
}

impl RenderObjects for RenderObjectState {
    fn create_object(&mut self) -> RenderObjectId {
        let id = RenderObjectId(self.next_id);
        self.next_id += 1;
        self.objects.insert(id, RenderObject::default());
        id
    }

    fn destroy_object(&mut self, object: RenderObjectId) {
        if self.objects.remove(&object).is_none() {
            warn!("Destroying unknown render object {:?}", object);
        }
    }

    fn set_transform(&mut self, object: RenderObjectId, origin: Point3<f32>) {
        if let Some(object) = self.object_mut(object) {
            object.origin = origin;
        }
    }

    fn attach_mesh(
        &mut self,
        object: RenderObjectId,
        vertex_buffer: Option<BufferId>,
        index_count: u32,
    ) -> Option<BufferId> {
        let object = self.object_mut(object)?;
        object.index_count = index_count;
        std::mem::replace(&mut object.vertex_buffer, vertex_buffer)
    }

    fn detach_mesh(&mut self, object: RenderObjectId) -> Option<BufferId> {
        let object = self.object_mut(object)?;
        object.index_count = 0;
        object.vertex_buffer.take()
    }

    fn set_enabled(&mut self, object: RenderObjectId, enabled: bool) {
        if let Some(object) = self.object_mut(object) {
            object.enabled = enabled;
        }
    }
}
