//! # Voxel Registry
//!
//! Append-only table of voxel type data, indexed by [`Voxel`] id.
//!
//! The first three slots are reserved for [`NULL_VOXEL`], [`UNKNOWN_VOXEL`] and
//! [`DEBUG_VOXEL`]. Once [`finalize`](VoxelRegistry::finalize) is called the
//! table is read-only and can be shared with worker threads behind an `Arc`.

use log::{info, trace};

use super::{DrawMode, Voxel, VoxelData, DEBUG_VOXEL, NULL_VOXEL, UNKNOWN_VOXEL};
use crate::error::RegistryError;

/// Number of distinct voxel ids.
pub const MAX_VOXEL_TYPES: usize = Voxel::MAX as usize + 1;

#[derive(Debug, Clone)]
pub struct VoxelRegistry {
    voxels: Vec<VoxelData>,
    finalized: bool,
}

impl Default for VoxelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl VoxelRegistry {
    /// Creates a registry holding only the reserved types.
    pub fn new() -> Self {
        let reserved = [
            (NULL_VOXEL, VoxelData::new(DrawMode::Transparent, 0)),
            (UNKNOWN_VOXEL, VoxelData::new(DrawMode::Opaque, 1)),
            (DEBUG_VOXEL, VoxelData::new(DrawMode::Opaque, 2)),
        ];

        let voxels = reserved
            .into_iter()
            .map(|(id, data)| VoxelData { id, ..data })
            .collect();

        VoxelRegistry {
            voxels,
            finalized: false,
        }
    }

    /// Appends a voxel type and returns its id.
    ///
    /// # Errors
    /// Fails once the registry is finalized or every id is taken.
    pub fn register_voxel(&mut self, data: VoxelData) -> Result<Voxel, RegistryError> {
        if self.finalized {
            return Err(RegistryError::Finalized);
        }
        if self.voxels.len() >= MAX_VOXEL_TYPES {
            return Err(RegistryError::Full(self.voxels.len()));
        }

        let id = self.voxels.len() as Voxel;
        self.voxels.push(VoxelData { id, ..data });
        trace!("Registered voxel {} ({:?})", id, data.draw_mode);
        Ok(id)
    }

    /// Registers every entry of a JSON array of voxel definitions, in order.
    ///
    /// Registration is all or nothing: on error the registry is unchanged.
    ///
    /// ```
    /// use voxel_world::voxels::voxel::{registry::VoxelRegistry, DrawMode};
    ///
    /// let mut registry = VoxelRegistry::new();
    /// let ids = registry
    ///     .register_json(r#"[{"texture_id": 3}, {"draw_mode": "translucent", "texture_id": 4}]"#)
    ///     .unwrap();
    ///
    /// assert_eq!(ids, vec![3, 4]);
    /// assert_eq!(registry.get_voxel_data(4).draw_mode, DrawMode::Translucent);
    /// ```
    pub fn register_json(&mut self, json: &str) -> Result<Vec<Voxel>, RegistryError> {
        let definitions: Vec<VoxelData> = serde_json::from_str(json)?;
        if self.finalized {
            return Err(RegistryError::Finalized);
        }
        if self.voxels.len() + definitions.len() > MAX_VOXEL_TYPES {
            return Err(RegistryError::Full(self.voxels.len()));
        }

        definitions
            .into_iter()
            .map(|data| self.register_voxel(data))
            .collect()
    }

    /// Makes the registry read-only. Calling it again has no effect.
    pub fn finalize(&mut self) {
        if !self.finalized {
            info!("Voxel registry finalized with {} types", self.voxels.len());
        }
        self.finalized = true;
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    /// Always false: the reserved types are present from construction.
    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    /// Looks up a voxel type. Unknown ids resolve to [`UNKNOWN_VOXEL`]'s data.
    #[inline]
    pub fn get_voxel_data(&self, voxel: Voxel) -> &VoxelData {
        self.voxels
            .get(voxel as usize)
            .unwrap_or(&self.voxels[UNKNOWN_VOXEL as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_types() {
        let registry = VoxelRegistry::new();

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get_voxel_data(NULL_VOXEL).draw_mode, DrawMode::Transparent);
        assert_eq!(registry.get_voxel_data(UNKNOWN_VOXEL).draw_mode, DrawMode::Opaque);
        assert_eq!(registry.get_voxel_data(DEBUG_VOXEL).draw_mode, DrawMode::Opaque);
        assert_eq!(registry.get_voxel_data(DEBUG_VOXEL).id, DEBUG_VOXEL);
    }

    #[test]
    fn test_register_returns_sequential_ids() {
        let mut registry = VoxelRegistry::new();

        let stone = registry.register_voxel(VoxelData::new(DrawMode::Opaque, 10)).unwrap();
        let glass = registry.register_voxel(VoxelData::new(DrawMode::Translucent, 11)).unwrap();

        assert_eq!((stone, glass), (3, 4));
        assert_eq!(registry.get_voxel_data(glass).id, glass);
        assert_eq!(registry.get_voxel_data(glass).texture_id, 11);
    }

    #[test]
    fn test_register_after_finalize_fails() {
        let mut registry = VoxelRegistry::new();
        registry.finalize();
        registry.finalize();

        assert!(registry.is_finalized());
        assert!(matches!(
            registry.register_voxel(VoxelData::new(DrawMode::Opaque, 0)),
            Err(RegistryError::Finalized)
        ));
    }

    #[test]
    fn test_out_of_range_lookup_returns_unknown() {
        let registry = VoxelRegistry::new();

        assert_eq!(registry.get_voxel_data(3).id, UNKNOWN_VOXEL);
        assert_eq!(registry.get_voxel_data(Voxel::MAX).id, UNKNOWN_VOXEL);
    }

    #[test]
    fn test_registry_fills_every_id() {
        let mut registry = VoxelRegistry::new();
        let data = VoxelData::new(DrawMode::Opaque, 0);

        for _ in registry.len()..MAX_VOXEL_TYPES {
            registry.register_voxel(data).unwrap();
        }

        assert_eq!(registry.get_voxel_data(Voxel::MAX).id, Voxel::MAX);
        assert!(matches!(registry.register_voxel(data), Err(RegistryError::Full(_))));
    }

    #[test]
    fn test_json_batch_that_overflows_registers_nothing() {
        let mut registry = VoxelRegistry::new();
        let data = VoxelData::new(DrawMode::Opaque, 0);
        for _ in registry.len()..MAX_VOXEL_TYPES - 1 {
            registry.register_voxel(data).unwrap();
        }

        assert!(matches!(
            registry.register_json(r#"[{"texture_id": 1}, {"texture_id": 2}]"#),
            Err(RegistryError::Full(_))
        ));
        assert_eq!(registry.len(), MAX_VOXEL_TYPES - 1);

        assert_eq!(registry.register_json(r#"[{"texture_id": 1}]"#).unwrap(), vec![Voxel::MAX]);
        registry.finalize();
        assert!(matches!(registry.register_json("[]"), Err(RegistryError::Finalized)));
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        let mut registry = VoxelRegistry::new();

        assert!(matches!(
            registry.register_json(r#"[{"draw_mode": "glowing"}]"#),
            Err(RegistryError::Parse(_))
        ));
        assert_eq!(registry.len(), 3);
    }
}
