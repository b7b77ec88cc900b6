//! Error types returned by the world core.

use cgmath::Point3;
use thiserror::Error;

/// Failures while populating the voxel registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The registry was finalized and is read-only.
    #[error("voxel registry is finalized")]
    Finalized,
    /// Every voxel id is taken.
    #[error("voxel registry is full ({0} types)")]
    Full(usize),
    /// A JSON voxel definition list could not be parsed.
    #[error("invalid voxel definitions: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Contract violations on a [`Structure`](crate::Structure).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StructureError {
    #[error("chunk at {0:?} already exists")]
    ChunkExists(Point3<i32>),
    #[error("no chunk at {0:?}")]
    ChunkMissing(Point3<i32>),
    #[error("chunk position {0:?} is outside the structure bounds")]
    OutOfBounds(Point3<i32>),
}

/// Failures while loading a [`WorldConfig`](crate::WorldConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Failures while starting a [`World`](crate::World).
#[derive(Debug, Error)]
pub enum WorldError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to start worker threads: {0}")]
    Workers(#[from] std::io::Error),
}
