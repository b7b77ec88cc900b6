//! World configuration, loadable from JSON.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::thread;

use cgmath::Point3;
use serde::{Deserialize, Serialize};

use crate::engine_state::voxels::chunk::coordinates::{STRUCTURE_POS_MAX, STRUCTURE_POS_MIN};
use crate::engine_state::voxels::chunk::CHUNK_LENGTH;
use crate::engine_state::voxels::generation::{GenType, TerrainConfig};
use crate::error::ConfigError;

/// Default view radius, in chunks.
pub const DEFAULT_VIEW_RADIUS: u32 = 8;
/// Largest accepted view radius. The scan visits about `4/3 π r³` chunks per frame.
pub const MAX_VIEW_RADIUS: u32 = 64;

/// Parameters of a streamed world.
///
/// Every field has a default, so a JSON file only needs the fields it changes:
///
/// ```
/// use voxel_world::{GenType, WorldConfig};
///
/// let config = WorldConfig::from_json_str(r#"{ "view_radius": 4, "gen_type": "terrain" }"#).unwrap();
/// assert_eq!(config.view_radius, 4);
/// assert_eq!(config.gen_type, GenType::Terrain);
/// assert_eq!(config.seed, 0);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Radius of the streamed sphere, in chunks.
    pub view_radius: u32,
    /// Lowest viewer position, in world units.
    pub min_border: [f32; 3],
    /// Highest viewer position, in world units.
    pub max_border: [f32; 3],
    /// Background threads for generation and meshing. Zero runs tasks inline.
    pub worker_count: usize,
    pub gen_type: GenType,
    pub seed: u32,
    pub terrain: TerrainConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        let length = CHUNK_LENGTH as f32;
        let min = STRUCTURE_POS_MIN as f32 * length;
        let max = STRUCTURE_POS_MAX as f32 * length;

        WorldConfig {
            view_radius: DEFAULT_VIEW_RADIUS,
            min_border: [min; 3],
            max_border: [max; 3],
            worker_count: default_worker_count(),
            gen_type: GenType::default(),
            seed: 0,
            terrain: TerrainConfig::default(),
        }
    }
}

/// One worker per core, leaving one for the main thread.
fn default_worker_count() -> usize {
    thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1))
        .unwrap_or(1)
        .max(1)
}

impl WorldConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: WorldConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let reader = BufReader::new(File::open(path)?);
        let config: WorldConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the values serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_VIEW_RADIUS).contains(&self.view_radius) {
            return Err(ConfigError::Invalid(format!(
                "view_radius {} is outside 1..={}",
                self.view_radius, MAX_VIEW_RADIUS
            )));
        }
        if self
            .min_border
            .iter()
            .zip(&self.max_border)
            .any(|(min, max)| !(min <= max))
        {
            return Err(ConfigError::Invalid(format!(
                "min_border {:?} exceeds max_border {:?}",
                self.min_border, self.max_border
            )));
        }
        if !(0.0..=1.0).contains(&self.terrain.sprinkle_chance) {
            return Err(ConfigError::Invalid(format!(
                "terrain.sprinkle_chance {} is not a probability",
                self.terrain.sprinkle_chance
            )));
        }
        Ok(())
    }

    pub fn min_border(&self) -> Point3<f32> {
        Point3::from(self.min_border)
    }

    pub fn max_border(&self) -> Point3<f32> {
        Point3::from(self.max_border)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = WorldConfig::default();

        assert_eq!(config.view_radius, 8);
        assert_eq!(config.gen_type, GenType::DebugSphere);
        assert!(config.worker_count >= 1);
        assert_eq!(config.min_border[0], -33_554_432.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config = WorldConfig::from_json_str(
            r#"{ "seed": 9, "worker_count": 0, "terrain": { "amplitude": 2.5 } }"#,
        )
        .unwrap();

        assert_eq!(config.seed, 9);
        assert_eq!(config.worker_count, 0);
        assert_eq!(config.terrain.amplitude, 2.5);
        assert_eq!(config.terrain.soil_depth, TerrainConfig::default().soil_depth);
        assert_eq!(config.view_radius, DEFAULT_VIEW_RADIUS);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            WorldConfig::from_json_str(r#"{ "view_radius": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            WorldConfig::from_json_str(r#"{ "view_radius": 50000 }"#),
            Err(ConfigError::Invalid(_))
        ));
        for view_radius in [MAX_VIEW_RADIUS + 1, i32::MAX as u32 + 1, u32::MAX] {
            let config = WorldConfig { view_radius, ..WorldConfig::default() };
            assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        }
        let config = WorldConfig { view_radius: MAX_VIEW_RADIUS, ..WorldConfig::default() };
        assert!(config.validate().is_ok());
        assert!(matches!(
            WorldConfig::from_json_str(r#"{ "min_border": [10, 0, 0], "max_border": [0, 0, 0] }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            WorldConfig::from_json_str(r#"{ "gen_type": "caves" }"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_file_round_trip() {
        let config = WorldConfig {
            view_radius: 3,
            gen_type: GenType::Empty,
            ..WorldConfig::default()
        };
        let path = std::env::temp_dir().join(format!("voxel-world-config-{}.json", std::process::id()));
        File::create(&path)
            .unwrap()
            .write_all(serde_json::to_string(&config).unwrap().as_bytes())
            .unwrap();

        let loaded = WorldConfig::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded, config);
        assert!(matches!(
            WorldConfig::from_json_file(&path),
            Err(ConfigError::Io(_))
        ));
    }
}
