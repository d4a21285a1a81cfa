/*!
Terrain configuration.

Both structs are plain immutable values: build them once (usually from `Default` plus a few
overrides), validate, and hand them to the sampler. Nothing merges partial configs at runtime.

Notes
- Distances are in meters.
- `horizontal_scale` is the spacing between adjacent heightmap samples along X and Z.
- `vertical_scale` multiplies the denormalized height, so 0 flattens the terrain.
*/

use crate::{
    constants::{DEFAULT_FRICTION, DEFAULT_NORMAL_SAMPLE_OFFSET, DEFAULT_RAYCAST_STEP},
    error::{Error, Result},
    terrain::material::{MaterialRegion, SurfaceMaterial},
    types::Vec2,
};

/// Sampler tuning that does not depend on the loaded heightmap.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SamplerConfig {
    /// Horizontal offset used for finite-difference normals (meters).
    pub normal_sample_offset: f32,
    /// Material reported where no registered region matches.
    pub default_material: SurfaceMaterial,
    /// Friction reported where no registered region matches.
    pub default_friction: f32,
    /// March step for terrain raycasts (meters).
    pub raycast_step: f32,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            normal_sample_offset: DEFAULT_NORMAL_SAMPLE_OFFSET,
            default_material: SurfaceMaterial::Snow,
            default_friction: DEFAULT_FRICTION,
            raycast_step: DEFAULT_RAYCAST_STEP,
        }
    }
}

impl SamplerConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.normal_sample_offset.is_finite() || self.normal_sample_offset <= 0.0 {
            return Err(Error::InvalidSamplerConfig(
                "normal_sample_offset must be finite and > 0",
            ));
        }
        if !self.default_friction.is_finite() || self.default_friction < 0.0 {
            return Err(Error::InvalidSamplerConfig(
                "default_friction must be finite and >= 0",
            ));
        }
        if !self.raycast_step.is_finite() || self.raycast_step <= 0.0 {
            return Err(Error::InvalidSamplerConfig(
                "raycast_step must be finite and > 0",
            ));
        }
        Ok(())
    }
}

/// Everything needed to build a procedural terrain and its material table.
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainConfig {
    /// Samples along X.
    pub width: usize,
    /// Samples along Z.
    pub depth: usize,
    pub seed: u32,
    pub min_height: f32,
    pub max_height: f32,
    pub horizontal_scale: Vec2,
    pub vertical_scale: f32,
    /// Material regions, registered in order.
    pub materials: Vec<MaterialRegion>,
    pub sampler: SamplerConfig,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            width: 129,
            depth: 129,
            seed: 42,
            min_height: 0.0,
            max_height: 60.0,
            horizontal_scale: Vec2::new(2.0, 2.0),
            vertical_scale: 1.0,
            materials: vec![MaterialRegion {
                material: SurfaceMaterial::Snow,
                friction: SurfaceMaterial::Snow.typical_friction(),
                region: None,
            }],
            sampler: SamplerConfig::default(),
        }
    }
}
