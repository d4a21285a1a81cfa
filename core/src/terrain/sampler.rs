use crate::{
    error::Result,
    terrain::{
        config::{SamplerConfig, TerrainConfig},
        heightmap::{HeightmapData, HeightmapStore, generate_procedural},
        material::{MaterialTable, RegionRect, SurfaceMaterial},
    },
    types::{Aabb, Point3, Vec2, Vec3, up},
};

/// Terrain facts at one XZ position. Computed per query and never stored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainSurfaceInfo {
    /// `false` when there is no heightmap or the point is outside it.
    pub exists: bool,
    /// World-space Y of the surface.
    pub height: f32,
    /// Unit surface normal.
    pub normal: Vec3,
    /// Unsigned angle between `normal` and world-up (radians).
    pub slope: f32,
    pub friction: f32,
    pub material: SurfaceMaterial,
}

impl TerrainSurfaceInfo {
    /// The "no terrain here" value.
    pub fn missing() -> Self {
        Self {
            exists: false,
            height: 0.0,
            normal: up(),
            slope: 0.0,
            friction: 0.0,
            material: SurfaceMaterial::default(),
        }
    }
}

/// Answers world-space terrain queries against the loaded heightmap.
///
/// Every query degrades to "no terrain" (`None` / `exists: false`) when no heightmap is loaded
/// or the point lies outside the heightmap footprint; nothing here panics on bad positions.
#[derive(Clone, Debug)]
pub struct TerrainSampler {
    store: HeightmapStore,
    materials: MaterialTable,
    config: SamplerConfig,
}

impl TerrainSampler {
    /// Create a sampler with no terrain loaded.
    pub fn new(config: SamplerConfig) -> Result<Self> {
        config
            .validate()
            .inspect_err(|e| log::warn!("rejecting sampler config: {e}"))?;
        Ok(Self {
            store: HeightmapStore::new(),
            materials: MaterialTable::new(config.default_material, config.default_friction),
            config,
        })
    }

    /// Generate a procedural heightmap and register the configured materials.
    pub fn from_config(config: &TerrainConfig) -> Result<Self> {
        let mut sampler = Self::new(config.sampler)?;
        let data = generate_procedural(
            config.width,
            config.depth,
            config.seed,
            config.min_height,
            config.max_height,
            config.horizontal_scale,
            config.vertical_scale,
        )?;
        sampler.load_heightmap(data);

        for entry in &config.materials {
            sampler.add_material_region(entry.material, entry.friction, entry.region)?;
        }

        Ok(sampler)
    }

    #[inline]
    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Install `data` as the active terrain, returning the previous heightmap.
    pub fn load_heightmap(&mut self, data: HeightmapData) -> Option<HeightmapData> {
        self.store.load(data)
    }

    pub fn unload_heightmap(&mut self) -> Option<HeightmapData> {
        self.store.unload()
    }

    #[inline]
    pub fn has_terrain(&self) -> bool {
        self.store.is_loaded()
    }

    #[inline]
    pub fn heightmap(&self) -> Option<&HeightmapData> {
        self.store.data()
    }

    #[inline]
    pub fn materials(&self) -> &MaterialTable {
        &self.materials
    }

    /// Register a material region; see [`MaterialTable::add`].
    pub fn add_material_region(
        &mut self,
        material: SurfaceMaterial,
        friction: f32,
        region: Option<RegionRect>,
    ) -> Result<()> {
        self.materials.add(material, friction, region)
    }

    pub fn remove_all_regions(&mut self) {
        self.materials.clear();
    }

    /// World-space box enclosing the whole terrain surface.
    pub fn bounds(&self) -> Option<Aabb> {
        let data = self.store.data()?;
        let half = data.world_extent() * 0.5;
        let (lo, hi) = data.world_height_range();
        Some(Aabb::new(
            Point3::new(-half.x, lo, -half.y),
            Point3::new(half.x, hi, half.y),
        ))
    }

    /// World-space terrain height at `(world_x, world_z)`, or `None` if there is no terrain there.
    pub fn height_at(&self, world_x: f32, world_z: f32) -> Option<f32> {
        let data = self.store.data()?;
        let (u, v) = data.world_to_normalized(world_x, world_z)?;
        Some(data.denormalize(data.sample_bilinear(u, v)))
    }

    /// Height, normal, slope and material at `(world_x, world_z)`.
    pub fn surface_info_at(&self, world_x: f32, world_z: f32) -> TerrainSurfaceInfo {
        let Some(height) = self.height_at(world_x, world_z) else {
            return TerrainSurfaceInfo::missing();
        };

        let d = self.config.normal_sample_offset;
        let gx = self.gradient_along(world_x, world_z, height, d, 0.0);
        let gz = self.gradient_along(world_x, world_z, height, 0.0, d);

        // Tangents (1, gx, 0) and (0, gz, 1); their cross product points up.
        let tangent_x = Vec3::new(1.0, gx, 0.0);
        let tangent_z = Vec3::new(0.0, gz, 1.0);
        let normal = tangent_z.cross(&tangent_x).normalize();
        let slope = normal.y.clamp(-1.0, 1.0).acos();

        let (material, friction) = self.materials.resolve(Vec2::new(world_x, world_z));

        TerrainSurfaceInfo {
            exists: true,
            height,
            normal,
            slope,
            friction,
            material,
        }
    }

    /// Rate of height change along `(dx, dz)` (one of them zero) per meter.
    ///
    /// Uses a forward difference, falling back to a backward difference at the far edges.
    fn gradient_along(&self, x: f32, z: f32, h: f32, dx: f32, dz: f32) -> f32 {
        let step = dx + dz;
        if let Some(ahead) = self.height_at(x + dx, z + dz) {
            return (ahead - h) / step;
        }
        if let Some(behind) = self.height_at(x - dx, z - dz) {
            return (h - behind) / step;
        }
        0.0
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::terrain::heightmap::HeightmapData;

    /// Plane tilted along +X: height = tan(angle) * x, centered footprint of `size` meters.
    pub(crate) fn tilted_plane(angle: f32, size: f32) -> HeightmapData {
        let n = 33;
        let spacing = size / (n - 1) as f32;
        let rise = angle.tan() * size;
        let mut heights = Vec::with_capacity(n * n);
        for _gz in 0..n {
            for gx in 0..n {
                heights.push(gx as f32 / (n - 1) as f32);
            }
        }
        HeightmapData::from_normalized(
            n,
            n,
            heights,
            -rise * 0.5,
            rise * 0.5,
            Vec2::new(spacing, spacing),
            1.0,
        )
        .unwrap()
    }

    pub(crate) fn flat(size: f32, height: f32) -> HeightmapData {
        HeightmapData::from_normalized(
            5,
            5,
            vec![0.0; 25],
            height,
            height + 10.0,
            Vec2::new(size / 4.0, size / 4.0),
            1.0,
        )
        .unwrap()
    }

    pub(crate) fn sampler_with(data: HeightmapData) -> TerrainSampler {
        let mut sampler = TerrainSampler::new(SamplerConfig::default()).unwrap();
        sampler.load_heightmap(data);
        sampler
    }

    #[test]
    fn missing_heightmap_reports_no_terrain() {
        let sampler = TerrainSampler::new(SamplerConfig::default()).unwrap();
        assert_eq!(sampler.height_at(0.0, 0.0), None);
        assert!(!sampler.surface_info_at(0.0, 0.0).exists);
        assert!(sampler.bounds().is_none());
    }

    #[test]
    fn out_of_bounds_reports_no_terrain() {
        let sampler = sampler_with(flat(100.0, 3.0));
        assert_eq!(sampler.height_at(0.0, 0.0), Some(3.0));
        assert_eq!(sampler.height_at(50.0, -50.0), Some(3.0));
        assert_eq!(sampler.height_at(50.5, 0.0), None);
        assert!(!sampler.surface_info_at(0.0, -70.0).exists);
    }

    #[test]
    fn height_is_denormalized_and_vertically_scaled() {
        let data = HeightmapData::from_normalized(
            2,
            2,
            vec![0.5; 4],
            10.0,
            30.0,
            Vec2::new(4.0, 4.0),
            2.0,
        )
        .unwrap();
        let sampler = sampler_with(data);
        // (10 + 0.5 * 20) * 2
        assert_eq!(sampler.height_at(1.0, 1.0), Some(40.0));
    }

    #[test]
    fn flat_terrain_faces_up() {
        let sampler = sampler_with(flat(100.0, 0.0));
        let info = sampler.surface_info_at(10.0, 10.0);
        assert!(info.exists);
        assert!((info.normal - up()).norm() < 1.0e-6);
        assert!(info.slope.abs() < 1.0e-6);
    }

    #[test]
    fn tilted_plane_slope_matches_angle() {
        let angle = 0.5f32;
        let sampler = sampler_with(tilted_plane(angle, 64.0));

        for &(x, z) in &[(0.0, 0.0), (-20.0, 13.0), (31.9, -31.9)] {
            let info = sampler.surface_info_at(x, z);
            assert!(info.exists);
            assert!((info.slope - angle).abs() < 1.0e-3, "slope {}", info.slope);
            // Terrain rises toward +X, so the normal leans toward -X.
            assert!(info.normal.x < 0.0);
            assert!(info.normal.z.abs() < 1.0e-4);
            assert!((info.normal.norm() - 1.0).abs() < 1.0e-5);
        }
    }

    #[test]
    fn ice_rectangle_inside_snow_default() {
        let mut sampler = sampler_with(flat(200.0, 0.0));
        let ice = RegionRect::new(-10.0, -10.0, 10.0, 10.0).unwrap();
        sampler
            .add_material_region(SurfaceMaterial::Snow, 0.12, None)
            .unwrap();
        sampler
            .add_material_region(SurfaceMaterial::Ice, 0.02, Some(ice))
            .unwrap();

        let inside = sampler.surface_info_at(2.0, -3.0);
        assert_eq!(inside.material, SurfaceMaterial::Ice);
        assert_eq!(inside.friction, 0.02);

        let outside = sampler.surface_info_at(40.0, 40.0);
        assert_eq!(outside.material, SurfaceMaterial::Snow);
        assert_eq!(outside.friction, 0.12);

        sampler.remove_all_regions();
        let fallback = sampler.surface_info_at(2.0, -3.0);
        assert_eq!(fallback.material, SamplerConfig::default().default_material);
        assert_eq!(fallback.friction, SamplerConfig::default().default_friction);
    }

    #[test]
    fn from_config_builds_terrain_and_materials() {
        let config = TerrainConfig {
            width: 17,
            depth: 17,
            ..TerrainConfig::default()
        };
        let sampler = TerrainSampler::from_config(&config).unwrap();
        assert!(sampler.has_terrain());
        assert_eq!(sampler.materials().regions().len(), 1);

        let bounds = sampler.bounds().unwrap();
        assert_eq!(bounds.mins.x, -16.0);
        assert_eq!(bounds.maxs.z, 16.0);
        assert_eq!(bounds.maxs.y, 60.0);
    }

    #[test]
    fn unload_removes_terrain() {
        let mut sampler = sampler_with(flat(10.0, 0.0));
        assert!(sampler.unload_heightmap().is_some());
        assert_eq!(sampler.height_at(0.0, 0.0), None);
    }
}
