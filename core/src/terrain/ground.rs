use crate::{
    terrain::sampler::{TerrainSampler, TerrainSurfaceInfo},
    types::Vec3,
};

/// Contact returned when an actor stands on (or slightly above) the terrain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundContact {
    /// Point on the terrain surface below the actor.
    pub position: Vec3,
    /// Surface normal at `position`.
    pub normal: Vec3,
    pub surface: TerrainSurfaceInfo,
    /// Signed gap between the actor's feet and the ground (negative when penetrating).
    pub gap: f32,
}

impl TerrainSampler {
    /// Check whether an actor with feet at `position` is standing on the terrain.
    ///
    /// - The ground height is the highest terrain sample under the actor's footprint: the
    ///   center plus four points `radius` away along +/-X and +/-Z. Footprint points that fall
    ///   outside the terrain are ignored, so an actor overhanging an edge is still supported
    ///   by the part of the footprint that is over terrain.
    /// - The actor is grounded when its feet are at most `height` above that ground. Feet
    ///   below the ground also count as grounded.
    /// - Returns `None` when airborne or when no footprint point is over terrain.
    pub fn check_grounded(
        &self,
        position: Vec3,
        radius: f32,
        height: f32,
    ) -> Option<GroundContact> {
        if !self.has_terrain() {
            return None;
        }

        let radius = radius.max(0.0);
        let tolerance = height.max(0.0);

        let footprint = [
            (0.0, 0.0),
            (radius, 0.0),
            (-radius, 0.0),
            (0.0, radius),
            (0.0, -radius),
        ];

        // Highest supporting point under the footprint.
        let mut best: Option<(f32, f32, f32)> = None;
        for (ox, oz) in footprint {
            let x = position.x + ox;
            let z = position.z + oz;
            if let Some(h) = self.height_at(x, z) {
                if best.is_none_or(|(_, _, bh)| h > bh) {
                    best = Some((x, z, h));
                }
            }
        }

        let (x, z, ground) = best?;
        let gap = position.y - ground;
        if gap > tolerance {
            return None;
        }

        let surface = self.surface_info_at(x, z);
        Some(GroundContact {
            position: Vec3::new(x, ground, z),
            normal: surface.normal,
            surface,
            gap,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::terrain::sampler::tests::{flat, sampler_with, tilted_plane};
    use crate::types::Vec3;

    #[test]
    fn grounded_within_tolerance() {
        let sampler = sampler_with(flat(100.0, 2.0));

        let contact = sampler
            .check_grounded(Vec3::new(0.0, 2.05, 0.0), 0.5, 0.1)
            .expect("feet 5cm above ground should be grounded");
        assert!((contact.gap - 0.05).abs() < 1.0e-5);
        assert_eq!(contact.position, Vec3::new(0.0, 2.0, 0.0));
        assert!(contact.surface.exists);

        assert!(sampler.check_grounded(Vec3::new(0.0, 2.5, 0.0), 0.5, 0.1).is_none());
    }

    #[test]
    fn penetrating_actor_is_grounded() {
        let sampler = sampler_with(flat(100.0, 2.0));
        let contact = sampler
            .check_grounded(Vec3::new(0.0, 1.0, 0.0), 0.5, 0.1)
            .unwrap();
        assert!(contact.gap < 0.0);
    }

    #[test]
    fn radius_reaches_ground_past_the_edge() {
        let sampler = sampler_with(flat(100.0, 0.0));
        // Center is 0.3m past the +X edge; the -X footprint point is still over terrain.
        let pos = Vec3::new(50.3, 0.0, 0.0);
        assert!(sampler.check_grounded(pos, 0.0, 0.1).is_none());
        let contact = sampler.check_grounded(pos, 0.5, 0.1).unwrap();
        assert!((contact.position.x - 49.8).abs() < 1.0e-4);
    }

    #[test]
    fn footprint_uses_highest_ground() {
        let sampler = sampler_with(tilted_plane(0.5, 64.0));
        let center = sampler.height_at(0.0, 0.0).unwrap();
        let uphill = sampler.height_at(1.0, 0.0).unwrap();
        assert!(uphill > center);

        // Standing at center height: the uphill footprint point is above the feet.
        let contact = sampler
            .check_grounded(Vec3::new(0.0, center, 0.0), 1.0, 0.05)
            .unwrap();
        assert!((contact.position.y - uphill).abs() < 1.0e-4);
        assert!(contact.gap < 0.0);
    }

    #[test]
    fn no_terrain_is_never_grounded() {
        let mut sampler = sampler_with(flat(10.0, 0.0));
        sampler.unload_heightmap();
        assert!(sampler.check_grounded(Vec3::zeros(), 1.0, 1.0).is_none());
    }
}
