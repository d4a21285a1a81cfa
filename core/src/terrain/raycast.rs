//! Ray vs height-field intersection.
//!
//! The ray is first clipped against the terrain volume (parry's `Aabb` ray cast, once forward
//! for the entry and once backward for the exit), then only that segment is marched in fixed
//! steps until it crosses the surface, and the crossing is refined by
//! bisection. Thin features narrower than the march step can be skipped; the step comes from
//! `SamplerConfig::raycast_step`.

use rapier3d::parry::query::{Ray, RayCast};

use crate::{
    constants::{DIST_EPS, RAYCAST_REFINE_ITERATIONS},
    terrain::sampler::{TerrainSampler, TerrainSurfaceInfo},
    types::{Aabb, Point3, Vec3},
};

/// Upper bound on march steps across the terrain volume; huge terrains get a coarser step.
const MAX_MARCH_STEPS: f32 = 4096.0;

/// Vertical padding applied to the terrain volume so perfectly flat terrain still has a
/// non-degenerate box to clip against.
const VOLUME_PADDING: f32 = 0.01;

/// First intersection of a ray with the terrain surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainHit {
    pub point: Vec3,
    pub normal: Vec3,
    /// Distance from the ray origin along the normalized direction.
    pub distance: f32,
    pub surface: TerrainSurfaceInfo,
}

impl TerrainSampler {
    /// Cast a ray against the terrain and return the first hit within `max_distance`.
    ///
    /// An origin already below the surface hits at distance 0. Returns `None` for a zero
    /// direction, a non-positive distance, a missing heightmap, or a miss.
    pub fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<TerrainHit> {
        if max_distance.is_nan() || max_distance <= 0.0 {
            return None;
        }
        let dir_len = direction.norm();
        if dir_len.is_nan() || dir_len <= DIST_EPS || !origin.iter().all(|v| v.is_finite()) {
            return None;
        }
        let dir = direction / dir_len;

        // Signed height of the ray above the terrain at parameter t.
        let clearance = |t: f32| -> Option<f32> {
            let p = origin + dir * t;
            self.height_at(p.x, p.z).map(|h| p.y - h)
        };

        // Starting underground counts as an immediate hit.
        if clearance(0.0).is_some_and(|c| c <= 0.0) {
            return Some(self.hit_at(origin, dir, 0.0));
        }

        let bounds = self.bounds()?;
        let volume = Aabb::new(
            Point3::new(bounds.mins.x, bounds.mins.y - VOLUME_PADDING, bounds.mins.z),
            Point3::new(bounds.maxs.x, bounds.maxs.y + VOLUME_PADDING, bounds.maxs.z),
        );

        let ray = Ray::new(Point3::from(origin), dir);
        let t_enter = volume.cast_local_ray(&ray, max_distance, true)?;

        // Exit: cast back toward the origin from a point past the far side of the volume.
        let beyond = t_enter + (volume.maxs - volume.mins).norm() + 1.0;
        let back = Ray::new(Point3::from(origin + dir * beyond), -dir);
        let t_exit = volume
            .cast_local_ray(&back, beyond, true)
            .map_or(t_enter, |toi| beyond - toi);
        let t_end = t_exit.min(max_distance).max(t_enter);

        let step = self
            .config()
            .raycast_step
            .max((t_end - t_enter) / MAX_MARCH_STEPS);

        let mut prev: Option<f32> = None;
        let mut t = t_enter;
        loop {
            if let Some(c) = clearance(t) {
                if c <= 0.0 {
                    let hit_t = match prev {
                        Some(above_t) => bisect(&clearance, above_t, t),
                        None => t,
                    };
                    return Some(self.hit_at(origin, dir, hit_t));
                }
                prev = Some(t);
            } else {
                prev = None;
            }

            if t >= t_end {
                return None;
            }
            t = (t + step).min(t_end);
        }
    }

    fn hit_at(&self, origin: Vec3, dir: Vec3, t: f32) -> TerrainHit {
        let point = origin + dir * t;
        let surface = self.surface_info_at(point.x, point.z);
        TerrainHit {
            point,
            normal: surface.normal,
            distance: t,
            surface,
        }
    }
}

/// Bisect between a parameter above the surface and one at/below it.
fn bisect(clearance: &impl Fn(f32) -> Option<f32>, mut above: f32, mut below: f32) -> f32 {
    for _ in 0..RAYCAST_REFINE_ITERATIONS {
        let mid = 0.5 * (above + below);
        match clearance(mid) {
            Some(c) if c <= 0.0 => below = mid,
            _ => above = mid,
        }
    }
    below
}
