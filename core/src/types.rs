/*!
Core math aliases and identifiers shared by the terrain, grid and skiing modules.

This module intentionally contains no algorithms. It defines the data types
exchanged between:
- terrain (heightmap store, surface sampler, raycasts)
- grid (spatial cells and queries)
- skiing (velocity integration)
- simulation (per-tick actor pipeline)

Bounding boxes reuse parry's `Aabb` (re-exported through rapier3d) so entity
bounds, cell bounds and the terrain volume all speak the same type.
*/

use nalgebra as na;

pub use rapier3d::parry::bounding_volume::Aabb;

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Vec2 = na::Vector2<f32>;
pub type Point3 = na::Point3<f32>;

/// Identifier of a dynamic entity indexed by the spatial grid.
///
/// The grid never interprets the value; callers own the id space.
pub type EntityId = u64;

/// World-space up axis.
#[inline]
pub fn up() -> Vec3 {
    Vec3::new(0.0, 1.0, 0.0)
}

/// Build an `Aabb` from two opposite corners given in any order.
#[inline]
pub fn aabb_from_corners(a: Vec3, b: Vec3) -> Aabb {
    Aabb::new(
        Point3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
        Point3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
    )
}

/// Test two AABBs for overlap (touching faces count as overlapping).
#[inline]
pub fn aabb_intersects(a: &Aabb, b: &Aabb) -> bool {
    !(a.maxs.x < b.mins.x
        || a.mins.x > b.maxs.x
        || a.maxs.y < b.mins.y
        || a.mins.y > b.maxs.y
        || a.maxs.z < b.mins.z
        || a.mins.z > b.maxs.z)
}

/// Test whether a point lies inside an AABB (inclusive).
#[inline]
pub fn aabb_contains_point(a: &Aabb, p: &Vec3) -> bool {
    p.x >= a.mins.x
        && p.x <= a.maxs.x
        && p.y >= a.mins.y
        && p.y <= a.maxs.y
        && p.z >= a.mins.z
        && p.z <= a.maxs.z
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_are_sorted_per_axis() {
        let aabb = aabb_from_corners(Vec3::new(1.0, -2.0, 3.0), Vec3::new(-1.0, 2.0, 0.0));
        assert_eq!(aabb.mins, Point3::new(-1.0, -2.0, 0.0));
        assert_eq!(aabb.maxs, Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn touching_boxes_intersect() {
        let a = aabb_from_corners(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        let b = aabb_from_corners(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        let c = aabb_from_corners(Vec3::new(1.5, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        assert!(aabb_intersects(&a, &b));
        assert!(!aabb_intersects(&a, &c));
    }

    #[test]
    fn contains_point_is_inclusive() {
        let a = aabb_from_corners(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0));
        assert!(aabb_contains_point(&a, &Vec3::new(1.0, 0.0, 0.5)));
        assert!(!aabb_contains_point(&a, &Vec3::new(1.01, 0.0, 0.5)));
    }
}
