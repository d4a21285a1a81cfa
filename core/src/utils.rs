use crate::{
    constants::{DIST_EPS, FACING_EPS_SQ},
    types::{Vec2, Vec3},
};
use nalgebra::{UnitQuaternion, Vector3};

/// Small numeric helpers used across the movement math.
pub trait UtilMath {
    fn sq(self) -> Self;
}

impl UtilMath for f32 {
    #[inline]
    fn sq(self) -> f32 {
        self * self
    }
}

/// Drop the vertical component, returning the planar (XZ) part as a 2D vector.
#[inline]
pub fn to_planar(v: Vec3) -> Vec2 {
    Vec2::new(v.x, v.z)
}

/// Horizontal part of `v` (Y zeroed) as a 3D vector.
#[inline]
pub fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Yaw (radians about +Y) that faces along the planar vector `xz`.
///
/// Follows the `(-x).atan2(-z)` convention: yaw 0 faces -Z.
pub fn yaw_from_xz(xz: Vec2) -> Option<f32> {
    if xz.norm_squared() > FACING_EPS_SQ {
        return Some((-xz[0]).atan2(-xz[1]));
    }

    None
}

/// Unit planar direction of `v`, or `None` if the planar part is too small.
#[inline]
pub fn planar_direction(v: Vec3) -> Option<Vec3> {
    let h = horizontal(v);
    let len_sq = h.norm_squared();
    if len_sq <= FACING_EPS_SQ {
        return None;
    }
    Some(h / len_sq.sqrt())
}

/// Rotate `v` about the world +Y axis by `angle` radians (counter-clockwise seen from above).
#[inline]
pub fn rotate_about_y(v: Vec3, angle: f32) -> Vec3 {
    UnitQuaternion::from_axis_angle(&Vector3::y_axis(), angle) * v
}

/// Remove the component of `v` along the unit normal `n`.
#[inline]
pub fn project_on_plane(v: Vec3, n: Vec3) -> Vec3 {
    v - n * v.dot(&n)
}

/// Scale `v` down so its length does not exceed `max_len`. Direction is preserved.
#[inline]
pub fn clamp_length(v: Vec3, max_len: f32) -> Vec3 {
    let len_sq = v.norm_squared();
    if len_sq <= max_len.sq() || len_sq <= DIST_EPS * DIST_EPS {
        return v;
    }
    v * (max_len / len_sq.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaw_zero_faces_negative_z() {
        let yaw = yaw_from_xz(Vec2::new(0.0, -1.0)).unwrap();
        assert!(yaw.abs() < 1.0e-6);
        assert!(yaw_from_xz(Vec2::zeros()).is_none());
    }

    #[test]
    fn rotate_quarter_turn_about_y() {
        // +X rotated counter-clockwise (seen from above) by 90 degrees points to -Z.
        let r = rotate_about_y(Vec3::new(1.0, 0.0, 0.0), std::f32::consts::FRAC_PI_2);
        assert!((r - Vec3::new(0.0, 0.0, -1.0)).norm() < 1.0e-5);
    }

    #[test]
    fn clamp_length_preserves_direction() {
        let v = Vec3::new(3.0, 4.0, 0.0);
        let c = clamp_length(v, 2.5);
        assert!((c.norm() - 2.5).abs() < 1.0e-5);
        assert!((c.normalize() - v.normalize()).norm() < 1.0e-6);
        assert_eq!(clamp_length(v, 10.0), v);
    }

    #[test]
    fn project_on_plane_removes_normal_component() {
        let n = Vec3::new(0.0, 1.0, 0.0);
        let p = project_on_plane(Vec3::new(1.0, -2.0, 3.0), n);
        assert_eq!(p, Vec3::new(1.0, 0.0, 3.0));
    }

    #[test]
    fn planar_helpers_ignore_height() {
        assert_eq!(to_planar(Vec3::new(1.0, 50.0, 2.0)), Vec2::new(1.0, 2.0));
        assert!(planar_direction(Vec3::new(0.0, 5.0, 0.0)).is_none());
        let d = planar_direction(Vec3::new(3.0, 9.0, 4.0)).unwrap();
        assert!((d - Vec3::new(0.6, 0.0, 0.8)).norm() < 1.0e-6);
    }
}
