use crate::{
    types::Vec3,
    utils::{to_planar, yaw_from_xz},
};

/// Player intent for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SkiInput {
    /// Push strength in `[-1, 1]`; only positive values push.
    pub forward: f32,
    /// Turn strength in `[-1, 1]`; positive turns right (clockwise seen from above).
    pub right: f32,
    /// Hold to ski. Only sampled while grounded.
    pub ski: bool,
    pub jump: bool,
}

impl SkiInput {
    /// Copy with axes clamped to `[-1, 1]` and NaN treated as 0.
    pub fn sanitized(self) -> Self {
        let axis = |v: f32| if v.is_nan() { 0.0 } else { v.clamp(-1.0, 1.0) };
        Self {
            forward: axis(self.forward),
            right: axis(self.right),
            ..self
        }
    }
}

/// Observable integrator state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SkiingState {
    pub velocity: Vec3,
    /// `|velocity|`, kept in sync with every velocity change.
    pub speed: f32,
    pub is_skiing: bool,
    /// Unit horizontal direction the skis point along.
    pub facing: Vec3,
}

impl Default for SkiingState {
    fn default() -> Self {
        Self {
            velocity: Vec3::zeros(),
            speed: 0.0,
            is_skiing: false,
            facing: Vec3::new(0.0, 0.0, -1.0),
        }
    }
}

impl SkiingState {
    /// Yaw of the facing (radians about +Y, 0 faces -Z), for orienting a model.
    pub fn yaw(&self) -> f32 {
        yaw_from_xz(to_planar(self.facing)).unwrap_or(0.0)
    }

    #[inline]
    pub(crate) fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
        self.speed = velocity.norm();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitized_clamps_axes() {
        let input = SkiInput {
            forward: 3.0,
            right: f32::NAN,
            ski: true,
            jump: false,
        }
        .sanitized();
        assert_eq!(input.forward, 1.0);
        assert_eq!(input.right, 0.0);
        assert!(input.ski);
    }

    #[test]
    fn yaw_follows_facing() {
        let mut state = SkiingState::default();
        assert!(state.yaw().abs() < 1.0e-6);
        state.facing = Vec3::new(1.0, 0.0, 0.0);
        assert!((state.yaw() + std::f32::consts::FRAC_PI_2).abs() < 1.0e-6);
    }
}
