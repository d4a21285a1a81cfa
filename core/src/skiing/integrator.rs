use crate::{
    constants::DIST_EPS,
    error::Result,
    skiing::{
        config::SkiingConfig,
        state::{SkiInput, SkiingState},
    },
    terrain::TerrainSurfaceInfo,
    types::{Vec3, up},
    utils::{clamp_length, horizontal, planar_direction, project_on_plane, rotate_about_y},
};

/// Per-actor skiing velocity integrator.
///
/// Owns the actor's velocity; the caller owns position. Each `update` advances the velocity by
/// one tick given the terrain under the actor and whether it is grounded.
#[derive(Clone, Debug)]
pub struct SkiingIntegrator {
    config: SkiingConfig,
    state: SkiingState,
    /// Non-instantaneous forces, integrated as acceleration on the next `update`.
    pending_acceleration: Vec3,
}

impl SkiingIntegrator {
    pub fn new(config: SkiingConfig) -> Result<Self> {
        config
            .validate()
            .inspect_err(|e| log::warn!("rejecting skiing config: {e}"))?;
        Ok(Self {
            config,
            state: SkiingState::default(),
            pending_acceleration: Vec3::zeros(),
        })
    }

    #[inline]
    pub fn config(&self) -> &SkiingConfig {
        &self.config
    }

    #[inline]
    pub fn state(&self) -> &SkiingState {
        &self.state
    }

    /// Overwrite the velocity, e.g. when spawning with an initial speed.
    pub fn set_velocity(&mut self, velocity: Vec3) {
        if !velocity.iter().all(|v| v.is_finite()) {
            log::warn!("ignoring non-finite velocity {velocity:?}");
            return;
        }
        self.state.set_velocity(velocity);
    }

    /// Apply an external force.
    ///
    /// - `instantaneous = true`: `force` is a velocity delta applied right now, ignoring mass
    ///   and time; `state()` reflects it immediately.
    /// - `instantaneous = false`: `force` accumulates as an acceleration for the next `update`.
    pub fn apply_force(&mut self, force: Vec3, instantaneous: bool) {
        if !force.iter().all(|v| v.is_finite()) {
            log::warn!("ignoring non-finite force {force:?}");
            return;
        }
        if instantaneous {
            self.state.set_velocity(self.state.velocity + force);
        } else {
            self.pending_acceleration += force;
        }
    }

    /// Remove the part of the velocity that points into a surface with unit `normal`.
    pub fn resolve_ground_contact(&mut self, normal: Vec3) {
        let into = self.state.velocity.dot(&normal);
        if into < 0.0 {
            self.state.set_velocity(self.state.velocity - normal * into);
        }
    }

    /// Ground support for an actor that is grounded but not skiing. Call after `update`.
    ///
    /// Cancels this tick's gravity, drops motion into the surface and lets surface friction bleed
    /// off the along-surface motion, so a standing actor stays put on a slope and one that just
    /// stopped skiing coasts to a halt. Motion away from the surface (a jump) is kept.
    pub fn hold_on_surface(&mut self, surface: &TerrainSurfaceInfo, dt: f32) -> Vec3 {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let normal = if surface.exists { surface.normal } else { up() };

        let mut v = self.state.velocity;
        v.y += self.config.gravity * dt;

        let along_normal = v.dot(&normal);
        let tangent = self.apply_friction(v - normal * along_normal, surface, dt);
        let v = tangent + normal * along_normal.max(0.0);

        self.state.set_velocity(v);
        v
    }

    /// Advance one tick and return the new velocity.
    ///
    /// Behavior
    /// - Skiing toggles to `input.ski`, but only while grounded. Velocity carries over.
    /// - Skiing and grounded: slope acceleration, friction, steering, pushing, then the speed cap.
    /// - Otherwise: gravity only.
    /// - A grounded jump adds `jump_speed` upward after everything else, including the speed
    ///   cap, so the returned speed can exceed `max_speed` on the tick of a jump.
    /// - Negative or non-finite `dt` counts as 0.
    pub fn update(
        &mut self,
        dt: f32,
        input: SkiInput,
        surface: &TerrainSurfaceInfo,
        grounded: bool,
    ) -> Vec3 {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let input = input.sanitized();
        let mut v = self.state.velocity;

        // 0) Ski state transition (grounded only). Skis line up with the current motion.
        if grounded && input.ski != self.state.is_skiing {
            self.state.is_skiing = input.ski;
            if input.ski {
                if let Some(dir) = planar_direction(v) {
                    self.state.facing = dir;
                }
            }
            log::debug!(
                "skiing {} at speed {:.2}",
                if input.ski { "started" } else { "stopped" },
                self.state.speed
            );
        }

        // 1) Deferred forces.
        if dt > 0.0 {
            v += self.pending_acceleration * dt;
            self.pending_acceleration = Vec3::zeros();
        }

        if self.state.is_skiing && grounded {
            let normal = if surface.exists { surface.normal } else { up() };
            // 2) Slope: along-surface part of gravity.
            v += self.slope_acceleration(normal) * dt;
            // 3) Friction: opposes motion, never reverses it.
            v = self.apply_friction(v, surface, dt);
            // 4) Steering and pushing.
            v = self.steer(v, input.right, dt);
            v = self.push(v, input.forward, dt);
            // 5) Speed cap, direction preserved.
            v = clamp_length(v, self.config.max_speed);
        } else {
            v.y -= self.config.gravity * dt;
        }

        if grounded && input.jump {
            v.y += self.config.jump_speed;
        }

        self.state.set_velocity(v);
        v
    }

    /// Gravity minus its component along `normal`, scaled. Magnitude is `g * sin(slope)`,
    /// pointing downhill, so it speeds up downhill motion and slows uphill motion.
    fn slope_acceleration(&self, normal: Vec3) -> Vec3 {
        let g = Vec3::new(0.0, -self.config.gravity, 0.0);
        project_on_plane(g, normal) * self.config.slope_acceleration_scale
    }

    fn apply_friction(&self, v: Vec3, surface: &TerrainSurfaceInfo, dt: f32) -> Vec3 {
        let speed = v.norm();
        if speed <= DIST_EPS {
            return v;
        }
        let mu = surface.friction.max(0.0) * self.config.friction_scale;
        let decel = mu * self.config.gravity * surface.slope.cos().max(0.0);
        let new_speed = (speed - decel * dt).max(0.0);
        v * (new_speed / speed)
    }

    /// Rotate the facing by `right` and swing horizontal velocity toward it.
    ///
    /// The swing is a partial blend (`steer_authority * |right| * dt`, capped at 1) and keeps
    /// horizontal speed; the vertical component is untouched.
    fn steer(&mut self, v: Vec3, right: f32, dt: f32) -> Vec3 {
        if right == 0.0 || dt == 0.0 {
            return v;
        }

        // Positive angles turn counter-clockwise from above, so right is negative.
        let turned = rotate_about_y(self.state.facing, -right * self.config.turn_rate * dt);
        if let Some(facing) = planar_direction(turned) {
            self.state.facing = facing;
        }

        let h = horizontal(v);
        let h_speed = h.norm();
        if h_speed <= DIST_EPS {
            return v;
        }

        let alpha = (self.config.steer_authority * right.abs() * dt).min(1.0);
        let blended = h.lerp(&(self.state.facing * h_speed), alpha);
        let len = blended.norm();
        if len <= DIST_EPS {
            return v;
        }
        let h_new = blended * (h_speed / len);
        Vec3::new(h_new.x, v.y, h_new.z)
    }

    /// Pole push along the facing; only effective below `push_max_speed`.
    fn push(&self, v: Vec3, forward: f32, dt: f32) -> Vec3 {
        if forward <= 0.0 || v.norm() >= self.config.push_max_speed {
            return v;
        }
        v + self.state.facing * (self.config.push_acceleration * forward * dt)
    }
}
