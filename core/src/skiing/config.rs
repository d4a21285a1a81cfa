use crate::{
    constants::{
        DEFAULT_JUMP_SPEED, DEFAULT_MAX_SKI_SPEED, DEFAULT_PUSH_ACCELERATION,
        DEFAULT_PUSH_MAX_SPEED, DEFAULT_STEER_AUTHORITY, DEFAULT_TURN_RATE, GRAVITY_MPS2,
    },
    error::{Error, Result},
};

/// Tuning for one skiing actor. Immutable once handed to the integrator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SkiingConfig {
    /// Downward gravity magnitude (m/s^2).
    pub gravity: f32,
    /// Multiplier on the along-slope component of gravity. 1.0 is physical.
    pub slope_acceleration_scale: f32,
    /// Multiplier on surface friction deceleration.
    pub friction_scale: f32,
    /// Speed ceiling (m/s); velocity is scaled down to this length.
    pub max_speed: f32,
    /// Facing rotation rate at full `right` input (rad/s).
    pub turn_rate: f32,
    /// How fast horizontal velocity swings toward the facing, per second at full input.
    pub steer_authority: f32,
    /// Pole-push acceleration at full `forward` input (m/s^2).
    pub push_acceleration: f32,
    /// Pushing only helps below this speed (m/s).
    pub push_max_speed: f32,
    /// Upward velocity added by a jump (m/s).
    pub jump_speed: f32,
}

impl Default for SkiingConfig {
    fn default() -> Self {
        Self {
            gravity: GRAVITY_MPS2,
            slope_acceleration_scale: 1.0,
            friction_scale: 1.0,
            max_speed: DEFAULT_MAX_SKI_SPEED,
            turn_rate: DEFAULT_TURN_RATE,
            steer_authority: DEFAULT_STEER_AUTHORITY,
            push_acceleration: DEFAULT_PUSH_ACCELERATION,
            push_max_speed: DEFAULT_PUSH_MAX_SPEED,
            jump_speed: DEFAULT_JUMP_SPEED,
        }
    }
}

impl SkiingConfig {
    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            (self.gravity, "gravity must be finite and >= 0"),
            (
                self.slope_acceleration_scale,
                "slope_acceleration_scale must be finite and >= 0",
            ),
            (self.friction_scale, "friction_scale must be finite and >= 0"),
            (self.turn_rate, "turn_rate must be finite and >= 0"),
            (self.steer_authority, "steer_authority must be finite and >= 0"),
            (self.push_acceleration, "push_acceleration must be finite and >= 0"),
            (self.push_max_speed, "push_max_speed must be finite and >= 0"),
            (self.jump_speed, "jump_speed must be finite and >= 0"),
        ];
        for (value, msg) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidMovementConfig(msg));
            }
        }
        if !self.max_speed.is_finite() || self.max_speed <= 0.0 {
            return Err(Error::InvalidMovementConfig(
                "max_speed must be finite and > 0",
            ));
        }
        Ok(())
    }
}
