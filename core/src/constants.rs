/// Gravity magnitude in meters per second squared (positive value).
/// Integrate as a downward acceleration along -Y.
pub const GRAVITY_MPS2: f32 = 9.81;

/// Practical small distance for comparisons (meters).
/// Use for dot-product guards, equality checks in world space, etc.
pub const DIST_EPS: f32 = 1.0e-6;

/// Minimum squared planar speed required to derive a facing direction (m^2/s^2).
pub const FACING_EPS_SQ: f32 = 1.0e-6;

/// Size of one spatial grid cell in world units (meters).
/// All cells are cubes.
pub const DEFAULT_CELL_SIZE: f32 = 10.0;

/// Horizontal offset used for finite-difference normals when the sampler config
/// does not override it (meters).
pub const DEFAULT_NORMAL_SAMPLE_OFFSET: f32 = 0.5;

/// Friction applied where no material region matches.
pub const DEFAULT_FRICTION: f32 = 0.1;

/// Distance advanced per march step when raycasting against the height field (meters).
pub const DEFAULT_RAYCAST_STEP: f32 = 0.25;

/// Number of bisection refinements applied once a raycast brackets the surface.
pub const RAYCAST_REFINE_ITERATIONS: u32 = 16;

/// Vertical distance under which an actor's feet count as touching the ground (meters).
pub const GROUND_TOLERANCE: f32 = 0.1;

/// Speed ceiling for skiing actors (meters per second).
pub const DEFAULT_MAX_SKI_SPEED: f32 = 40.0;

/// Facing turn rate at full steering input (radians per second).
pub const DEFAULT_TURN_RATE: f32 = 2.5;

/// How quickly horizontal velocity follows the facing direction at full input (1/s).
pub const DEFAULT_STEER_AUTHORITY: f32 = 3.0;

/// Pole-push acceleration at full forward input (m/s^2).
pub const DEFAULT_PUSH_ACCELERATION: f32 = 2.0;

/// Pole pushing stops contributing above this speed (m/s).
pub const DEFAULT_PUSH_MAX_SPEED: f32 = 3.0;

/// Vertical launch speed applied by a jump (m/s).
pub const DEFAULT_JUMP_SPEED: f32 = 6.0;

/// Fractal octaves used by procedural heightmap generation.
pub const PROCEDURAL_OCTAVES: u32 = 6;

/// Base frequency of procedural generation, in cycles per heightmap sample.
pub const PROCEDURAL_BASE_FREQUENCY: f64 = 0.02;
