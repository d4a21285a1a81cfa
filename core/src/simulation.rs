/*!
Per-tick actor pipeline.

`SkiWorld` ties the terrain sampler, the spatial grid and one skiing integrator per actor
together. Each tick, for every actor in id order:

1. derive grounded + surface info from the terrain (never trusted from input)
2. advance velocity with the actor's integrator; grounded actors without skis are held by
   the surface instead of sliding
3. move by `velocity * dt`
4. clamp to the terrain: an actor that ends below the surface is lifted onto it and loses
   the into-surface part of its velocity; a held actor is snapped onto the surface
5. re-index the actor in the grid at its new position

Actors are stored in a `BTreeMap`, so a tick is deterministic for a given set of inputs.
*/

use std::collections::{BTreeMap, HashMap};

use crate::{
    constants::{DIST_EPS, GROUND_TOLERANCE},
    error::{Error, Result},
    grid::{SpatialAccess, SpatialGrid},
    skiing::{SkiInput, SkiingConfig, SkiingIntegrator, SkiingState},
    terrain::{TerrainSampler, TerrainSurfaceInfo},
    types::{Aabb, EntityId, Point3, Vec3, aabb_from_corners, aabb_intersects},
};

/// Body and tuning of one actor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActorSpec {
    /// Footprint radius used for grounded checks and bounds (meters).
    pub radius: f32,
    /// Body height above the feet, used for bounds (meters).
    pub height: f32,
    /// Max gap between feet and ground that still counts as grounded (meters).
    pub ground_tolerance: f32,
    pub skiing: SkiingConfig,
}

impl Default for ActorSpec {
    fn default() -> Self {
        Self {
            radius: 0.3,
            height: 1.8,
            ground_tolerance: GROUND_TOLERANCE,
            skiing: SkiingConfig::default(),
        }
    }
}

impl ActorSpec {
    pub fn validate(&self) -> Result<()> {
        if !self.radius.is_finite() || self.radius < 0.0 {
            return Err(Error::InvalidMovementConfig(
                "actor radius must be finite and >= 0",
            ));
        }
        if !self.height.is_finite() || self.height < 0.0 {
            return Err(Error::InvalidMovementConfig(
                "actor height must be finite and >= 0",
            ));
        }
        if !self.ground_tolerance.is_finite() || self.ground_tolerance < 0.0 {
            return Err(Error::InvalidMovementConfig(
                "ground_tolerance must be finite and >= 0",
            ));
        }
        self.skiing.validate()
    }
}

/// One simulated skier. Position is the point between the feet.
#[derive(Clone, Debug)]
pub struct Actor {
    id: EntityId,
    position: Vec3,
    spec: ActorSpec,
    integrator: SkiingIntegrator,
    grounded: bool,
    surface: TerrainSurfaceInfo,
}

impl Actor {
    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    pub fn spec(&self) -> &ActorSpec {
        &self.spec
    }

    #[inline]
    pub fn state(&self) -> &SkiingState {
        self.integrator.state()
    }

    /// Grounded flag as of the end of the last tick.
    #[inline]
    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    /// Terrain under the actor as of the end of the last tick.
    #[inline]
    pub fn surface(&self) -> &TerrainSurfaceInfo {
        &self.surface
    }

    /// World-space box from the feet up to `height`, `radius` wide on X and Z.
    pub fn bounds(&self) -> Aabb {
        let r = self.spec.radius;
        let h = self.spec.height;
        Aabb::new(
            Point3::from(self.position - Vec3::new(r, 0.0, r)),
            Point3::from(self.position + Vec3::new(r, h, r)),
        )
    }

    fn refresh_contact(&mut self, sampler: &TerrainSampler) {
        let contact =
            sampler.check_grounded(self.position, self.spec.radius, self.spec.ground_tolerance);
        self.grounded = contact.is_some();
        self.surface = sampler.surface_info_at(self.position.x, self.position.z);
    }
}

pub struct SkiWorld {
    sampler: TerrainSampler,
    grid: SpatialGrid,
    actors: BTreeMap<EntityId, Actor>,
    next_id: EntityId,
    /// Largest radius and height spawned so far; only grows.
    body_reach: f32,
    body_height: f32,
}

impl SkiWorld {
    pub fn new(sampler: TerrainSampler, grid: SpatialGrid) -> Self {
        Self {
            sampler,
            grid,
            actors: BTreeMap::new(),
            next_id: 1,
            body_reach: 0.0,
            body_height: 0.0,
        }
    }

    #[inline]
    pub fn sampler(&self) -> &TerrainSampler {
        &self.sampler
    }

    /// Mutable sampler access for terrain (re)loads and material edits between ticks.
    #[inline]
    pub fn sampler_mut(&mut self) -> &mut TerrainSampler {
        &mut self.sampler
    }

    #[inline]
    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    #[inline]
    pub fn actor(&self, id: EntityId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    /// Actors in id order.
    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    #[inline]
    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Add an actor with feet at `position`; an actor spawned below the terrain is lifted
    /// onto it.
    pub fn spawn(&mut self, position: Vec3, spec: ActorSpec) -> Result<EntityId> {
        spec.validate()
            .inspect_err(|e| log::warn!("rejecting actor spec: {e}"))?;
        if !position.iter().all(|v| v.is_finite()) {
            return Err(Error::InvalidMovementConfig("spawn position must be finite"));
        }

        let mut position = position;
        if let Some(ground) = self.sampler.height_at(position.x, position.z) {
            position.y = position.y.max(ground);
        }

        let id = self.next_id;
        self.next_id += 1;
        self.body_reach = self.body_reach.max(spec.radius);
        self.body_height = self.body_height.max(spec.height);

        let mut actor = Actor {
            id,
            position,
            spec,
            integrator: SkiingIntegrator::new(spec.skiing)?,
            grounded: false,
            surface: TerrainSurfaceInfo::missing(),
        };
        actor.refresh_contact(&self.sampler);
        self.grid.insert(id, position);
        self.actors.insert(id, actor);

        log::debug!("spawned actor {id} at {position:?}");
        Ok(id)
    }

    /// Remove an actor. Returns `false` if it did not exist.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        let existed = self.actors.remove(&id).is_some();
        self.grid.remove(id);
        if existed {
            log::debug!("despawned actor {id}");
        }
        existed
    }

    pub fn set_velocity(&mut self, id: EntityId, velocity: Vec3) -> bool {
        match self.actors.get_mut(&id) {
            Some(actor) => {
                actor.integrator.set_velocity(velocity);
                true
            }
            None => false,
        }
    }

    /// See [`SkiingIntegrator::apply_force`].
    pub fn apply_force(&mut self, id: EntityId, force: Vec3, instantaneous: bool) -> bool {
        match self.actors.get_mut(&id) {
            Some(actor) => {
                actor.integrator.apply_force(force, instantaneous);
                true
            }
            None => false,
        }
    }

    /// Advance every actor by `dt` seconds. Actors missing from `inputs` get a neutral input.
    pub fn step(&mut self, dt: f32, inputs: &HashMap<EntityId, SkiInput>) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        for actor in self.actors.values_mut() {
            let input = inputs.get(&actor.id).copied().unwrap_or_default();
            step_actor(&self.sampler, &mut self.grid, actor, dt, input);
        }
    }

    /// Actors whose feet are within `radius` of `center`.
    pub fn query_radius(&self, center: Vec3, radius: f32) -> Vec<EntityId> {
        self.grid.query_radius(center, radius, self)
    }

    /// Actors whose body box overlaps the box with corners `min` and `max`.
    ///
    /// The grid indexes feet, so candidates come from a box widened by the largest body ever
    /// spawned; the exact test is against each actor's body box.
    pub fn query_aabb(&self, min: Vec3, max: Vec3) -> Vec<EntityId> {
        if !min.iter().chain(max.iter()).all(|v| v.is_finite()) {
            return Vec::new();
        }
        let query = aabb_from_corners(min, max);
        let reach = Vec3::new(self.body_reach, self.body_height, self.body_reach);
        let lo = query.mins.coords - reach;
        let hi = query.maxs.coords + Vec3::new(self.body_reach, 0.0, self.body_reach);
        self.grid
            .query_aabb(lo, hi, self)
            .into_iter()
            .filter(|id| {
                self.actors
                    .get(id)
                    .is_some_and(|a| aabb_intersects(&a.bounds(), &query))
            })
            .collect()
    }
}

impl SpatialAccess for SkiWorld {
    fn position(&self, entity: EntityId) -> Option<Vec3> {
        self.actors.get(&entity).map(Actor::position)
    }

    fn bounds(&self, entity: EntityId) -> Option<Aabb> {
        self.actors.get(&entity).map(Actor::bounds)
    }
}

/// One tick for one actor.
fn step_actor(
    sampler: &TerrainSampler,
    grid: &mut SpatialGrid,
    actor: &mut Actor,
    dt: f32,
    input: SkiInput,
) {
    // 0) Grounded and surface at the start of the tick.
    let contact =
        sampler.check_grounded(actor.position, actor.spec.radius, actor.spec.ground_tolerance);
    let grounded = contact.is_some();
    let surface = match contact {
        Some(c) => c.surface,
        None => sampler.surface_info_at(actor.position.x, actor.position.z),
    };

    // 1) Velocity. The ground carries anyone standing on it without skis.
    let mut velocity = actor.integrator.update(dt, input, &surface, grounded);
    let held = grounded && !actor.integrator.state().is_skiing;
    if held {
        velocity = actor.integrator.hold_on_surface(&surface, dt);
    }

    // 2) Position.
    let mut next = actor.position + velocity * dt;

    // 3) Keep the feet out of the ground. A held actor that is not jumping off is also
    //    snapped down onto it.
    let snap = held && velocity.dot(&surface.normal) <= DIST_EPS;
    if let Some(ground) = sampler.height_at(next.x, next.z) {
        if next.y < ground || snap {
            next.y = ground;
            let normal = sampler.surface_info_at(next.x, next.z).normal;
            actor.integrator.resolve_ground_contact(normal);
        }
    }

    actor.position = next;
    actor.refresh_contact(sampler);

    // 4) Re-index.
    if grid.insert(actor.id, next).is_none() {
        log::warn!("actor {} left the grid at {next:?}", actor.id);
    }
}
