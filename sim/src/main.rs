//! # Slope simulation runner
//!
//! Headless driver for the movement core: builds a procedural terrain, drops a line of skiers
//! on it and runs a fixed number of ticks, logging progress once per simulated second.
//!
//! ## Usage
//!
//! ```bash
//! # Defaults: 129x129 terrain, 16 skiers, 10 seconds at 60 Hz
//! slope-sim
//!
//! # Different seed, more skiers, an ice patch in the middle
//! slope-sim --seed 7 --actors 64 --ice
//!
//! # Verbose per-actor logging
//! RUST_LOG=debug slope-sim --ticks 120
//! ```

use std::collections::HashMap;

use clap::Parser;
use slope_core::{
    ActorSpec, EntityId, GridConfig, RegionRect, SkiInput, SkiWorld, SpatialGrid, SurfaceMaterial,
    TerrainConfig, TerrainSampler, Vec2, Vec3, terrain::MaterialRegion,
};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "slope-sim")]
#[command(about = "Headless skiing simulation over procedural terrain")]
#[command(version)]
struct Args {
    /// Terrain noise seed
    #[arg(long, default_value_t = 42)]
    seed: u32,

    /// Heightmap samples per side
    #[arg(long, default_value_t = 129)]
    size: usize,

    /// Meters between adjacent heightmap samples
    #[arg(long, default_value_t = 2.0)]
    spacing: f32,

    /// Height of the highest terrain point (meters)
    #[arg(long, default_value_t = 60.0)]
    relief: f32,

    /// Number of skiers
    #[arg(short, long, default_value_t = 16)]
    actors: usize,

    /// Ticks to simulate
    #[arg(short, long, default_value_t = 600)]
    ticks: u32,

    /// Ticks per simulated second
    #[arg(long, default_value_t = 60)]
    tick_rate: u32,

    /// Spatial grid cell size (meters)
    #[arg(long, default_value_t = 10.0)]
    cell_size: f32,

    /// Radius for the end-of-run neighbor report (meters)
    #[arg(long, default_value_t = 15.0)]
    neighbor_radius: f32,

    /// Put a 40m ice patch in the middle of the terrain
    #[arg(long)]
    ice: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(err) = run(&args) {
        log::error!("simulation setup failed: {err}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> slope_core::Result<()> {
    let mut world = build_world(args)?;

    let Some(bounds) = world.sampler().bounds() else {
        log::warn!("no terrain loaded, nothing to simulate");
        return Ok(());
    };
    log::info!(
        "terrain {}x{} samples, x [{:.0}, {:.0}] z [{:.0}, {:.0}] y [{:.1}, {:.1}]",
        args.size,
        args.size,
        bounds.mins.x,
        bounds.maxs.x,
        bounds.mins.z,
        bounds.maxs.z,
        bounds.mins.y,
        bounds.maxs.y
    );

    let start = Vec3::new(bounds.mins.x * 0.6, bounds.mins.y, 0.0);
    let ids = spawn_line(&mut world, args.actors, start, bounds.maxs.z * 0.8)?;
    log::info!("spawned {} skiers", ids.len());

    let tick_rate = args.tick_rate.max(1);
    let dt = 1.0 / tick_rate as f32;
    let mut inputs: HashMap<EntityId, SkiInput> = HashMap::with_capacity(ids.len());

    for tick in 0..args.ticks {
        let t = tick as f32 * dt;
        for (i, id) in ids.iter().enumerate() {
            inputs.insert(*id, weave(t, i));
        }
        world.step(dt, &inputs);

        if (tick + 1) % tick_rate == 0 {
            log_progress(&world, t + dt);
        }
    }

    log_summary(&world, args.neighbor_radius);
    Ok(())
}

fn build_world(args: &Args) -> slope_core::Result<SkiWorld> {
    let mut config = TerrainConfig {
        width: args.size,
        depth: args.size,
        seed: args.seed,
        max_height: args.relief,
        horizontal_scale: Vec2::new(args.spacing, args.spacing),
        ..TerrainConfig::default()
    };
    if args.ice {
        config.materials.push(MaterialRegion {
            material: SurfaceMaterial::Ice,
            friction: SurfaceMaterial::Ice.typical_friction(),
            region: Some(RegionRect::new(-20.0, -20.0, 20.0, 20.0)?),
        });
    }

    let sampler = TerrainSampler::from_config(&config)?;
    let grid = SpatialGrid::new(GridConfig {
        cell_size: args.cell_size,
    })?;
    Ok(SkiWorld::new(sampler, grid))
}

/// Spawn `count` skiers evenly spaced along Z through `start`, between `-z_half` and `z_half`.
///
/// `start.y` is the terrain floor; the world lifts each skier onto the surface.
fn spawn_line(
    world: &mut SkiWorld,
    count: usize,
    start: Vec3,
    z_half: f32,
) -> slope_core::Result<Vec<EntityId>> {
    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        let f = if count > 1 {
            i as f32 / (count - 1) as f32
        } else {
            0.5
        };
        let z = -z_half + f * 2.0 * z_half;
        let id = world.spawn(Vec3::new(start.x, start.y, z), ActorSpec::default())?;
        ids.push(id);
    }
    Ok(ids)
}

/// Skiing with a gentle push and a slow left/right weave, phase-shifted per skier.
fn weave(t: f32, index: usize) -> SkiInput {
    SkiInput {
        forward: 1.0,
        right: (t * 1.5 + index as f32).sin() * 0.5,
        ski: true,
        jump: false,
    }
}

fn log_progress(world: &SkiWorld, t: f32) {
    let mut fastest = 0.0f32;
    let mut total = 0.0f32;
    let mut grounded = 0;
    for actor in world.actors() {
        let speed = actor.state().speed;
        fastest = fastest.max(speed);
        total += speed;
        if actor.is_grounded() {
            grounded += 1;
        }
    }
    let count = world.actor_count().max(1) as f32;
    let grid = world.grid().stats();
    log::info!(
        "t={t:.1}s mean {:.1} m/s, fastest {fastest:.1} m/s, grounded {grounded}/{}, {} cells (max {} per cell)",
        total / count,
        world.actor_count(),
        grid.cell_count,
        grid.max_cell_occupancy
    );
}

fn log_summary(world: &SkiWorld, neighbor_radius: f32) {
    for actor in world.actors() {
        let p = actor.position();
        let neighbors = world
            .query_radius(p, neighbor_radius)
            .into_iter()
            .filter(|id| *id != actor.id())
            .count();
        let surface = actor.surface();
        let ground = if surface.exists {
            surface.material.name()
        } else {
            "off terrain"
        };
        log::info!(
            "skier {}: ({:.1}, {:.1}, {:.1}) {:.1} m/s heading {:.0} deg on {ground}, {neighbors} within {neighbor_radius}m",
            actor.id(),
            p.x,
            p.y,
            p.z,
            actor.state().speed,
            actor.state().yaw().to_degrees()
        );
    }
}
