pub mod constants;
pub mod error;
pub mod grid;
pub mod simulation;
pub mod skiing;
pub mod terrain;
pub mod types;
pub mod utils;

pub use error::{Error, Result};
pub use grid::{
    CellCoord, GridConfig, GridStats, QueryStats, SpatialAccess, SpatialCell, SpatialGrid,
};
pub use simulation::{Actor, ActorSpec, SkiWorld};
pub use skiing::{SkiInput, SkiingConfig, SkiingIntegrator, SkiingState};
pub use terrain::{
    GroundContact, HeightmapData, HeightmapStore, MaterialTable, RegionRect, SamplerConfig,
    SurfaceMaterial, TerrainConfig, TerrainHit, TerrainSampler, TerrainSurfaceInfo,
    generate_procedural, load_from_image, sample_bilinear,
};
pub use types::{Aabb, EntityId, Point3, Vec2, Vec3};
