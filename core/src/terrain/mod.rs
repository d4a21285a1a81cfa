/*!
Terrain root module.

Answers "what does the ground look like here?" from a heightmap. The code is split for clarity:

- heightmap: normalized sample storage, procedural/image loading, bilinear sampling
- material:  surface materials and the ordered region table that resolves friction
- config:    immutable sampler/terrain configuration
- sampler:   world-space height, normal, slope and material queries
- ground:    grounded checks for actors with a footprint radius
- raycast:   ray vs height-field intersection
*/

pub mod config;
pub mod ground;
pub mod heightmap;
pub mod material;
pub mod raycast;
pub mod sampler;

pub use config::{SamplerConfig, TerrainConfig};
pub use ground::GroundContact;
pub use heightmap::{
    HeightmapData, HeightmapImage, HeightmapStore, generate_procedural, load_from_image,
    sample_bilinear,
};
pub use material::{MaterialRegion, MaterialTable, RegionRect, SurfaceMaterial};
pub use raycast::TerrainHit;
pub use sampler::{TerrainSampler, TerrainSurfaceInfo};
