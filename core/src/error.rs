//! Setup-time errors.
//!
//! Only misconfiguration is an error. Queries that land outside the terrain, and
//! lifecycle races such as removing an entity that is not indexed, are ordinary
//! outcomes and are reported through `Option`/flags instead.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("cell size must be finite and greater than zero, got {0}")]
    InvalidCellSize(f32),

    #[error("heightmap needs at least 2x2 samples, got {width}x{depth}")]
    InvalidDimensions { width: usize, depth: usize },

    #[error("heightmap expects {expected} samples, got {actual}")]
    SampleCountMismatch { expected: usize, actual: usize },

    #[error("heightmap sample {index} is not finite")]
    NonFiniteSample { index: usize },

    #[error("height range is invalid: min {min} > max {max} or not finite")]
    InvalidHeightRange { min: f32, max: f32 },

    #[error("invalid scale: {0}")]
    InvalidScale(&'static str),

    #[error("invalid sampler configuration: {0}")]
    InvalidSamplerConfig(&'static str),

    #[error("invalid material region: {0}")]
    InvalidRegion(&'static str),

    #[error("invalid movement configuration: {0}")]
    InvalidMovementConfig(&'static str),
}
