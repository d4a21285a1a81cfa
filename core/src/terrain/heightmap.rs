//! Heightmap storage, generation and bilinear sampling.
//!
//! # Model
//! - Samples are stored row-major: `index = gz * width + gx`.
//! - Every stored sample is normalized into `[0, 1]`. World height is recovered with
//!   `(min_height + sample * (max_height - min_height)) * vertical_scale`.
//! - `horizontal_scale` is the spacing between adjacent samples in meters, per axis (X, Z).
//! - The terrain is centered on the world origin, so X spans
//!   `[-(width - 1) * sx / 2, (width - 1) * sx / 2]` and Z likewise with `depth`.
//!
//! A [`HeightmapData`] is immutable once built. [`HeightmapStore`] owns at most one of them
//! and is the only place a heightmap is swapped in or out.

use noise::{NoiseFn, Perlin};
use num_traits::{AsPrimitive, PrimInt, Unsigned};

use crate::{
    constants::{PROCEDURAL_BASE_FREQUENCY, PROCEDURAL_OCTAVES},
    error::{Error, Result},
    types::Vec2,
};

/// Normalized height samples plus the metadata needed to place them in the world.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightmapData {
    width: usize,
    depth: usize,
    heights: Vec<f32>,
    min_height: f32,
    max_height: f32,
    horizontal_scale: Vec2,
    vertical_scale: f32,
}

impl HeightmapData {
    /// Build a heightmap from samples that are already normalized.
    ///
    /// Samples are clamped into `[0, 1]`; non-finite samples are rejected.
    pub fn from_normalized(
        width: usize,
        depth: usize,
        mut heights: Vec<f32>,
        min_height: f32,
        max_height: f32,
        horizontal_scale: Vec2,
        vertical_scale: f32,
    ) -> Result<Self> {
        validate_layout(width, depth, heights.len())?;
        validate_ranges(min_height, max_height, horizontal_scale, vertical_scale)?;

        for (index, h) in heights.iter_mut().enumerate() {
            if !h.is_finite() {
                return Err(Error::NonFiniteSample { index });
            }
            *h = h.clamp(0.0, 1.0);
        }

        Ok(Self {
            width,
            depth,
            heights,
            min_height,
            max_height,
            horizontal_scale,
            vertical_scale,
        })
    }

    /// Number of samples along X.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of samples along Z.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    #[inline]
    pub fn min_height(&self) -> f32 {
        self.min_height
    }

    #[inline]
    pub fn max_height(&self) -> f32 {
        self.max_height
    }

    #[inline]
    pub fn horizontal_scale(&self) -> Vec2 {
        self.horizontal_scale
    }

    #[inline]
    pub fn vertical_scale(&self) -> f32 {
        self.vertical_scale
    }

    /// Normalized sample at integer grid coordinates (clamped to the grid).
    #[inline]
    pub fn sample_at(&self, gx: usize, gz: usize) -> f32 {
        let gx = gx.min(self.width - 1);
        let gz = gz.min(self.depth - 1);
        self.heights[gz * self.width + gx]
    }

    /// World-space size of the terrain along X and Z (meters).
    #[inline]
    pub fn world_extent(&self) -> Vec2 {
        Vec2::new(
            (self.width - 1) as f32 * self.horizontal_scale.x,
            (self.depth - 1) as f32 * self.horizontal_scale.y,
        )
    }

    /// Convert a world XZ position into normalized `[0, 1]` grid coordinates.
    ///
    /// Returns `None` when the position is outside the terrain footprint.
    pub fn world_to_normalized(&self, world_x: f32, world_z: f32) -> Option<(f32, f32)> {
        let extent = self.world_extent();
        let u = (world_x + extent.x * 0.5) / extent.x;
        let v = (world_z + extent.y * 0.5) / extent.y;

        if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
            return None;
        }

        Some((u, v))
    }

    /// World XZ position of grid vertex `(gx, gz)`.
    #[inline]
    pub fn grid_to_world(&self, gx: usize, gz: usize) -> Vec2 {
        let extent = self.world_extent();
        Vec2::new(
            gx as f32 * self.horizontal_scale.x - extent.x * 0.5,
            gz as f32 * self.horizontal_scale.y - extent.y * 0.5,
        )
    }

    /// Map a normalized sample to a world-space Y value.
    #[inline]
    pub fn denormalize(&self, sample: f32) -> f32 {
        (self.min_height + sample * (self.max_height - self.min_height)) * self.vertical_scale
    }

    /// Lowest and highest world-space Y the terrain can reach.
    #[inline]
    pub fn world_height_range(&self) -> (f32, f32) {
        let a = self.denormalize(0.0);
        let b = self.denormalize(1.0);
        (a.min(b), a.max(b))
    }

    /// Bilinear sample at normalized coordinates; see [`sample_bilinear`].
    #[inline]
    pub fn sample_bilinear(&self, x_norm: f32, z_norm: f32) -> f32 {
        sample_bilinear(self, x_norm, z_norm)
    }
}

/// Fill a `width x depth` grid with seeded fractal Perlin noise.
///
/// The generated field is renormalized into `[0, 1]` using its own observed min/max.
/// `min_height`/`max_height` describe the target world range and are only applied when
/// heights are queried. The same seed always produces bit-identical samples.
pub fn generate_procedural(
    width: usize,
    depth: usize,
    seed: u32,
    min_height: f32,
    max_height: f32,
    horizontal_scale: Vec2,
    vertical_scale: f32,
) -> Result<HeightmapData> {
    validate_layout(width, depth, width.saturating_mul(depth))?;
    validate_ranges(min_height, max_height, horizontal_scale, vertical_scale)?;

    let perlin = Perlin::new(seed);
    let mut raw = Vec::with_capacity(width * depth);

    for gz in 0..depth {
        for gx in 0..width {
            raw.push(fractal_noise(&perlin, gx as f64, gz as f64));
        }
    }

    let (lo, hi) = raw
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &h| {
            (lo.min(h), hi.max(h))
        });
    let range = hi - lo;

    let heights = if range > f32::EPSILON {
        raw.iter().map(|h| (h - lo) / range).collect()
    } else {
        vec![0.0; raw.len()]
    };

    log::debug!(
        "generated {}x{} heightmap (seed {}, raw range {:.4}..{:.4})",
        width,
        depth,
        seed,
        lo,
        hi
    );

    HeightmapData::from_normalized(
        width,
        depth,
        heights,
        min_height,
        max_height,
        horizontal_scale,
        vertical_scale,
    )
}

/// Raw pixel data handed over by an external image decoder.
///
/// `pixels` is interleaved with `channels` values per pixel; only the first channel is read.
#[derive(Clone, Copy, Debug)]
pub struct HeightmapImage<'a, P> {
    pub pixels: &'a [P],
    pub channels: usize,
    pub width: usize,
    pub depth: usize,
}

/// Interpret the first channel of `image` as height.
///
/// Samples are normalized by the maximum value the channel type can represent
/// (255 for `u8`, 65535 for `u16`).
pub fn load_from_image<P>(
    image: HeightmapImage<'_, P>,
    min_height: f32,
    max_height: f32,
    horizontal_scale: Vec2,
    vertical_scale: f32,
) -> Result<HeightmapData>
where
    P: PrimInt + Unsigned + AsPrimitive<f32>,
{
    let HeightmapImage {
        pixels,
        channels,
        width,
        depth,
    } = image;

    if channels == 0 {
        return Err(Error::InvalidDimensions { width, depth });
    }

    let expected = width.saturating_mul(depth).saturating_mul(channels);
    if pixels.len() != expected {
        return Err(Error::SampleCountMismatch {
            expected,
            actual: pixels.len(),
        });
    }

    let channel_max: f32 = P::max_value().as_();
    let heights = pixels
        .chunks_exact(channels)
        .map(|px| px[0].as_() / channel_max)
        .collect();

    HeightmapData::from_normalized(
        width,
        depth,
        heights,
        min_height,
        max_height,
        horizontal_scale,
        vertical_scale,
    )
}

/// Bilinearly interpolate `data` at normalized `[0, 1]` coordinates.
///
/// Inputs outside `[0, 1]` clamp to the grid edge. Sampling exactly on a grid vertex returns
/// that vertex's stored value.
pub fn sample_bilinear(data: &HeightmapData, x_norm: f32, z_norm: f32) -> f32 {
    let x_norm = if x_norm.is_nan() { 0.0 } else { x_norm.clamp(0.0, 1.0) };
    let z_norm = if z_norm.is_nan() { 0.0 } else { z_norm.clamp(0.0, 1.0) };

    let gx = x_norm * (data.width - 1) as f32;
    let gz = z_norm * (data.depth - 1) as f32;

    let x0 = (gx.floor() as usize).min(data.width - 1);
    let z0 = (gz.floor() as usize).min(data.depth - 1);
    let x1 = (x0 + 1).min(data.width - 1);
    let z1 = (z0 + 1).min(data.depth - 1);

    let fx = gx - x0 as f32;
    let fz = gz - z0 as f32;

    let h00 = data.sample_at(x0, z0);
    let h10 = data.sample_at(x1, z0);
    let h01 = data.sample_at(x0, z1);
    let h11 = data.sample_at(x1, z1);

    let h0 = h00 * (1.0 - fx) + h10 * fx;
    let h1 = h01 * (1.0 - fx) + h11 * fx;
    h0 * (1.0 - fz) + h1 * fz
}

/// Owner of the currently loaded heightmap.
///
/// Loading and unloading take `&mut self`, so no sampler query can observe a half-loaded
/// heightmap.
#[derive(Clone, Debug, Default)]
pub struct HeightmapStore {
    data: Option<HeightmapData>,
}

impl HeightmapStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the loaded heightmap, returning the previous one if any.
    pub fn load(&mut self, data: HeightmapData) -> Option<HeightmapData> {
        log::info!(
            "terrain loaded: {}x{} samples, extent {:?}",
            data.width(),
            data.depth(),
            data.world_extent()
        );
        self.data.replace(data)
    }

    pub fn unload(&mut self) -> Option<HeightmapData> {
        let previous = self.data.take();
        if previous.is_some() {
            log::info!("terrain unloaded");
        }
        previous
    }

    #[inline]
    pub fn data(&self) -> Option<&HeightmapData> {
        self.data.as_ref()
    }

    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.data.is_some()
    }
}

/// Sum of Perlin octaves at grid position `(x, z)`; frequency doubles and amplitude halves
/// per octave.
fn fractal_noise(perlin: &Perlin, x: f64, z: f64) -> f32 {
    let mut height = 0.0f64;
    let mut amplitude = 1.0f64;
    let mut frequency = PROCEDURAL_BASE_FREQUENCY;

    for _ in 0..PROCEDURAL_OCTAVES {
        height += amplitude * perlin.get([x * frequency, z * frequency]);
        amplitude *= 0.5;
        frequency *= 2.0;
    }

    height as f32
}

fn validate_layout(width: usize, depth: usize, sample_count: usize) -> Result<()> {
    if width < 2 || depth < 2 {
        log::warn!("rejecting heightmap with {}x{} samples", width, depth);
        return Err(Error::InvalidDimensions { width, depth });
    }

    let Some(expected) = width.checked_mul(depth) else {
        log::warn!("rejecting heightmap with {}x{} samples", width, depth);
        return Err(Error::InvalidDimensions { width, depth });
    };
    if sample_count != expected {
        return Err(Error::SampleCountMismatch {
            expected,
            actual: sample_count,
        });
    }

    Ok(())
}

fn validate_ranges(
    min_height: f32,
    max_height: f32,
    horizontal_scale: Vec2,
    vertical_scale: f32,
) -> Result<()> {
    if !min_height.is_finite() || !max_height.is_finite() || min_height > max_height {
        return Err(Error::InvalidHeightRange {
            min: min_height,
            max: max_height,
        });
    }
    if !horizontal_scale.iter().all(|s| s.is_finite() && *s > 0.0) {
        return Err(Error::InvalidScale(
            "horizontal scale must be finite and > 0",
        ));
    }
    if !vertical_scale.is_finite() || vertical_scale < 0.0 {
        return Err(Error::InvalidScale("vertical scale must be finite and >= 0"));
    }
    Ok(())
}
