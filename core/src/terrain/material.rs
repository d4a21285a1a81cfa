//! Surface materials and the ordered region table that resolves them.
//!
//! Rectangular regions are tested in registration order and the first match wins. A
//! region-less entry is the terrain-wide base layer: it applies wherever no rectangle matched,
//! regardless of when it was registered. The table default comes last.

use crate::{
    error::{Error, Result},
    types::Vec2,
};

/// Surface material identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SurfaceMaterial {
    #[default]
    Snow = 0,
    Powder = 1,
    Ice = 2,
    Slush = 3,
    Rock = 4,
    Dirt = 5,
    Grass = 6,
}

impl SurfaceMaterial {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Snow => "snow",
            Self::Powder => "powder",
            Self::Ice => "ice",
            Self::Slush => "slush",
            Self::Rock => "rock",
            Self::Dirt => "dirt",
            Self::Grass => "grass",
        }
    }

    /// Typical kinetic friction coefficient for skis on this surface.
    pub fn typical_friction(&self) -> f32 {
        match self {
            Self::Snow => 0.1,
            Self::Powder => 0.2,
            Self::Ice => 0.02,
            Self::Slush => 0.3,
            Self::Rock => 0.8,
            Self::Dirt => 0.6,
            Self::Grass => 0.5,
        }
    }
}

/// Axis-aligned rectangle on the XZ plane, inclusive on all edges.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegionRect {
    pub x1: f32,
    pub z1: f32,
    pub x2: f32,
    pub z2: f32,
}

impl RegionRect {
    /// Build a rectangle from two corners in any order.
    pub fn new(x1: f32, z1: f32, x2: f32, z2: f32) -> Result<Self> {
        if ![x1, z1, x2, z2].iter().all(|v| v.is_finite()) {
            return Err(Error::InvalidRegion("region corners must be finite"));
        }
        Ok(Self {
            x1: x1.min(x2),
            z1: z1.min(z2),
            x2: x1.max(x2),
            z2: z1.max(z2),
        })
    }

    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x1 && p.x <= self.x2 && p.y >= self.z1 && p.y <= self.z2
    }
}

/// One registered material entry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaterialRegion {
    pub material: SurfaceMaterial,
    pub friction: f32,
    /// `None` applies to the whole terrain.
    pub region: Option<RegionRect>,
}

/// Ordered material regions with a global fallback.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialTable {
    regions: Vec<MaterialRegion>,
    default_material: SurfaceMaterial,
    default_friction: f32,
}

impl MaterialTable {
    pub fn new(default_material: SurfaceMaterial, default_friction: f32) -> Self {
        Self {
            regions: Vec::new(),
            default_material,
            default_friction: default_friction.max(0.0),
        }
    }

    /// Register a material region.
    ///
    /// An entry with the same material and region replaces the earlier one in place (keeping
    /// its position in the match order). Anything else is appended.
    pub fn add(
        &mut self,
        material: SurfaceMaterial,
        friction: f32,
        region: Option<RegionRect>,
    ) -> Result<()> {
        if !friction.is_finite() || friction < 0.0 {
            return Err(Error::InvalidRegion("friction must be finite and >= 0"));
        }

        let entry = MaterialRegion {
            material,
            friction,
            region,
        };

        if let Some(existing) = self
            .regions
            .iter_mut()
            .find(|r| r.material == material && r.region == region)
        {
            log::debug!(
                "replacing {} region {:?}: friction {} -> {}",
                material.name(),
                region,
                existing.friction,
                friction
            );
            *existing = entry;
            return Ok(());
        }

        log::debug!(
            "registered {} region {:?} with friction {}",
            material.name(),
            region,
            friction
        );
        self.regions.push(entry);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.regions.clear();
    }

    #[inline]
    pub fn regions(&self) -> &[MaterialRegion] {
        &self.regions
    }

    /// Material and friction at planar position `p`.
    ///
    /// First matching rectangle, else the first region-less entry, else the table default.
    pub fn resolve(&self, p: Vec2) -> (SurfaceMaterial, f32) {
        self.regions
            .iter()
            .find(|r| r.region.is_some_and(|rect| rect.contains(p)))
            .or_else(|| self.regions.iter().find(|r| r.region.is_none()))
            .map(|r| (r.material, r.friction))
            .unwrap_or((self.default_material, self.default_friction))
    }
}
