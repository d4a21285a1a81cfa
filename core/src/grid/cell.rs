//! Cell coordinate helpers.
//!
//! This module centralizes the world-to-cell mapping so it's easy to reason about cell sizing
//! and to test correctness.
//!
//! # Model
//! - Space is split into cubes of side `cell_size` (meters).
//! - A position maps to `floor(position / cell_size)` per axis, stored as `i32`, so negative
//!   coordinates need no offset. Positions beyond the `i32` range saturate to the edge cells.
//! - A cell's world AABB is `[coord * cell_size, (coord + 1) * cell_size]` per axis.

use std::collections::HashSet;

use crate::types::{Aabb, EntityId, Point3, Vec3};

/// Integer grid coordinates of one cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl CellCoord {
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Cell containing `position`.
    #[inline]
    pub fn from_position(position: Vec3, cell_size: f32) -> Self {
        Self {
            x: axis_coord(position.x, cell_size),
            y: axis_coord(position.y, cell_size),
            z: axis_coord(position.z, cell_size),
        }
    }

    /// World position of the cell's minimum corner.
    #[inline]
    pub fn min_corner(&self, cell_size: f32) -> Vec3 {
        Vec3::new(
            self.x as f32 * cell_size,
            self.y as f32 * cell_size,
            self.z as f32 * cell_size,
        )
    }

    /// World-space bounds of the cell.
    #[inline]
    pub fn bounds(&self, cell_size: f32) -> Aabb {
        let min = self.min_corner(cell_size);
        let max = min + Vec3::repeat(cell_size);
        Aabb::new(Point3::from(min), Point3::from(max))
    }
}

#[inline]
fn axis_coord(v: f32, cell_size: f32) -> i32 {
    // `as` saturates out-of-range floats and maps NaN to 0.
    (v / cell_size).floor() as i32
}

/// Inclusive box of cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRange {
    pub min: CellCoord,
    pub max: CellCoord,
}

impl CellRange {
    /// Cells touched by the world-space box `[min, max]`.
    pub fn covering(min: Vec3, max: Vec3, cell_size: f32) -> Self {
        Self {
            min: CellCoord::from_position(min, cell_size),
            max: CellCoord::from_position(max, cell_size),
        }
    }

    /// Number of coordinates inside the range.
    pub fn volume(&self) -> u64 {
        let span = |a: i32, b: i32| (i64::from(b) - i64::from(a) + 1).max(0) as u64;
        span(self.min.x, self.max.x)
            .saturating_mul(span(self.min.y, self.max.y))
            .saturating_mul(span(self.min.z, self.max.z))
    }

    #[inline]
    pub fn contains(&self, c: &CellCoord) -> bool {
        c.x >= self.min.x
            && c.x <= self.max.x
            && c.y >= self.min.y
            && c.y <= self.max.y
            && c.z >= self.min.z
            && c.z <= self.max.z
    }

    /// Iterate every coordinate in the range, X fastest.
    pub fn iter(&self) -> impl Iterator<Item = CellCoord> + '_ {
        (self.min.z..=self.max.z).flat_map(move |z| {
            (self.min.y..=self.max.y)
                .flat_map(move |y| (self.min.x..=self.max.x).map(move |x| CellCoord::new(x, y, z)))
        })
    }
}

/// One occupied cell: its coordinates, world bounds and the entities inside it.
#[derive(Clone, Debug)]
pub struct SpatialCell {
    coord: CellCoord,
    bounds: Aabb,
    pub(crate) entities: HashSet<EntityId>,
}

impl SpatialCell {
    pub(crate) fn new(coord: CellCoord, cell_size: f32) -> Self {
        Self {
            coord,
            bounds: coord.bounds(cell_size),
            entities: HashSet::new(),
        }
    }

    #[inline]
    pub fn coord(&self) -> CellCoord {
        self.coord
    }

    #[inline]
    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    #[inline]
    pub fn entities(&self) -> &HashSet<EntityId> {
        &self.entities
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_positions_floor_toward_negative_infinity() {
        let c = CellCoord::from_position(Vec3::new(-0.1, 0.0, 9.99), 10.0);
        assert_eq!(c, CellCoord::new(-1, 0, 0));

        let c = CellCoord::from_position(Vec3::new(-10.0, 10.0, -10.01), 10.0);
        assert_eq!(c, CellCoord::new(-1, 1, -2));
    }

    #[test]
    fn bounds_follow_coordinates() {
        let b = CellCoord::new(-2, 0, 3).bounds(5.0);
        assert_eq!(b.mins, Point3::new(-10.0, 0.0, 15.0));
        assert_eq!(b.maxs, Point3::new(-5.0, 5.0, 20.0));
    }

    #[test]
    fn extreme_positions_saturate() {
        let c = CellCoord::from_position(Vec3::new(1.0e30, -1.0e30, f32::NAN), 1.0);
        assert_eq!(c, CellCoord::new(i32::MAX, i32::MIN, 0));
    }

    #[test]
    fn range_iterates_every_coordinate_once() {
        let range = CellRange::covering(Vec3::new(-5.0, 0.0, 0.0), Vec3::new(5.0, 9.0, 19.0), 10.0);
        assert_eq!(range.volume(), 2 * 1 * 2);

        let coords: Vec<_> = range.iter().collect();
        assert_eq!(coords.len(), 4);
        assert!(coords.iter().all(|c| range.contains(c)));
        assert!(!range.contains(&CellCoord::new(1, 0, 0)));
    }

    #[test]
    fn inverted_range_is_empty() {
        let range = CellRange {
            min: CellCoord::new(1, 0, 0),
            max: CellCoord::new(0, 0, 0),
        };
        assert_eq!(range.volume(), 0);
        assert_eq!(range.iter().count(), 0);
    }
}
