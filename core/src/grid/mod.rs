/*!
Uniform spatial grid over dynamic entities.

Each indexed entity lives in exactly one cubic cell, chosen from its position at the last
`insert`. The grid keeps two maps that must always agree:
- `cells`: coordinate -> cell holding a set of entity ids
- `entity_cells`: entity id -> coordinate of the cell that holds it

Queries enumerate the cells overlapping the query volume and run an exact test on every
candidate, reading positions/bounds through [`SpatialAccess`]. Cost scales with the number of
candidate cells and their occupancy, not with the total entity count.

Empty cells are dropped as soon as their last entity leaves, so `cells` only ever holds
occupied cells.
*/

pub mod access;
pub mod cell;

use std::collections::HashMap;

pub use access::SpatialAccess;
pub use cell::{CellCoord, CellRange, SpatialCell};

use crate::{
    constants::DEFAULT_CELL_SIZE,
    error::{Error, Result},
    types::{EntityId, Vec3, aabb_contains_point, aabb_from_corners, aabb_intersects},
};

/// Grid construction parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridConfig {
    /// Side length of a cell in meters. Pick it close to typical query radii.
    pub cell_size: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
        }
    }
}

impl GridConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(Error::InvalidCellSize(self.cell_size));
        }
        Ok(())
    }
}

/// Work done by one query; used to check that cost tracks local density.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueryStats {
    /// Occupied cells whose entity sets were scanned.
    pub cells_visited: usize,
    /// Entities that went through the exact test.
    pub candidates_tested: usize,
}

/// Occupancy summary for debug overlays and logs.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GridStats {
    pub cell_size: f32,
    pub cell_count: usize,
    pub entity_count: usize,
    pub max_cell_occupancy: usize,
}

#[derive(Clone, Debug)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<CellCoord, SpatialCell>,
    entity_cells: HashMap<EntityId, CellCoord>,
}

impl SpatialGrid {
    pub fn new(config: GridConfig) -> Result<Self> {
        config
            .validate()
            .inspect_err(|e| log::warn!("rejecting grid config: {e}"))?;
        log::debug!("spatial grid created with cell size {}", config.cell_size);
        Ok(Self {
            cell_size: config.cell_size,
            cells: HashMap::new(),
            entity_cells: HashMap::new(),
        })
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Cell coordinate that `position` maps to.
    #[inline]
    pub fn cell_coord(&self, position: Vec3) -> CellCoord {
        CellCoord::from_position(position, self.cell_size)
    }

    /// Index `entity` at `position`, moving it out of its previous cell if needed.
    ///
    /// Re-inserting into the same cell changes nothing. Non-finite positions are rejected
    /// (the entity keeps its previous cell, if any) and `None` is returned.
    pub fn insert(&mut self, entity: EntityId, position: Vec3) -> Option<CellCoord> {
        if !position.iter().all(|v| v.is_finite()) {
            log::warn!(
                "ignoring grid insert of entity {entity} at non-finite position {position:?}"
            );
            return None;
        }

        let coord = self.cell_coord(position);
        match self.entity_cells.get(&entity).copied() {
            Some(old) if old == coord => return Some(coord),
            Some(old) => {
                log::trace!("entity {entity} moved from cell {old:?} to {coord:?}");
                self.detach(entity, old);
            }
            None => {}
        }

        let cell_size = self.cell_size;
        self.cells
            .entry(coord)
            .or_insert_with(|| SpatialCell::new(coord, cell_size))
            .entities
            .insert(entity);
        self.entity_cells.insert(entity, coord);
        Some(coord)
    }

    /// Remove `entity` from the grid. Returns `false` if it was not indexed.
    pub fn remove(&mut self, entity: EntityId) -> bool {
        match self.entity_cells.remove(&entity) {
            Some(coord) => {
                self.detach(entity, coord);
                true
            }
            None => false,
        }
    }

    /// Drop every cell and entity mapping.
    pub fn clear(&mut self) {
        log::debug!(
            "clearing spatial grid ({} entities in {} cells)",
            self.entity_cells.len(),
            self.cells.len()
        );
        self.cells.clear();
        self.entity_cells.clear();
    }

    /// Take `entity` out of the set of the cell at `coord`, pruning the cell if it empties.
    fn detach(&mut self, entity: EntityId, coord: CellCoord) {
        if let Some(cell) = self.cells.get_mut(&coord) {
            cell.entities.remove(&entity);
            if cell.entities.is_empty() {
                self.cells.remove(&coord);
            }
        }
    }

    #[inline]
    pub fn cell_of(&self, entity: EntityId) -> Option<CellCoord> {
        self.entity_cells.get(&entity).copied()
    }

    #[inline]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.entity_cells.contains_key(&entity)
    }

    /// Number of indexed entities.
    #[inline]
    pub fn len(&self) -> usize {
        self.entity_cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entity_cells.is_empty()
    }

    /// Number of occupied cells.
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn cell(&self, coord: CellCoord) -> Option<&SpatialCell> {
        self.cells.get(&coord)
    }

    /// Read-only view of every occupied cell, in no particular order.
    pub fn cells(&self) -> impl Iterator<Item = &SpatialCell> {
        self.cells.values()
    }

    pub fn stats(&self) -> GridStats {
        GridStats {
            cell_size: self.cell_size,
            cell_count: self.cells.len(),
            entity_count: self.entity_cells.len(),
            max_cell_occupancy: self.cells.values().map(SpatialCell::len).max().unwrap_or(0),
        }
    }

    /// Entities within `radius` of `center` (inclusive). Each entity appears at most once;
    /// order carries no meaning.
    pub fn query_radius(
        &self,
        center: Vec3,
        radius: f32,
        access: &impl SpatialAccess,
    ) -> Vec<EntityId> {
        self.query_radius_with_stats(center, radius, access).0
    }

    pub fn query_radius_with_stats(
        &self,
        center: Vec3,
        radius: f32,
        access: &impl SpatialAccess,
    ) -> (Vec<EntityId>, QueryStats) {
        let mut out = Vec::new();
        if radius.is_nan() || radius < 0.0 || !center.iter().all(|v| v.is_finite()) {
            return (out, QueryStats::default());
        }

        let extent = Vec3::repeat(radius);
        let range = CellRange::covering(center - extent, center + extent, self.cell_size);
        let radius_sq = radius * radius;

        let stats = self.scan(range, |entity| {
            if let Some(p) = access.position(entity) {
                if (p - center).norm_squared() <= radius_sq {
                    out.push(entity);
                }
            }
        });
        (out, stats)
    }

    /// Entities overlapping the box with corners `min` and `max` (any order).
    ///
    /// Entities with bounds are tested box-vs-box; the rest are tested by position. Candidates
    /// come from the cells the box covers, keyed by each entity's indexed position.
    pub fn query_aabb(&self, min: Vec3, max: Vec3, access: &impl SpatialAccess) -> Vec<EntityId> {
        self.query_aabb_with_stats(min, max, access).0
    }

    pub fn query_aabb_with_stats(
        &self,
        min: Vec3,
        max: Vec3,
        access: &impl SpatialAccess,
    ) -> (Vec<EntityId>, QueryStats) {
        let mut out = Vec::new();
        if !min.iter().chain(max.iter()).all(|v| v.is_finite()) {
            return (out, QueryStats::default());
        }

        let query = aabb_from_corners(min, max);
        let range = CellRange::covering(query.mins.coords, query.maxs.coords, self.cell_size);

        let stats = self.scan(range, |entity| {
            let hit = match access.bounds(entity) {
                Some(bounds) => aabb_intersects(&bounds, &query),
                None => access
                    .position(entity)
                    .is_some_and(|p| aabb_contains_point(&query, &p)),
            };
            if hit {
                out.push(entity);
            }
        });
        (out, stats)
    }

    /// Feed every entity of every occupied cell in `range` to `visit`.
    ///
    /// Small ranges are walked coordinate by coordinate. When the range holds more coordinates
    /// than there are occupied cells, the occupied cells are filtered instead.
    fn scan(&self, range: CellRange, mut visit: impl FnMut(EntityId)) -> QueryStats {
        let mut stats = QueryStats::default();
        let mut take = |cell: &SpatialCell| {
            stats.cells_visited += 1;
            stats.candidates_tested += cell.entities.len();
            for &entity in &cell.entities {
                visit(entity);
            }
        };

        if range.volume() > self.cells.len() as u64 {
            self.cells
                .values()
                .filter(|cell| range.contains(&cell.coord()))
                .for_each(&mut take);
        } else {
            range
                .iter()
                .filter_map(|coord| self.cells.get(&coord))
                .for_each(&mut take);
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use super::*;
    use crate::types::{Aabb, Point3};

    fn grid(cell_size: f32) -> SpatialGrid {
        SpatialGrid::new(GridConfig { cell_size }).unwrap()
    }

    /// Deterministic xorshift so the randomized tests are reproducible.
    struct Rng(u64);

    impl Rng {
        fn next_u64(&mut self) -> u64 {
            let mut x = self.0;
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            self.0 = x;
            x
        }

        fn range(&mut self, lo: f32, hi: f32) -> f32 {
            let unit = (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32;
            lo + unit * (hi - lo)
        }

        fn point(&mut self, extent: f32) -> Vec3 {
            Vec3::new(
                self.range(-extent, extent),
                self.range(-extent, extent),
                self.range(-extent, extent),
            )
        }
    }

    fn assert_consistent(grid: &SpatialGrid) {
        for (entity, coord) in &grid.entity_cells {
            let cell = grid.cells.get(coord).expect("mapped cell must exist");
            assert!(cell.entities.contains(entity));
        }
        let mut seen = HashSet::new();
        for (coord, cell) in &grid.cells {
            assert_eq!(cell.coord(), *coord);
            assert!(!cell.is_empty(), "empty cells are pruned");
            for entity in &cell.entities {
                assert!(seen.insert(*entity), "entity {entity} in two cells");
                assert_eq!(grid.entity_cells.get(entity), Some(coord));
            }
        }
        assert_eq!(seen.len(), grid.len());
    }

    #[test]
    fn rejects_invalid_cell_size() {
        for size in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            assert!(SpatialGrid::new(GridConfig { cell_size: size }).is_err());
        }
        assert_eq!(
            SpatialGrid::new(GridConfig { cell_size: 0.0 }).unwrap_err(),
            Error::InvalidCellSize(0.0)
        );
    }

    #[test]
    fn insert_move_remove_keep_maps_consistent() {
        let mut g = grid(4.0);
        let mut rng = Rng(0x9e37_79b9_7f4a_7c15);

        for _ in 0..2000 {
            let entity = rng.next_u64() % 64;
            match rng.next_u64() % 4 {
                0 => {
                    g.remove(entity);
                }
                _ => {
                    g.insert(entity, rng.point(30.0));
                }
            }
            assert_consistent(&g);
        }
    }

    #[test]
    fn insert_and_remove_are_idempotent() {
        let mut g = grid(10.0);
        let a = g.insert(7, Vec3::new(1.0, 2.0, 3.0)).unwrap();
        let b = g.insert(7, Vec3::new(9.0, 0.5, 9.9)).unwrap();
        assert_eq!(a, b);
        assert_eq!(g.cell(a).unwrap().len(), 1);

        let moved = g.insert(7, Vec3::new(-1.0, 2.0, 3.0)).unwrap();
        assert_eq!(moved, CellCoord::new(-1, 0, 0));
        assert!(g.cell(a).is_none(), "old cell pruned after move");
        assert_eq!(g.cell_count(), 1);

        assert!(g.remove(7));
        assert!(!g.remove(7));
        assert!(g.is_empty());
        assert_eq!(g.cell_count(), 0);
        assert_consistent(&g);
    }

    #[test]
    fn non_finite_insert_keeps_previous_cell() {
        let mut g = grid(10.0);
        g.insert(1, Vec3::new(5.0, 5.0, 5.0));
        assert_eq!(g.insert(1, Vec3::new(f32::NAN, 0.0, 0.0)), None);
        assert_eq!(g.cell_of(1), Some(CellCoord::new(0, 0, 0)));
        assert_eq!(g.insert(2, Vec3::new(f32::INFINITY, 0.0, 0.0)), None);
        assert!(!g.contains(2));
    }

    #[test]
    fn radius_query_matches_brute_force() {
        let mut g = grid(5.0);
        let mut rng = Rng(42);
        let mut positions: HashMap<EntityId, Vec3> = HashMap::new();
        for id in 0..500 {
            let p = rng.point(40.0);
            positions.insert(id, p);
            g.insert(id, p);
        }

        for _ in 0..50 {
            let center = rng.point(45.0);
            let radius = rng.range(0.0, 20.0);
            let got: HashSet<_> = g.query_radius(center, radius, &positions).into_iter().collect();
            let expected: HashSet<_> = positions
                .iter()
                .filter(|(_, p)| (**p - center).norm_squared() <= radius * radius)
                .map(|(id, _)| *id)
                .collect();
            assert_eq!(got, expected);
        }
    }

    #[test]
    fn radius_boundary_is_inclusive_and_results_are_unique() {
        let mut g = grid(1.0);
        let positions: HashMap<EntityId, Vec3> = [
            (1, Vec3::new(3.0, 0.0, 0.0)),
            (2, Vec3::new(3.001, 0.0, 0.0)),
            (3, Vec3::new(0.0, 0.0, 0.0)),
        ]
        .into_iter()
        .collect();
        for (id, p) in &positions {
            g.insert(*id, *p);
        }

        let mut got = g.query_radius(Vec3::zeros(), 3.0, &positions);
        got.sort_unstable();
        assert_eq!(got, vec![1, 3]);
    }

    #[test]
    fn huge_radius_scans_live_cells() {
        let mut g = grid(1.0);
        let positions: HashMap<EntityId, Vec3> = (0..10)
            .map(|i| (i, Vec3::new(i as f32 * 100.0, 0.0, 0.0)))
            .collect();
        for (id, p) in &positions {
            g.insert(*id, *p);
        }

        let (found, stats) = g.query_radius_with_stats(Vec3::zeros(), 1.0e6, &positions);
        assert_eq!(found.len(), 10);
        assert_eq!(stats.cells_visited, 10);
        assert_eq!(stats.candidates_tested, 10);
    }

    #[test]
    fn cells_visited_independent_of_total_population() {
        // One entity per cell over a 20x20 and a 40x20 patch: same density, double count.
        fn populate(nx: i32, nz: i32) -> (SpatialGrid, HashMap<EntityId, Vec3>) {
            let mut g = grid(10.0);
            let mut positions = HashMap::new();
            let mut id = 0;
            for x in 0..nx {
                for z in 0..nz {
                    let p = Vec3::new(x as f32 * 10.0 + 5.0, 5.0, z as f32 * 10.0 + 5.0);
                    positions.insert(id, p);
                    g.insert(id, p);
                    id += 1;
                }
            }
            (g, positions)
        }

        let center = Vec3::new(100.0, 5.0, 100.0);
        let (small, small_pos) = populate(20, 20);
        let (large, large_pos) = populate(40, 20);
        assert_eq!(large.len(), 2 * small.len());

        let (a, sa) = small.query_radius_with_stats(center, 15.0, &small_pos);
        let (b, sb) = large.query_radius_with_stats(center, 15.0, &large_pos);
        assert_eq!(sa.cells_visited, sb.cells_visited);
        assert_eq!(sa.candidates_tested, sb.candidates_tested);
        assert_eq!(sa.cells_visited, 16);
        assert_eq!(a.len(), b.len());
    }

    #[test]
    fn aabb_query_uses_bounds_then_position() {
        let mut g = grid(2.0);
        let boxes: HashMap<EntityId, Aabb> = [
            // Center outside the query box (but in a covered cell); the box overlaps it.
            (
                1,
                Aabb::new(Point3::new(3.0, 0.0, 0.0), Point3::new(4.5, 1.0, 1.0)),
            ),
            // Fully outside.
            (
                2,
                Aabb::new(Point3::new(8.0, 0.0, 0.0), Point3::new(9.0, 1.0, 1.0)),
            ),
        ]
        .into_iter()
        .collect();
        for (id, b) in &boxes {
            g.insert(*id, b.center().coords);
        }

        let mut got = g.query_aabb(Vec3::new(0.0, 0.0, 0.0), Vec3::new(3.5, 1.0, 1.0), &boxes);
        got.sort_unstable();
        assert_eq!(got, vec![1]);

        // Point entities fall back to a containment test; corners may come in any order.
        let points: HashMap<EntityId, Vec3> =
            [(10, Vec3::new(1.0, 1.0, 1.0)), (11, Vec3::new(5.0, 1.0, 1.0))]
                .into_iter()
                .collect();
        let mut pg = grid(2.0);
        for (id, p) in &points {
            pg.insert(*id, *p);
        }
        let got = pg.query_aabb(Vec3::new(2.0, 2.0, 2.0), Vec3::new(0.0, 0.0, 0.0), &points);
        assert_eq!(got, vec![10]);
    }

    #[test]
    fn stale_entities_without_position_are_skipped() {
        let mut g = grid(10.0);
        g.insert(1, Vec3::zeros());
        let empty: HashMap<EntityId, Vec3> = HashMap::new();
        assert!(g.query_radius(Vec3::zeros(), 5.0, &empty).is_empty());
        assert!(g.query_aabb(Vec3::repeat(-1.0), Vec3::repeat(1.0), &empty).is_empty());
    }

    #[test]
    fn invalid_queries_return_nothing() {
        let mut g = grid(10.0);
        let positions: HashMap<EntityId, Vec3> = [(1, Vec3::zeros())].into_iter().collect();
        g.insert(1, Vec3::zeros());
        assert!(g.query_radius(Vec3::zeros(), -1.0, &positions).is_empty());
        assert!(g.query_radius(Vec3::zeros(), f32::NAN, &positions).is_empty());
        assert!(g
            .query_aabb(Vec3::repeat(f32::NAN), Vec3::zeros(), &positions)
            .is_empty());
    }

    #[test]
    fn clear_and_stats() {
        let mut g = grid(10.0);
        g.insert(1, Vec3::new(1.0, 1.0, 1.0));
        g.insert(2, Vec3::new(2.0, 2.0, 2.0));
        g.insert(3, Vec3::new(25.0, 0.0, 0.0));

        let stats = g.stats();
        assert_eq!(stats.cell_count, 2);
        assert_eq!(stats.entity_count, 3);
        assert_eq!(stats.max_cell_occupancy, 2);
        assert_eq!(g.cells().map(SpatialCell::len).sum::<usize>(), 3);

        g.clear();
        assert!(g.is_empty());
        assert_eq!(g.cell_count(), 0);
        assert!(g.cell_of(1).is_none());
        assert_consistent(&g);
    }
}
