use std::collections::HashMap;

use crate::types::{Aabb, EntityId, Vec3};

/// Read access to entity placement, as needed by grid queries.
///
/// The grid stores ids only; positions and bounds are looked up through this trait at query
/// time, so callers implement it once per entity container.
pub trait SpatialAccess {
    /// Current world position of `entity`, or `None` if the entity no longer exists.
    fn position(&self, entity: EntityId) -> Option<Vec3>;

    /// World-space bounds of `entity`, if it has any. AABB queries fall back to a point test
    /// on [`SpatialAccess::position`] when this returns `None`.
    fn bounds(&self, entity: EntityId) -> Option<Aabb> {
        let _ = entity;
        None
    }
}

impl<T: SpatialAccess + ?Sized> SpatialAccess for &T {
    #[inline]
    fn position(&self, entity: EntityId) -> Option<Vec3> {
        (**self).position(entity)
    }

    #[inline]
    fn bounds(&self, entity: EntityId) -> Option<Aabb> {
        (**self).bounds(entity)
    }
}

/// Point entities.
impl SpatialAccess for HashMap<EntityId, Vec3> {
    #[inline]
    fn position(&self, entity: EntityId) -> Option<Vec3> {
        self.get(&entity).copied()
    }
}

/// Box entities; the position is the box center.
impl SpatialAccess for HashMap<EntityId, Aabb> {
    #[inline]
    fn position(&self, entity: EntityId) -> Option<Vec3> {
        self.get(&entity).map(|b| b.center().coords)
    }

    #[inline]
    fn bounds(&self, entity: EntityId) -> Option<Aabb> {
        self.get(&entity).copied()
    }
}
