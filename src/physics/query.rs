//! Overlap and segment queries over the collider world.

use bevy_ecs::prelude::*;
use serde::Serialize;
use smallvec::SmallVec;

use crate::components::collider::PhysicsCollider2D;
use crate::components::transform::Transform2D;
use crate::math::{Fp, FpVec2};
use crate::physics::layers;
use crate::physics::shape::{Contact, Shape2D, penetration, raycast};
use crate::resources::staticgeometry::StaticGeometry;

/// Which collider a hit refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ColliderRef {
    Static(usize),
    Entity(Entity),
}

impl ColliderRef {
    /// The entity owning the collider, `None` for level geometry.
    pub fn entity(&self) -> Option<Entity> {
        match self {
            ColliderRef::Static(_) => None,
            ColliderRef::Entity(e) => Some(*e),
        }
    }
}

/// Layer mask plus whether trigger colliders are reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueryFilter {
    pub mask: u32,
    pub include_triggers: bool,
}

impl QueryFilter {
    pub fn solids(mask: u32) -> Self {
        QueryFilter {
            mask,
            include_triggers: false,
        }
    }

    pub fn all(mask: u32) -> Self {
        QueryFilter {
            mask,
            include_triggers: true,
        }
    }

    fn accepts(&self, layer: u32, is_trigger: bool) -> bool {
        self.mask & layer != 0 && (self.include_triggers || !is_trigger)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct OverlapHit {
    pub collider: ColliderRef,
    pub is_trigger: bool,
    /// Direction that pushes the query shape out of the collider.
    pub normal: FpVec2,
    pub penetration: Fp,
}

impl OverlapHit {
    pub fn entity(&self) -> Option<Entity> {
        self.collider.entity()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineHit {
    pub collider: ColliderRef,
    pub is_trigger: bool,
    pub point: FpVec2,
    pub normal: FpVec2,
    pub fraction: Fp,
}

impl LineHit {
    pub fn entity(&self) -> Option<Entity> {
        self.collider.entity()
    }
}

#[derive(Clone, Copy)]
struct ColliderView {
    collider: ColliderRef,
    shape: Shape2D,
    position: FpVec2,
    is_trigger: bool,
}

/// Colliders passing `filter`: statics by index, then entities by id.
fn gather(world: &mut World, filter: QueryFilter) -> SmallVec<[ColliderView; 32]> {
    let mut views: SmallVec<[ColliderView; 32]> = SmallVec::new();
    if let Some(geometry) = world.get_resource::<StaticGeometry>() {
        views.extend(
            geometry
                .iter()
                .filter(|(_, c)| filter.accepts(c.layer, c.is_trigger))
                .map(|(index, c)| ColliderView {
                    collider: ColliderRef::Static(index),
                    shape: c.shape,
                    position: c.position,
                    is_trigger: c.is_trigger,
                }),
        );
    }

    let mut entities: SmallVec<[ColliderView; 32]> = SmallVec::new();
    let mut query = world.query::<(Entity, &Transform2D, &PhysicsCollider2D)>();
    for (entity, transform, collider) in query.iter(world) {
        if filter.accepts(collider.layer, collider.is_trigger) {
            entities.push(ColliderView {
                collider: ColliderRef::Entity(entity),
                shape: collider.shape,
                position: transform.position,
                is_trigger: collider.is_trigger,
            });
        }
    }
    entities.sort_by_key(|view| view.collider.entity());
    views.extend(entities);
    views
}

/// Every collider `shape` at `position` overlaps.
pub fn overlap_shape(
    world: &mut World,
    position: FpVec2,
    shape: &Shape2D,
    filter: QueryFilter,
) -> SmallVec<[OverlapHit; 16]> {
    gather(world, filter)
        .into_iter()
        .filter_map(|view| {
            penetration(shape, position, &view.shape, view.position).map(|contact| OverlapHit {
                collider: view.collider,
                is_trigger: view.is_trigger,
                normal: contact.normal,
                penetration: contact.penetration,
            })
        })
        .collect()
}

/// Recompute the overlap between `shape` at `position` and one collider.
///
/// Returns `None` when they no longer overlap or the collider is gone.
pub fn check_overlap(
    world: &World,
    position: FpVec2,
    shape: &Shape2D,
    collider: ColliderRef,
) -> Option<Contact> {
    let (other_shape, other_position) = match collider {
        ColliderRef::Static(index) => {
            let c = world.get_resource::<StaticGeometry>()?.get(index)?;
            (c.shape, c.position)
        }
        ColliderRef::Entity(entity) => {
            let transform = world.get::<Transform2D>(entity)?;
            let c = world.get::<PhysicsCollider2D>(entity)?;
            (c.shape, transform.position)
        }
    };
    penetration(shape, position, &other_shape, other_position)
}

/// Every collider crossed by the segment `from -> to`, nearest first.
pub fn linecast_all(
    world: &mut World,
    from: FpVec2,
    to: FpVec2,
    filter: QueryFilter,
) -> SmallVec<[LineHit; 8]> {
    let mut hits: SmallVec<[LineHit; 8]> = gather(world, filter)
        .into_iter()
        .filter_map(|view| {
            raycast(&view.shape, view.position, from, to).map(|hit| LineHit {
                collider: view.collider,
                is_trigger: view.is_trigger,
                point: hit.point,
                normal: hit.normal,
                fraction: hit.fraction,
            })
        })
        .collect();
    // Stable: equal fractions keep collider order.
    hits.sort_by_key(|hit| hit.fraction);
    hits
}

/// True when no solid static collider blocks the segment.
pub fn line_of_sight(world: &World, from: FpVec2, to: FpVec2) -> bool {
    let Some(geometry) = world.get_resource::<StaticGeometry>() else {
        return true;
    };
    let filter = QueryFilter::solids(layers::STATIC);
    !geometry
        .iter()
        .filter(|(_, c)| filter.accepts(c.layer, c.is_trigger))
        .any(|(_, c)| raycast(&c.shape, c.position, from, to).is_some())
}
