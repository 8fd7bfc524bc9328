//! Collider attached to an entity.
//!
//! Entity colliders sit at the entity's [`Transform2D`](super::transform::Transform2D)
//! position. Static level geometry lives in
//! [`StaticGeometry`](crate::resources::staticgeometry::StaticGeometry) instead.

use bevy_ecs::prelude::Component;
use serde::Serialize;

use crate::physics::layers;
use crate::physics::shape::Shape2D;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Component, Serialize)]
pub struct PhysicsCollider2D {
    pub shape: Shape2D,
    /// Single layer bit this collider belongs to.
    pub layer: u32,
    /// Triggers report overlaps but never push anything out.
    pub is_trigger: bool,
}

impl PhysicsCollider2D {
    pub fn new(shape: Shape2D) -> Self {
        Self {
            shape,
            layer: layers::CHARACTER,
            is_trigger: false,
        }
    }

    pub fn with_layer(mut self, layer: u32) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_trigger(mut self, is_trigger: bool) -> Self {
        self.is_trigger = is_trigger;
        self
    }
}
