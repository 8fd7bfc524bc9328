//! Level colliders that never move.
//!
//! Static colliders report hits with no entity attached. They are the only
//! colliders considered by line-of-sight checks.

use bevy_ecs::prelude::Resource;
use serde::Serialize;

use crate::math::FpVec2;
use crate::physics::layers;
use crate::physics::shape::Shape2D;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StaticCollider {
    pub shape: Shape2D,
    pub position: FpVec2,
    pub layer: u32,
    pub is_trigger: bool,
}

impl StaticCollider {
    pub fn solid(shape: Shape2D, position: FpVec2) -> Self {
        StaticCollider {
            shape,
            position,
            layer: layers::STATIC,
            is_trigger: false,
        }
    }

    pub fn trigger(shape: Shape2D, position: FpVec2) -> Self {
        StaticCollider {
            is_trigger: true,
            ..Self::solid(shape, position)
        }
    }
}

#[derive(Resource, Clone, Debug, Default)]
pub struct StaticGeometry {
    colliders: Vec<StaticCollider>,
}

impl StaticGeometry {
    /// Add a collider and return its index.
    pub fn add(&mut self, collider: StaticCollider) -> usize {
        self.colliders.push(collider);
        self.colliders.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&StaticCollider> {
        self.colliders.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &StaticCollider)> {
        self.colliders.iter().enumerate()
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }
}
