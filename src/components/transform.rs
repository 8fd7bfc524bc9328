use bevy_ecs::prelude::Component;
use serde::Serialize;

use crate::math::FpVec2;

/// World-space position of an entity.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Transform2D {
    pub position: FpVec2,
}

impl Transform2D {
    pub fn new(position: FpVec2) -> Self {
        Self { position }
    }
}
