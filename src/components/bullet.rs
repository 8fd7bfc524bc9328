use bevy_ecs::prelude::*;
use serde::Serialize;

use crate::math::FpVec2;
use crate::resources::assets::{AssetRef, BulletData};

/// In-flight projectile.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BulletFields {
    /// Character that fired it.
    pub source: Entity,
    /// Velocity in world units per second.
    pub direction: FpVec2,
    pub data: AssetRef<BulletData>,
}
