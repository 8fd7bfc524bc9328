//! Delayed area effects and the inventory that casts them.

use bevy_ecs::prelude::*;
use serde::Serialize;

use crate::components::timer::FrameTimer;
use crate::math::Fp;
use crate::resources::assets::{AssetRef, SkillData, SkillInventoryData};

/// A cast skill counting down to activation.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SkillFields {
    pub source: Entity,
    pub data: AssetRef<SkillData>,
    /// Seconds left before activation.
    pub time_to_activate: Fp,
}

#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SkillInventory {
    pub data: AssetRef<SkillInventoryData>,
    pub cast_rate_timer: FrameTimer,
}

impl SkillInventory {
    pub fn new(data: AssetRef<SkillInventoryData>) -> Self {
        SkillInventory {
            data,
            cast_rate_timer: FrameTimer::NONE,
        }
    }
}
