//! Health, death and respawn bookkeeping of a character.

use bevy_ecs::prelude::Component;
use serde::Serialize;

use crate::components::timer::FrameTimer;
use crate::math::Fp;
use crate::resources::assets::{AssetRef, StatusData};

/// Damageable state. Only the status handlers mutate it.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Status {
    pub data: AssetRef<StatusData>,
    pub current_health: Fp,
    pub is_dead: bool,
    /// Regeneration waits until this expires.
    pub regen_timer: FrameTimer,
    /// Damage is ignored while this runs.
    pub invincible_timer: FrameTimer,
    pub respawn_timer: FrameTimer,
    /// Running while the owning player is absent.
    pub disconnected_timer: FrameTimer,
}

impl Status {
    pub fn new(data: AssetRef<StatusData>, max_health: Fp) -> Self {
        Status {
            data,
            current_health: max_health,
            is_dead: false,
            regen_timer: FrameTimer::NONE,
            invincible_timer: FrameTimer::NONE,
            respawn_timer: FrameTimer::NONE,
            disconnected_timer: FrameTimer::NONE,
        }
    }
}
