//! Player ownership and presentation hints.

use bevy_ecs::prelude::Component;
use serde::Serialize;

use crate::resources::input::PlayerRef;

/// Links a character to the player slot whose input drives it.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PlayerLink {
    pub player: PlayerRef,
}

#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MovementData {
    pub is_facing_right: bool,
}

/// Marks an entity whose position is a respawn point.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SpawnIdentifier;
