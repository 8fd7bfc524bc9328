//! Input systems.
//!
//! - [`update_player_inputs`] latches the raw per-player frames queued for
//!   this tick into the edge-detected
//!   [`PlayerInput`](crate::resources::input::PlayerInput) read by gameplay
//!   systems. It runs first so every later system sees the same input.
use bevy_ecs::prelude::*;

use crate::resources::input::PlayerInputs;

pub fn update_player_inputs(mut inputs: ResMut<PlayerInputs>) {
    inputs.advance();
}
