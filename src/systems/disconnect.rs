//! Removal of characters whose player left.
//!
//! While a player's input slot is marked absent its character's disconnect
//! timer runs; coming back clears it. Once the character has been absent for
//! `time_to_disconnect` seconds it is despawned. Bullets and skills it fired
//! clean themselves up.

use bevy_ecs::prelude::*;
use log::info;

use crate::components::player::PlayerLink;
use crate::components::status::Status;
use crate::components::timer::FrameTimer;
use crate::resources::assets::Assets;
use crate::resources::input::PlayerInputs;
use crate::resources::simtime::SimTime;

pub fn disconnect_system(
    mut commands: Commands,
    mut query: Query<(Entity, &PlayerLink, &mut Status)>,
    inputs: Res<PlayerInputs>,
    time: Res<SimTime>,
    assets: Res<Assets>,
) {
    for (entity, link, mut status) in query.iter_mut() {
        let Some(data) = assets.status(status.data) else {
            continue;
        };

        if inputs.is_present(link.player) {
            if status.disconnected_timer.is_valid() {
                status.disconnected_timer = FrameTimer::NONE;
            }
        } else if !status.disconnected_timer.is_valid() {
            status.disconnected_timer = FrameTimer::from_seconds(&time, data.time_to_disconnect);
        }

        if status.disconnected_timer.is_valid()
            && status.disconnected_timer.seconds_since_start(&time) >= data.time_to_disconnect
        {
            info!("Player {} disconnected, removing {:?}", link.player.0, entity);
            commands.entity(entity).despawn();
        }
    }
}
