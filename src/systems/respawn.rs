//! Respawn points and respawning dead characters.
//!
//! - [`spawn_registration_system`] raises the spawn-identifier-added signal
//!   once for every entity that gained a [`SpawnIdentifier`] since the last
//!   tick; [`on_spawn_identifier_added`] records it in [`SpawnPlaces`].
//! - [`respawn_system`] raises the respawn signal for dead characters whose
//!   respawn timer expired.
//! - [`on_character_respawn`] moves the character to a random registered
//!   spawn point, stops it and makes its collider solid again.

use bevy_ecs::prelude::*;
use log::{debug, warn};

use crate::components::collider::PhysicsCollider2D;
use crate::components::kcc::KCC2D;
use crate::components::player::SpawnIdentifier;
use crate::components::status::Status;
use crate::components::transform::Transform2D;
use crate::events::sim::{SimEvent, emit};
use crate::math::FpVec2;
use crate::resources::rng::SimRng;
use crate::resources::signals;
use crate::resources::simtime::SimTime;
use crate::resources::spawnplaces::SpawnPlaces;

/// Used when no spawn point is registered.
pub const FALLBACK_SPAWN: FpVec2 = FpVec2::from_ints(1, 1);

pub fn spawn_registration_system(world: &mut World) {
    let mut added: Vec<Entity> = world
        .query_filtered::<Entity, Added<SpawnIdentifier>>()
        .iter(world)
        .collect();
    added.sort();
    for entity in added {
        signals::spawn_identifier_added(world, entity);
    }
}

pub fn on_spawn_identifier_added(world: &mut World, entity: Entity) {
    world.get_resource_or_init::<SpawnPlaces>().register(entity);
}

pub fn respawn_system(world: &mut World) {
    let Some(time) = world.get_resource::<SimTime>().copied() else {
        return;
    };
    let mut ready: Vec<Entity> = world
        .query::<(Entity, &Status)>()
        .iter(world)
        .filter(|(_, status)| status.is_dead && status.respawn_timer.is_expired(&time))
        .map(|(entity, _)| entity)
        .collect();
    ready.sort();
    for character in ready {
        signals::character_respawn(world, character);
    }
}

pub fn on_character_respawn(world: &mut World, character: Entity) {
    let places = world
        .get_resource::<SpawnPlaces>()
        .map(|places| places.places.clone())
        .unwrap_or_default();

    let index = world
        .get_resource_mut::<SimRng>()
        .and_then(|mut rng| rng.index(places.len()));
    let position = match index.and_then(|i| places.get(i)) {
        Some(&spawn) => match world.get::<Transform2D>(spawn) {
            Some(transform) => transform.position,
            None => {
                warn!("on_character_respawn: spawn point {:?} has no transform", spawn);
                FALLBACK_SPAWN
            }
        },
        None => FALLBACK_SPAWN,
    };

    let Some(mut transform) = world.get_mut::<Transform2D>(character) else {
        return;
    };
    transform.position = position;
    if let Some(mut collider) = world.get_mut::<PhysicsCollider2D>(character) {
        collider.is_trigger = false;
    }
    if let Some(mut kcc) = world.get_mut::<KCC2D>(character) {
        kcc.halt();
    }

    debug!("{:?} respawned at {:?}", character, position);
    emit(world, SimEvent::CharacterRespawn { character });
}
