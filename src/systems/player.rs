//! Player join.
//!
//! [`on_player_added`] builds the character a joining player picked from its
//! [`CharacterPrototype`], links it to the player and respawns it.

use bevy_ecs::prelude::*;
use log::{info, warn};

use crate::components::collider::PhysicsCollider2D;
use crate::components::kcc::KCC2D;
use crate::components::player::{MovementData, PlayerLink};
use crate::components::skill::SkillInventory;
use crate::components::status::Status;
use crate::components::transform::Transform2D;
use crate::components::weapon::{Weapon, WeaponInventory};
use crate::events::sim::{SimEvent, emit};
use crate::resources::assets::{AssetStore, Assets, CharacterPrototype};
use crate::resources::input::PlayerRef;
use crate::resources::roster::PlayerRoster;
use crate::resources::signals;

pub fn on_player_added(world: &mut World, player: PlayerRef, first_time: bool) {
    let Some(avatar) = world
        .get_resource::<PlayerRoster>()
        .and_then(|roster| roster.avatar(player))
    else {
        warn!("Player {} joined without a character", player.0);
        return;
    };
    let Some(assets) = world.get_resource::<Assets>().cloned() else {
        return;
    };
    let Some(prototype) = assets.character(avatar) else {
        warn!("Player {} picked missing character {:?}", player.0, avatar);
        return;
    };
    let Some(character) = spawn_character(world, &assets, prototype, player) else {
        return;
    };
    info!(
        "Player {} joined{} as {:?}",
        player.0,
        if first_time { "" } else { " again" },
        character
    );

    signals::character_respawn(world, character);
    emit(world, SimEvent::CharacterCreated { character });
    emit(world, SimEvent::PlayerSelectedCharacter { player });
}

/// Spawn the components described by `prototype`. `None` when its
/// controller or status asset is missing.
pub fn spawn_character(
    world: &mut World,
    assets: &AssetStore,
    prototype: &CharacterPrototype,
    player: PlayerRef,
) -> Option<Entity> {
    let Some(kcc_config) = assets.kcc_config(prototype.kcc) else {
        warn!("spawn_character: missing KCC config {:?}", prototype.kcc);
        return None;
    };
    let Some(status_data) = assets.status(prototype.status) else {
        warn!("spawn_character: missing status data {:?}", prototype.status);
        return None;
    };

    let weapons = prototype.weapons.iter().filter_map(|&weapon| match assets.weapon(weapon) {
        Some(data) => Some(Weapon::new(weapon, data.max_ammo)),
        None => {
            warn!("spawn_character: skipping missing weapon {:?}", weapon);
            None
        }
    });

    let mut entity = world.spawn((
        Transform2D::default(),
        KCC2D::new(prototype.kcc),
        PhysicsCollider2D::new(kcc_config.capsule()),
        Status::new(prototype.status, status_data.max_health),
        WeaponInventory::new(weapons),
        MovementData::default(),
        PlayerLink { player },
    ));
    if let Some(inventory) = prototype.skill_inventory {
        entity.insert(SkillInventory::new(inventory));
    }
    Some(entity.id())
}
