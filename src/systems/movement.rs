//! Character movement.
//!
//! Feeds each living character's input into the kinematic controller and
//! records which way it faces. Characters are processed one at a time in
//! entity order because controller signal handlers may touch other entities.

use bevy_ecs::prelude::*;
use log::warn;

use crate::components::kcc::KCC2D;
use crate::components::player::{MovementData, PlayerLink};
use crate::components::status::Status;
use crate::components::transform::Transform2D;
use crate::kcc::move_character;
use crate::math::Fp;
use crate::resources::assets::Assets;
use crate::resources::input::PlayerInputs;

pub fn movement_system(world: &mut World) {
    let Some(assets) = world.get_resource::<Assets>().cloned() else {
        return;
    };

    let mut characters: Vec<Entity> = world
        .query_filtered::<Entity, (
            With<Transform2D>,
            With<PlayerLink>,
            With<Status>,
            With<MovementData>,
            With<KCC2D>,
        )>()
        .iter(world)
        .collect();
    characters.sort();

    for entity in characters {
        let (Some(link), Some(status), Some(transform), Some(kcc)) = (
            world.get::<PlayerLink>(entity).copied(),
            world.get::<Status>(entity).copied(),
            world.get::<Transform2D>(entity).copied(),
            world.get::<KCC2D>(entity).copied(),
        ) else {
            continue;
        };
        if status.is_dead {
            continue;
        }

        let Some(config) = assets.kcc_config(kcc.config) else {
            warn!("movement_system: {:?} has no KCC config {:?}", entity, kcc.config);
            continue;
        };

        let input = world
            .get_resource::<PlayerInputs>()
            .and_then(|inputs| inputs.get(link.player).copied())
            .unwrap_or_default();

        let mut transform = transform;
        let mut kcc = kcc;
        kcc.input = input;
        move_character(world, config, entity, &mut transform, &mut kcc);

        if let Some(mut stored) = world.get_mut::<KCC2D>(entity) {
            *stored = kcc;
        }
        if let Some(mut stored) = world.get_mut::<Transform2D>(entity) {
            *stored = transform;
        }
        if let Some(mut movement) = world.get_mut::<MovementData>(entity) {
            movement.is_facing_right = input.aim_direction().x > Fp::ZERO;
        }
    }
}
