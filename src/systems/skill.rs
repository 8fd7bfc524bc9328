//! Skill casting and activation.
//!
//! [`skill_inventory_system`] throws a skill entity when a living character
//! presses `alt_fire` and its cast-rate timer expired. The thrown entity
//! flies as a [`PhysicsBody2D`] until its activation delay runs out; then
//! [`skill_system`] damages every character inside the skill's area that is
//! not its caster and not behind level geometry, and removes it.

use bevy_ecs::message::MessageWriter;
use bevy_ecs::prelude::*;
use log::warn;

use crate::components::physicsbody::PhysicsBody2D;
use crate::components::player::PlayerLink;
use crate::components::skill::{SkillFields, SkillInventory};
use crate::components::status::Status;
use crate::components::timer::FrameTimer;
use crate::components::transform::Transform2D;
use crate::events::sim::{SimEvent, emit};
use crate::math::{Fp, FpVec2};
use crate::physics::layers;
use crate::physics::query::{QueryFilter, line_of_sight, overlap_shape};
use crate::resources::assets::{Assets, SkillData};
use crate::resources::input::PlayerInputs;
use crate::resources::signals;
use crate::resources::simtime::SimTime;

pub fn skill_inventory_system(
    mut commands: Commands,
    mut query: Query<(Entity, &PlayerLink, &Status, &Transform2D, &mut SkillInventory)>,
    inputs: Res<PlayerInputs>,
    time: Res<SimTime>,
    assets: Res<Assets>,
    mut events: MessageWriter<SimEvent>,
) {
    let mut casters: Vec<Entity> = query.iter().map(|(entity, ..)| entity).collect();
    casters.sort();

    for entity in casters {
        let Ok((entity, link, status, transform, mut inventory)) = query.get_mut(entity) else {
            continue;
        };
        if status.is_dead || inventory.cast_rate_timer.is_running(&time) {
            continue;
        }
        let Some(input) = inputs.get(link.player) else {
            continue;
        };
        if !input.alt_fire.was_pressed {
            continue;
        }

        let Some(inventory_data) = assets.skill_inventory(inventory.data) else {
            warn!("skill_inventory_system: missing inventory data {:?}", inventory.data);
            continue;
        };
        let Some(skill_data) = assets.skill(inventory_data.skill) else {
            warn!("skill_inventory_system: missing skill data {:?}", inventory_data.skill);
            continue;
        };

        let velocity = input.aim_direction() * inventory_data.cast_force;
        let skill = commands
            .spawn((
                Transform2D::new(transform.position),
                SkillFields {
                    source: entity,
                    data: inventory_data.skill,
                    time_to_activate: skill_data.activation_delay,
                },
                PhysicsBody2D::new(velocity)
                    .with_gravity_scale(skill_data.gravity_scale)
                    .with_radius(skill_data.body_radius),
            ))
            .id();
        inventory.cast_rate_timer = FrameTimer::from_seconds(&time, inventory_data.cast_rate);
        events.write(SimEvent::SkillCasted { skill });
    }
}

pub fn skill_system(world: &mut World) {
    let Some(time) = world.get_resource::<SimTime>().copied() else {
        return;
    };
    let Some(assets) = world.get_resource::<Assets>().cloned() else {
        return;
    };

    let mut skills: Vec<Entity> = world
        .query_filtered::<Entity, (With<SkillFields>, With<Transform2D>)>()
        .iter(world)
        .collect();
    skills.sort();

    for skill in skills {
        let Some(mut fields) = world.get_mut::<SkillFields>(skill) else {
            continue;
        };
        if fields.time_to_activate > Fp::ZERO {
            fields.time_to_activate -= time.delta;
            continue;
        }
        let fields = *fields;

        match assets.skill(fields.data) {
            Some(data) => activate(world, skill, &fields, data),
            None => warn!("skill_system: missing skill data {:?}", fields.data),
        }
        world.despawn(skill);
    }
}

fn activate(world: &mut World, skill: Entity, fields: &SkillFields, data: &SkillData) {
    let Some(position) = world.get::<Transform2D>(skill).map(|t| t.position) else {
        return;
    };
    emit(world, SimEvent::SkillActivated { position });

    let hits = overlap_shape(world, position, &data.shape, QueryFilter::all(layers::ALL));
    for hit in hits.iter() {
        let Some(target) = hit.entity() else {
            continue;
        };
        if target == skill || target == fields.source {
            continue;
        }
        if world.get::<Status>(target).is_none() {
            continue;
        }
        let target_position = world
            .get::<Transform2D>(target)
            .map_or(FpVec2::ZERO, |t| t.position);
        if !line_of_sight(world, position, target_position) {
            continue;
        }

        signals::character_skill_hit(world, skill, target);
        emit(
            world,
            SimEvent::SkillHitTarget {
                position,
                skill_data: fields.data,
                target,
            },
        );
    }
}
