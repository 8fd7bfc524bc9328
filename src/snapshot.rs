//! World snapshots and desync checksums.
//!
//! A [`SimSnapshot`] captures everything a tick reads: the frame counter,
//! the random generator state, the latched inputs, the registered spawn
//! places and every gameplay component of every positioned entity, listed in
//! entity id order. Two peers
//! fed the same inputs produce byte-identical snapshots, so comparing
//! [`SimSnapshot::checksum`] values is enough to detect a desync.

use std::hash::Hasher;

use bevy_ecs::prelude::*;
use rustc_hash::FxHasher;
use serde::Serialize;

use crate::components::bullet::BulletFields;
use crate::components::collider::PhysicsCollider2D;
use crate::components::kcc::KCC2D;
use crate::components::physicsbody::PhysicsBody2D;
use crate::components::player::{MovementData, PlayerLink, SpawnIdentifier};
use crate::components::skill::{SkillFields, SkillInventory};
use crate::components::status::Status;
use crate::components::transform::Transform2D;
use crate::components::weapon::WeaponInventory;
use crate::error::SimError;
use crate::resources::input::PlayerInputs;
use crate::resources::rng::SimRng;
use crate::resources::simtime::SimTime;
use crate::resources::spawnplaces::SpawnPlaces;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EntitySnapshot {
    pub entity: Entity,
    pub transform: Transform2D,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kcc: Option<KCC2D>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collider: Option<PhysicsCollider2D>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<PhysicsBody2D>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weapons: Option<WeaponInventory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<SkillInventory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bullet: Option<BulletFields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill: Option<SkillFields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player: Option<PlayerLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movement: Option<MovementData>,
    pub spawn_point: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimSnapshot {
    pub frame: u32,
    pub rng_state: u64,
    pub inputs: Option<PlayerInputs>,
    /// Registration order picks the respawn point, so it is part of the state.
    pub spawn_places: Vec<Entity>,
    pub entities: Vec<EntitySnapshot>,
}

type SnapshotQuery<'a> = (
    Entity,
    &'a Transform2D,
    Option<&'a KCC2D>,
    Option<&'a PhysicsCollider2D>,
    Option<&'a PhysicsBody2D>,
    Option<&'a Status>,
    Option<&'a WeaponInventory>,
    Option<&'a SkillInventory>,
    Option<&'a BulletFields>,
    Option<&'a SkillFields>,
    Option<&'a PlayerLink>,
    Option<&'a MovementData>,
    Has<SpawnIdentifier>,
);

impl SimSnapshot {
    pub fn capture(world: &mut World) -> Self {
        let mut entities: Vec<EntitySnapshot> = world
            .query::<SnapshotQuery<'static>>()
            .iter(world)
            .map(
                |(
                    entity,
                    transform,
                    kcc,
                    collider,
                    body,
                    status,
                    weapons,
                    skills,
                    bullet,
                    skill,
                    player,
                    movement,
                    spawn_point,
                )| EntitySnapshot {
                    entity,
                    transform: *transform,
                    kcc: kcc.copied(),
                    collider: collider.copied(),
                    body: body.copied(),
                    status: status.copied(),
                    weapons: weapons.cloned(),
                    skills: skills.copied(),
                    bullet: bullet.copied(),
                    skill: skill.copied(),
                    player: player.copied(),
                    movement: movement.copied(),
                    spawn_point,
                },
            )
            .collect();
        entities.sort_by_key(|snapshot| snapshot.entity);

        SimSnapshot {
            frame: world.get_resource::<SimTime>().map_or(0, |time| time.frame),
            rng_state: world.get_resource::<SimRng>().map_or(0, SimRng::state),
            inputs: world.get_resource::<PlayerInputs>().cloned(),
            spawn_places: world
                .get_resource::<SpawnPlaces>()
                .map(|places| places.places.clone())
                .unwrap_or_default(),
            entities,
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, SimError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Hash of the JSON encoding.
    pub fn checksum(&self) -> Result<u64, SimError> {
        let mut hasher = FxHasher::default();
        hasher.write(&self.to_json()?);
        Ok(hasher.finish())
    }
}
