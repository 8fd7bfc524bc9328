//! Outward notifications for presentation layers.
//!
//! The simulation writes [`SimEvent`]s into the `Messages<SimEvent>` queue and
//! never reads them back; whether anything consumes them has no effect on
//! state. [`Simulation::drain_events`](crate::simulation::Simulation::drain_events)
//! hands them to the outside after each tick.

use bevy_ecs::message::{Message, Messages};
use bevy_ecs::prelude::*;
use serde::Serialize;

use crate::components::kcc::KCCState;
use crate::math::{Fp, FpVec2};
use crate::resources::assets::{AssetRef, BulletData, SkillData, WeaponData};
use crate::resources::input::PlayerRef;

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SimEvent {
    BulletDestroyed {
        bullet: Entity,
        source: Entity,
        position: FpVec2,
        direction: FpVec2,
        bullet_data: AssetRef<BulletData>,
    },
    CharacterCreated {
        character: Entity,
    },
    CharacterTakeDamage {
        character: Entity,
        damage: Fp,
        source: Entity,
    },
    CharacterBlink {
        character: Entity,
    },
    CharacterDeath {
        character: Entity,
        killer: Entity,
    },
    CharacterRespawn {
        character: Entity,
    },
    CharacterChangeWeapon {
        character: Entity,
    },
    /// Only meaningful to the view of the owning player.
    CharacterChangeWeaponLocal {
        player: PlayerRef,
        weapon_data: AssetRef<WeaponData>,
    },
    WeaponShoot {
        character: Entity,
    },
    SkillCasted {
        skill: Entity,
    },
    SkillActivated {
        position: FpVec2,
    },
    SkillHitTarget {
        position: FpVec2,
        skill_data: AssetRef<SkillData>,
        target: Entity,
    },
    Jumped {
        entity: Entity,
        next: KCCState,
        previous: KCCState,
        impulse: FpVec2,
    },
    /// `speed` is the velocity component cancelled by the landing.
    Landed {
        entity: Entity,
        speed: Fp,
        state: KCCState,
    },
    PlayerSelectedCharacter {
        player: PlayerRef,
    },
}

/// Queue an event from exclusive code.
pub fn emit(world: &mut World, event: SimEvent) {
    if let Some(mut messages) = world.get_resource_mut::<Messages<SimEvent>>() {
        messages.write(event);
    }
}
