//! Weapon switching, recharge and firing.
//!
//! - [`weapon_inventory_system`] – `use_weapon` cycles to the next weapon
//! - [`weapon_system`] – recharges the current weapon one round at a time and
//!   fires bullets while `fire` is held
//! - [`on_character_respawn`] – refill every weapon of a respawned character
//!
//! A weapon fires only when its fire-rate timer expired, it is not
//! recharging and it has ammo left. Emptying it starts a recharge that
//! blocks firing until the magazine is full again.

use bevy_ecs::message::MessageWriter;
use bevy_ecs::prelude::*;
use log::{trace, warn};

use crate::components::bullet::BulletFields;
use crate::components::player::PlayerLink;
use crate::components::status::Status;
use crate::components::timer::FrameTimer;
use crate::components::transform::Transform2D;
use crate::components::weapon::{Weapon, WeaponInventory};
use crate::events::sim::SimEvent;
use crate::math::{Fp, FpVec2, fp};
use crate::resources::assets::{Assets, WeaponData};
use crate::resources::input::PlayerInputs;
use crate::resources::simtime::SimTime;

pub fn weapon_inventory_system(
    mut query: Query<(Entity, &PlayerLink, &Status, &mut WeaponInventory)>,
    inputs: Res<PlayerInputs>,
    mut events: MessageWriter<SimEvent>,
) {
    let mut characters: Vec<Entity> = query.iter().map(|(entity, ..)| entity).collect();
    characters.sort();

    for entity in characters {
        let Ok((entity, link, status, mut inventory)) = query.get_mut(entity) else {
            continue;
        };
        if status.is_dead || inventory.weapons.is_empty() {
            continue;
        }
        let pressed = inputs
            .get(link.player)
            .is_some_and(|input| input.use_weapon.was_pressed);
        if !pressed {
            continue;
        }

        inventory.current = (inventory.current + 1) % inventory.weapons.len();
        let Some(weapon) = inventory.current_weapon_mut() else {
            continue;
        };
        weapon.charge_time = Fp::ZERO;
        let weapon_data = weapon.data;

        events.write(SimEvent::CharacterChangeWeapon { character: entity });
        events.write(SimEvent::CharacterChangeWeaponLocal {
            player: link.player,
            weapon_data,
        });
    }
}

pub fn weapon_system(
    mut commands: Commands,
    mut query: Query<(Entity, &PlayerLink, &Status, &Transform2D, &mut WeaponInventory)>,
    inputs: Res<PlayerInputs>,
    time: Res<SimTime>,
    assets: Res<Assets>,
    mut events: MessageWriter<SimEvent>,
) {
    let mut characters: Vec<Entity> = query.iter().map(|(entity, ..)| entity).collect();
    characters.sort();

    for entity in characters {
        let Ok((entity, link, status, transform, mut inventory)) = query.get_mut(entity) else {
            continue;
        };
        if status.is_dead {
            continue;
        }
        let Some(weapon) = inventory.current_weapon_mut() else {
            continue;
        };
        let Some(data) = assets.weapon(weapon.data) else {
            warn!("weapon_system: missing weapon data {:?}", weapon.data);
            continue;
        };

        recharge(weapon, data, &time);

        let Some(input) = inputs.get(link.player) else {
            continue;
        };
        if !input.fire.is_down || !can_fire(weapon, &time) {
            continue;
        }

        let aim = input.aim_direction();
        let bullet = spawn_bullet(&mut commands, entity, transform.position, weapon, data, aim, &time);
        weapon.fire_rate_timer = FrameTimer::from_seconds(&time, seconds_per(data.fire_rate));
        weapon.charge_time = Fp::ZERO;
        events.write(SimEvent::WeaponShoot { character: entity });
        trace!("{:?} fired {:?}", entity, bullet);
    }
}

/// Restore one round once the recharge delay and the per-round timer allow.
fn recharge(weapon: &mut Weapon, data: &WeaponData, time: &SimTime) {
    if weapon.delay_to_start_recharge_timer.is_running(time)
        || weapon.recharge_rate.is_running(time)
        || weapon.current_ammo >= data.max_ammo
    {
        return;
    }
    let per_round = data.recharge_timer / fp(data.max_ammo as i32);
    weapon.recharge_rate = FrameTimer::from_seconds(time, per_round);
    weapon.current_ammo += 1;
    if weapon.current_ammo == data.max_ammo {
        weapon.is_recharging = false;
    }
}

pub fn can_fire(weapon: &Weapon, time: &SimTime) -> bool {
    weapon.fire_rate_timer.is_expired(time) && !weapon.is_recharging && weapon.current_ammo > 0
}

/// `1 / rate`, zero for a non-positive rate.
fn seconds_per(rate: Fp) -> Fp {
    if rate > Fp::ZERO {
        Fp::ONE / rate
    } else {
        Fp::ZERO
    }
}

/// Bullets leave from the character position plus the weapon offsets and
/// one unit along the aim.
pub fn fire_spot(data: &WeaponData, position: FpVec2, aim: FpVec2) -> FpVec2 {
    position + data.position_offset + aim + data.fire_spot_offset
}

fn spawn_bullet(
    commands: &mut Commands,
    character: Entity,
    position: FpVec2,
    weapon: &mut Weapon,
    data: &WeaponData,
    aim: FpVec2,
    time: &SimTime,
) -> Entity {
    weapon.current_ammo -= 1;
    if weapon.current_ammo == 0 {
        weapon.is_recharging = true;
    }
    weapon.delay_to_start_recharge_timer = FrameTimer::from_seconds(time, data.time_to_recharge);

    commands
        .spawn((
            Transform2D::new(fire_spot(data, position, aim)),
            BulletFields {
                source: character,
                direction: aim * data.shoot_force,
                data: data.bullet,
            },
        ))
        .id()
}

pub fn on_character_respawn(world: &mut World, character: Entity) {
    let Some(assets) = world.get_resource::<Assets>().cloned() else {
        return;
    };
    let Some(mut inventory) = world.get_mut::<WeaponInventory>(character) else {
        return;
    };
    for weapon in inventory.weapons.iter_mut() {
        let Some(data) = assets.weapon(weapon.data) else {
            warn!("on_character_respawn: missing weapon data {:?}", weapon.data);
            continue;
        };
        weapon.is_recharging = false;
        weapon.current_ammo = data.max_ammo;
        weapon.fire_rate_timer = FrameTimer::NONE;
        weapon.delay_to_start_recharge_timer = FrameTimer::NONE;
        weapon.recharge_rate = FrameTimer::NONE;
    }
}
