//! Weapons carried by a character.

use bevy_ecs::prelude::Component;
use serde::Serialize;
use smallvec::SmallVec;

use crate::components::timer::FrameTimer;
use crate::math::Fp;
use crate::resources::assets::{AssetRef, WeaponData};

/// Runtime state of one weapon.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Weapon {
    pub data: AssetRef<WeaponData>,
    pub current_ammo: u32,
    pub is_recharging: bool,
    pub fire_rate_timer: FrameTimer,
    pub delay_to_start_recharge_timer: FrameTimer,
    pub recharge_rate: FrameTimer,
    pub charge_time: Fp,
}

impl Weapon {
    pub fn new(data: AssetRef<WeaponData>, max_ammo: u32) -> Self {
        Weapon {
            data,
            current_ammo: max_ammo,
            is_recharging: false,
            fire_rate_timer: FrameTimer::NONE,
            delay_to_start_recharge_timer: FrameTimer::NONE,
            recharge_rate: FrameTimer::NONE,
            charge_time: Fp::ZERO,
        }
    }
}

/// Fixed list of weapons plus the selected index.
#[derive(Component, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WeaponInventory {
    pub current: usize,
    pub weapons: SmallVec<[Weapon; 4]>,
}

impl WeaponInventory {
    pub fn new(weapons: impl IntoIterator<Item = Weapon>) -> Self {
        WeaponInventory {
            current: 0,
            weapons: weapons.into_iter().collect(),
        }
    }

    pub fn current_weapon(&self) -> Option<&Weapon> {
        self.weapons.get(self.current)
    }

    pub fn current_weapon_mut(&mut self) -> Option<&mut Weapon> {
        self.weapons.get_mut(self.current)
    }
}
