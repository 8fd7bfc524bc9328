//! Immutable gameplay data assets.
//!
//! Assets are loaded once, before the first tick, into an [`AssetStore`] that
//! is shared read-only through the [`Assets`] resource. Components never copy
//! asset data; they hold a typed [`AssetRef`] and look the record up when
//! needed. A dangling reference is a missing-reference case: the caller logs
//! and takes its fallback branch.
//!
//! # File format
//!
//! One JSON document with one table per asset kind, keyed by numeric id:
//!
//! ```json
//! {
//!   "weapons": { "1": { "fire_rate": 5, "bullet": 1 } },
//!   "bullets": { "1": { "damage": 10, "action": { "kind": "common" } } }
//! }
//! ```
//!
//! Every record field has a default, so files only list what they change.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;

use bevy_ecs::prelude::Resource;
use log::info;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SimError;
use crate::kcc::config::KCC2DConfig;
use crate::math::{Fp, FpVec2, fp, fp_ratio, serde_fp};
use crate::physics::shape::Shape2D;

// ==================== REFERENCES ====================

/// Typed id of an asset record.
pub struct AssetRef<T> {
    id: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> AssetRef<T> {
    pub const fn new(id: u32) -> Self {
        AssetRef {
            id,
            _marker: PhantomData,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }
}

impl<T> Clone for AssetRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for AssetRef<T> {}

impl<T> PartialEq for AssetRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for AssetRef<T> {}

impl<T> Hash for AssetRef<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> Default for AssetRef<T> {
    fn default() -> Self {
        AssetRef::new(0)
    }
}

impl<T> fmt::Debug for AssetRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetRef({})", self.id)
    }
}

impl<T> Serialize for AssetRef<T> {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u32(self.id)
    }
}

impl<'de, T> Deserialize<'de> for AssetRef<T> {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        u32::deserialize(d).map(AssetRef::new)
    }
}

// ==================== RECORDS ====================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponData {
    pub name: String,
    /// Shots per second.
    #[serde(with = "serde_fp")]
    pub fire_rate: Fp,
    /// Speed given to spawned bullets.
    #[serde(with = "serde_fp")]
    pub shoot_force: Fp,
    pub max_ammo: u32,
    /// Seconds to refill a fully empty weapon.
    #[serde(with = "serde_fp")]
    pub recharge_timer: Fp,
    /// Delay after the last shot before recharging starts.
    #[serde(with = "serde_fp")]
    pub time_to_recharge: Fp,
    #[serde(with = "serde_fp::vec")]
    pub fire_spot_offset: FpVec2,
    #[serde(with = "serde_fp::vec")]
    pub position_offset: FpVec2,
    pub bullet: AssetRef<BulletData>,
}

impl Default for WeaponData {
    fn default() -> Self {
        WeaponData {
            name: String::from("weapon"),
            fire_rate: fp(5),
            shoot_force: fp(20),
            max_ammo: 10,
            recharge_timer: fp(2),
            time_to_recharge: fp(1),
            fire_spot_offset: FpVec2::ZERO,
            position_offset: FpVec2::ZERO,
            bullet: AssetRef::default(),
        }
    }
}

/// What a bullet does once it resolves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BulletAction {
    /// Damage the target, if any.
    #[default]
    Common,
    /// Area damage with linear falloff, plus full damage to a direct target.
    Explosive { explosion_shape: Shape2D },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletData {
    #[serde(with = "serde_fp")]
    pub damage: Fp,
    /// Distance from the source after which the bullet resolves on its own.
    #[serde(with = "serde_fp")]
    pub range: Fp,
    /// Minimum squared step length before a linecast is performed.
    #[serde(with = "serde_fp")]
    pub collision_check_threshold: Fp,
    pub action: BulletAction,
}

impl Default for BulletData {
    fn default() -> Self {
        BulletData {
            damage: fp(10),
            range: fp(10),
            collision_check_threshold: fp_ratio(1, 100),
            action: BulletAction::Common,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillData {
    #[serde(with = "serde_fp")]
    pub activation_delay: Fp,
    #[serde(with = "serde_fp")]
    pub damage: Fp,
    /// Area affected on activation.
    pub shape: Shape2D,
    #[serde(with = "serde_fp")]
    pub gravity_scale: Fp,
    /// Radius of the thrown body against level geometry.
    #[serde(with = "serde_fp")]
    pub body_radius: Fp,
}

impl Default for SkillData {
    fn default() -> Self {
        SkillData {
            activation_delay: fp(1),
            damage: fp(30),
            shape: Shape2D::circle(fp(2)),
            gravity_scale: fp(1),
            body_radius: fp_ratio(1, 10),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillInventoryData {
    /// Seconds between casts.
    #[serde(with = "serde_fp")]
    pub cast_rate: Fp,
    #[serde(with = "serde_fp")]
    pub cast_force: Fp,
    pub skill: AssetRef<SkillData>,
}

impl Default for SkillInventoryData {
    fn default() -> Self {
        SkillInventoryData {
            cast_rate: fp(3),
            cast_force: fp(8),
            skill: AssetRef::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusData {
    #[serde(with = "serde_fp")]
    pub max_health: Fp,
    /// Health per second while regenerating.
    #[serde(with = "serde_fp")]
    pub regen_rate: Fp,
    /// Delay after taking damage before regeneration starts.
    #[serde(with = "serde_fp")]
    pub time_until_regen: Fp,
    #[serde(with = "serde_fp")]
    pub invincible_time: Fp,
    #[serde(with = "serde_fp")]
    pub minimum_damage: Fp,
    #[serde(with = "serde_fp")]
    pub respawn_time: Fp,
    #[serde(with = "serde_fp")]
    pub time_to_disconnect: Fp,
}

impl Default for StatusData {
    fn default() -> Self {
        StatusData {
            max_health: fp(100),
            regen_rate: fp(5),
            time_until_regen: fp(3),
            invincible_time: fp(2),
            minimum_damage: fp(1),
            respawn_time: fp(3),
            time_to_disconnect: fp(5),
        }
    }
}

/// Everything needed to spawn a player's character.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterPrototype {
    pub kcc: AssetRef<KCC2DConfig>,
    pub status: AssetRef<StatusData>,
    pub weapons: Vec<AssetRef<WeaponData>>,
    pub skill_inventory: Option<AssetRef<SkillInventoryData>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticColliderDef {
    pub shape: Shape2D,
    #[serde(with = "serde_fp::vec")]
    pub position: FpVec2,
    #[serde(default)]
    pub is_trigger: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnPointDef {
    #[serde(with = "serde_fp::vec")]
    pub position: FpVec2,
}

/// Arena description used by the runner.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelData {
    pub colliders: Vec<StaticColliderDef>,
    pub spawn_points: Vec<SpawnPointDef>,
}

// ==================== STORE ====================

#[derive(Deserialize, Default)]
#[serde(default)]
struct AssetFile {
    kcc_configs: BTreeMap<u32, KCC2DConfig>,
    weapons: BTreeMap<u32, WeaponData>,
    bullets: BTreeMap<u32, BulletData>,
    skills: BTreeMap<u32, SkillData>,
    skill_inventories: BTreeMap<u32, SkillInventoryData>,
    statuses: BTreeMap<u32, StatusData>,
    characters: BTreeMap<u32, CharacterPrototype>,
    level: LevelData,
}

fn into_table<T>(records: BTreeMap<u32, T>) -> FxHashMap<AssetRef<T>, T> {
    records
        .into_iter()
        .map(|(id, record)| (AssetRef::new(id), record))
        .collect()
}

/// All asset tables of a session.
#[derive(Clone, Debug, Default)]
pub struct AssetStore {
    kcc_configs: FxHashMap<AssetRef<KCC2DConfig>, KCC2DConfig>,
    weapons: FxHashMap<AssetRef<WeaponData>, WeaponData>,
    bullets: FxHashMap<AssetRef<BulletData>, BulletData>,
    skills: FxHashMap<AssetRef<SkillData>, SkillData>,
    skill_inventories: FxHashMap<AssetRef<SkillInventoryData>, SkillInventoryData>,
    statuses: FxHashMap<AssetRef<StatusData>, StatusData>,
    characters: FxHashMap<AssetRef<CharacterPrototype>, CharacterPrototype>,
    pub level: LevelData,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self, SimError> {
        let file: AssetFile = serde_json::from_str(json)?;
        let store = AssetStore {
            kcc_configs: into_table(file.kcc_configs),
            weapons: into_table(file.weapons),
            bullets: into_table(file.bullets),
            skills: into_table(file.skills),
            skill_inventories: into_table(file.skill_inventories),
            statuses: into_table(file.statuses),
            characters: into_table(file.characters),
            level: file.level,
        };
        store.validate()?;
        Ok(store)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self::from_json_str(&json)?;
        info!(
            "Loaded assets from {}: {} characters, {} weapons, {} bullets, {} skills",
            path.display(),
            store.characters.len(),
            store.weapons.len(),
            store.bullets.len(),
            store.skills.len()
        );
        Ok(store)
    }

    /// Check every cross-reference resolves.
    pub fn validate(&self) -> Result<(), SimError> {
        fn missing(kind: &'static str, id: u32) -> SimError {
            SimError::MissingAsset { kind, id }
        }
        for weapon in self.weapons.values() {
            if !self.bullets.contains_key(&weapon.bullet) {
                return Err(missing("bullet", weapon.bullet.id()));
            }
        }
        for inventory in self.skill_inventories.values() {
            if !self.skills.contains_key(&inventory.skill) {
                return Err(missing("skill", inventory.skill.id()));
            }
        }
        for character in self.characters.values() {
            if !self.kcc_configs.contains_key(&character.kcc) {
                return Err(missing("kcc config", character.kcc.id()));
            }
            if !self.statuses.contains_key(&character.status) {
                return Err(missing("status", character.status.id()));
            }
            if let Some(weapon) = character.weapons.iter().find(|w| !self.weapons.contains_key(w)) {
                return Err(missing("weapon", weapon.id()));
            }
            if let Some(inventory) = character.skill_inventory
                && !self.skill_inventories.contains_key(&inventory)
            {
                return Err(missing("skill inventory", inventory.id()));
            }
        }
        Ok(())
    }

    pub fn kcc_config(&self, id: AssetRef<KCC2DConfig>) -> Option<&KCC2DConfig> {
        self.kcc_configs.get(&id)
    }

    pub fn weapon(&self, id: AssetRef<WeaponData>) -> Option<&WeaponData> {
        self.weapons.get(&id)
    }

    pub fn bullet(&self, id: AssetRef<BulletData>) -> Option<&BulletData> {
        self.bullets.get(&id)
    }

    pub fn skill(&self, id: AssetRef<SkillData>) -> Option<&SkillData> {
        self.skills.get(&id)
    }

    pub fn skill_inventory(&self, id: AssetRef<SkillInventoryData>) -> Option<&SkillInventoryData> {
        self.skill_inventories.get(&id)
    }

    pub fn status(&self, id: AssetRef<StatusData>) -> Option<&StatusData> {
        self.statuses.get(&id)
    }

    pub fn character(&self, id: AssetRef<CharacterPrototype>) -> Option<&CharacterPrototype> {
        self.characters.get(&id)
    }

    pub fn insert_kcc_config(&mut self, id: u32, data: KCC2DConfig) -> AssetRef<KCC2DConfig> {
        let key = AssetRef::new(id);
        self.kcc_configs.insert(key, data);
        key
    }

    pub fn insert_weapon(&mut self, id: u32, data: WeaponData) -> AssetRef<WeaponData> {
        let key = AssetRef::new(id);
        self.weapons.insert(key, data);
        key
    }

    pub fn insert_bullet(&mut self, id: u32, data: BulletData) -> AssetRef<BulletData> {
        let key = AssetRef::new(id);
        self.bullets.insert(key, data);
        key
    }

    pub fn insert_skill(&mut self, id: u32, data: SkillData) -> AssetRef<SkillData> {
        let key = AssetRef::new(id);
        self.skills.insert(key, data);
        key
    }

    pub fn insert_skill_inventory(
        &mut self,
        id: u32,
        data: SkillInventoryData,
    ) -> AssetRef<SkillInventoryData> {
        let key = AssetRef::new(id);
        self.skill_inventories.insert(key, data);
        key
    }

    pub fn insert_status(&mut self, id: u32, data: StatusData) -> AssetRef<StatusData> {
        let key = AssetRef::new(id);
        self.statuses.insert(key, data);
        key
    }

    pub fn insert_character(
        &mut self,
        id: u32,
        data: CharacterPrototype,
    ) -> AssetRef<CharacterPrototype> {
        let key = AssetRef::new(id);
        self.characters.insert(key, data);
        key
    }
}

/// Shared handle to the session's [`AssetStore`].
///
/// Cloning is cheap; exclusive systems clone it before borrowing the world
/// mutably.
#[derive(Resource, Clone, Debug, Default)]
pub struct Assets(Arc<AssetStore>);

impl Assets {
    pub fn new(store: AssetStore) -> Self {
        Assets(Arc::new(store))
    }
}

impl Deref for Assets {
    type Target = AssetStore;

    fn deref(&self) -> &AssetStore {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "kcc_configs": { "1": {} },
        "bullets": {
            "1": { "damage": 12.5 },
            "2": { "action": { "kind": "explosive", "explosion_shape": { "type": "circle", "radius": 2 } } }
        },
        "weapons": { "1": { "fire_rate": 8, "bullet": 1 } },
        "statuses": { "1": { "max_health": 50 } },
        "characters": { "1": { "kcc": 1, "status": 1, "weapons": [1] } },
        "level": {
            "colliders": [ { "shape": { "type": "box", "half_extents": [10, 0.5] }, "position": [0, -0.5] } ],
            "spawn_points": [ { "position": [1, 1] } ]
        }
    }"#;

    #[test]
    fn test_load_sample_tables() {
        let store = AssetStore::from_json_str(SAMPLE).unwrap();
        let bullet = store.bullet(AssetRef::new(1)).unwrap();
        assert_eq!(bullet.damage, fp_ratio(25, 2));
        assert_eq!(bullet.action, BulletAction::Common);
        let explosive = store.bullet(AssetRef::new(2)).unwrap();
        assert_eq!(
            explosive.action,
            BulletAction::Explosive {
                explosion_shape: Shape2D::circle(fp(2))
            }
        );
        assert_eq!(store.weapon(AssetRef::new(1)).unwrap().fire_rate, fp(8));
        assert_eq!(store.level.colliders.len(), 1);
        assert_eq!(store.level.spawn_points[0].position, FpVec2::from_ints(1, 1));
    }

    #[test]
    fn test_dangling_reference_is_rejected() {
        let json = r#"{ "weapons": { "1": { "bullet": 9 } } }"#;
        match AssetStore::from_json_str(json) {
            Err(SimError::MissingAsset { kind, id }) => {
                assert_eq!(kind, "bullet");
                assert_eq!(id, 9);
            }
            other => panic!("expected missing asset, got {other:?}"),
        }
    }

    #[test]
    fn test_lookup_of_unknown_id_is_none() {
        let store = AssetStore::new();
        assert!(store.status(AssetRef::new(3)).is_none());
    }
}
