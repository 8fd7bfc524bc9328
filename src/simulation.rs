//! The simulation facade.
//!
//! [`Simulation`] owns the ECS [`World`] and the per-tick [`Schedule`]. It
//! installs every resource a tick needs, registers the default signal
//! handlers and runs the gameplay systems in one fixed order.
//!
//! # Tick order
//!
//! 1. latch player input
//! 2. register new spawn points
//! 3. disconnect absent players
//! 4. move characters
//! 5. integrate ballistic bodies
//! 6. switch weapons, then fire them
//! 7. cast skills
//! 8. bullets, then skill activation
//! 9. health regeneration
//! 10. respawn
//!
//! # Example
//!
//! ```no_run
//! use platformer_sim::resources::assets::AssetStore;
//! use platformer_sim::resources::simconfig::SimConfig;
//! use platformer_sim::simulation::Simulation;
//!
//! let assets = AssetStore::load_from_file("assets/sim_assets.json")?;
//! let mut sim = Simulation::new(SimConfig::new(), assets);
//! sim.step();
//! let events = sim.drain_events();
//! # Ok::<(), platformer_sim::error::SimError>(())
//! ```

use bevy_ecs::message::Messages;
use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;
use log::{debug, error, info};

use crate::components::collider::PhysicsCollider2D;
use crate::components::player::{PlayerLink, SpawnIdentifier};
use crate::components::transform::Transform2D;
use crate::error::SimError;
use crate::events::sim::SimEvent;
use crate::math::FpVec2;
use crate::resources::assets::{AssetRef, AssetStore, Assets, CharacterPrototype, LevelData};
use crate::resources::input::{InputFrame, PlayerInputs, PlayerRef};
use crate::resources::rng::SimRng;
use crate::resources::roster::PlayerRoster;
use crate::resources::signals::{self, SignalBus};
use crate::resources::simconfig::SimConfig;
use crate::resources::simtime::SimTime;
use crate::resources::spawnplaces::SpawnPlaces;
use crate::resources::staticgeometry::{StaticCollider, StaticGeometry};
use crate::snapshot::SimSnapshot;
use crate::systems::bullet::bullet_system;
use crate::systems::disconnect::disconnect_system;
use crate::systems::input::update_player_inputs;
use crate::systems::movement::movement_system;
use crate::systems::physicsbody::physics_body_system;
use crate::systems::player::on_player_added;
use crate::systems::respawn::{respawn_system, spawn_registration_system};
use crate::systems::skill::{skill_inventory_system, skill_system};
use crate::systems::status::{on_character_hit, on_character_skill_hit, status_regen_system};
use crate::systems::weapon::{weapon_inventory_system, weapon_system};
use crate::systems::{respawn, status, weapon};

/// Signal handlers every simulation starts with.
pub fn default_signal_bus() -> SignalBus {
    let mut bus = SignalBus::new();
    bus.on_character_hit(on_character_hit)
        .on_character_skill_hit(on_character_skill_hit)
        .on_character_respawn(status::on_character_respawn)
        .on_character_respawn(weapon::on_character_respawn)
        .on_character_respawn(respawn::on_character_respawn)
        .on_spawn_identifier_added(respawn::on_spawn_identifier_added)
        .on_player_added(on_player_added);
    bus
}

/// The per-tick schedule, run on the calling thread.
pub fn build_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.add_systems(
        (
            update_player_inputs,
            spawn_registration_system,
            disconnect_system,
            movement_system,
            physics_body_system,
            weapon_inventory_system,
            weapon_system,
            skill_inventory_system,
            bullet_system,
            skill_system,
            status_regen_system,
            respawn_system,
        )
            .chain(),
    );
    schedule
}

pub struct Simulation {
    world: World,
    schedule: Schedule,
}

impl Simulation {
    pub fn new(config: SimConfig, assets: AssetStore) -> Self {
        let mut world = World::new();
        world.insert_resource(SimTime::new(config.tick_rate));
        world.insert_resource(SimRng::new(config.seed));
        world.insert_resource(PlayerInputs::new(config.max_players));
        world.insert_resource(PlayerRoster::new(config.max_players));
        world.insert_resource(Assets::new(assets));
        world.init_resource::<SpawnPlaces>();
        world.init_resource::<StaticGeometry>();
        world.init_resource::<Messages<SimEvent>>();
        world.insert_resource(default_signal_bus());
        info!(
            "Simulation created: {} ticks/s, {} player slots, seed {:#x}",
            config.tick_rate, config.max_players, config.seed
        );
        world.insert_resource(config);

        let mut schedule = build_schedule();
        if let Err(e) = schedule.initialize(&mut world) {
            error!("Failed to initialize schedule: {e}");
        }
        Simulation { world, schedule }
    }

    /// Add the level's colliders and spawn points.
    pub fn load_level(&mut self, level: &LevelData) {
        for collider in &level.colliders {
            let static_collider = if collider.is_trigger {
                StaticCollider::trigger(collider.shape, collider.position)
            } else {
                StaticCollider::solid(collider.shape, collider.position)
            };
            self.add_static_collider(static_collider);
        }
        for spawn in &level.spawn_points {
            self.add_spawn_point(spawn.position);
        }
        debug!(
            "Level loaded: {} colliders, {} spawn points",
            level.colliders.len(),
            level.spawn_points.len()
        );
    }

    pub fn add_static_collider(&mut self, collider: StaticCollider) -> usize {
        self.world.resource_mut::<StaticGeometry>().add(collider)
    }

    /// Spawn a spawn point; it is registered at the start of the next tick.
    pub fn add_spawn_point(&mut self, position: FpVec2) -> Entity {
        self.world
            .spawn((Transform2D::new(position), SpawnIdentifier))
            .id()
    }

    /// Spawn an entity collider, e.g. a moving platform or a pickup zone.
    pub fn add_entity_collider(&mut self, position: FpVec2, collider: PhysicsCollider2D) -> Entity {
        self.world.spawn((Transform2D::new(position), collider)).id()
    }

    /// Join `player` with the character described by `prototype`.
    ///
    /// Returns the new character, `None` when the player slot or the
    /// prototype does not exist.
    pub fn add_player(
        &mut self,
        player: PlayerRef,
        prototype: AssetRef<CharacterPrototype>,
    ) -> Option<Entity> {
        if player.0 as usize >= self.world.resource::<PlayerInputs>().capacity() {
            return None;
        }
        let first_time = {
            let mut roster = self.world.resource_mut::<PlayerRoster>();
            let first_time = roster.avatar(player).is_none();
            roster.set_avatar(player, prototype);
            first_time
        };
        self.world
            .resource_mut::<PlayerInputs>()
            .set_present(player, true);

        let before = self.character_of(player);
        signals::player_added(&mut self.world, player, first_time);
        self.character_of(player).filter(|&entity| Some(entity) != before)
    }

    /// Character linked to `player`, the highest id when several are.
    pub fn character_of(&mut self, player: PlayerRef) -> Option<Entity> {
        self.world
            .query::<(Entity, &PlayerLink)>()
            .iter(&self.world)
            .filter(|(_, link)| link.player == player)
            .map(|(entity, _)| entity)
            .max()
    }

    /// Queue `frame` as the player's input for the next tick.
    pub fn set_input(&mut self, player: PlayerRef, frame: InputFrame) {
        self.world.resource_mut::<PlayerInputs>().set(player, frame);
    }

    pub fn set_player_present(&mut self, player: PlayerRef, present: bool) {
        self.world
            .resource_mut::<PlayerInputs>()
            .set_present(player, present);
    }

    /// Advance one tick.
    pub fn step(&mut self) {
        self.world.resource_mut::<SimTime>().frame += 1;
        self.world.resource_mut::<Messages<SimEvent>>().update();
        self.schedule.run(&mut self.world);
        self.world.clear_trackers();
    }

    pub fn frame(&self) -> u32 {
        self.world.resource::<SimTime>().frame
    }

    pub fn time(&self) -> SimTime {
        *self.world.resource::<SimTime>()
    }

    /// Take every event written since the last drain.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.world
            .resource_mut::<Messages<SimEvent>>()
            .drain()
            .collect()
    }

    /// Register extra signal handlers; they run after the default ones.
    pub fn signals_mut(&mut self) -> Mut<'_, SignalBus> {
        self.world.resource_mut::<SignalBus>()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn snapshot(&mut self) -> SimSnapshot {
        SimSnapshot::capture(&mut self.world)
    }

    pub fn checksum(&mut self) -> Result<u64, SimError> {
        self.snapshot().checksum()
    }
}
