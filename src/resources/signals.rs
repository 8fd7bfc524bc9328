//! Synchronous cross-system calls.
//!
//! A [`SignalBus`] maps each signal kind to an ordered list of plain function
//! handlers. The table is filled once when the simulation is built and
//! handlers run immediately, in registration order, on the thread raising the
//! signal. Nothing is queued: a bullet hit has already changed the target's
//! health when the raising system moves on to its next entity.
//!
//! Raise signals through the free functions in this module; they look the
//! handler up by index on every call so a handler may freely borrow the world.

use bevy_ecs::prelude::*;

use crate::components::kcc::{KCC2D, KCCQueryResult};
use crate::math::Fp;
use crate::physics::query::OverlapHit;
use crate::resources::input::PlayerRef;

pub type CharacterHitHandler = fn(&mut World, Entity, Entity, Fp);
pub type CharacterSkillHitHandler = fn(&mut World, Entity, Entity);
pub type CharacterRespawnHandler = fn(&mut World, Entity);
pub type CharacterDeathHandler = fn(&mut World, Entity, Entity);
pub type PlayerAddedHandler = fn(&mut World, PlayerRef, bool);
pub type KccPreCollisionHandler = fn(&mut World, Entity, &mut KCC2D, &mut KCCQueryResult);
pub type KccSolverCollisionHandler = fn(&mut World, Entity, &mut KCC2D, &mut KCCQueryResult, u32);
pub type KccTriggerHandler = fn(&mut World, Entity, &mut KCC2D, &OverlapHit);
pub type ComponentAddedHandler = fn(&mut World, Entity);

/// Registration table of signal handlers.
#[derive(Resource, Clone, Default)]
pub struct SignalBus {
    character_hit: Vec<CharacterHitHandler>,
    character_skill_hit: Vec<CharacterSkillHitHandler>,
    character_respawn: Vec<CharacterRespawnHandler>,
    character_death: Vec<CharacterDeathHandler>,
    player_added: Vec<PlayerAddedHandler>,
    kcc_pre_collision: Vec<KccPreCollisionHandler>,
    kcc_solver_collision: Vec<KccSolverCollisionHandler>,
    kcc_trigger: Vec<KccTriggerHandler>,
    spawn_identifier_added: Vec<ComponentAddedHandler>,
}

impl SignalBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(bullet, target, damage)`
    pub fn on_character_hit(&mut self, handler: CharacterHitHandler) -> &mut Self {
        self.character_hit.push(handler);
        self
    }

    /// `(skill, target)`
    pub fn on_character_skill_hit(&mut self, handler: CharacterSkillHitHandler) -> &mut Self {
        self.character_skill_hit.push(handler);
        self
    }

    /// `(character)`
    pub fn on_character_respawn(&mut self, handler: CharacterRespawnHandler) -> &mut Self {
        self.character_respawn.push(handler);
        self
    }

    /// `(target, source)`
    pub fn on_character_death(&mut self, handler: CharacterDeathHandler) -> &mut Self {
        self.character_death.push(handler);
        self
    }

    /// `(player, first_time)`
    pub fn on_player_added(&mut self, handler: PlayerAddedHandler) -> &mut Self {
        self.player_added.push(handler);
        self
    }

    pub fn on_kcc_pre_collision(&mut self, handler: KccPreCollisionHandler) -> &mut Self {
        self.kcc_pre_collision.push(handler);
        self
    }

    /// Handlers also receive the solver iteration index.
    pub fn on_kcc_solver_collision(&mut self, handler: KccSolverCollisionHandler) -> &mut Self {
        self.kcc_solver_collision.push(handler);
        self
    }

    pub fn on_kcc_trigger(&mut self, handler: KccTriggerHandler) -> &mut Self {
        self.kcc_trigger.push(handler);
        self
    }

    /// Raised once for each entity that gains a `SpawnIdentifier`.
    pub fn on_spawn_identifier_added(&mut self, handler: ComponentAddedHandler) -> &mut Self {
        self.spawn_identifier_added.push(handler);
        self
    }
}

/// Call every handler of one list in order.
fn dispatch<H: Copy>(
    world: &mut World,
    list: fn(&SignalBus) -> &[H],
    mut call: impl FnMut(&mut World, H),
) {
    let mut index = 0;
    while let Some(handler) = world
        .get_resource::<SignalBus>()
        .and_then(|bus| list(bus).get(index).copied())
    {
        call(world, handler);
        index += 1;
    }
}

pub fn character_hit(world: &mut World, bullet: Entity, target: Entity, damage: Fp) {
    dispatch(world, |bus| bus.character_hit.as_slice(), |w, h| h(w, bullet, target, damage));
}

pub fn character_skill_hit(world: &mut World, skill: Entity, target: Entity) {
    dispatch(world, |bus| bus.character_skill_hit.as_slice(), |w, h| h(w, skill, target));
}

pub fn character_respawn(world: &mut World, character: Entity) {
    dispatch(world, |bus| bus.character_respawn.as_slice(), |w, h| h(w, character));
}

pub fn character_death(world: &mut World, target: Entity, source: Entity) {
    dispatch(world, |bus| bus.character_death.as_slice(), |w, h| h(w, target, source));
}

pub fn player_added(world: &mut World, player: PlayerRef, first_time: bool) {
    dispatch(world, |bus| bus.player_added.as_slice(), |w, h| h(w, player, first_time));
}

pub fn kcc_pre_collision(
    world: &mut World,
    entity: Entity,
    kcc: &mut KCC2D,
    contact: &mut KCCQueryResult,
) {
    dispatch(world, |bus| bus.kcc_pre_collision.as_slice(), |w, h| h(w, entity, kcc, contact));
}

pub fn kcc_solver_collision(
    world: &mut World,
    entity: Entity,
    kcc: &mut KCC2D,
    contact: &mut KCCQueryResult,
    iteration: u32,
) {
    dispatch(world, |bus| bus.kcc_solver_collision.as_slice(), |w, h| {
        h(w, entity, kcc, contact, iteration)
    });
}

pub fn kcc_trigger(world: &mut World, entity: Entity, kcc: &mut KCC2D, hit: &OverlapHit) {
    dispatch(world, |bus| bus.kcc_trigger.as_slice(), |w, h| h(w, entity, kcc, hit));
}

pub fn spawn_identifier_added(world: &mut World, entity: Entity) {
    dispatch(world, |bus| bus.spawn_identifier_added.as_slice(), |w, h| h(w, entity));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Resource, Default)]
    struct CallLog(Vec<&'static str>);

    fn first(world: &mut World, _: Entity) {
        world.resource_mut::<CallLog>().0.push("first");
    }

    fn second(world: &mut World, _: Entity) {
        world.resource_mut::<CallLog>().0.push("second");
    }

    #[test]
    fn test_handlers_run_in_registration_order() {
        let mut world = World::new();
        world.init_resource::<CallLog>();
        let mut bus = SignalBus::new();
        bus.on_character_respawn(second).on_character_respawn(first);
        world.insert_resource(bus);

        let e = world.spawn_empty().id();
        character_respawn(&mut world, e);
        assert_eq!(world.resource::<CallLog>().0, vec!["second", "first"]);
    }

    #[test]
    fn test_signal_without_bus_is_a_no_op() {
        let mut world = World::new();
        world.init_resource::<CallLog>();
        let e = world.spawn_empty().id();
        character_respawn(&mut world, e);
        assert!(world.resource::<CallLog>().0.is_empty());
    }

    #[test]
    fn test_kcc_handler_can_veto_step() {
        fn veto(_: &mut World, _: Entity, kcc: &mut KCC2D, contact: &mut KCCQueryResult) {
            contact.ignore = true;
            kcc.ignore_step = true;
        }
        let mut world = World::new();
        let mut bus = SignalBus::new();
        bus.on_kcc_pre_collision(veto);
        world.insert_resource(bus);

        let e = world.spawn_empty().id();
        let mut kcc = KCC2D::new(crate::resources::assets::AssetRef::new(1));
        let mut contact = KCCQueryResult::default();
        kcc_pre_collision(&mut world, e, &mut kcc, &mut contact);
        assert!(kcc.ignore_step);
        assert!(contact.ignore);
    }
}
