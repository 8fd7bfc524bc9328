//! Health, damage and death.
//!
//! [`status_regen_system`] regenerates living characters once their regen
//! delay has passed. Damage arrives through signals:
//!
//! - [`on_character_hit`] – a bullet (or its explosion) hit a character
//! - [`on_character_skill_hit`] – an activated skill caught a character
//! - [`on_character_respawn`] – restore health and grant invincibility
//!
//! A character dies at most once per life: damage to a dead character is
//! ignored until it respawns.

use bevy_ecs::prelude::*;
use log::{debug, warn};

use crate::components::bullet::BulletFields;
use crate::components::collider::PhysicsCollider2D;
use crate::components::kcc::KCC2D;
use crate::components::skill::SkillFields;
use crate::components::status::Status;
use crate::components::timer::FrameTimer;
use crate::events::sim::{SimEvent, emit};
use crate::math::Fp;
use crate::resources::assets::Assets;
use crate::resources::signals;
use crate::resources::simtime::SimTime;

pub fn status_regen_system(
    mut query: Query<&mut Status>,
    time: Res<SimTime>,
    assets: Res<Assets>,
) {
    for mut status in query.iter_mut() {
        if status.is_dead || status.regen_timer.is_running(&time) {
            continue;
        }
        let Some(data) = assets.status(status.data) else {
            continue;
        };
        if status.current_health < data.max_health {
            let health = status.current_health + time.delta * data.regen_rate;
            status.current_health = health.min(data.max_health);
        }
    }
}

pub fn on_character_hit(world: &mut World, bullet: Entity, target: Entity, damage: Fp) {
    let Some(fields) = world.get::<BulletFields>(bullet).copied() else {
        warn!("on_character_hit: {:?} is not a bullet", bullet);
        return;
    };
    apply_damage(world, fields.source, target, damage);
}

pub fn on_character_skill_hit(world: &mut World, skill: Entity, target: Entity) {
    let Some(fields) = world.get::<SkillFields>(skill).copied() else {
        warn!("on_character_skill_hit: {:?} is not a skill", skill);
        return;
    };
    let Some(damage) = world
        .get_resource::<Assets>()
        .and_then(|assets| assets.skill(fields.data))
        .map(|data| data.damage)
    else {
        warn!("on_character_skill_hit: missing skill data {:?}", fields.data);
        return;
    };
    apply_damage(world, fields.source, target, damage);
}

pub fn on_character_respawn(world: &mut World, character: Entity) {
    let Some(time) = world.get_resource::<SimTime>().copied() else {
        return;
    };
    let Some(assets) = world.get_resource::<Assets>().cloned() else {
        return;
    };
    let Some(mut status) = world.get_mut::<Status>(character) else {
        return;
    };
    let Some(data) = assets.status(status.data) else {
        warn!("on_character_respawn: missing status data {:?}", status.data);
        return;
    };
    status.is_dead = false;
    status.current_health = data.max_health;
    status.invincible_timer = FrameTimer::from_seconds(&time, data.invincible_time);
}

/// Subtract `damage` from `target`, killing it when health reaches zero.
///
/// No-op while the target is invincible, dead, or when `damage` is below the
/// target's minimum damage.
pub fn apply_damage(world: &mut World, source: Entity, target: Entity, damage: Fp) {
    let Some(time) = world.get_resource::<SimTime>().copied() else {
        return;
    };
    let Some(assets) = world.get_resource::<Assets>().cloned() else {
        return;
    };
    let Some(mut status) = world.get::<Status>(target).copied() else {
        return;
    };
    if status.is_dead {
        return;
    }
    let Some(data) = assets.status(status.data) else {
        warn!("apply_damage: missing status data {:?}", status.data);
        return;
    };
    if status.invincible_timer.is_running(&time) || damage < data.minimum_damage {
        return;
    }

    status.regen_timer = FrameTimer::from_seconds(&time, data.time_until_regen);
    status.current_health -= damage;
    let lethal = status.current_health <= Fp::ZERO;
    if lethal {
        status.current_health = Fp::ZERO;
        status.is_dead = true;
        status.respawn_timer = FrameTimer::from_seconds(&time, data.respawn_time);
    }
    if let Some(mut stored) = world.get_mut::<Status>(target) {
        *stored = status;
    }

    emit(
        world,
        SimEvent::CharacterTakeDamage {
            character: target,
            damage,
            source,
        },
    );
    emit(world, SimEvent::CharacterBlink { character: target });

    if lethal {
        kill(world, source, target);
    }
}

fn kill(world: &mut World, source: Entity, target: Entity) {
    debug!("{:?} killed by {:?}", target, source);
    if let Some(mut kcc) = world.get_mut::<KCC2D>(target) {
        kcc.set_horizontal_speed(Fp::ZERO);
    }
    if let Some(mut collider) = world.get_mut::<PhysicsCollider2D>(target) {
        collider.is_trigger = true;
    }

    signals::character_death(world, target, source);
    emit(
        world,
        SimEvent::CharacterDeath {
            character: target,
            killer: source,
        },
    );
}

#[cfg(test)]
mod tests {
    use bevy_ecs::message::Messages;

    use super::*;
    use crate::math::fp;
    use crate::physics::shape::Shape2D;
    use crate::resources::assets::{AssetRef, AssetStore, StatusData};

    fn make_world() -> (World, AssetRef<StatusData>) {
        let mut world = World::new();
        let mut store = AssetStore::new();
        let data = store.insert_status(
            1,
            StatusData {
                max_health: fp(100),
                minimum_damage: fp(5),
                invincible_time: fp(1),
                ..StatusData::default()
            },
        );
        world.insert_resource(Assets::new(store));
        let mut time = SimTime::new(60);
        time.frame = 100;
        world.insert_resource(time);
        world.init_resource::<Messages<SimEvent>>();
        (world, data)
    }

    fn spawn_character(world: &mut World, data: AssetRef<StatusData>) -> Entity {
        world
            .spawn((
                Status::new(data, fp(100)),
                PhysicsCollider2D::new(Shape2D::circle(fp(1))),
            ))
            .id()
    }

    fn drain(world: &mut World) -> Vec<SimEvent> {
        world.resource_mut::<Messages<SimEvent>>().drain().collect()
    }

    // ==================== DAMAGE TESTS ====================

    #[test]
    fn test_damage_reduces_health_and_emits() {
        let (mut world, data) = make_world();
        let source = world.spawn_empty().id();
        let target = spawn_character(&mut world, data);

        apply_damage(&mut world, source, target, fp(30));

        let status = world.get::<Status>(target).unwrap();
        assert_eq!(status.current_health, fp(70));
        assert!(status.regen_timer.is_valid());
        let events = drain(&mut world);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], SimEvent::CharacterTakeDamage { damage, .. } if damage == fp(30)));
        assert!(matches!(events[1], SimEvent::CharacterBlink { .. }));
    }

    #[test]
    fn test_small_damage_ignored() {
        let (mut world, data) = make_world();
        let source = world.spawn_empty().id();
        let target = spawn_character(&mut world, data);

        apply_damage(&mut world, source, target, fp(4));
        assert_eq!(world.get::<Status>(target).unwrap().current_health, fp(100));
        assert!(drain(&mut world).is_empty());
    }

    #[test]
    fn test_invincible_ignores_damage() {
        let (mut world, data) = make_world();
        let source = world.spawn_empty().id();
        let target = spawn_character(&mut world, data);
        on_character_respawn(&mut world, target);

        apply_damage(&mut world, source, target, fp(50));
        assert_eq!(world.get::<Status>(target).unwrap().current_health, fp(100));
        assert!(drain(&mut world).is_empty());
    }

    #[test]
    fn test_lethal_damage_kills_once() {
        let (mut world, data) = make_world();
        let source = world.spawn_empty().id();
        let target = spawn_character(&mut world, data);

        apply_damage(&mut world, source, target, fp(120));
        apply_damage(&mut world, source, target, fp(120));

        let status = world.get::<Status>(target).unwrap();
        assert!(status.is_dead);
        assert_eq!(status.current_health, Fp::ZERO);
        assert!(status.respawn_timer.is_valid());
        assert!(world.get::<PhysicsCollider2D>(target).unwrap().is_trigger);
        let deaths = drain(&mut world)
            .into_iter()
            .filter(|ev| matches!(ev, SimEvent::CharacterDeath { .. }))
            .count();
        assert_eq!(deaths, 1);
    }

    #[test]
    fn test_respawn_restores_health() {
        let (mut world, data) = make_world();
        let source = world.spawn_empty().id();
        let target = spawn_character(&mut world, data);
        apply_damage(&mut world, source, target, fp(200));

        on_character_respawn(&mut world, target);
        let status = world.get::<Status>(target).unwrap();
        assert!(!status.is_dead);
        assert_eq!(status.current_health, fp(100));
        assert!(status.invincible_timer.is_valid());
    }

    // ==================== REGEN TESTS ====================

    #[test]
    fn test_regen_waits_for_timer_and_caps() {
        let (mut world, data) = make_world();
        let source = world.spawn_empty().id();
        let target = spawn_character(&mut world, data);
        apply_damage(&mut world, source, target, fp(10));

        let mut schedule = Schedule::default();
        schedule.add_systems(status_regen_system);
        schedule.run(&mut world);
        assert_eq!(world.get::<Status>(target).unwrap().current_health, fp(90));

        // jump past the regen delay and far enough to refill
        world.resource_mut::<SimTime>().frame += 60 * 60;
        for _ in 0..400 {
            schedule.run(&mut world);
        }
        assert_eq!(world.get::<Status>(target).unwrap().current_health, fp(100));
    }
}
