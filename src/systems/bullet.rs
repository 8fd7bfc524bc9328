//! Projectile flight and impact.
//!
//! Each tick a bullet linecasts from its position to where it will be next
//! tick. The first living character (other than the shooter) or solid piece
//! of level geometry on that segment resolves the bullet there. Otherwise it
//! advances and resolves on its own once it is further than its range from
//! the shooter. Bullets whose shooter no longer exists are removed.
//!
//! Resolution dispatches on [`BulletAction`]; see [`apply_bullet_action`].

use bevy_ecs::prelude::*;
use log::warn;

use crate::components::bullet::BulletFields;
use crate::components::status::Status;
use crate::components::transform::Transform2D;
use crate::events::sim::{SimEvent, emit};
use crate::math::{Fp, FpVec2, clamp01};
use crate::physics::layers;
use crate::physics::query::{QueryFilter, line_of_sight, linecast_all, overlap_shape};
use crate::physics::shape::Shape2D;
use crate::resources::assets::{Assets, BulletAction, BulletData};
use crate::resources::signals;
use crate::resources::simtime::SimTime;

pub fn bullet_system(world: &mut World) {
    let Some(time) = world.get_resource::<SimTime>().copied() else {
        return;
    };
    let Some(assets) = world.get_resource::<Assets>().cloned() else {
        return;
    };

    let mut bullets: Vec<Entity> = world
        .query_filtered::<Entity, (With<BulletFields>, With<Transform2D>)>()
        .iter(world)
        .collect();
    bullets.sort();

    for bullet in bullets {
        let Some(fields) = world.get::<BulletFields>(bullet).copied() else {
            continue;
        };
        let Some(data) = assets.bullet(fields.data) else {
            warn!("bullet_system: missing bullet data {:?}", fields.data);
            world.despawn(bullet);
            continue;
        };

        if check_collision(world, &time, bullet, &fields, data) {
            continue;
        }

        let Some(source_position) = world.get::<Transform2D>(fields.source).map(|t| t.position)
        else {
            world.despawn(bullet);
            continue;
        };

        let position = {
            let Some(mut transform) = world.get_mut::<Transform2D>(bullet) else {
                continue;
            };
            transform.position += fields.direction * time.delta;
            transform.position
        };

        if position.distance(source_position) > data.range {
            apply_bullet_action(world, bullet, None, data);
        }
    }
}

/// Linecast this tick's path. Returns true when the bullet resolved.
fn check_collision(
    world: &mut World,
    time: &SimTime,
    bullet: Entity,
    fields: &BulletFields,
    data: &BulletData,
) -> bool {
    if fields.direction == FpVec2::ZERO {
        return false;
    }
    let Some(position) = world.get::<Transform2D>(bullet).map(|t| t.position) else {
        return false;
    };
    let next = position + fields.direction * time.delta;
    if position.distance_squared(next) <= data.collision_check_threshold {
        return false;
    }

    let hits = linecast_all(world, position, next, QueryFilter::solids(layers::ALL));
    for hit in hits.iter() {
        let target = match hit.entity() {
            Some(entity) => {
                if entity == fields.source {
                    continue;
                }
                match world.get::<Status>(entity) {
                    Some(status) if !status.is_dead => Some(entity),
                    _ => continue,
                }
            }
            None => None,
        };

        if let Some(mut transform) = world.get_mut::<Transform2D>(bullet) {
            transform.position = hit.point;
        }
        apply_bullet_action(world, bullet, target, data);
        return true;
    }
    false
}

/// Resolve `bullet`: damage according to its action, emit
/// `BulletDestroyed` and despawn it.
///
/// - `Common` damages `target`, if any.
/// - `Explosive` first damages every character around the impact point with
///   linear falloff, skipping `target` and characters behind level geometry,
///   then deals full damage to `target`.
pub fn apply_bullet_action(
    world: &mut World,
    bullet: Entity,
    target: Option<Entity>,
    data: &BulletData,
) {
    let (Some(fields), Some(position)) = (
        world.get::<BulletFields>(bullet).copied(),
        world.get::<Transform2D>(bullet).map(|t| t.position),
    ) else {
        return;
    };

    if let BulletAction::Explosive { explosion_shape } = &data.action {
        explode(world, bullet, position, target, explosion_shape, data.damage);
    }
    if let Some(target) = target {
        signals::character_hit(world, bullet, target, data.damage);
    }

    emit(
        world,
        SimEvent::BulletDestroyed {
            bullet,
            source: fields.source,
            position,
            direction: fields.direction,
            bullet_data: fields.data,
        },
    );
    world.despawn(bullet);
}

/// Damage scale at `distance` from the centre of an explosion of `radius`.
pub fn falloff(distance: Fp, radius: Fp) -> Fp {
    if radius <= Fp::ZERO {
        return Fp::ZERO;
    }
    clamp01(Fp::ONE - distance / radius)
}

fn explode(
    world: &mut World,
    bullet: Entity,
    position: FpVec2,
    target: Option<Entity>,
    shape: &Shape2D,
    damage: Fp,
) {
    let hits = overlap_shape(world, position, shape, QueryFilter::all(layers::ALL));
    for hit in hits.iter() {
        let Some(entity) = hit.entity() else {
            continue;
        };
        if world.get::<Status>(entity).is_none() {
            continue;
        }
        let Some(entity_position) = world.get::<Transform2D>(entity).map(|t| t.position) else {
            continue;
        };
        if !line_of_sight(world, position, entity_position) {
            continue;
        }
        // The direct target takes full damage separately.
        if Some(entity) == target {
            continue;
        }

        let scaled = damage * falloff(position.distance(entity_position), shape.radius());
        signals::character_hit(world, bullet, entity, scaled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{fp, fp_ratio};

    #[test]
    fn test_falloff_edges() {
        assert_eq!(falloff(Fp::ZERO, fp(2)), Fp::ONE);
        assert_eq!(falloff(fp(2), fp(2)), Fp::ZERO);
        assert_eq!(falloff(fp(1), fp(2)), fp_ratio(1, 2));
        assert_eq!(falloff(fp(5), fp(2)), Fp::ZERO);
        assert_eq!(falloff(fp(1), Fp::ZERO), Fp::ZERO);
    }
}
