//! Ballistic body integration.
//!
//! Integrates [`PhysicsBody2D`] velocities (gravity, drag, speed cap) into
//! positions and keeps the body out of solid level geometry. Bodies slide
//! along the surfaces they hit; the velocity component into the surface is
//! removed.

use bevy_ecs::prelude::*;

use crate::components::physicsbody::PhysicsBody2D;
use crate::components::transform::Transform2D;
use crate::math::{Fp, FpVec2, clamp01};
use crate::physics::shape::{Shape2D, penetration};
use crate::resources::simconfig::SimConfig;
use crate::resources::simtime::SimTime;
use crate::resources::staticgeometry::StaticGeometry;

pub fn physics_body_system(
    mut query: Query<(&mut Transform2D, &mut PhysicsBody2D)>,
    time: Res<SimTime>,
    config: Res<SimConfig>,
    geometry: Option<Res<StaticGeometry>>,
) {
    let dt = time.delta;
    for (mut transform, mut body) in query.iter_mut() {
        if body.frozen {
            continue;
        }

        let gravity = config.gravity * body.gravity_scale;
        body.velocity.y += gravity * dt;
        if body.friction > Fp::ZERO {
            let damping = clamp01(Fp::ONE - body.friction * dt);
            body.velocity *= damping;
        }
        if let Some(max_speed) = body.max_speed {
            body.velocity = body.velocity.clamp_magnitude(max_speed);
        }

        let mut position = transform.position + body.velocity * dt;
        if let Some(geometry) = geometry.as_deref() {
            let shape = Shape2D::circle(body.radius);
            for (_, collider) in geometry.iter().filter(|(_, c)| !c.is_trigger) {
                let Some(contact) = penetration(&shape, position, &collider.shape, collider.position)
                else {
                    continue;
                };
                position += contact.normal * contact.penetration;
                body.velocity = remove_into(body.velocity, contact.normal);
            }
        }
        transform.position = position;
    }
}

/// Drop the part of `velocity` that points into the surface with `normal`.
fn remove_into(velocity: FpVec2, normal: FpVec2) -> FpVec2 {
    let into = velocity.dot(normal);
    if into < Fp::ZERO {
        velocity - normal * into
    } else {
        velocity
    }
}
