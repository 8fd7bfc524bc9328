//! Simple ballistic body for entities moved by the physics layer.
//!
//! Skill projectiles (grenades and the like) carry a [`PhysicsBody2D`]; the
//! [`physics_body_system`](crate::systems::physicsbody::physics_body_system)
//! applies gravity, drag and speed limits, then pushes the body out of solid
//! static geometry. Characters never use it, they move through the KCC.

use bevy_ecs::prelude::Component;
use serde::Serialize;

use crate::math::{Fp, FpVec2};

#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PhysicsBody2D {
    /// Current velocity in world units per second.
    pub velocity: FpVec2,
    /// Multiplier on the configured world gravity.
    pub gravity_scale: Fp,
    /// Velocity damping. Applied as: velocity *= clamp01(1 - friction * dt).
    pub friction: Fp,
    /// Optional maximum speed. Velocity magnitude is clamped to this value.
    pub max_speed: Option<Fp>,
    /// Radius used when resolving against static geometry.
    pub radius: Fp,
    /// When true, the body is not integrated.
    pub frozen: bool,
}

impl Default for PhysicsBody2D {
    fn default() -> Self {
        Self::new(FpVec2::ZERO)
    }
}

impl PhysicsBody2D {
    pub fn new(velocity: FpVec2) -> Self {
        Self {
            velocity,
            gravity_scale: Fp::ONE,
            friction: Fp::ZERO,
            max_speed: None,
            radius: Fp::ZERO,
            frozen: false,
        }
    }

    pub fn with_gravity_scale(mut self, scale: Fp) -> Self {
        self.gravity_scale = scale;
        self
    }

    /// Configure drag and an optional speed cap.
    pub fn with_physics(mut self, friction: Fp, max_speed: Option<Fp>) -> Self {
        self.friction = friction;
        self.max_speed = max_speed;
        self
    }

    pub fn with_radius(mut self, radius: Fp) -> Self {
        self.radius = radius;
        self
    }
}
