//! ECS components for simulated entities.
//!
//! This module groups the component types attached to characters,
//! projectiles, skills and spawn points. Components only carry data; the
//! rules that change them live in [`crate::systems`] and [`crate::kcc`].
//!
//! Submodules overview:
//! - [`bullet`] – projectile in flight, its source and velocity
//! - [`collider`] – collision shape, layer and trigger flag of an entity
//! - [`kcc`] – kinematic controller state, contact records and movement states
//! - [`physicsbody`] – ballistic body integrated by the physics body system
//! - [`player`] – player link, facing hint and spawn point marker
//! - [`skill`] – delayed area effect and the inventory casting it
//! - [`status`] – health, death, invincibility and respawn timers
//! - [`timer`] – frame-counted expiring timer used by the other components
//! - [`transform`] – world-space position
//! - [`weapon`] – weapon state and the per-character weapon inventory

pub mod bullet;
pub mod collider;
pub mod kcc;
pub mod physicsbody;
pub mod player;
pub mod skill;
pub mod status;
pub mod timer;
pub mod transform;
pub mod weapon;
