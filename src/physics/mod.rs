//! Deterministic collision queries.
//!
//! A small fixed-point collider world made of the
//! [`StaticGeometry`](crate::resources::staticgeometry::StaticGeometry)
//! resource and every entity carrying a
//! [`PhysicsCollider2D`](crate::components::collider::PhysicsCollider2D).
//! Queries are synchronous and return hits in a stable order: static
//! colliders by index first, then entities by id.
//!
//! Submodules overview:
//! - [`shape`] – shapes and pairwise penetration / segment tests
//! - [`query`] – overlap, linecast and line-of-sight queries over a `World`

pub mod query;
pub mod shape;

/// Collider layer bits.
pub mod layers {
    pub const STATIC: u32 = 1;
    pub const CHARACTER: u32 = 1 << 1;
    pub const ALL: u32 = u32::MAX;
}
