//! ECS resources made available to systems.
//!
//! This module groups the long-lived data injected into the simulation
//! world: the clock, player input, configuration, immutable data assets,
//! level geometry and the signal table. Everything here is part of the
//! deterministic state or read-only for the whole session.
//!
//! Overview
//! - `assets` – immutable data assets referenced by typed ids
//! - `input` – per-tick player input slots and the compact wire encoding
//! - `rng` – the seeded random source
//! - `roster` – character picked by each player
//! - `signals` – synchronous cross-system handler table
//! - `simconfig` – INI backed session settings
//! - `simtime` – fixed-step clock
//! - `spawnplaces` – registered respawn points
//! - `staticgeometry` – level colliders that never move
pub mod assets;
pub mod input;
pub mod rng;
pub mod roster;
pub mod signals;
pub mod simconfig;
pub mod simtime;
pub mod spawnplaces;
pub mod staticgeometry;
