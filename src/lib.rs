//! Deterministic 2D platformer-shooter simulation.
//!
//! This crate exposes the simulation's ECS components, resources, systems,
//! and events, plus the [`Simulation`](simulation::Simulation) facade used by
//! the runner binary and the integration tests.
//!
//! All simulated state is fixed point ([`math::Fp`]); given the same
//! configuration, assets and per-tick inputs two simulations produce the same
//! [`snapshot`] on every machine.

pub mod components;
pub mod error;
pub mod events;
pub mod kcc;
pub mod math;
pub mod physics;
pub mod resources;
pub mod simulation;
pub mod snapshot;
pub mod systems;
