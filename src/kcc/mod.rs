//! Kinematic character controller.
//!
//! Characters are not simulated bodies: every tick the controller integrates
//! the player's intent into a velocity, advances a capsule in sub-steps and
//! pushes it out of whatever it overlaps, then derives the movement state
//! from the most relevant contact.
//!
//! # Submodules overview
//!
//! - [`config`] – immutable tunables shared by characters ([`KCC2DConfig`])
//! - [`solver`] – the per-tick move ([`move_character`]) and its contact solver
//!
//! The mutable per-character state lives in
//! [`KCC2D`](crate::components::kcc::KCC2D).

pub mod config;
pub mod solver;

pub use config::{DashDirection, KCC2DConfig};
pub use solver::move_character;
