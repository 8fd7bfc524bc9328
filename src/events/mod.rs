//! Event types emitted by the simulation.
//!
//! Submodules:
//! - [`sim`] – the [`SimEvent`](sim::SimEvent) notifications read by view,
//!   audio and UI layers
pub mod sim;
