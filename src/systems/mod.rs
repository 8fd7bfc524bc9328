//! Simulation systems.
//!
//! This module groups every system and signal handler that advances the
//! simulation by one tick. Systems touching several entities visit them in
//! entity id order so peers agree on the outcome.
//!
//! Submodules overview
//! - [`bullet`] – move bullets, resolve hits and run their bullet action
//! - [`disconnect`] – remove characters of players that left
//! - [`input`] – latch this tick's player input
//! - [`movement`] – feed input to the character controller and move characters
//! - [`physicsbody`] – integrate ballistic bodies against level geometry
//! - [`player`] – build the character of a joining player
//! - [`respawn`] – spawn point registration and respawning dead characters
//! - [`skill`] – cast and activate area skills
//! - [`status`] – health, damage, death and regeneration
//! - [`weapon`] – weapon switching, firing and recharging

pub mod bullet;
pub mod disconnect;
pub mod input;
pub mod movement;
pub mod physicsbody;
pub mod player;
pub mod respawn;
pub mod skill;
pub mod status;
pub mod weapon;
