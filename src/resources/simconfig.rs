//! Simulation configuration resource.
//!
//! Session settings loaded from an INI configuration file. Missing files
//! or keys keep the defaults so a bare runner still starts.
//!
//! # Configuration File Format
//!
//! ```ini
//! [simulation]
//! tick_rate = 60
//! seed = 12345
//! max_players = 4
//!
//! [physics]
//! gravity = -10
//! ```
//!
//! Every peer of a session must run with the same values: they feed the
//! clock, the random generator and ballistic bodies.

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::{info, warn};
use std::path::PathBuf;

use crate::error::SimError;
use crate::math::{Fp, fp};
use crate::resources::simtime::DEFAULT_TICK_RATE;

const DEFAULT_SEED: u64 = 0x5eed;
const DEFAULT_MAX_PLAYERS: usize = 4;
const DEFAULT_GRAVITY: i32 = -10;
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    /// Ticks per simulated second.
    pub tick_rate: u32,
    /// Seed of the session's [`SimRng`](crate::resources::rng::SimRng).
    pub seed: u64,
    /// Number of player slots.
    pub max_players: usize,
    /// Vertical acceleration applied to physics bodies.
    pub gravity: Fp,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SimConfig {
    pub fn new() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            seed: DEFAULT_SEED,
            max_players: DEFAULT_MAX_PLAYERS,
            gravity: fp(DEFAULT_GRAVITY),
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current values.
    pub fn load_from_file(&mut self) -> Result<(), SimError> {
        let mut config = Ini::new();
        config.load(&self.config_path).map_err(|e| {
            SimError::Config(format!("{}: {}", self.config_path.display(), e))
        })?;
        self.apply(&config)?;

        info!(
            "Loaded config: tick_rate={}, seed={}, max_players={}, gravity={}",
            self.tick_rate, self.seed, self.max_players, self.gravity
        );
        Ok(())
    }

    /// Parse configuration from INI text, starting from the defaults.
    pub fn from_ini_str(text: &str) -> Result<Self, SimError> {
        let mut config = Ini::new();
        config.read(text.to_string()).map_err(SimError::Config)?;
        let mut sim_config = Self::new();
        sim_config.apply(&config)?;
        Ok(sim_config)
    }

    fn apply(&mut self, config: &Ini) -> Result<(), SimError> {
        // [simulation] section
        if let Some(rate) = read_uint(config, "simulation", "tick_rate") {
            self.tick_rate = u32::try_from(rate)
                .ok()
                .filter(|r| *r > 0)
                .ok_or_else(|| SimError::Config(format!("tick_rate out of range: {}", rate)))?;
        }
        if let Some(seed) = read_uint(config, "simulation", "seed") {
            self.seed = seed;
        }
        if let Some(players) = read_uint(config, "simulation", "max_players") {
            self.max_players = usize::try_from(players)
                .ok()
                .filter(|p| *p <= usize::from(u8::MAX))
                .ok_or_else(|| SimError::Config(format!("max_players out of range: {}", players)))?;
        }

        // [physics] section
        if let Some(gravity) = read_float(config, "physics", "gravity") {
            self.gravity = Fp::checked_from_num(gravity)
                .ok_or_else(|| SimError::Config(format!("gravity out of range: {}", gravity)))?;
        }
        Ok(())
    }

    /// Save configuration to the INI file.
    pub fn save_to_file(&self) -> Result<(), SimError> {
        let mut config = Ini::new();

        // [simulation] section
        config.set("simulation", "tick_rate", Some(self.tick_rate.to_string()));
        config.set("simulation", "seed", Some(self.seed.to_string()));
        config.set("simulation", "max_players", Some(self.max_players.to_string()));

        // [physics] section
        config.set("physics", "gravity", Some(self.gravity.to_string()));

        config
            .write(&self.config_path)
            .map_err(|source| SimError::Io {
                path: self.config_path.clone(),
                source,
            })?;

        info!("Saved config to {:?}", self.config_path);
        Ok(())
    }
}

fn read_uint(config: &Ini, section: &str, key: &str) -> Option<u64> {
    reported(config.getuint(section, key), section, key)
}

fn read_float(config: &Ini, section: &str, key: &str) -> Option<f64> {
    reported(config.getfloat(section, key), section, key)
}

/// Unparseable values keep the default and are reported.
fn reported<T>(value: Result<Option<T>, String>, section: &str, key: &str) -> Option<T> {
    match value {
        Ok(value) => value,
        Err(err) => {
            warn!("Ignoring [{}] {}: {}", section, key, err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SimConfig::new();
        assert_eq!(config.tick_rate, 60);
        assert_eq!(config.max_players, 4);
        assert_eq!(config.gravity, fp(-10));
    }

    #[test]
    fn test_partial_ini_keeps_defaults() {
        let config = SimConfig::from_ini_str("[simulation]\nseed = 99\n").unwrap();
        assert_eq!(config.seed, 99);
        assert_eq!(config.tick_rate, 60);
    }

    #[test]
    fn test_ini_values() {
        let text = "[simulation]\ntick_rate = 30\nmax_players = 2\n[physics]\ngravity = -9.5\n";
        let config = SimConfig::from_ini_str(text).unwrap();
        assert_eq!(config.tick_rate, 30);
        assert_eq!(config.max_players, 2);
        assert_eq!(config.gravity, Fp::from_num(-9.5));
    }

    #[test]
    fn test_unparseable_value_keeps_default() {
        let text = "[simulation]\nseed = twelve\ntick_rate = 30\n[physics]\ngravity = down\n";
        let config = SimConfig::from_ini_str(text).unwrap();
        assert_eq!(config.seed, DEFAULT_SEED);
        assert_eq!(config.tick_rate, 30);
        assert_eq!(config.gravity, fp(DEFAULT_GRAVITY));
    }

    #[test]
    fn test_zero_tick_rate_rejected() {
        let result = SimConfig::from_ini_str("[simulation]\ntick_rate = 0\n");
        assert!(matches!(result, Err(SimError::Config(_))));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let mut config = SimConfig::with_path("/nonexistent/sim-config.ini");
        assert!(config.load_from_file().is_err());
        assert_eq!(config.tick_rate, 60);
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join("platformer-sim-config-test.ini");
        let mut config = SimConfig::with_path(&path);
        config.seed = 4242;
        config.tick_rate = 50;
        config.save_to_file().unwrap();

        let mut loaded = SimConfig::with_path(&path);
        loaded.load_from_file().unwrap();
        assert_eq!(loaded.seed, 4242);
        assert_eq!(loaded.tick_rate, 50);
        let _ = std::fs::remove_file(&path);
    }
}
