//! Headless simulation runner.
//!
//! Builds a [`Simulation`] from a configuration file and an asset file, joins
//! a few scripted bots and runs a fixed number of ticks, logging periodic
//! checksums and a summary of the events produced.
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --ticks 3600 --bots 4 --checksum-every 60
//! RUST_LOG=debug cargo run -- --seed 7
//! ```
//!
//! Two runs with the same configuration, assets and seed print the same
//! checksums.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info, warn};

use platformer_sim::events::sim::SimEvent;
use platformer_sim::math::FpVec2;
use platformer_sim::resources::assets::{AssetRef, AssetStore};
use platformer_sim::resources::input::{InputFrame, PlayerRef};
use platformer_sim::resources::simconfig::SimConfig;
use platformer_sim::simulation::Simulation;

/// Deterministic platformer-shooter simulation runner
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// INI configuration file.
    #[arg(long, value_name = "PATH", default_value = "config.ini")]
    config: PathBuf,

    /// JSON asset file, including the level.
    #[arg(long, value_name = "PATH", default_value = "assets/sim_assets.json")]
    assets: PathBuf,

    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 600)]
    ticks: u32,

    /// Number of scripted players.
    #[arg(long, default_value_t = 2)]
    bots: u8,

    /// Override the configured seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Log a checksum every N ticks (0 disables).
    #[arg(long, default_value_t = 60)]
    checksum_every: u32,
}

/// Scripted player: holds a direction for a while, hops and shoots.
struct Bot {
    player: PlayerRef,
    rng: fastrand::Rng,
    frame: InputFrame,
    hold: u32,
}

impl Bot {
    fn new(player: PlayerRef, seed: u64) -> Self {
        Bot {
            player,
            rng: fastrand::Rng::with_seed(seed ^ (u64::from(player.0) << 32)),
            frame: InputFrame::default(),
            hold: 0,
        }
    }

    fn next_frame(&mut self) -> InputFrame {
        if self.hold == 0 {
            let direction = self.rng.i32(-1..=1);
            self.frame.left = direction < 0;
            self.frame.right = direction > 0;
            let aim = match direction {
                d if d < 0 => FpVec2::LEFT,
                d if d > 0 => FpVec2::RIGHT,
                _ => FpVec2::UP,
            };
            self.frame = self.frame.with_aim(aim);
            self.hold = self.rng.u32(20..90);
        }
        self.hold -= 1;
        self.frame.jump = self.rng.u8(..100) < 4;
        self.frame.fire = self.rng.u8(..100) < 20;
        self.frame.alt_fire = self.rng.u16(..1000) < 5;
        self.frame.use_weapon = self.rng.u16(..1000) < 3;
        self.frame.dash = self.rng.u16(..1000) < 8;
        self.frame
    }
}

fn event_name(event: &SimEvent) -> &'static str {
    match event {
        SimEvent::BulletDestroyed { .. } => "bullet_destroyed",
        SimEvent::CharacterCreated { .. } => "character_created",
        SimEvent::CharacterTakeDamage { .. } => "character_take_damage",
        SimEvent::CharacterBlink { .. } => "character_blink",
        SimEvent::CharacterDeath { .. } => "character_death",
        SimEvent::CharacterRespawn { .. } => "character_respawn",
        SimEvent::CharacterChangeWeapon { .. } => "character_change_weapon",
        SimEvent::CharacterChangeWeaponLocal { .. } => "character_change_weapon_local",
        SimEvent::WeaponShoot { .. } => "weapon_shoot",
        SimEvent::SkillCasted { .. } => "skill_casted",
        SimEvent::SkillActivated { .. } => "skill_activated",
        SimEvent::SkillHitTarget { .. } => "skill_hit_target",
        SimEvent::Jumped { .. } => "jumped",
        SimEvent::Landed { .. } => "landed",
        SimEvent::PlayerSelectedCharacter { .. } => "player_selected_character",
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = SimConfig::with_path(&cli.config);
    if let Err(e) = config.load_from_file() {
        warn!("Using default configuration: {e}");
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    let seed = config.seed;
    let max_players = config.max_players;

    let assets = match AssetStore::load_from_file(&cli.assets) {
        Ok(assets) => assets,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let level = assets.level.clone();

    let mut sim = Simulation::new(config, assets);
    sim.load_level(&level);

    let bot_count = usize::from(cli.bots).min(max_players);
    let mut bots: Vec<Bot> = Vec::with_capacity(bot_count);
    for index in 0..bot_count {
        let Ok(slot) = u8::try_from(index) else {
            break;
        };
        let player = PlayerRef(slot);
        // Alternate between the first two character prototypes.
        let prototype = AssetRef::new(1 + u32::from(slot % 2));
        if sim.add_player(player, prototype).is_none() {
            warn!("Player {} could not join with {:?}", slot, prototype);
            continue;
        }
        bots.push(Bot::new(player, seed));
    }

    let mut counts: BTreeMap<&'static str, u64> = BTreeMap::new();
    for _ in 0..cli.ticks {
        for bot in &mut bots {
            let frame = bot.next_frame();
            sim.set_input(bot.player, frame);
        }
        sim.step();
        for event in sim.drain_events() {
            *counts.entry(event_name(&event)).or_default() += 1;
        }

        if cli.checksum_every > 0 && sim.frame() % cli.checksum_every == 0 {
            match sim.checksum() {
                Ok(sum) => info!("frame {:>6} checksum {:016x}", sim.frame(), sum),
                Err(e) => error!("frame {:>6} checksum failed: {e}", sim.frame()),
            }
        }
    }

    info!("Simulated {} ticks with {} players", sim.frame(), bots.len());
    for (name, count) in &counts {
        info!("  {name}: {count}");
    }
    ExitCode::SUCCESS
}
