//! Fixed-timestep simulation clock.
//!
//! The clock only ever advances by whole ticks; there is no wall-clock input.
//! Frame timers ([`FrameTimer`](crate::components::timer::FrameTimer)) are
//! expressed against [`SimTime::frame`].

use bevy_ecs::prelude::Resource;
use serde::Serialize;

use crate::math::{Fp, fp};

pub const DEFAULT_TICK_RATE: u32 = 60;

#[derive(Resource, Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SimTime {
    /// Number of ticks simulated so far.
    pub frame: u32,
    /// Ticks per simulated second.
    pub tick_rate: u32,
    /// Seconds per tick, `1 / tick_rate`.
    pub delta: Fp,
}

impl Default for SimTime {
    fn default() -> Self {
        SimTime::new(DEFAULT_TICK_RATE)
    }
}

impl SimTime {
    /// A zero tick rate is treated as one tick per second.
    pub fn new(tick_rate: u32) -> Self {
        let tick_rate = tick_rate.max(1);
        SimTime {
            frame: 0,
            tick_rate,
            delta: Fp::ONE / fp(tick_rate as i32),
        }
    }

    /// Whole ticks covered by `seconds`, rounded to the nearest tick, never negative.
    pub fn seconds_to_frames(&self, seconds: Fp) -> u32 {
        let frames = seconds.saturating_mul(fp(self.tick_rate as i32));
        frames
            .max(Fp::ZERO)
            .saturating_round()
            .saturating_to_num::<u32>()
    }

    /// Seconds covered by `frames` ticks.
    pub fn frames_to_seconds(&self, frames: u32) -> Fp {
        fp(frames as i32) / fp(self.tick_rate as i32)
    }
}
