//! Frame-counted expiring timer used for cooldowns, invincibility and respawn.

use serde::Serialize;

use crate::math::Fp;
use crate::resources::simtime::SimTime;

/// Timer that expires at a target frame.
///
/// An unset timer ([`FrameTimer::NONE`]) counts as expired, so a fresh
/// component never blocks the action it gates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct FrameTimer {
    start_frame: u32,
    target_frame: u32,
    valid: bool,
}

impl FrameTimer {
    pub const NONE: FrameTimer = FrameTimer {
        start_frame: 0,
        target_frame: 0,
        valid: false,
    };

    pub fn from_frames(time: &SimTime, frames: u32) -> Self {
        FrameTimer {
            start_frame: time.frame,
            target_frame: time.frame.saturating_add(frames),
            valid: true,
        }
    }

    pub fn from_seconds(time: &SimTime, seconds: Fp) -> Self {
        Self::from_frames(time, time.seconds_to_frames(seconds))
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Set and not yet at its target frame.
    pub fn is_running(&self, time: &SimTime) -> bool {
        self.valid && time.frame < self.target_frame
    }

    pub fn is_expired(&self, time: &SimTime) -> bool {
        !self.is_running(time)
    }

    pub fn remaining_seconds(&self, time: &SimTime) -> Fp {
        if self.is_running(time) {
            time.frames_to_seconds(self.target_frame - time.frame)
        } else {
            Fp::ZERO
        }
    }

    pub fn seconds_since_start(&self, time: &SimTime) -> Fp {
        if self.valid {
            time.frames_to_seconds(time.frame.saturating_sub(self.start_frame))
        } else {
            Fp::ZERO
        }
    }

    pub fn target_frame(&self) -> u32 {
        self.target_frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{fp, fp_ratio};

    fn at_frame(frame: u32) -> SimTime {
        SimTime {
            frame,
            ..SimTime::new(60)
        }
    }

    #[test]
    fn test_unset_timer_is_expired() {
        let t = FrameTimer::NONE;
        assert!(!t.is_valid());
        assert!(t.is_expired(&at_frame(0)));
        assert_eq!(t.remaining_seconds(&at_frame(10)), Fp::ZERO);
    }

    #[test]
    fn test_timer_runs_until_target_frame() {
        let t = FrameTimer::from_seconds(&at_frame(10), fp_ratio(1, 2));
        assert_eq!(t.target_frame(), 40);
        assert!(t.is_running(&at_frame(39)));
        assert!(t.is_expired(&at_frame(40)));
        assert_eq!(t.remaining_seconds(&at_frame(10)), fp_ratio(1, 2));
    }

    #[test]
    fn test_zero_length_timer_expires_immediately() {
        let t = FrameTimer::from_frames(&at_frame(5), 0);
        assert!(t.is_valid());
        assert!(t.is_expired(&at_frame(5)));
    }

    #[test]
    fn test_seconds_since_start() {
        let t = FrameTimer::from_seconds(&at_frame(0), fp(5));
        assert_eq!(t.seconds_since_start(&at_frame(120)), fp(2));
    }
}
