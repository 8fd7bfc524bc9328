//! Per-character kinematic controller state.
//!
//! The solver in [`crate::kcc`] reads and writes this component once per tick.
//! Only the solver's state computation changes [`KCC2D::state`]; collision
//! handlers may set [`KCC2D::ignore_step`] to veto the rest of a move.

use bevy_ecs::prelude::Component;
use serde::Serialize;

use crate::components::timer::FrameTimer;
use crate::kcc::config::KCC2DConfig;
use crate::math::{Fp, FpVec2};
use crate::physics::query::{ColliderRef, OverlapHit};
use crate::resources::assets::AssetRef;
use crate::resources::input::PlayerInput;
use crate::resources::simtime::SimTime;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum KCCState {
    Grounded,
    Jumped,
    DoubleJumped,
    Walled,
    Sloped,
    Dashing,
    #[default]
    FreeFalling,
}

/// Surface classification. Lower values win when picking the closest contact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum KCCContactType {
    #[default]
    None = 0,
    Ground = 1,
    Wall = 2,
    Slope = 3,
    Ceil = 4,
}

/// One contact as seen by the solver during a sub-step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct KCCQueryResult {
    pub collider: Option<ColliderRef>,
    /// Points away from the surface, towards the character.
    pub normal: FpVec2,
    pub penetration: Fp,
    pub overlapping: bool,
    pub surface_tangent: FpVec2,
    /// Degrees between up and the normal.
    pub contact_angle: Fp,
    pub contact_type: KCCContactType,
    /// Set by collision handlers to exclude this contact.
    pub ignore: bool,
}

impl KCCQueryResult {
    pub fn from_hit(hit: &OverlapHit) -> Self {
        KCCQueryResult {
            collider: Some(hit.collider),
            normal: hit.normal,
            penetration: hit.penetration,
            overlapping: true,
            ..Default::default()
        }
    }
}

#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct KCC2D {
    pub config: AssetRef<KCC2DConfig>,
    /// Velocity driven by input, gravity, jumps and dashes.
    pub kinematic_velocity: FpVec2,
    /// Velocity from external pushes; decays on landing.
    pub dynamic_velocity: FpVec2,
    pub state: KCCState,
    pub state_timer: FrameTimer,
    /// Buffered jump press waiting for a surface.
    pub grounded_jump_timer: FrameTimer,
    /// Authoritative contact of the last sub-step.
    pub closest: KCCQueryResult,
    pub last_input_direction: i32,
    /// Skip movement: set by handlers, consumed at the start of the next move.
    pub ignore_step: bool,
    pub input: PlayerInput,
}

impl KCC2D {
    pub fn new(config: AssetRef<KCC2DConfig>) -> Self {
        KCC2D {
            config,
            kinematic_velocity: FpVec2::ZERO,
            dynamic_velocity: FpVec2::ZERO,
            state: KCCState::FreeFalling,
            state_timer: FrameTimer::NONE,
            grounded_jump_timer: FrameTimer::NONE,
            closest: KCCQueryResult::default(),
            last_input_direction: 1,
            ignore_step: false,
            input: PlayerInput::default(),
        }
    }

    pub fn combined_velocity(&self) -> FpVec2 {
        self.kinematic_velocity + self.dynamic_velocity
    }

    pub fn horizontal_speed(&self) -> Fp {
        self.kinematic_velocity.x
    }

    pub fn vertical_speed(&self) -> Fp {
        self.kinematic_velocity.y
    }

    pub fn set_horizontal_speed(&mut self, speed: Fp) {
        self.kinematic_velocity.x = speed;
    }

    pub fn set_vertical_speed(&mut self, speed: Fp) {
        self.kinematic_velocity.y = speed;
    }

    /// Switch state; `duration` holds it against timer-based expiry.
    pub fn set_state(&mut self, time: &SimTime, state: KCCState, duration: Option<Fp>) {
        self.state = state;
        self.state_timer = match duration {
            Some(seconds) => FrameTimer::from_seconds(time, seconds),
            None => FrameTimer::NONE,
        };
    }

    pub fn set_state_timer(&mut self, time: &SimTime, seconds: Fp) {
        self.state_timer = FrameTimer::from_seconds(time, seconds);
    }

    /// Replace the kinematic velocity with `impulse` and drop any buffered jump.
    pub fn jump(&mut self, impulse: FpVec2) {
        self.kinematic_velocity = impulse;
        self.grounded_jump_timer = FrameTimer::NONE;
    }

    pub fn apply_kinematic_acceleration(&mut self, dt: Fp, acceleration: FpVec2) {
        self.kinematic_velocity += acceleration * dt;
    }

    /// Add a one-off push, e.g. knockback.
    pub fn add_impulse(&mut self, impulse: FpVec2) {
        self.dynamic_velocity += impulse;
    }

    /// Stop all movement, used on respawn.
    pub fn halt(&mut self) {
        self.kinematic_velocity = FpVec2::ZERO;
        self.dynamic_velocity = FpVec2::ZERO;
    }
}
