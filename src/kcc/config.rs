//! Tunables of the kinematic character controller.
//!
//! A [`KCC2DConfig`] is an immutable data asset shared by every character
//! that references it. Authored files only need to list the values that
//! differ from the defaults below.

use serde::{Deserialize, Serialize};

use crate::math::{Fp, FpVec2, fp, fp_ratio, serde_fp};
use crate::physics::layers;
use crate::physics::shape::Shape2D;

/// How the dash picks its horizontal direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashDirection {
    /// Sign of the current horizontal velocity.
    Velocity,
    /// Last horizontal input direction.
    #[default]
    Input,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KCC2DConfig {
    // shape and collision
    #[serde(with = "serde_fp")]
    pub capsule_radius: Fp,
    #[serde(with = "serde_fp")]
    pub capsule_height: Fp,
    /// Layers the capsule collides with.
    pub mask: u32,

    // depenetration
    pub solver_iterations: u32,
    #[serde(with = "serde_fp")]
    pub iteration_correction_rate: Fp,
    #[serde(with = "serde_fp")]
    pub allowed_penetration: Fp,
    pub ccd: bool,

    // horizontal movement
    #[serde(with = "serde_fp")]
    pub acceleration: Fp,
    #[serde(with = "serde_fp")]
    pub flip_direction_multiplier: Fp,
    #[serde(with = "serde_fp")]
    pub deceleration: Fp,
    #[serde(with = "serde_fp")]
    pub max_base_speed: Fp,

    // dashing
    pub dash_direction: DashDirection,
    pub dash_suspends_gravity: bool,
    #[serde(with = "serde_fp")]
    pub dash_duration: Fp,
    #[serde(with = "serde_fp")]
    pub max_dash_speed: Fp,

    // gravity and slopes
    #[serde(with = "serde_fp")]
    pub base_gravity: Fp,
    #[serde(with = "serde_fp")]
    pub down_gravity_multiplier: Fp,
    /// Degrees.
    #[serde(with = "serde_fp")]
    pub max_slope_angle: Fp,
    #[serde(with = "serde_fp")]
    pub slope_max_speed: Fp,
    #[serde(with = "serde_fp")]
    pub free_fall_max_speed: Fp,

    // jumps
    #[serde(with = "serde_fp")]
    pub jump_impulse: Fp,
    #[serde(with = "serde_fp")]
    pub air_control_factor: Fp,
    pub fast_flip_on_air: bool,
    pub down_gravity_on_release: bool,
    #[serde(with = "serde_fp")]
    pub coyote_time: Fp,
    #[serde(with = "serde_fp")]
    pub input_buffer_time: Fp,
    pub double_jump_enabled: bool,
    pub double_jump_when_free_falling: bool,
    #[serde(with = "serde_fp")]
    pub deceleration_on_air: Fp,

    // wall jumps
    pub wall_jump_enabled: bool,
    pub requires_opposite_input: bool,
    #[serde(with = "serde_fp")]
    pub walled_state_extension: Fp,
    #[serde(with = "serde_fp")]
    pub min_wall_angle: Fp,
    #[serde(with = "serde_fp")]
    pub max_wall_angle: Fp,
    #[serde(with = "serde_fp::vec")]
    pub wall_jump_impulse: FpVec2,
    #[serde(with = "serde_fp")]
    pub wall_max_speed: Fp,
}

impl Default for KCC2DConfig {
    fn default() -> Self {
        KCC2DConfig {
            capsule_radius: fp_ratio(1, 4),
            capsule_height: fp(1),
            mask: layers::STATIC,

            solver_iterations: 4,
            iteration_correction_rate: fp_ratio(1, 2),
            allowed_penetration: fp_ratio(1, 100),
            ccd: true,

            acceleration: fp(10),
            flip_direction_multiplier: fp(1),
            deceleration: fp(10),
            max_base_speed: fp(4),

            dash_direction: DashDirection::Input,
            dash_suspends_gravity: true,
            dash_duration: fp_ratio(1, 4),
            max_dash_speed: fp(10),

            base_gravity: fp(-10),
            down_gravity_multiplier: fp(1),
            max_slope_angle: fp(30),
            slope_max_speed: fp(10),
            free_fall_max_speed: fp(25),

            jump_impulse: fp(6),
            air_control_factor: fp(1),
            fast_flip_on_air: true,
            down_gravity_on_release: true,
            coyote_time: fp_ratio(1, 10),
            input_buffer_time: fp_ratio(1, 10),
            double_jump_enabled: true,
            double_jump_when_free_falling: true,
            deceleration_on_air: fp(5),

            wall_jump_enabled: true,
            requires_opposite_input: true,
            walled_state_extension: fp_ratio(1, 4),
            min_wall_angle: fp(75),
            max_wall_angle: fp(100),
            wall_jump_impulse: FpVec2::from_ints(1, 6),
            wall_max_speed: fp(10),
        }
    }
}

impl KCC2DConfig {
    /// The character capsule described by this config.
    pub fn capsule(&self) -> Shape2D {
        Shape2D::capsule(self.capsule_radius, self.capsule_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let cfg: KCC2DConfig =
            serde_json::from_str(r#"{"jump_impulse": 8, "dash_direction": "velocity"}"#).unwrap();
        assert_eq!(cfg.jump_impulse, fp(8));
        assert_eq!(cfg.dash_direction, DashDirection::Velocity);
        assert_eq!(cfg.max_base_speed, fp(4));
        assert_eq!(cfg.solver_iterations, 4);
    }

    #[test]
    fn test_capsule_segment_excludes_caps() {
        let cfg = KCC2DConfig::default();
        assert_eq!(
            cfg.capsule(),
            Shape2D::Capsule {
                radius: fp_ratio(1, 4),
                half_height: fp_ratio(1, 4),
            }
        );
    }
}
