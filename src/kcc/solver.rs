//! Per-tick character move.
//!
//! [`move_character`] runs the whole pipeline for one entity:
//!
//! 1. consume a pending `ignore_step` veto and stop,
//! 2. integrate input, drag, gravity and per-state speed caps,
//! 3. resolve jump and dash intent,
//! 4. advance the capsule in CCD sub-steps, gathering contacts and running
//!    the iterative penetration solver after each one,
//! 5. compute the next [`KCCState`] from the closest contact.
//!
//! Collision handlers registered on the
//! [`SignalBus`](crate::resources::signals::SignalBus) run synchronously from
//! inside steps 4 and may mark contacts as ignored or set `ignore_step`,
//! which aborts the rest of the move immediately.

use arrayvec::ArrayVec;
use bevy_ecs::prelude::*;
use log::warn;

use crate::components::kcc::{KCC2D, KCCContactType, KCCQueryResult, KCCState};
use crate::components::timer::FrameTimer;
use crate::components::transform::Transform2D;
use crate::events::sim::{SimEvent, emit};
use crate::kcc::config::{DashDirection, KCC2DConfig};
use crate::math::{Fp, FpVec2, clamp01, fp, sign};
use crate::physics::query::{QueryFilter, check_overlap, overlap_shape};
use crate::physics::shape::Shape2D;
use crate::resources::signals;
use crate::resources::simtime::SimTime;

/// Capacity of the contact buffer. Extra overlaps are dropped.
pub const MAX_CONTACTS: usize = 16;
/// Upper bound on CCD sub-steps per tick.
pub const MAX_CCD_STEPS: u32 = 64;

/// Outcome of one solver pass over the contact buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Iteration {
    Corrected,
    Settled,
    Vetoed,
}

struct Mover<'a> {
    config: &'a KCC2DConfig,
    time: SimTime,
    entity: Entity,
    capsule: Shape2D,
    contacts: ArrayVec<KCCQueryResult, MAX_CONTACTS>,
}

/// Advance one character by one tick.
///
/// `transform` and `kcc` are the caller's working copies; the position is
/// also written back to the entity's `Transform2D` after every correction so
/// queries raised from signal handlers see where the character currently is.
pub fn move_character(
    world: &mut World,
    config: &KCC2DConfig,
    entity: Entity,
    transform: &mut Transform2D,
    kcc: &mut KCC2D,
) {
    if kcc.ignore_step {
        kcc.ignore_step = false;
        return;
    }

    let Some(time) = world.get_resource::<SimTime>().copied() else {
        warn!("move_character: no SimTime resource, {:?} not moved", entity);
        return;
    };

    let mut mover = Mover {
        config,
        time,
        entity,
        capsule: config.capsule(),
        contacts: ArrayVec::new(),
    };

    mover.integrate_forces(kcc);
    mover.process_jump(world, kcc);
    mover.process_dash(kcc);

    let steps = ccd_steps(config, kcc.combined_velocity(), time.delta);
    let mut position = transform.position;
    for _ in 0..steps {
        kcc.closest.overlapping = false;
        kcc.closest.contact_type = KCCContactType::None;

        position += kcc.combined_velocity() * time.delta / fp(steps as i32);
        place(world, entity, transform, position);

        if !mover.find_contacts(world, kcc, position) {
            return;
        }
        if mover.contacts.is_empty() {
            continue;
        }
        for iteration in 0..config.solver_iterations {
            match mover.solver_iteration(world, kcc, &mut position, iteration) {
                Iteration::Vetoed => return,
                Iteration::Settled => break,
                Iteration::Corrected => place(world, entity, transform, position),
            }
        }
    }

    mover.compute_state(world, kcc);
}

/// `ceil(|v| * dt / radius) + 1` sub-steps with CCD on, otherwise one.
pub fn ccd_steps(config: &KCC2DConfig, velocity: FpVec2, dt: Fp) -> u32 {
    if !config.ccd || config.capsule_radius <= Fp::ZERO {
        return 1;
    }
    let length = velocity.magnitude() * dt;
    let ratio = length
        .saturating_div(config.capsule_radius)
        .saturating_ceil()
        .to_num::<i64>();
    ratio.clamp(0, i64::from(MAX_CCD_STEPS) - 1) as u32 + 1
}

/// GROUND forces unless dashing, WALL always forces, CEIL forces unless
/// dashing or double jumped.
pub fn should_force_switch(state: KCCState, contact: KCCContactType) -> bool {
    match contact {
        KCCContactType::Ground => state != KCCState::Dashing,
        KCCContactType::Wall => true,
        KCCContactType::Ceil => state != KCCState::Dashing && state != KCCState::DoubleJumped,
        KCCContactType::None | KCCContactType::Slope => false,
    }
}

/// Classify a contact by the angle between up and its normal.
pub fn classify_contact(config: &KCC2DConfig, angle: Fp) -> KCCContactType {
    if angle < config.max_slope_angle {
        KCCContactType::Ground
    } else if angle > fp(90) + config.max_slope_angle {
        KCCContactType::Ceil
    } else if config.wall_jump_enabled
        && angle > config.min_wall_angle
        && angle < config.max_wall_angle
    {
        KCCContactType::Wall
    } else {
        KCCContactType::Slope
    }
}

fn place(world: &mut World, entity: Entity, transform: &mut Transform2D, position: FpVec2) {
    transform.position = position;
    if let Some(mut stored) = world.get_mut::<Transform2D>(entity) {
        stored.position = position;
    }
}

fn held_direction(kcc: &KCC2D) -> Fp {
    fp(kcc.input.horizontal())
}

impl Mover<'_> {
    // ==================== FORCES ====================

    fn integrate_forces(&self, kcc: &mut KCC2D) {
        let dt = self.time.delta;
        let side = self.side_movement(kcc);

        self.accelerate(kcc, side);

        if side == Fp::ZERO {
            if kcc.state == KCCState::Grounded {
                kcc.kinematic_velocity *= clamp01(Fp::ONE - self.config.deceleration * dt);
            } else {
                let drag = clamp01(Fp::ONE - self.config.deceleration_on_air * dt);
                kcc.set_horizontal_speed(kcc.horizontal_speed() * drag);
            }
        }

        self.apply_gravity(kcc);
        self.clamp_velocity(kcc);
    }

    fn side_movement(&self, kcc: &mut KCC2D) -> Fp {
        let mut side = Fp::ZERO;
        if kcc.input.left.is_down {
            side -= Fp::ONE;
        }
        if kcc.input.right.is_down {
            side += Fp::ONE;
        }
        if side != Fp::ZERO {
            kcc.last_input_direction = side.to_num::<i32>();
        }
        let grounded = kcc.state == KCCState::Grounded;
        if !grounded {
            side *= self.config.air_control_factor;
        }

        let opposite = kcc.combined_velocity().x * side < Fp::ZERO;
        if opposite && (grounded || self.config.fast_flip_on_air) {
            side *= self.config.flip_direction_multiplier;
        }
        side
    }

    fn accelerate(&self, kcc: &mut KCC2D, side: Fp) {
        let dt = self.time.delta;
        if kcc.state == KCCState::Grounded {
            // Along the surface so slopes are climbed, not pushed into.
            let acceleration = kcc.closest.surface_tangent * (self.config.acceleration * side);
            kcc.apply_kinematic_acceleration(dt, acceleration);
            return;
        }

        let speed = kcc.horizontal_speed() + self.config.acceleration * dt * side;
        kcc.set_horizontal_speed(speed);
        if kcc.state == KCCState::Walled && kcc.horizontal_speed() * kcc.closest.normal.x < Fp::ZERO {
            kcc.set_horizontal_speed(Fp::ZERO);
        }
    }

    fn apply_gravity(&self, kcc: &mut KCC2D) {
        let dashing = kcc.state == KCCState::Dashing;
        if kcc.state == KCCState::Grounded || (self.config.dash_suspends_gravity && dashing) {
            return;
        }

        let held = kcc.input.jump.is_down || !self.config.down_gravity_on_release;
        let modifier = if kcc.vertical_speed() <= Fp::ZERO || !held || kcc.state == KCCState::FreeFalling {
            self.config.down_gravity_multiplier
        } else {
            Fp::ONE
        };
        let speed = kcc.vertical_speed() + self.config.base_gravity * modifier * self.time.delta;
        kcc.set_vertical_speed(speed);
    }

    fn clamp_velocity(&self, kcc: &mut KCC2D) {
        let mut max_x = self.config.max_base_speed;
        let mut max_y = self.config.free_fall_max_speed;
        match kcc.state {
            KCCState::Walled => {
                if self.config.wall_jump_enabled && kcc.state_timer.is_running(&self.time) {
                    max_y = self.config.wall_max_speed;
                }
            }
            KCCState::Sloped => max_y = self.config.slope_max_speed,
            KCCState::Dashing => max_x = self.config.max_dash_speed,
            _ => {}
        }

        if kcc.state == KCCState::Grounded {
            kcc.kinematic_velocity = kcc.kinematic_velocity.clamp_magnitude(max_x);
        } else if kcc.horizontal_speed().abs() > max_x {
            kcc.set_horizontal_speed(sign(kcc.horizontal_speed()) * max_x);
        }

        if kcc.vertical_speed() < -max_y {
            kcc.set_vertical_speed(-max_y);
        }
    }

    // ==================== INTENT ====================

    fn process_jump(&self, world: &mut World, kcc: &mut KCC2D) {
        let buffered = kcc.grounded_jump_timer.is_running(&self.time);
        let pressed = kcc.input.jump.was_pressed;
        if !pressed && !buffered {
            return;
        }

        let impulse = FpVec2::new(kcc.horizontal_speed(), self.config.jump_impulse);
        let double_jump = match kcc.state {
            KCCState::Grounded => {
                self.jump(world, kcc, KCCState::Jumped, impulse, Some(self.time.delta));
                return;
            }
            KCCState::Walled => {
                let away = if kcc.closest.normal.x > Fp::ZERO { Fp::ONE } else { -Fp::ONE };
                let mut impulse = self.config.wall_jump_impulse;
                impulse.x *= away;
                self.jump(world, kcc, KCCState::Jumped, impulse, Some(self.time.delta));
                return;
            }
            KCCState::Jumped => self.config.double_jump_enabled,
            KCCState::FreeFalling => {
                self.config.double_jump_enabled && self.config.double_jump_when_free_falling
            }
            KCCState::DoubleJumped | KCCState::Sloped | KCCState::Dashing => false,
        };

        if double_jump {
            self.jump(world, kcc, KCCState::DoubleJumped, impulse, Some(Fp::ONE));
        } else if pressed && matches!(
            kcc.state,
            KCCState::Jumped | KCCState::FreeFalling | KCCState::DoubleJumped
        ) {
            kcc.grounded_jump_timer =
                FrameTimer::from_seconds(&self.time, self.config.input_buffer_time);
        }
    }

    /// A fresh jump holds `next` at least through the current tick.
    fn jump(
        &self,
        world: &mut World,
        kcc: &mut KCC2D,
        next: KCCState,
        impulse: FpVec2,
        hold: Option<Fp>,
    ) {
        let previous = kcc.state;
        kcc.jump(impulse);
        emit(
            world,
            SimEvent::Jumped {
                entity: self.entity,
                next,
                previous,
                impulse,
            },
        );
        kcc.set_state(&self.time, next, hold);
    }

    fn process_dash(&self, kcc: &mut KCC2D) {
        if kcc.state == KCCState::Dashing {
            return;
        }
        if self.config.requires_opposite_input
            && kcc.closest.contact_type == KCCContactType::Wall
            && kcc.closest.normal.x * fp(kcc.last_input_direction) < Fp::ZERO
        {
            return;
        }
        if !kcc.input.dash.was_pressed {
            return;
        }

        kcc.set_state(&self.time, KCCState::Dashing, Some(self.config.dash_duration));
        let direction = match self.config.dash_direction {
            DashDirection::Velocity => sign(kcc.combined_velocity().x),
            DashDirection::Input => fp(kcc.last_input_direction),
        };
        kcc.set_horizontal_speed(direction * self.config.max_dash_speed);
        if self.config.dash_suspends_gravity {
            kcc.set_vertical_speed(Fp::ZERO);
        }
    }

    // ==================== CONTACTS ====================

    /// Fill the contact buffer. Returns false when a handler vetoed the step.
    fn find_contacts(&mut self, world: &mut World, kcc: &mut KCC2D, position: FpVec2) -> bool {
        self.contacts.clear();
        let hits = overlap_shape(world, position, &self.capsule, QueryFilter::all(self.config.mask));
        for hit in hits.iter() {
            if hit.entity() == Some(self.entity) {
                continue;
            }

            if hit.is_trigger {
                signals::kcc_trigger(world, self.entity, kcc, hit);
                if kcc.ignore_step {
                    self.contacts.clear();
                    return false;
                }
                continue;
            }

            let mut contact = KCCQueryResult::from_hit(hit);
            signals::kcc_pre_collision(world, self.entity, kcc, &mut contact);
            if !contact.ignore {
                self.contacts.push(contact);
            }
            if kcc.ignore_step {
                self.contacts.clear();
                return false;
            }
            if self.contacts.is_full() {
                break;
            }
        }
        true
    }

    fn solver_iteration(
        &mut self,
        world: &mut World,
        kcc: &mut KCC2D,
        position: &mut FpVec2,
        iteration: u32,
    ) -> Iteration {
        let mut corrected = false;
        for index in 0..self.contacts.len() {
            let mut result = self.contacts[index];
            result.contact_type = KCCContactType::None;

            let overlap = result
                .collider
                .and_then(|collider| check_overlap(world, *position, &self.capsule, collider));
            match overlap {
                Some(contact) => {
                    result.normal = contact.normal;
                    result.penetration = contact.penetration;
                    result.overlapping = true;
                }
                None => {
                    result.penetration = Fp::ZERO;
                    result.overlapping = false;
                }
            }
            result.surface_tangent = result.normal.rotate_cw90();
            result.contact_angle = FpVec2::UP.angle_deg(result.normal);

            signals::kcc_solver_collision(world, self.entity, kcc, &mut result, iteration);
            self.contacts[index] = result;
            if result.ignore {
                continue;
            }
            if kcc.ignore_step {
                self.contacts.clear();
                return Iteration::Vetoed;
            }

            result.contact_type = classify_contact(self.config, result.contact_angle);
            if kcc.closest.contact_type == KCCContactType::None
                || kcc.closest.contact_type > result.contact_type
            {
                kcc.closest = result;
            }

            if result.penetration > self.config.allowed_penetration {
                let correction =
                    result.normal * (result.penetration * self.config.iteration_correction_rate);
                *position += correction;
                corrected = true;
            }
            self.contacts[index] = result;
        }

        if corrected {
            Iteration::Corrected
        } else {
            Iteration::Settled
        }
    }

    // ==================== STATE ====================

    fn compute_state(&self, world: &mut World, kcc: &mut KCC2D) {
        let time = &self.time;
        let contact = kcc.closest.contact_type;
        let forced = should_force_switch(kcc.state, contact);
        let previous = kcc.state;

        if forced || kcc.state_timer.is_expired(time) {
            match contact {
                KCCContactType::Ground => {
                    let coyote = forced.then_some(self.config.coyote_time);
                    kcc.set_state(time, KCCState::Grounded, coyote);
                    kcc.dynamic_velocity *= clamp01(Fp::ONE - self.config.deceleration * time.delta);
                }
                KCCContactType::Wall => {
                    let opposite = kcc.closest.normal.x * held_direction(kcc) < Fp::ZERO;
                    if !self.config.requires_opposite_input || opposite {
                        kcc.set_state(time, KCCState::Walled, None);
                    }
                }
                KCCContactType::Slope => kcc.set_state(time, KCCState::Sloped, None),
                KCCContactType::None => kcc.set_state(time, KCCState::FreeFalling, None),
                KCCContactType::Ceil => kcc.set_state(time, KCCState::DoubleJumped, Some(Fp::ONE)),
            }
        }

        match kcc.state {
            KCCState::Walled => {
                if contact == KCCContactType::Wall {
                    let opposite = kcc.closest.normal.x * held_direction(kcc) < Fp::ZERO;
                    if previous != KCCState::Walled {
                        let hold = if opposite {
                            self.config.walled_state_extension
                        } else {
                            Fp::ZERO
                        };
                        kcc.set_state_timer(time, hold);
                    }
                    if !self.config.requires_opposite_input || opposite {
                        kcc.set_state_timer(time, self.config.walled_state_extension);
                    }
                }
                if previous != KCCState::Walled {
                    self.landed(world, kcc.horizontal_speed(), KCCState::Walled);
                    kcc.set_horizontal_speed(Fp::ZERO);
                }
            }
            KCCState::Jumped => {
                if kcc.input.jump.is_down {
                    kcc.set_state_timer(time, Fp::ONE);
                }
            }
            KCCState::DoubleJumped => kcc.set_state_timer(time, Fp::ONE),
            KCCState::Grounded => {
                if previous != KCCState::Grounded {
                    self.landed(world, kcc.vertical_speed(), KCCState::Grounded);
                    kcc.set_vertical_speed(Fp::ZERO);
                }
            }
            KCCState::Sloped | KCCState::Dashing | KCCState::FreeFalling => {}
        }

        if contact == KCCContactType::Ceil && kcc.vertical_speed() > Fp::ZERO {
            kcc.set_vertical_speed(Fp::ZERO);
        }
    }

    fn landed(&self, world: &mut World, speed: Fp, state: KCCState) {
        emit(
            world,
            SimEvent::Landed {
                entity: self.entity,
                speed,
                state,
            },
        );
    }
}
