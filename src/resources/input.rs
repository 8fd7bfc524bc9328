//! Per-tick player input.
//!
//! The outside world hands the simulation one [`InputFrame`] per player per
//! tick (held buttons plus an aim byte). At the start of each tick
//! [`PlayerInputs::advance`] turns the raw frames into [`PlayerInput`] values
//! whose [`Button`]s carry edge information (`was_pressed`) computed against
//! the previous tick, which is what gameplay systems read.
//!
//! # Aim encoding
//!
//! A direction is packed into one byte as `((angle + 360) % 360) / 2 + 1`
//! where `angle` is the signed angle in degrees from up to the direction.
//! Zero means "no aim" and decodes to a zero vector.

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::math::{Fp, FpVec2, fp};

/// Index of a player slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerRef(pub u8);

/// Bit positions used by the two byte wire form of [`InputFrame`].
pub mod button {
    pub const LEFT: u8 = 1;
    pub const RIGHT: u8 = 1 << 1;
    pub const JUMP: u8 = 1 << 2;
    pub const FIRE: u8 = 1 << 3;
    pub const ALT_FIRE: u8 = 1 << 4;
    pub const USE_WEAPON: u8 = 1 << 5;
    pub const DASH: u8 = 1 << 6;
}

/// Raw input for one player and one tick: which buttons are held.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputFrame {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub fire: bool,
    pub alt_fire: bool,
    pub use_weapon: bool,
    pub dash: bool,
    /// Encoded aim direction, see [`encode_aim`].
    pub aim: u8,
}

impl InputFrame {
    pub fn with_aim(mut self, direction: FpVec2) -> Self {
        self.aim = encode_aim(direction);
        self
    }

    pub fn encode(&self) -> [u8; 2] {
        let flags = [
            (self.left, button::LEFT),
            (self.right, button::RIGHT),
            (self.jump, button::JUMP),
            (self.fire, button::FIRE),
            (self.alt_fire, button::ALT_FIRE),
            (self.use_weapon, button::USE_WEAPON),
            (self.dash, button::DASH),
        ];
        let bits = flags
            .iter()
            .filter(|(held, _)| *held)
            .fold(0u8, |acc, (_, bit)| acc | bit);
        [bits, self.aim]
    }

    pub fn decode(bytes: [u8; 2]) -> Self {
        let [bits, aim] = bytes;
        InputFrame {
            left: bits & button::LEFT != 0,
            right: bits & button::RIGHT != 0,
            jump: bits & button::JUMP != 0,
            fire: bits & button::FIRE != 0,
            alt_fire: bits & button::ALT_FIRE != 0,
            use_weapon: bits & button::USE_WEAPON != 0,
            dash: bits & button::DASH != 0,
            aim,
        }
    }
}

/// Pack a direction into the aim byte.
pub fn encode_aim(direction: FpVec2) -> u8 {
    if direction == FpVec2::ZERO {
        return 0;
    }
    let angle = FpVec2::UP.signed_angle_deg(direction);
    let wrapped = (angle + fp(360)) % fp(360);
    (wrapped / 2 + Fp::ONE).to_num::<i64>().clamp(1, u8::MAX as i64) as u8
}

/// Unpack an aim byte into a unit direction (zero vector for 0).
pub fn decode_aim(aim: u8) -> FpVec2 {
    if aim == 0 {
        return FpVec2::ZERO;
    }
    FpVec2::UP.rotate_deg(fp((aim as i32 - 1) * 2))
}

/// Held state plus edges relative to the previous tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Button {
    pub is_down: bool,
    pub was_pressed: bool,
    pub was_released: bool,
}

impl Button {
    fn from_edges(previous: bool, current: bool) -> Self {
        Button {
            is_down: current,
            was_pressed: current && !previous,
            was_released: previous && !current,
        }
    }
}

/// Input as read by gameplay systems during a tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct PlayerInput {
    pub left: Button,
    pub right: Button,
    pub jump: Button,
    pub fire: Button,
    pub alt_fire: Button,
    pub use_weapon: Button,
    pub dash: Button,
    pub aim: u8,
}

impl PlayerInput {
    pub fn from_frames(previous: &InputFrame, current: &InputFrame) -> Self {
        PlayerInput {
            left: Button::from_edges(previous.left, current.left),
            right: Button::from_edges(previous.right, current.right),
            jump: Button::from_edges(previous.jump, current.jump),
            fire: Button::from_edges(previous.fire, current.fire),
            alt_fire: Button::from_edges(previous.alt_fire, current.alt_fire),
            use_weapon: Button::from_edges(previous.use_weapon, current.use_weapon),
            dash: Button::from_edges(previous.dash, current.dash),
            aim: current.aim,
        }
    }

    pub fn aim_direction(&self) -> FpVec2 {
        decode_aim(self.aim)
    }

    /// -1 for left, 1 for right, 0 for neither. Left wins when both are held.
    pub fn horizontal(&self) -> i32 {
        if self.left.is_down {
            -1
        } else if self.right.is_down {
            1
        } else {
            0
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
struct PlayerSlot {
    latest: InputFrame,
    previous: InputFrame,
    input: PlayerInput,
    present: bool,
}

/// Input table indexed by [`PlayerRef`].
#[derive(Resource, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlayerInputs {
    slots: Vec<PlayerSlot>,
}

impl PlayerInputs {
    pub fn new(max_players: usize) -> Self {
        PlayerInputs {
            slots: vec![PlayerSlot::default(); max_players],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Queue the raw input used by the next tick. Out of range players are ignored.
    pub fn set(&mut self, player: PlayerRef, frame: InputFrame) {
        if let Some(slot) = self.slots.get_mut(player.0 as usize) {
            slot.latest = frame;
        }
    }

    pub fn set_present(&mut self, player: PlayerRef, present: bool) {
        if let Some(slot) = self.slots.get_mut(player.0 as usize) {
            slot.present = present;
        }
    }

    pub fn is_present(&self, player: PlayerRef) -> bool {
        self.slots
            .get(player.0 as usize)
            .is_some_and(|slot| slot.present)
    }

    /// Input for this tick, `None` for players outside the table.
    pub fn get(&self, player: PlayerRef) -> Option<&PlayerInput> {
        self.slots.get(player.0 as usize).map(|slot| &slot.input)
    }

    /// Latch the queued raw frames into this tick's [`PlayerInput`]s.
    pub fn advance(&mut self) {
        for slot in &mut self.slots {
            slot.input = PlayerInput::from_frames(&slot.previous, &slot.latest);
            slot.previous = slot.latest;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== AIM TESTS ====================

    #[test]
    fn test_encode_aim_cardinal_directions() {
        assert_eq!(encode_aim(FpVec2::ZERO), 0);
        assert_eq!(encode_aim(FpVec2::UP), 1);
        assert_eq!(encode_aim(FpVec2::LEFT), 46);
        assert_eq!(encode_aim(FpVec2::DOWN), 91);
        assert_eq!(encode_aim(FpVec2::RIGHT), 136);
    }

    #[test]
    fn test_decode_aim_zero_is_no_input() {
        assert_eq!(decode_aim(0), FpVec2::ZERO);
    }

    #[test]
    fn test_decode_aim_right() {
        let dir = decode_aim(136);
        assert!((dir.x - Fp::ONE).abs() < Fp::from_num(1e-6));
        assert!(dir.y.abs() < Fp::from_num(1e-6));
    }

    // ==================== BUTTON TESTS ====================

    #[test]
    fn test_press_edge_only_on_first_tick() {
        let mut inputs = PlayerInputs::new(2);
        let p = PlayerRef(1);
        inputs.set(
            p,
            InputFrame {
                jump: true,
                ..Default::default()
            },
        );
        inputs.advance();
        let jump = inputs.get(p).expect("slot").jump;
        assert!(jump.is_down && jump.was_pressed);

        inputs.advance();
        let jump = inputs.get(p).expect("slot").jump;
        assert!(jump.is_down && !jump.was_pressed);

        inputs.set(p, InputFrame::default());
        inputs.advance();
        let jump = inputs.get(p).expect("slot").jump;
        assert!(!jump.is_down && jump.was_released);
    }

    #[test]
    fn test_horizontal_prefers_left() {
        let frame = |left, right| InputFrame {
            left,
            right,
            ..Default::default()
        };
        let none = InputFrame::default();
        assert_eq!(PlayerInput::from_frames(&none, &none).horizontal(), 0);
        assert_eq!(PlayerInput::from_frames(&none, &frame(false, true)).horizontal(), 1);
        assert_eq!(PlayerInput::from_frames(&none, &frame(true, false)).horizontal(), -1);
        assert_eq!(PlayerInput::from_frames(&none, &frame(true, true)).horizontal(), -1);
        // Held from the previous tick still counts.
        let right = frame(false, true);
        assert_eq!(PlayerInput::from_frames(&right, &right).horizontal(), 1);
    }

    #[test]
    fn test_out_of_range_player_is_ignored() {
        let mut inputs = PlayerInputs::new(1);
        inputs.set(PlayerRef(5), InputFrame::default());
        inputs.set_present(PlayerRef(5), true);
        assert!(inputs.get(PlayerRef(5)).is_none());
        assert!(!inputs.is_present(PlayerRef(5)));
    }

    #[test]
    fn test_wire_form_keeps_buttons_and_aim() {
        let frame = InputFrame {
            right: true,
            fire: true,
            dash: true,
            ..Default::default()
        }
        .with_aim(FpVec2::RIGHT);
        let bytes = frame.encode();
        assert_eq!(bytes, [button::RIGHT | button::FIRE | button::DASH, 136]);
        assert_eq!(InputFrame::decode(bytes), frame);
    }
}
