/// Joypad buttons. The first four live in the action group, the rest in
/// the direction group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Button {
    A,
    B,
    Select,
    Start,
    Right,
    Left,
    Up,
    Down,
}

impl Button {
    /// Group index (0 = action, 1 = direction) and active-low bit mask.
    fn position(self) -> (usize, u8) {
        match self {
            Button::A => (0, 0x01),
            Button::B => (0, 0x02),
            Button::Select => (0, 0x04),
            Button::Start => (0, 0x08),
            Button::Right => (1, 0x01),
            Button::Left => (1, 0x02),
            Button::Up => (1, 0x04),
            Button::Down => (1, 0x08),
        }
    }
}

/// Joypad port at 0xFF00.
///
/// The last write selects a group through bits 4-5: 0x10 exposes the
/// action keys, 0x20 the direction keys, anything else reads 0. A
/// pressed key reads as a 0 bit.
#[derive(Clone, Debug)]
pub(super) struct Keyboard {
    keys: [u8; 2],
    select: u8,
}

impl Default for Keyboard {
    fn default() -> Self {
        Self {
            keys: [0x0F, 0x0F],
            select: 0,
        }
    }
}

impl Keyboard {
    pub(super) fn reset(&mut self) {
        *self = Self::default();
    }

    pub(super) fn read(&self) -> u8 {
        match self.select {
            0x10 => self.keys[0],
            0x20 => self.keys[1],
            _ => 0x00,
        }
    }

    pub(super) fn write(&mut self, value: u8) {
        self.select = value & 0x30;
    }

    pub(super) fn set(&mut self, button: Button, pressed: bool) {
        let (group, mask) = button.position();
        if pressed {
            self.keys[group] &= !mask;
        } else {
            self.keys[group] |= mask;
        }
    }
}
