// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use core::fmt;

use bitflags::bitflags;

bitflags! {
    /// Modifier keys as encoded in xterm's `1 + bitmask` parameter scheme.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
    pub struct KeyModifiers: u8 {
        const SHIFT   = 1 << 0;
        const ALT     = 1 << 1;
        const CONTROL = 1 << 2;
        const META    = 1 << 3;
    }
}

impl KeyModifiers {
    /// Decode the wire parameter (`1` means "no modifiers").
    #[must_use]
    pub fn from_wire_param(param: usize) -> Self {
        let bits = param.saturating_sub(1);
        Self::from_bits_truncate(u8::try_from(bits).unwrap_or(0))
    }

    /// Encode back to the wire parameter.
    #[must_use]
    pub const fn to_wire_param(self) -> usize {
        self.bits() as usize + 1
    }
}

/// Function and navigation keys that arrive as `CSI <code> ~`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SpecialKeyCode {
    Home,
    Insert,
    Delete,
    End,
    PageUp,
    PageDown,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    /// Anything we don't have a name for; kept so the sequence can be
    /// reproduced byte for byte.
    Unknown(usize),
}

impl SpecialKeyCode {
    #[must_use]
    pub const fn from_code(code: usize) -> Self {
        match code {
            1 => Self::Home,
            2 => Self::Insert,
            3 => Self::Delete,
            4 => Self::End,
            5 => Self::PageUp,
            6 => Self::PageDown,
            15 => Self::F5,
            17 => Self::F6,
            18 => Self::F7,
            19 => Self::F8,
            20 => Self::F9,
            21 => Self::F10,
            23 => Self::F11,
            24 => Self::F12,
            other => Self::Unknown(other),
        }
    }

    #[must_use]
    pub const fn code(self) -> usize {
        match self {
            Self::Home => 1,
            Self::Insert => 2,
            Self::Delete => 3,
            Self::End => 4,
            Self::PageUp => 5,
            Self::PageDown => 6,
            Self::F5 => 15,
            Self::F6 => 17,
            Self::F7 => 18,
            Self::F8 => 19,
            Self::F9 => 20,
            Self::F10 => 21,
            Self::F11 => 23,
            Self::F12 => 24,
            Self::Unknown(other) => other,
        }
    }
}

impl fmt::Display for SpecialKeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Home => write!(f, "Home"),
            Self::Insert => write!(f, "Insert"),
            Self::Delete => write!(f, "Delete"),
            Self::End => write!(f, "End"),
            Self::PageUp => write!(f, "PageUp"),
            Self::PageDown => write!(f, "PageDown"),
            Self::F5 => write!(f, "F5"),
            Self::F6 => write!(f, "F6"),
            Self::F7 => write!(f, "F7"),
            Self::F8 => write!(f, "F8"),
            Self::F9 => write!(f, "F9"),
            Self::F10 => write!(f, "F10"),
            Self::F11 => write!(f, "F11"),
            Self::F12 => write!(f, "F12"),
            Self::Unknown(code) => write!(f, "Unknown({code})"),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    WheelUp,
    WheelDown,
    /// No button pressed (plain motion reports).
    None,
}

/// What an SGR mouse report describes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum MouseAction {
    Down,
    Up,
    Move,
    Drag,
}

impl MouseButton {
    /// Decode the low bits of an SGR mouse button code.
    #[must_use]
    pub const fn from_sgr_code(code: usize) -> Self {
        if code & 64 != 0 {
            return if code & 1 == 0 {
                Self::WheelUp
            } else {
                Self::WheelDown
            };
        }

        match code & 3 {
            0 => Self::Left,
            1 => Self::Middle,
            2 => Self::Right,
            _ => Self::None,
        }
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "Left"),
            Self::Middle => write!(f, "Middle"),
            Self::Right => write!(f, "Right"),
            Self::WheelUp => write!(f, "WheelUp"),
            Self::WheelDown => write!(f, "WheelDown"),
            Self::None => write!(f, "None"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifier_wire_encoding_round_trips() {
        for bits in 0..16u8 {
            let mods = KeyModifiers::from_bits_truncate(bits);
            assert_eq!(KeyModifiers::from_wire_param(mods.to_wire_param()), mods);
        }
    }

    #[test]
    fn wire_param_one_is_no_modifiers() {
        assert_eq!(KeyModifiers::from_wire_param(1), KeyModifiers::empty());
        assert_eq!(KeyModifiers::from_wire_param(0), KeyModifiers::empty());
        assert_eq!(KeyModifiers::from_wire_param(2), KeyModifiers::SHIFT);
        assert_eq!(KeyModifiers::from_wire_param(5), KeyModifiers::CONTROL);
    }

    #[test]
    fn special_key_codes_round_trip() {
        for code in [1, 2, 3, 4, 5, 6, 15, 17, 18, 19, 20, 21, 23, 24, 99] {
            assert_eq!(SpecialKeyCode::from_code(code).code(), code);
        }
    }

    #[test]
    fn sgr_mouse_button_decoding() {
        assert_eq!(MouseButton::from_sgr_code(0), MouseButton::Left);
        assert_eq!(MouseButton::from_sgr_code(1), MouseButton::Middle);
        assert_eq!(MouseButton::from_sgr_code(2), MouseButton::Right);
        assert_eq!(MouseButton::from_sgr_code(3), MouseButton::None);
        assert_eq!(MouseButton::from_sgr_code(64), MouseButton::WheelUp);
        assert_eq!(MouseButton::from_sgr_code(65), MouseButton::WheelDown);
        // drag motion keeps the button in the low bits
        assert_eq!(MouseButton::from_sgr_code(32), MouseButton::Left);
    }
}
