// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use bitflags::bitflags;

bitflags! {
    /// Per-cell text attributes as set by SGR.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
    pub struct CellAttributes: u16 {
        const BOLD          = 1 << 0;
        const DIM           = 1 << 1;
        const ITALIC        = 1 << 2;
        const UNDERLINE     = 1 << 3;
        const BLINK         = 1 << 4;
        const REVERSE       = 1 << 5;
        const HIDDEN        = 1 << 6;
        const STRIKETHROUGH = 1 << 7;
        const OVERLINE      = 1 << 8;
    }
}

impl CellAttributes {
    /// SGR parameter that enables this single attribute, used when
    /// re-emitting styles on the wire.
    #[must_use]
    pub const fn sgr_enable_code(self) -> Option<u8> {
        match self {
            Self::BOLD => Some(1),
            Self::DIM => Some(2),
            Self::ITALIC => Some(3),
            Self::UNDERLINE => Some(4),
            Self::BLINK => Some(5),
            Self::REVERSE => Some(7),
            Self::HIDDEN => Some(8),
            Self::STRIKETHROUGH => Some(9),
            Self::OVERLINE => Some(53),
            _ => None,
        }
    }
}
