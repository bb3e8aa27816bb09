// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use core::fmt;

use hex1b_common::input::{KeyModifiers, MouseAction, MouseButton, SpecialKeyCode};
use unicode_segmentation::UnicodeSegmentation;

/// The APC payload that marks the start of a render frame.
pub const FRAME_BEGIN_MARKER: &str = "HEX1BAPP:FRAME:BEGIN";
/// The APC payload that marks the end of a render frame.
pub const FRAME_END_MARKER: &str = "HEX1BAPP:FRAME:END";

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum CursorMoveDirection {
    Up,
    Down,
    Forward,
    Back,
    NextLine,
    PreviousLine,
}

impl CursorMoveDirection {
    /// CSI final byte for this direction.
    #[must_use]
    pub const fn final_byte(self) -> char {
        match self {
            Self::Up => 'A',
            Self::Down => 'B',
            Self::Forward => 'C',
            Self::Back => 'D',
            Self::NextLine => 'E',
            Self::PreviousLine => 'F',
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ClearScreenMode {
    ToEnd,
    ToStart,
    All,
    AllAndScrollback,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ClearLineMode {
    ToEnd,
    ToStart,
    All,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum CharsetTarget {
    G0,
    G1,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum DeviceStatusKind {
    /// `CSI 5 n` — operating status.
    Status,
    /// `CSI 6 n` — cursor position report request.
    CursorPosition,
    Other(usize),
}

impl DeviceStatusKind {
    #[must_use]
    pub const fn from_code(code: usize) -> Self {
        match code {
            5 => Self::Status,
            6 => Self::CursorPosition,
            other => Self::Other(other),
        }
    }

    #[must_use]
    pub const fn code(self) -> usize {
        match self {
            Self::Status => 5,
            Self::CursorPosition => 6,
            Self::Other(code) => code,
        }
    }
}

/// One recognised ANSI/VT construct.
///
/// The tokenizer never fails: anything it cannot classify is preserved in an
/// `Unrecognised` token, so serialising a token stream reconstitutes the
/// input. Numeric fields are 1-based where the wire is 1-based.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AnsiToken {
    /// A run of printable graphemes.
    Text(String),
    /// CR, LF or Tab.
    Control(char),
    /// Raw SGR parameter body, preserved verbatim.
    Sgr(String),
    CursorPosition {
        row: usize,
        col: usize,
        /// Original parameter spelling, kept so `CSI 5;1H` and `CSI 5H`
        /// serialize back to their exact input bytes.
        original_params: Option<String>,
    },
    CursorMove {
        direction: CursorMoveDirection,
        count: usize,
    },
    CursorColumn(usize),
    CursorRow(usize),
    /// DECSCUSR shape code.
    CursorShape(usize),
    ClearScreen(ClearScreenMode),
    ClearLine(ClearLineMode),
    /// DECSTBM. `top=1, bottom=0` resets to the full screen.
    ScrollRegion {
        top: usize,
        bottom: usize,
    },
    ScrollUp(usize),
    ScrollDown(usize),
    InsertLines(usize),
    DeleteLines(usize),
    InsertCharacter(usize),
    DeleteCharacter(usize),
    EraseCharacter(usize),
    RepeatCharacter(usize),
    /// DECSLRM, honoured only while margin mode (private mode 69) is set.
    LeftRightMargin {
        left: usize,
        right: usize,
    },
    Index,
    ReverseIndex,
    CharacterSet {
        target: CharsetTarget,
        charset: char,
    },
    /// `ESC =` (true) / `ESC >` (false).
    KeypadMode(bool),
    SaveCursor {
        dec: bool,
    },
    RestoreCursor {
        dec: bool,
    },
    /// The DEC `?` set/reset mode family.
    PrivateMode {
        mode: usize,
        enable: bool,
    },
    Osc {
        command: String,
        parameters: Vec<String>,
        payload: String,
        /// Whether the sequence was terminated with `ESC \` (or C1 ST)
        /// rather than BEL.
        esc_terminated: bool,
    },
    /// Entire device-control-string body, including any Sixel data.
    Dcs(String),
    FrameBegin,
    FrameEnd,
    /// `ESC O <char>` function/arrow keys.
    Ss3(char),
    SgrMouse {
        button: MouseButton,
        action: MouseAction,
        x: usize,
        y: usize,
        modifiers: KeyModifiers,
        /// Wire button code, kept for byte-exact reproduction.
        raw_button: usize,
    },
    SpecialKey {
        code: SpecialKeyCode,
        modifiers: KeyModifiers,
    },
    DeviceStatusReport(DeviceStatusKind),
    /// Catch-all preserving the original bytes of anything unclassified.
    Unrecognised(String),
}

impl AnsiToken {
    /// Compare two tokens ignoring the formatting hints (`original_params`,
    /// OSC terminator style) that only exist to keep serialization
    /// byte-exact.
    #[must_use]
    pub fn semantic_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::CursorPosition { row, col, .. },
                Self::CursorPosition {
                    row: other_row,
                    col: other_col,
                    ..
                },
            ) => row == other_row && col == other_col,
            (
                Self::Osc {
                    command,
                    parameters,
                    payload,
                    ..
                },
                Self::Osc {
                    command: other_command,
                    parameters: other_parameters,
                    payload: other_payload,
                    ..
                },
            ) => {
                command == other_command
                    && parameters == other_parameters
                    && payload == other_payload
            }
            (a, b) => a == b,
        }
    }

    /// Whether this token is printable content rather than a control
    /// function.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Iterate the extended grapheme clusters of a `Text` token.
    pub fn graphemes(&self) -> impl Iterator<Item = &str> {
        let text = match self {
            Self::Text(text) => text.as_str(),
            _ => "",
        };
        text.graphemes(true)
    }
}

impl fmt::Display for AnsiToken {
    #[allow(clippy::too_many_lines)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "Text({text})"),
            Self::Control(c) => write!(f, "Control(0x{:02X})", *c as u32),
            Self::Sgr(params) => write!(f, "Sgr({params})"),
            Self::CursorPosition { row, col, .. } => {
                write!(f, "CursorPosition: row: {row}, col: {col}")
            }
            Self::CursorMove { direction, count } => {
                write!(f, "CursorMove({direction:?}, {count})")
            }
            Self::CursorColumn(col) => write!(f, "CursorColumn({col})"),
            Self::CursorRow(row) => write!(f, "CursorRow({row})"),
            Self::CursorShape(shape) => write!(f, "CursorShape({shape})"),
            Self::ClearScreen(mode) => write!(f, "ClearScreen({mode:?})"),
            Self::ClearLine(mode) => write!(f, "ClearLine({mode:?})"),
            Self::ScrollRegion { top, bottom } => {
                write!(f, "ScrollRegion({top}, {bottom})")
            }
            Self::ScrollUp(n) => write!(f, "ScrollUp({n})"),
            Self::ScrollDown(n) => write!(f, "ScrollDown({n})"),
            Self::InsertLines(n) => write!(f, "InsertLines({n})"),
            Self::DeleteLines(n) => write!(f, "DeleteLines({n})"),
            Self::InsertCharacter(n) => write!(f, "InsertCharacter({n})"),
            Self::DeleteCharacter(n) => write!(f, "DeleteCharacter({n})"),
            Self::EraseCharacter(n) => write!(f, "EraseCharacter({n})"),
            Self::RepeatCharacter(n) => write!(f, "RepeatCharacter({n})"),
            Self::LeftRightMargin { left, right } => {
                write!(f, "LeftRightMargin({left}, {right})")
            }
            Self::Index => write!(f, "Index"),
            Self::ReverseIndex => write!(f, "ReverseIndex"),
            Self::CharacterSet { target, charset } => {
                write!(f, "CharacterSet({target:?}, {charset})")
            }
            Self::KeypadMode(application) => write!(f, "KeypadMode({application})"),
            Self::SaveCursor { dec } => write!(f, "SaveCursor(dec: {dec})"),
            Self::RestoreCursor { dec } => write!(f, "RestoreCursor(dec: {dec})"),
            Self::PrivateMode { mode, enable } => {
                write!(f, "PrivateMode({mode}, {enable})")
            }
            Self::Osc {
                command, payload, ..
            } => write!(f, "Osc({command}, {payload})"),
            Self::Dcs(payload) => write!(f, "Dcs({} bytes)", payload.len()),
            Self::FrameBegin => write!(f, "FrameBegin"),
            Self::FrameEnd => write!(f, "FrameEnd"),
            Self::Ss3(c) => write!(f, "Ss3({c})"),
            Self::SgrMouse {
                button,
                action,
                x,
                y,
                ..
            } => write!(f, "SgrMouse({button}, {action:?}, {x}, {y})"),
            Self::SpecialKey { code, modifiers } => {
                write!(f, "SpecialKey({code}, {modifiers:?})")
            }
            Self::DeviceStatusReport(kind) => write!(f, "DeviceStatusReport({kind:?})"),
            Self::Unrecognised(raw) => write!(f, "Unrecognised({})", raw.escape_debug()),
        }
    }
}
