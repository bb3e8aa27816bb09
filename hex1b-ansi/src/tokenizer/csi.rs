// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use hex1b_common::input::{KeyModifiers, MouseAction, MouseButton};

use super::{ParseStep, special_key_token};
use crate::error::TokenizeFailure;
use crate::token::{
    AnsiToken, ClearLineMode, ClearScreenMode, CursorMoveDirection, DeviceStatusKind,
};

const fn is_csi_param(c: char) -> bool {
    matches!(c, '\x30'..='\x3f')
}

const fn is_csi_intermediate(c: char) -> bool {
    matches!(c, '\x20'..='\x2f')
}

const fn is_csi_terminator(c: char) -> bool {
    matches!(c, '\x40'..='\x7e')
}

#[derive(Debug, Default, Eq, PartialEq)]
enum CsiState {
    #[default]
    Params,
    Intermediates,
    Invalid,
}

/// Parser for one control sequence: `ESC [ params intermediates final`.
#[derive(Debug, Default, Eq, PartialEq)]
pub(crate) struct CsiParser {
    state: CsiState,
    params: String,
    intermediates: String,
    /// Everything consumed after `ESC [`, kept for `Unrecognised` output.
    sequence: String,
}

impl CsiParser {
    pub(crate) fn new() -> Self {
        Self {
            state: CsiState::Params,
            params: String::with_capacity(8),
            intermediates: String::with_capacity(2),
            sequence: String::with_capacity(16),
        }
    }

    pub(crate) fn raw(&self) -> &str {
        &self.sequence
    }

    fn unrecognised(&self) -> Vec<AnsiToken> {
        vec![AnsiToken::Unrecognised(format!("\x1b[{}", self.sequence))]
    }

    pub(crate) fn push(&mut self, c: char) -> ParseStep {
        // A control character inside a CSI aborts the sequence; the byte is
        // handed back to the caller for normal processing.
        if (c as u32) < 0x20 || c == '\x7f' {
            debug!("{}", TokenizeFailure::InterruptedEscape(c as u32));
            return ParseStep::Aborted {
                raw: format!("\x1b[{}", self.sequence),
                reprocess: Some(c),
            };
        }

        self.sequence.push(c);

        match self.state {
            CsiState::Params => {
                if is_csi_param(c) {
                    self.params.push(c);
                    ParseStep::Continue
                } else if is_csi_intermediate(c) {
                    self.intermediates.push(c);
                    self.state = CsiState::Intermediates;
                    ParseStep::Continue
                } else if is_csi_terminator(c) {
                    ParseStep::Finished(self.dispatch(c))
                } else {
                    self.state = CsiState::Invalid;
                    ParseStep::Continue
                }
            }
            CsiState::Intermediates => {
                if is_csi_intermediate(c) {
                    self.intermediates.push(c);
                    ParseStep::Continue
                } else if is_csi_terminator(c) {
                    ParseStep::Finished(self.dispatch(c))
                } else {
                    self.state = CsiState::Invalid;
                    ParseStep::Continue
                }
            }
            CsiState::Invalid => {
                if is_csi_terminator(c) {
                    ParseStep::Finished(self.unrecognised())
                } else {
                    ParseStep::Continue
                }
            }
        }
    }

    #[allow(clippy::too_many_lines)]
    fn dispatch(&self, final_byte: char) -> Vec<AnsiToken> {
        let params = self.params.as_str();

        // SGR mouse reports carry a `<` prefix and terminate in M/m.
        if let Some(body) = params.strip_prefix('<') {
            return match final_byte {
                'M' | 'm' => self
                    .parse_sgr_mouse(body, final_byte)
                    .unwrap_or_else(|| self.unrecognised()),
                _ => self.unrecognised(),
            };
        }

        // Private set/reset modes carry a `?` prefix and terminate in h/l.
        if let Some(body) = params.strip_prefix('?') {
            return match final_byte {
                'h' | 'l' => self
                    .parse_private_modes(body, final_byte == 'h')
                    .unwrap_or_else(|| self.unrecognised()),
                _ => self.unrecognised(),
            };
        }

        // SGR bodies are carried verbatim (including `:` sub-parameter
        // syntax), so they skip numeric validation entirely.
        if final_byte == 'm' {
            return vec![AnsiToken::Sgr(params.to_string())];
        }

        let Some(numeric) = split_params(params) else {
            debug!(
                "{}",
                TokenizeFailure::InvalidCsiParams(params.to_string())
            );
            return self.unrecognised();
        };
        let arg = |idx: usize, default: usize| -> usize {
            numeric.get(idx).copied().flatten().unwrap_or(default)
        };

        match final_byte {
            'H' | 'f' => vec![AnsiToken::CursorPosition {
                row: arg(0, 1).max(1),
                col: arg(1, 1).max(1),
                original_params: if params.is_empty() {
                    None
                } else {
                    Some(params.to_string())
                },
            }],
            'A' | 'B' | 'C' | 'D' | 'E' | 'F' => {
                let direction = match final_byte {
                    'A' => CursorMoveDirection::Up,
                    'B' => CursorMoveDirection::Down,
                    'C' => CursorMoveDirection::Forward,
                    'D' => CursorMoveDirection::Back,
                    'E' => CursorMoveDirection::NextLine,
                    _ => CursorMoveDirection::PreviousLine,
                };
                vec![AnsiToken::CursorMove {
                    direction,
                    count: arg(0, 1).max(1),
                }]
            }
            'G' => vec![AnsiToken::CursorColumn(arg(0, 1).max(1))],
            'd' => vec![AnsiToken::CursorRow(arg(0, 1).max(1))],
            'J' => match arg(0, 0) {
                0 => vec![AnsiToken::ClearScreen(ClearScreenMode::ToEnd)],
                1 => vec![AnsiToken::ClearScreen(ClearScreenMode::ToStart)],
                2 => vec![AnsiToken::ClearScreen(ClearScreenMode::All)],
                3 => vec![AnsiToken::ClearScreen(ClearScreenMode::AllAndScrollback)],
                _ => self.unrecognised(),
            },
            'K' => match arg(0, 0) {
                0 => vec![AnsiToken::ClearLine(ClearLineMode::ToEnd)],
                1 => vec![AnsiToken::ClearLine(ClearLineMode::ToStart)],
                2 => vec![AnsiToken::ClearLine(ClearLineMode::All)],
                _ => self.unrecognised(),
            },
            'r' => vec![AnsiToken::ScrollRegion {
                top: arg(0, 1),
                bottom: arg(1, 0),
            }],
            'S' => vec![AnsiToken::ScrollUp(arg(0, 1).max(1))],
            'T' => vec![AnsiToken::ScrollDown(arg(0, 1).max(1))],
            'L' => vec![AnsiToken::InsertLines(arg(0, 1).max(1))],
            'M' => vec![AnsiToken::DeleteLines(arg(0, 1).max(1))],
            '@' => vec![AnsiToken::InsertCharacter(arg(0, 1).max(1))],
            'P' => vec![AnsiToken::DeleteCharacter(arg(0, 1).max(1))],
            'X' => vec![AnsiToken::EraseCharacter(arg(0, 1).max(1))],
            'b' => vec![AnsiToken::RepeatCharacter(arg(0, 1).max(1))],
            's' => {
                if params.is_empty() {
                    vec![AnsiToken::SaveCursor { dec: false }]
                } else {
                    vec![AnsiToken::LeftRightMargin {
                        left: arg(0, 1),
                        right: arg(1, 0),
                    }]
                }
            }
            'u' => {
                if params.is_empty() {
                    vec![AnsiToken::RestoreCursor { dec: false }]
                } else {
                    // kitty keyboard protocol and friends
                    self.unrecognised()
                }
            }
            'q' => {
                if self.intermediates == " " {
                    vec![AnsiToken::CursorShape(arg(0, 0))]
                } else {
                    self.unrecognised()
                }
            }
            '~' => match numeric.first().copied().flatten() {
                Some(code) => vec![special_key_token(code, numeric.get(1).copied().flatten())],
                None => self.unrecognised(),
            },
            'n' => vec![AnsiToken::DeviceStatusReport(DeviceStatusKind::from_code(
                arg(0, 0),
            ))],
            _ => self.unrecognised(),
        }
    }

    fn parse_private_modes(&self, body: &str, enable: bool) -> Option<Vec<AnsiToken>> {
        let numeric = split_params(body)?;
        let modes: Vec<AnsiToken> = numeric
            .into_iter()
            .map(|mode| {
                mode.map(|mode| AnsiToken::PrivateMode { mode, enable })
            })
            .collect::<Option<Vec<AnsiToken>>>()?;

        if modes.is_empty() { None } else { Some(modes) }
    }

    fn parse_sgr_mouse(&self, body: &str, final_byte: char) -> Option<Vec<AnsiToken>> {
        let numeric = split_params(body)?;
        let raw_button = numeric.first().copied().flatten()?;
        let x = numeric.get(1).copied().flatten()?;
        let y = numeric.get(2).copied().flatten()?;

        let button = MouseButton::from_sgr_code(raw_button);
        let action = if final_byte == 'm' {
            MouseAction::Up
        } else if raw_button & 32 != 0 {
            if button == MouseButton::None {
                MouseAction::Move
            } else {
                MouseAction::Drag
            }
        } else {
            MouseAction::Down
        };

        let mut modifiers = KeyModifiers::empty();
        if raw_button & 4 != 0 {
            modifiers |= KeyModifiers::SHIFT;
        }
        if raw_button & 8 != 0 {
            modifiers |= KeyModifiers::ALT;
        }
        if raw_button & 16 != 0 {
            modifiers |= KeyModifiers::CONTROL;
        }

        Some(vec![AnsiToken::SgrMouse {
            button,
            action,
            x,
            y,
            modifiers,
            raw_button,
        }])
    }
}

/// Split a `;`-separated parameter body. Empty positions become `None`
/// (meaning "use the default"); a non-numeric position fails the whole body.
fn split_params(params: &str) -> Option<Vec<Option<usize>>> {
    if params.is_empty() {
        return Some(Vec::new());
    }

    params
        .split(';')
        .map(|part| {
            if part.is_empty() {
                Some(None)
            } else {
                part.parse::<usize>().ok().map(Some)
            }
        })
        .collect()
}
