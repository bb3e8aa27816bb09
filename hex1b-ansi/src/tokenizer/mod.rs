// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

pub mod apc;
pub mod csi;
pub mod dcs;
pub mod osc;
pub mod standard;

use hex1b_common::input::{KeyModifiers, SpecialKeyCode};

use crate::token::{AnsiToken, CharsetTarget};
use apc::ApcParser;
use csi::CsiParser;
use dcs::DcsParser;
use osc::OscParser;

/// What a sub-parser did with one character.
#[derive(Debug)]
pub(crate) enum ParseStep {
    /// The character was consumed; the sequence is still open.
    Continue,
    /// The sequence completed and produced these tokens.
    Finished(Vec<AnsiToken>),
    /// The sequence was aborted. `raw` holds everything consumed so far
    /// (emitted as `Unrecognised`), and `reprocess` is a character that must
    /// be fed back through the state machine.
    Aborted {
        raw: String,
        reprocess: Option<char>,
    },
}

#[derive(Debug)]
enum TokenizerState {
    Ground,
    Escape,
    Csi(CsiParser),
    Osc(OscParser),
    Dcs(DcsParser),
    Apc(ApcParser),
    Ss3,
    Designate(CharsetTarget),
}

/// Streaming ANSI tokenizer.
///
/// Feed it arbitrary input with [`Tokenizer::push`]; it never fails.
/// Unclassifiable input surfaces as [`AnsiToken::Unrecognised`] so the
/// stream can always be reconstituted by serializing the output.
///
/// Printable runs are coalesced into a single [`AnsiToken::Text`] until an
/// escape, a control character, or the end of a push breaks the run, so
/// grapheme clusters are never split mid-sequence.
#[derive(Debug)]
pub struct Tokenizer {
    state: TokenizerState,
    pending_text: String,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: TokenizerState::Ground,
            pending_text: String::new(),
        }
    }

    /// Feed a chunk of input. A partial escape sequence at the end of the
    /// chunk stays pending and completes on the next push.
    pub fn push(&mut self, input: &str) -> Vec<AnsiToken> {
        let mut output = Vec::new();

        for c in input.chars() {
            let mut carry = Some(c);
            while let Some(c) = carry.take() {
                carry = self.step(c, &mut output);
            }
        }

        self.flush_text(&mut output);
        output
    }

    /// Flush pending state at end of input. An in-flight escape sequence
    /// becomes an `Unrecognised` token holding the consumed fragment.
    pub fn finish(mut self) -> Vec<AnsiToken> {
        let mut output = Vec::new();
        self.flush_text(&mut output);

        let fragment = match self.state {
            TokenizerState::Ground => String::new(),
            TokenizerState::Escape => "\x1b".to_string(),
            TokenizerState::Csi(parser) => format!("\x1b[{}", parser.raw()),
            TokenizerState::Osc(parser) => format!("\x1b]{}", parser.raw()),
            TokenizerState::Dcs(parser) => format!("\x1bP{}", parser.raw()),
            TokenizerState::Apc(parser) => format!("\x1b_{}", parser.raw()),
            TokenizerState::Ss3 => "\x1bO".to_string(),
            TokenizerState::Designate(CharsetTarget::G0) => "\x1b(".to_string(),
            TokenizerState::Designate(CharsetTarget::G1) => "\x1b)".to_string(),
        };

        if !fragment.is_empty() {
            debug!(
                "tokenizer finished with incomplete sequence: {}",
                fragment.escape_debug()
            );
            output.push(AnsiToken::Unrecognised(fragment));
        }

        output
    }

    fn flush_text(&mut self, output: &mut Vec<AnsiToken>) {
        if !self.pending_text.is_empty() {
            output.push(AnsiToken::Text(std::mem::take(&mut self.pending_text)));
        }
    }

    /// Process one character. Returns a character to reprocess if a
    /// sub-parser aborted on it.
    fn step(&mut self, c: char, output: &mut Vec<AnsiToken>) -> Option<char> {
        match &mut self.state {
            TokenizerState::Ground => self.step_ground(c, output),
            TokenizerState::Escape => {
                self.flush_text(output);
                match standard::dispatch_escape(c) {
                    standard::EscapeOutcome::Token(token) => {
                        output.push(token);
                        self.state = TokenizerState::Ground;
                    }
                    standard::EscapeOutcome::EnterCsi => {
                        self.state = TokenizerState::Csi(CsiParser::new());
                    }
                    standard::EscapeOutcome::EnterOsc => {
                        self.state = TokenizerState::Osc(OscParser::new());
                    }
                    standard::EscapeOutcome::EnterDcs => {
                        self.state = TokenizerState::Dcs(DcsParser::new());
                    }
                    standard::EscapeOutcome::EnterApc => {
                        self.state = TokenizerState::Apc(ApcParser::new());
                    }
                    standard::EscapeOutcome::EnterSs3 => {
                        self.state = TokenizerState::Ss3;
                    }
                    standard::EscapeOutcome::EnterDesignate(target) => {
                        self.state = TokenizerState::Designate(target);
                    }
                    standard::EscapeOutcome::RestartEscape => {
                        // ESC ESC: the first escape led nowhere.
                        output.push(AnsiToken::Unrecognised("\x1b".to_string()));
                    }
                    standard::EscapeOutcome::Unrecognised(raw) => {
                        output.push(AnsiToken::Unrecognised(raw));
                        self.state = TokenizerState::Ground;
                    }
                }
                None
            }
            TokenizerState::Csi(parser) => {
                let step = parser.push(c);
                self.apply_step(step, output)
            }
            TokenizerState::Osc(parser) => {
                let step = parser.push(c);
                self.apply_step(step, output)
            }
            TokenizerState::Dcs(parser) => {
                let step = parser.push(c);
                self.apply_step(step, output)
            }
            TokenizerState::Apc(parser) => {
                let step = parser.push(c);
                self.apply_step(step, output)
            }
            TokenizerState::Ss3 => {
                output.push(AnsiToken::Ss3(c));
                self.state = TokenizerState::Ground;
                None
            }
            TokenizerState::Designate(target) => {
                output.push(AnsiToken::CharacterSet {
                    target: *target,
                    charset: c,
                });
                self.state = TokenizerState::Ground;
                None
            }
        }
    }

    fn step_ground(&mut self, c: char, output: &mut Vec<AnsiToken>) -> Option<char> {
        match c {
            '\x1b' => {
                self.flush_text(output);
                self.state = TokenizerState::Escape;
            }
            '\r' | '\n' | '\t' => {
                self.flush_text(output);
                output.push(AnsiToken::Control(c));
            }
            // C1 introducers arriving as codepoints
            '\u{9b}' => {
                self.flush_text(output);
                self.state = TokenizerState::Csi(CsiParser::new());
            }
            '\u{9d}' => {
                self.flush_text(output);
                self.state = TokenizerState::Osc(OscParser::new());
            }
            '\u{90}' => {
                self.flush_text(output);
                self.state = TokenizerState::Dcs(DcsParser::new());
            }
            '\u{9f}' => {
                self.flush_text(output);
                self.state = TokenizerState::Apc(ApcParser::new());
            }
            c if (c as u32) < 0x20 || c == '\x7f' || ('\u{80}'..='\u{9f}').contains(&c) => {
                self.flush_text(output);
                output.push(AnsiToken::Unrecognised(c.to_string()));
            }
            c => self.pending_text.push(c),
        }
        None
    }

    fn apply_step(&mut self, step: ParseStep, output: &mut Vec<AnsiToken>) -> Option<char> {
        match step {
            ParseStep::Continue => None,
            ParseStep::Finished(tokens) => {
                output.extend(tokens);
                self.state = TokenizerState::Ground;
                None
            }
            ParseStep::Aborted { raw, reprocess } => {
                debug!("aborted escape sequence: {}", raw.escape_debug());
                output.push(AnsiToken::Unrecognised(raw));
                self.state = TokenizerState::Ground;
                reprocess
            }
        }
    }
}

/// Tokenize a complete input in one call.
#[must_use]
pub fn tokenize(input: &str) -> Vec<AnsiToken> {
    let mut tokenizer = Tokenizer::new();
    let mut output = tokenizer.push(input);
    output.extend(tokenizer.finish());
    output
}

/// Build the modifiers + key pair for a `CSI <code> ; <mods> ~` sequence.
pub(crate) fn special_key_token(code: usize, modifier_param: Option<usize>) -> AnsiToken {
    AnsiToken::SpecialKey {
        code: SpecialKeyCode::from_code(code),
        modifiers: modifier_param.map_or(KeyModifiers::empty(), KeyModifiers::from_wire_param),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_coalesces_into_one_token() {
        let tokens = tokenize("Hello, world");
        assert_eq!(tokens, vec![AnsiToken::Text("Hello, world".to_string())]);
    }

    #[test]
    fn control_characters_break_text_runs() {
        let tokens = tokenize("ab\ncd");
        assert_eq!(
            tokens,
            vec![
                AnsiToken::Text("ab".to_string()),
                AnsiToken::Control('\n'),
                AnsiToken::Text("cd".to_string()),
            ]
        );
    }

    #[test]
    fn partial_escape_survives_across_pushes() {
        let mut tokenizer = Tokenizer::new();
        let first = tokenizer.push("A\x1b[3");
        assert_eq!(first, vec![AnsiToken::Text("A".to_string())]);

        let second = tokenizer.push("1m");
        assert_eq!(second, vec![AnsiToken::Sgr("31".to_string())]);
    }

    #[test]
    fn finish_reports_incomplete_sequence() {
        let mut tokenizer = Tokenizer::new();
        let _ = tokenizer.push("\x1b[12;3");
        let tail = tokenizer.finish();
        assert_eq!(
            tail,
            vec![AnsiToken::Unrecognised("\x1b[12;3".to_string())]
        );
    }

    #[test]
    fn bare_escape_at_end_is_unrecognised() {
        let tokens = tokenize("x\x1b");
        assert_eq!(
            tokens,
            vec![
                AnsiToken::Text("x".to_string()),
                AnsiToken::Unrecognised("\x1b".to_string()),
            ]
        );
    }

    #[test]
    fn esc_esc_emits_orphan_and_continues() {
        let tokens = tokenize("\x1b\x1b[1A");
        assert_eq!(
            tokens,
            vec![
                AnsiToken::Unrecognised("\x1b".to_string()),
                AnsiToken::CursorMove {
                    direction: crate::token::CursorMoveDirection::Up,
                    count: 1,
                },
            ]
        );
    }

    #[test]
    fn c1_csi_introducer_is_accepted() {
        let tokens = tokenize("\u{9b}2J");
        assert_eq!(
            tokens,
            vec![AnsiToken::ClearScreen(crate::token::ClearScreenMode::All)]
        );
    }

    #[test]
    fn other_c0_bytes_are_preserved_as_unrecognised() {
        let tokens = tokenize("a\u{7}b");
        assert_eq!(
            tokens,
            vec![
                AnsiToken::Text("a".to_string()),
                AnsiToken::Unrecognised("\u{7}".to_string()),
                AnsiToken::Text("b".to_string()),
            ]
        );
    }
}
