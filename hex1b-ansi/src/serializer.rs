// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::fmt::Write as _;
use std::io;

use crate::token::{
    AnsiToken, ClearLineMode, ClearScreenMode, CharsetTarget, FRAME_BEGIN_MARKER, FRAME_END_MARKER,
};
use hex1b_common::input::MouseAction;

/// Serialize one token to its wire form.
///
/// Default parameters (count 1, row/column 1, clear mode 0) are omitted so
/// common sequences match the exact bytes a human would write, and tokens
/// that carry their original parameter spelling or terminator style emit it
/// verbatim. For every token `t` produced by the tokenizer,
/// `tokenize(serialize(t))` yields `[t]` again (compared with
/// [`AnsiToken::semantic_eq`]).
#[must_use]
pub fn serialize(token: &AnsiToken) -> String {
    let mut out = String::new();
    encode_into(token, &mut out);
    out
}

/// Serialize a whole token stream.
#[must_use]
pub fn serialize_tokens(tokens: &[AnsiToken]) -> String {
    let mut out = String::new();
    for token in tokens {
        encode_into(token, &mut out);
    }
    out
}

/// Byte-writer back-end. Produces exactly the bytes of [`serialize`]; both
/// run through the same encoder so they cannot drift.
///
/// # Errors
/// Returns any error from the underlying writer.
pub fn write_token<W: io::Write>(writer: &mut W, token: &AnsiToken) -> io::Result<()> {
    writer.write_all(serialize(token).as_bytes())
}

/// # Errors
/// Returns any error from the underlying writer.
pub fn write_tokens<W: io::Write>(writer: &mut W, tokens: &[AnsiToken]) -> io::Result<()> {
    for token in tokens {
        write_token(writer, token)?;
    }
    Ok(())
}

#[allow(clippy::too_many_lines)]
fn encode_into(token: &AnsiToken, out: &mut String) {
    // Writing to a String cannot fail; the unwrap_or_default() calls keep
    // the deny(unwrap_used) lint satisfied without panicking paths.
    match token {
        AnsiToken::Text(text) => out.push_str(text),
        AnsiToken::Control(c) => out.push(*c),
        AnsiToken::Sgr(params) => {
            write!(out, "\x1b[{params}m").unwrap_or_default();
        }
        AnsiToken::CursorPosition {
            row,
            col,
            original_params,
        } => {
            if let Some(params) = original_params {
                write!(out, "\x1b[{params}H").unwrap_or_default();
            } else if *row == 1 && *col == 1 {
                out.push_str("\x1b[H");
            } else if *col == 1 {
                write!(out, "\x1b[{row}H").unwrap_or_default();
            } else {
                write!(out, "\x1b[{row};{col}H").unwrap_or_default();
            }
        }
        AnsiToken::CursorMove { direction, count } => {
            let final_byte = direction.final_byte();
            if *count == 1 {
                write!(out, "\x1b[{final_byte}").unwrap_or_default();
            } else {
                write!(out, "\x1b[{count}{final_byte}").unwrap_or_default();
            }
        }
        AnsiToken::CursorColumn(col) => {
            if *col == 1 {
                out.push_str("\x1b[G");
            } else {
                write!(out, "\x1b[{col}G").unwrap_or_default();
            }
        }
        AnsiToken::CursorRow(row) => {
            if *row == 1 {
                out.push_str("\x1b[d");
            } else {
                write!(out, "\x1b[{row}d").unwrap_or_default();
            }
        }
        AnsiToken::CursorShape(shape) => {
            write!(out, "\x1b[{shape} q").unwrap_or_default();
        }
        AnsiToken::ClearScreen(mode) => match mode {
            ClearScreenMode::ToEnd => out.push_str("\x1b[J"),
            ClearScreenMode::ToStart => out.push_str("\x1b[1J"),
            ClearScreenMode::All => out.push_str("\x1b[2J"),
            ClearScreenMode::AllAndScrollback => out.push_str("\x1b[3J"),
        },
        AnsiToken::ClearLine(mode) => match mode {
            ClearLineMode::ToEnd => out.push_str("\x1b[K"),
            ClearLineMode::ToStart => out.push_str("\x1b[1K"),
            ClearLineMode::All => out.push_str("\x1b[2K"),
        },
        AnsiToken::ScrollRegion { top, bottom } => {
            if *top == 1 && *bottom == 0 {
                out.push_str("\x1b[r");
            } else {
                write!(out, "\x1b[{top};{bottom}r").unwrap_or_default();
            }
        }
        AnsiToken::ScrollUp(n) => encode_count(out, *n, 'S'),
        AnsiToken::ScrollDown(n) => encode_count(out, *n, 'T'),
        AnsiToken::InsertLines(n) => encode_count(out, *n, 'L'),
        AnsiToken::DeleteLines(n) => encode_count(out, *n, 'M'),
        AnsiToken::InsertCharacter(n) => encode_count(out, *n, '@'),
        AnsiToken::DeleteCharacter(n) => encode_count(out, *n, 'P'),
        AnsiToken::EraseCharacter(n) => encode_count(out, *n, 'X'),
        AnsiToken::RepeatCharacter(n) => encode_count(out, *n, 'b'),
        AnsiToken::LeftRightMargin { left, right } => {
            write!(out, "\x1b[{left};{right}s").unwrap_or_default();
        }
        AnsiToken::Index => out.push_str("\x1bD"),
        AnsiToken::ReverseIndex => out.push_str("\x1bM"),
        AnsiToken::CharacterSet { target, charset } => {
            let intro = match target {
                CharsetTarget::G0 => '(',
                CharsetTarget::G1 => ')',
            };
            write!(out, "\x1b{intro}{charset}").unwrap_or_default();
        }
        AnsiToken::KeypadMode(application) => {
            out.push_str(if *application { "\x1b=" } else { "\x1b>" });
        }
        AnsiToken::SaveCursor { dec } => {
            out.push_str(if *dec { "\x1b7" } else { "\x1b[s" });
        }
        AnsiToken::RestoreCursor { dec } => {
            out.push_str(if *dec { "\x1b8" } else { "\x1b[u" });
        }
        AnsiToken::PrivateMode { mode, enable } => {
            let final_byte = if *enable { 'h' } else { 'l' };
            write!(out, "\x1b[?{mode}{final_byte}").unwrap_or_default();
        }
        AnsiToken::Osc {
            command,
            parameters,
            payload,
            esc_terminated,
        } => {
            write!(out, "\x1b]{command}").unwrap_or_default();
            for parameter in parameters {
                write!(out, ";{parameter}").unwrap_or_default();
            }
            if !(parameters.is_empty() && payload.is_empty()) {
                write!(out, ";{payload}").unwrap_or_default();
            }
            out.push_str(if *esc_terminated { "\x1b\\" } else { "\x07" });
        }
        AnsiToken::Dcs(payload) => {
            write!(out, "\x1bP{payload}\x1b\\").unwrap_or_default();
        }
        AnsiToken::FrameBegin => {
            write!(out, "\x1b_{FRAME_BEGIN_MARKER}\x1b\\").unwrap_or_default();
        }
        AnsiToken::FrameEnd => {
            write!(out, "\x1b_{FRAME_END_MARKER}\x1b\\").unwrap_or_default();
        }
        AnsiToken::Ss3(c) => {
            write!(out, "\x1bO{c}").unwrap_or_default();
        }
        AnsiToken::SgrMouse {
            raw_button,
            action,
            x,
            y,
            ..
        } => {
            let final_byte = if *action == MouseAction::Up { 'm' } else { 'M' };
            write!(out, "\x1b[<{raw_button};{x};{y}{final_byte}").unwrap_or_default();
        }
        AnsiToken::SpecialKey { code, modifiers } => {
            if modifiers.is_empty() {
                write!(out, "\x1b[{}~", code.code()).unwrap_or_default();
            } else {
                write!(out, "\x1b[{};{}~", code.code(), modifiers.to_wire_param())
                    .unwrap_or_default();
            }
        }
        AnsiToken::DeviceStatusReport(kind) => {
            write!(out, "\x1b[{}n", kind.code()).unwrap_or_default();
        }
        AnsiToken::Unrecognised(raw) => out.push_str(raw),
    }
}

fn encode_count(out: &mut String, count: usize, final_byte: char) {
    if count == 1 {
        write!(out, "\x1b[{final_byte}").unwrap_or_default();
    } else {
        write!(out, "\x1b[{count}{final_byte}").unwrap_or_default();
    }
}
