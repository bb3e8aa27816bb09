// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use hex1b_common::input::{KeyModifiers, MouseButton};

use super::binding::{Key, KeyEvent, MouseEvent, MouseEventKind};

/// Encode a key event as the bytes a terminal would send. The inverse of
/// the decode path, used by the test harness's input sequence builder.
#[must_use]
pub fn key_event_bytes(event: &KeyEvent) -> String {
    let KeyEvent { key, modifiers } = *event;

    if modifiers == KeyModifiers::CONTROL {
        if let Key::Char(c) = key {
            if c.is_ascii_lowercase() {
                return char::from((c as u8) - b'a' + 1).to_string();
            }
        }
    }

    match key {
        Key::Char(c) => c.to_string(),
        Key::Enter => "\r".to_string(),
        Key::Tab => "\t".to_string(),
        Key::Escape => "\x1b".to_string(),
        Key::Backspace => "\x7f".to_string(),
        Key::Up => csi_arrow('A', modifiers),
        Key::Down => csi_arrow('B', modifiers),
        Key::Right => csi_arrow('C', modifiers),
        Key::Left => csi_arrow('D', modifiers),
        Key::Home => tilde_key(1, modifiers),
        Key::Insert => tilde_key(2, modifiers),
        Key::Delete => tilde_key(3, modifiers),
        Key::End => tilde_key(4, modifiers),
        Key::PageUp => tilde_key(5, modifiers),
        Key::PageDown => tilde_key(6, modifiers),
        Key::Function(n @ 1..=4) => {
            let c = char::from(b'P' + n - 1);
            format!("\x1bO{c}")
        }
        Key::Function(n) => {
            let code = match n {
                5 => 15,
                6 => 17,
                7 => 18,
                8 => 19,
                9 => 20,
                10 => 21,
                11 => 23,
                _ => 24,
            };
            tilde_key(code, modifiers)
        }
    }
}

fn csi_arrow(final_byte: char, modifiers: KeyModifiers) -> String {
    if modifiers.is_empty() {
        format!("\x1b[{final_byte}")
    } else {
        format!("\x1b[1;{}{final_byte}", modifiers.to_wire_param())
    }
}

fn tilde_key(code: usize, modifiers: KeyModifiers) -> String {
    if modifiers.is_empty() {
        format!("\x1b[{code}~")
    } else {
        format!("\x1b[{code};{}~", modifiers.to_wire_param())
    }
}

/// Encode a mouse event as an SGR mouse report (1-based wire coordinates).
#[must_use]
pub fn mouse_event_bytes(event: &MouseEvent) -> String {
    let mut code;
    let final_byte;

    match event.kind {
        MouseEventKind::Down(button) => {
            code = button_code(button);
            final_byte = 'M';
        }
        MouseEventKind::Up(button) => {
            code = button_code(button);
            final_byte = 'm';
        }
        MouseEventKind::Drag(button) => {
            code = button_code(button) + 32;
            final_byte = 'M';
        }
        MouseEventKind::Move => {
            code = 35;
            final_byte = 'M';
        }
        MouseEventKind::WheelUp => {
            code = 64;
            final_byte = 'M';
        }
        MouseEventKind::WheelDown => {
            code = 65;
            final_byte = 'M';
        }
    }

    if event.modifiers.contains(KeyModifiers::SHIFT) {
        code += 4;
    }
    if event.modifiers.contains(KeyModifiers::ALT) {
        code += 8;
    }
    if event.modifiers.contains(KeyModifiers::CONTROL) {
        code += 16;
    }

    format!("\x1b[<{code};{};{}{final_byte}", event.x + 1, event.y + 1)
}

const fn button_code(button: MouseButton) -> usize {
    match button {
        MouseButton::Left => 0,
        MouseButton::Middle => 1,
        MouseButton::Right => 2,
        MouseButton::WheelUp => 64,
        MouseButton::WheelDown => 65,
        MouseButton::None => 3,
    }
}
