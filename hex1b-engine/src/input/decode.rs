// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use hex1b_ansi::token::{AnsiToken, CursorMoveDirection};
use hex1b_common::input::{KeyModifiers, MouseAction, SpecialKeyCode};
use unicode_segmentation::UnicodeSegmentation;

use super::binding::{InputEvent, Key, KeyEvent, MouseEvent, MouseEventKind};

/// Map tokens parsed from the input stream onto key/mouse events.
///
/// The tokenizer is shared between both directions of the wire, so the
/// input side sees the same token vocabulary: arrows arrive as
/// `CursorMove`, function keys as `Ss3`/`SpecialKey`, and single control
/// bytes as one-character `Unrecognised` tokens.
#[must_use]
pub fn events_from_tokens(tokens: &[AnsiToken]) -> Vec<InputEvent> {
    let mut events = Vec::new();

    for token in tokens {
        match token {
            AnsiToken::Text(text) => {
                for grapheme in text.graphemes(true) {
                    if let Some(c) = grapheme.chars().next() {
                        events.push(InputEvent::Key(KeyEvent::plain(Key::Char(c))));
                    }
                }
            }
            AnsiToken::Control(c) => match c {
                '\r' | '\n' => events.push(InputEvent::Key(KeyEvent::plain(Key::Enter))),
                '\t' => events.push(InputEvent::Key(KeyEvent::plain(Key::Tab))),
                _ => {}
            },
            AnsiToken::CursorMove {
                direction,
                count: 1,
            } => {
                let key = match direction {
                    CursorMoveDirection::Up => Some(Key::Up),
                    CursorMoveDirection::Down => Some(Key::Down),
                    CursorMoveDirection::Forward => Some(Key::Right),
                    CursorMoveDirection::Back => Some(Key::Left),
                    _ => None,
                };
                if let Some(key) = key {
                    events.push(InputEvent::Key(KeyEvent::plain(key)));
                }
            }
            AnsiToken::CursorPosition {
                row: 1,
                col: 1,
                original_params: None,
            } => {
                // CSI H with no parameters is how Home arrives on some
                // terminals.
                events.push(InputEvent::Key(KeyEvent::plain(Key::Home)));
            }
            AnsiToken::Ss3(c) => {
                let key = match c {
                    'A' => Some(Key::Up),
                    'B' => Some(Key::Down),
                    'C' => Some(Key::Right),
                    'D' => Some(Key::Left),
                    'H' => Some(Key::Home),
                    'F' => Some(Key::End),
                    'P' => Some(Key::Function(1)),
                    'Q' => Some(Key::Function(2)),
                    'R' => Some(Key::Function(3)),
                    'S' => Some(Key::Function(4)),
                    _ => None,
                };
                if let Some(key) = key {
                    events.push(InputEvent::Key(KeyEvent::plain(key)));
                }
            }
            AnsiToken::SpecialKey { code, modifiers } => {
                let key = match code {
                    SpecialKeyCode::Home => Some(Key::Home),
                    SpecialKeyCode::Insert => Some(Key::Insert),
                    SpecialKeyCode::Delete => Some(Key::Delete),
                    SpecialKeyCode::End => Some(Key::End),
                    SpecialKeyCode::PageUp => Some(Key::PageUp),
                    SpecialKeyCode::PageDown => Some(Key::PageDown),
                    SpecialKeyCode::F5 => Some(Key::Function(5)),
                    SpecialKeyCode::F6 => Some(Key::Function(6)),
                    SpecialKeyCode::F7 => Some(Key::Function(7)),
                    SpecialKeyCode::F8 => Some(Key::Function(8)),
                    SpecialKeyCode::F9 => Some(Key::Function(9)),
                    SpecialKeyCode::F10 => Some(Key::Function(10)),
                    SpecialKeyCode::F11 => Some(Key::Function(11)),
                    SpecialKeyCode::F12 => Some(Key::Function(12)),
                    SpecialKeyCode::Unknown(_) => None,
                };
                if let Some(key) = key {
                    events.push(InputEvent::Key(KeyEvent::with_modifiers(key, *modifiers)));
                }
            }
            AnsiToken::SgrMouse {
                button,
                action,
                x,
                y,
                modifiers,
                ..
            } => {
                use hex1b_common::input::MouseButton;

                let kind = match (action, button) {
                    (MouseAction::Down, MouseButton::WheelUp) => MouseEventKind::WheelUp,
                    (MouseAction::Down, MouseButton::WheelDown) => MouseEventKind::WheelDown,
                    (MouseAction::Down, button) => MouseEventKind::Down(*button),
                    (MouseAction::Up, button) => MouseEventKind::Up(*button),
                    (MouseAction::Drag, button) => MouseEventKind::Drag(*button),
                    (MouseAction::Move, _) => MouseEventKind::Move,
                };

                events.push(InputEvent::Mouse(MouseEvent {
                    x: x.saturating_sub(1),
                    y: y.saturating_sub(1),
                    kind,
                    modifiers: *modifiers,
                }));
            }
            AnsiToken::Unrecognised(raw) => {
                let mut chars = raw.chars();
                if let (Some(c), None) = (chars.next(), chars.next()) {
                    if let Some(event) = control_byte_event(c) {
                        events.push(event);
                    }
                }
            }
            _ => trace!("input token with no event mapping: {token}"),
        }
    }

    events
}

/// Single control bytes that mean a key on the input side.
fn control_byte_event(c: char) -> Option<InputEvent> {
    match c {
        '\x7f' | '\x08' => Some(InputEvent::Key(KeyEvent::plain(Key::Backspace))),
        '\x1b' => Some(InputEvent::Key(KeyEvent::plain(Key::Escape))),
        // Ctrl+A .. Ctrl+Z (minus the bytes that are their own keys)
        '\x01'..='\x1a' => {
            let letter = char::from(b'a' + (c as u8) - 1);
            Some(InputEvent::Key(KeyEvent::with_modifiers(
                Key::Char(letter),
                KeyModifiers::CONTROL,
            )))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex1b_ansi::tokenizer::tokenize;
    use hex1b_common::input::MouseButton;

    fn decode(input: &str) -> Vec<InputEvent> {
        events_from_tokens(&tokenize(input))
    }

    #[test]
    fn plain_text_becomes_char_events() {
        assert_eq!(
            decode("ab"),
            vec![
                InputEvent::Key(KeyEvent::plain(Key::Char('a'))),
                InputEvent::Key(KeyEvent::plain(Key::Char('b'))),
            ]
        );
    }

    #[test]
    fn arrows_in_both_encodings() {
        assert_eq!(decode("\x1b[A"), vec![InputEvent::Key(KeyEvent::plain(Key::Up))]);
        assert_eq!(decode("\x1bOA"), vec![InputEvent::Key(KeyEvent::plain(Key::Up))]);
    }

    #[test]
    fn enter_tab_escape_backspace() {
        assert_eq!(decode("\r"), vec![InputEvent::Key(KeyEvent::plain(Key::Enter))]);
        assert_eq!(decode("\t"), vec![InputEvent::Key(KeyEvent::plain(Key::Tab))]);
        assert_eq!(
            decode("\x7f"),
            vec![InputEvent::Key(KeyEvent::plain(Key::Backspace))]
        );
    }

    #[test]
    fn ctrl_c_decodes_with_modifier() {
        assert_eq!(
            decode("\x03"),
            vec![InputEvent::Key(KeyEvent::with_modifiers(
                Key::Char('c'),
                KeyModifiers::CONTROL
            ))]
        );
    }

    #[test]
    fn special_keys_carry_modifiers() {
        assert_eq!(
            decode("\x1b[3~"),
            vec![InputEvent::Key(KeyEvent::plain(Key::Delete))]
        );
        assert_eq!(
            decode("\x1b[5;5~"),
            vec![InputEvent::Key(KeyEvent::with_modifiers(
                Key::PageUp,
                KeyModifiers::CONTROL
            ))]
        );
    }

    #[test]
    fn sgr_mouse_events_are_zero_based() {
        let events = decode("\x1b[<0;10;5M");
        assert_eq!(
            events,
            vec![InputEvent::Mouse(MouseEvent {
                x: 9,
                y: 4,
                kind: MouseEventKind::Down(MouseButton::Left),
                modifiers: KeyModifiers::empty(),
            })]
        );
    }

    #[test]
    fn wheel_maps_to_wheel_kinds() {
        let events = decode("\x1b[<64;3;4M");
        assert_eq!(
            events,
            vec![InputEvent::Mouse(MouseEvent {
                x: 2,
                y: 3,
                kind: MouseEventKind::WheelUp,
                modifiers: KeyModifiers::empty(),
            })]
        );
    }
}
