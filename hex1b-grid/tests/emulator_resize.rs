// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use hex1b_ansi::tokenizer::tokenize;
use hex1b_common::colors::Rgb;
use hex1b_grid::emulator::TerminalEmulator;

fn apply_str(emulator: &mut TerminalEmulator, input: &str) {
    for token in tokenize(input) {
        emulator.apply(&token);
    }
}

#[test]
fn growing_preserves_content_at_original_coordinates() {
    let mut emulator = TerminalEmulator::new(80, 24);
    apply_str(&mut emulator, "hello\x1b[10;10Hworld");

    let impacts = emulator.resize(120, 40);

    assert_eq!(emulator.width(), 120);
    assert_eq!(emulator.height(), 40);
    assert_eq!(
        emulator.grid().cell(0, 0).map(|c| c.grapheme().to_string()),
        Some("h".to_string())
    );
    assert_eq!(
        emulator.grid().cell(9, 9).map(|c| c.grapheme().to_string()),
        Some("w".to_string())
    );
    // a resize dirties the whole grid
    assert_eq!(impacts.len(), 120 * 40);
}

#[test]
fn new_cells_are_blank_with_current_background() {
    let mut emulator = TerminalEmulator::new(4, 2);
    apply_str(&mut emulator, "\x1b[48;2;9;9;9m");
    emulator.resize(6, 3);

    let fresh = emulator.grid().cell(5, 2).cloned().unwrap();
    assert_eq!(fresh.grapheme(), " ");
    assert_eq!(fresh.bg(), Some(Rgb::new(9, 9, 9)));
}

#[test]
fn shrinking_truncates_and_clamps_cursor() {
    let mut emulator = TerminalEmulator::new(80, 24);
    apply_str(&mut emulator, "\x1b[24;80Hx");

    emulator.resize(20, 5);

    assert_eq!(emulator.width(), 20);
    assert_eq!(emulator.height(), 5);
    let cursor = emulator.grid().cursor;
    assert!(cursor.col <= 20);
    assert!(cursor.row < 5);
}

#[test]
fn resize_applies_to_the_saved_screen_too() {
    let mut emulator = TerminalEmulator::new(10, 4);
    apply_str(&mut emulator, "primary\x1b[?1049h");

    emulator.resize(20, 8);
    apply_str(&mut emulator, "\x1b[?1049l");

    assert_eq!(emulator.width(), 20);
    assert_eq!(emulator.height(), 8);
    assert_eq!(
        emulator.grid().cell(0, 0).map(|c| c.grapheme().to_string()),
        Some("p".to_string())
    );
}

#[test]
fn resize_to_same_size_is_a_no_op() {
    let mut emulator = TerminalEmulator::new(10, 4);
    apply_str(&mut emulator, "abc");
    let impacts = emulator.resize(10, 4);
    assert!(impacts.is_empty());
}
