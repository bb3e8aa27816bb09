// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use hex1b_ansi::tokenizer::tokenize;
use hex1b_grid::emulator::TerminalEmulator;
use hex1b_grid::grid::CursorPosition;

fn apply_str(emulator: &mut TerminalEmulator, input: &str) {
    for token in tokenize(input) {
        emulator.apply(&token);
    }
}

fn grapheme_at(emulator: &TerminalEmulator, x: usize, y: usize) -> String {
    emulator
        .grid()
        .cell(x, y)
        .map(|c| c.grapheme().to_string())
        .unwrap_or_default()
}

#[test]
fn wide_character_occupies_two_cells() {
    let mut emulator = TerminalEmulator::new(10, 2);
    apply_str(&mut emulator, "あ");

    assert_eq!(grapheme_at(&emulator, 0, 0), "あ");
    assert!(
        emulator
            .grid()
            .cell(1, 0)
            .is_some_and(hex1b_grid::cell::TerminalCell::is_wide_continuation)
    );
    assert_eq!(emulator.grid().cursor, CursorPosition::new(2, 0));
}

#[test]
fn wide_char_at_last_column_pads_and_wraps() {
    let mut emulator = TerminalEmulator::new(4, 2);
    apply_str(&mut emulator, "abcあ");

    // the wide glyph cannot straddle the margin: the final cell is padded
    // with a space and the glyph starts the next line
    assert_eq!(grapheme_at(&emulator, 3, 0), " ");
    assert_eq!(grapheme_at(&emulator, 0, 1), "あ");
    assert_eq!(emulator.grid().cursor, CursorPosition::new(2, 1));
}

#[test]
fn zwj_emoji_is_one_grapheme() {
    let mut emulator = TerminalEmulator::new(10, 2);
    apply_str(&mut emulator, "👩‍👩‍👧x");

    assert_eq!(grapheme_at(&emulator, 0, 0), "👩‍👩‍👧");
    // emoji sequences are terminal-width 2
    assert_eq!(grapheme_at(&emulator, 2, 0), "x");
}

#[test]
fn combining_marks_stay_with_their_base() {
    let mut emulator = TerminalEmulator::new(10, 2);
    apply_str(&mut emulator, "e\u{301}x");

    assert_eq!(grapheme_at(&emulator, 0, 0), "e\u{301}");
    assert_eq!(grapheme_at(&emulator, 1, 0), "x");
}

#[test]
fn overwriting_half_a_wide_glyph_clears_the_other_half() {
    let mut emulator = TerminalEmulator::new(10, 2);
    apply_str(&mut emulator, "あ");
    // overwrite the continuation cell
    apply_str(&mut emulator, "\x1b[1;2HZ");

    assert_eq!(grapheme_at(&emulator, 0, 0), " ");
    assert_eq!(grapheme_at(&emulator, 1, 0), "Z");
}

#[test]
fn auto_wrap_off_overwrites_last_column() {
    let mut emulator = TerminalEmulator::new(5, 2);
    apply_str(&mut emulator, "\x1b[?7labcdefgh");

    // everything past the margin lands on the final cell
    assert_eq!(grapheme_at(&emulator, 4, 0), "h");
    assert_eq!(emulator.grid().cursor.row, 0);
}

#[test]
fn bottom_line_wrap_scrolls() {
    let mut emulator = TerminalEmulator::new(5, 2);
    apply_str(&mut emulator, "aaaaabbbbbccc");

    // the first row scrolled away
    assert_eq!(emulator.screen_text(), "bbbbb\nccc");
    assert_eq!(emulator.grid().cursor, CursorPosition::new(3, 1));
}

#[test]
fn styled_text_carries_attributes() {
    use hex1b_common::attributes::CellAttributes;
    use hex1b_common::colors::lookup_16_color;

    let mut emulator = TerminalEmulator::new(10, 2);
    apply_str(&mut emulator, "\x1b[1;31mX\x1b[0mY");

    let styled = emulator.grid().cell(0, 0).cloned().unwrap();
    assert!(styled.attributes().contains(CellAttributes::BOLD));
    assert_eq!(styled.fg(), Some(lookup_16_color(1)));

    let plain = emulator.grid().cell(1, 0).cloned().unwrap();
    assert!(plain.attributes().is_empty());
    assert_eq!(plain.fg(), None);
}
