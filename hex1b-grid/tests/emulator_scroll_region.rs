// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use hex1b_ansi::tokenizer::tokenize;
use hex1b_grid::emulator::TerminalEmulator;

fn apply_str(emulator: &mut TerminalEmulator, input: &str) {
    for token in tokenize(input) {
        emulator.apply(&token);
    }
}

fn fill_rows(emulator: &mut TerminalEmulator, height: usize) {
    for row in 0..height {
        apply_str(emulator, &format!("\x1b[{};1H{}", row + 1, row));
    }
}

#[test_log::test]
fn decstbm_clamps_and_homes_the_cursor() {
    let mut emulator = TerminalEmulator::new(10, 6);
    apply_str(&mut emulator, "\x1b[3;5H\x1b[2;4r");

    assert_eq!(emulator.grid().scroll_region(), (1, 3));
    assert_eq!(emulator.grid().cursor.col, 0);
    assert_eq!(emulator.grid().cursor.row, 0);
}

#[test]
fn decstbm_reset_spelling() {
    let mut emulator = TerminalEmulator::new(10, 6);
    apply_str(&mut emulator, "\x1b[2;4r\x1b[r");
    assert_eq!(emulator.grid().scroll_region(), (0, 5));
}

#[test]
fn scroll_up_stays_inside_region() {
    let mut emulator = TerminalEmulator::new(10, 5);
    fill_rows(&mut emulator, 5);
    apply_str(&mut emulator, "\x1b[2;4r\x1b[S");

    // rows outside [1,3] are untouched; inside, content moved up one
    assert_eq!(emulator.screen_text(), "0\n2\n3\n\n4");
}

#[test]
fn scroll_down_stays_inside_region() {
    let mut emulator = TerminalEmulator::new(10, 5);
    fill_rows(&mut emulator, 5);
    apply_str(&mut emulator, "\x1b[2;4r\x1b[T");

    assert_eq!(emulator.screen_text(), "0\n\n1\n2\n4");
}

#[test]
fn index_at_region_bottom_scrolls() {
    let mut emulator = TerminalEmulator::new(10, 5);
    fill_rows(&mut emulator, 5);
    // place the cursor on the region's bottom row, then index
    apply_str(&mut emulator, "\x1b[2;4r\x1b[4;1H\x1bD");

    assert_eq!(emulator.screen_text(), "0\n2\n3\n\n4");
    assert_eq!(emulator.grid().cursor.row, 3);
}

#[test]
fn reverse_index_at_region_top_scrolls() {
    let mut emulator = TerminalEmulator::new(10, 5);
    fill_rows(&mut emulator, 5);
    apply_str(&mut emulator, "\x1b[2;4r\x1b[2;1H\x1bM");

    assert_eq!(emulator.screen_text(), "0\n\n1\n2\n4");
    assert_eq!(emulator.grid().cursor.row, 1);
}

#[test]
fn index_outside_region_does_not_scroll() {
    let mut emulator = TerminalEmulator::new(10, 5);
    fill_rows(&mut emulator, 5);
    // cursor below the region, at the last screen row
    apply_str(&mut emulator, "\x1b[2;3r\x1b[5;1H\x1bD");

    assert_eq!(emulator.screen_text(), "0\n1\n2\n3\n4");
}

#[test]
fn insert_lines_shifts_within_region() {
    let mut emulator = TerminalEmulator::new(10, 5);
    fill_rows(&mut emulator, 5);
    apply_str(&mut emulator, "\x1b[2;4r\x1b[2;1H\x1b[L");

    assert_eq!(emulator.screen_text(), "0\n\n1\n2\n4");
}

#[test]
fn delete_lines_shifts_within_region() {
    let mut emulator = TerminalEmulator::new(10, 5);
    fill_rows(&mut emulator, 5);
    apply_str(&mut emulator, "\x1b[2;4r\x1b[2;1H\x1b[M");

    assert_eq!(emulator.screen_text(), "0\n2\n3\n\n4");
}

#[test]
fn insert_lines_outside_region_is_ignored() {
    let mut emulator = TerminalEmulator::new(10, 5);
    fill_rows(&mut emulator, 5);
    apply_str(&mut emulator, "\x1b[2;4r\x1b[5;1H\x1b[L");

    assert_eq!(emulator.screen_text(), "0\n1\n2\n3\n4");
}

#[test]
fn writes_outside_region_leave_region_content_alone() {
    let mut emulator = TerminalEmulator::new(10, 5);
    fill_rows(&mut emulator, 5);
    apply_str(&mut emulator, "\x1b[2;4r");

    let before: Vec<String> = (1..4)
        .map(|y| {
            emulator
                .grid()
                .row(y)
                .map(|r| r.iter().map(|c| c.grapheme().to_string()).collect())
                .unwrap_or_default()
        })
        .collect();

    // write on rows outside the region
    apply_str(&mut emulator, "\x1b[1;1HXXXX\x1b[5;1HYYYY");

    let after: Vec<String> = (1..4)
        .map(|y| {
            emulator
                .grid()
                .row(y)
                .map(|r| r.iter().map(|c| c.grapheme().to_string()).collect())
                .unwrap_or_default()
        })
        .collect();

    assert_eq!(before, after);
}

#[test]
fn left_right_margins_restrict_scrolling() {
    let mut emulator = TerminalEmulator::new(8, 4);
    for row in 0..4 {
        apply_str(&mut emulator, &format!("\x1b[{};1Habcdefgh", row + 1));
    }

    // enable margin mode, set margins to columns 3..6 (1-based), scroll up
    apply_str(&mut emulator, "\x1b[?69h\x1b[3;6s\x1b[S");

    // columns outside the margins are untouched on every row
    for y in 0..4 {
        let row: String = emulator
            .grid()
            .row(y)
            .map(|r| r.iter().map(|c| c.grapheme().to_string()).collect())
            .unwrap_or_default();
        assert!(row.starts_with("ab"), "row {y} was {row:?}");
        assert!(row.ends_with("gh"), "row {y} was {row:?}");
    }

    // inside the margins, the last region row is blank
    let bottom: String = emulator
        .grid()
        .row(3)
        .map(|r| r[2..6].iter().map(|c| c.grapheme().to_string()).collect())
        .unwrap_or_default();
    assert_eq!(bottom, "    ");
}

#[test]
fn margins_ignored_without_margin_mode() {
    let mut emulator = TerminalEmulator::new(8, 4);
    apply_str(&mut emulator, "\x1b[3;6s");

    // DECSLRM without mode 69 does nothing; horizontal span is full width
    assert_eq!(emulator.grid().horizontal_span(), (0, 7));
}
