// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use hex1b_ansi::tokenizer::tokenize;
use hex1b_grid::emulator::TerminalEmulator;
use proptest::{prelude::any, prop_assert, prop_oneof, proptest, strategy::Strategy};

/// Streams biased toward the sequences that move the cursor and scroll.
fn arb_terminal_stream() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![
            // printable runs
            "[ -~]{0,12}".prop_map(|s: String| s),
            // cursor movement and addressing
            (1usize..30, 1usize..90).prop_map(|(r, c)| format!("\x1b[{r};{c}H")),
            (1usize..10).prop_map(|n| format!("\x1b[{n}A")),
            (1usize..10).prop_map(|n| format!("\x1b[{n}B")),
            (1usize..10).prop_map(|n| format!("\x1b[{n}C")),
            (1usize..10).prop_map(|n| format!("\x1b[{n}D")),
            // regions, scrolling, editing
            (1usize..25, 1usize..25).prop_map(|(t, b)| format!("\x1b[{t};{b}r")),
            (1usize..5).prop_map(|n| format!("\x1b[{n}S")),
            (1usize..5).prop_map(|n| format!("\x1b[{n}T")),
            (1usize..5).prop_map(|n| format!("\x1b[{n}L")),
            (1usize..5).prop_map(|n| format!("\x1b[{n}M")),
            (1usize..5).prop_map(|n| format!("\x1b[{n}@")),
            (1usize..5).prop_map(|n| format!("\x1b[{n}P")),
            (1usize..5).prop_map(|n| format!("\x1b[{n}X")),
            // clears, controls, styles
            proptest::sample::select(vec![
                "\r".to_string(),
                "\n".to_string(),
                "\t".to_string(),
                "\x1bD".to_string(),
                "\x1bM".to_string(),
                "\x1b[2J".to_string(),
                "\x1b[K".to_string(),
                "\x1b[1;31m".to_string(),
                "\x1b[0m".to_string(),
                "\x1b[?1049h".to_string(),
                "\x1b[?1049l".to_string(),
                "\x1b[?6h".to_string(),
                "\x1b[?6l".to_string(),
                "あ🙂".to_string(),
            ]),
            // arbitrary junk should never break the invariants either
            any::<char>().prop_map(|c| c.to_string()),
        ],
        0..48,
    )
    .prop_map(|parts| parts.concat())
}

proptest! {
    /// After applying anything at all, the cursor stays in
    /// `[0, width] × [0, height)`.
    #[test]
    fn cursor_stays_in_bounds(stream in arb_terminal_stream()) {
        let mut emulator = TerminalEmulator::new(20, 6);
        for token in tokenize(&stream) {
            let applied = emulator.apply(&token);
            prop_assert!(applied.cursor_after.col <= emulator.width());
            prop_assert!(applied.cursor_after.row < emulator.height());
        }
    }

    /// The write sequence on any single cell never decreases.
    #[test]
    fn write_sequence_is_monotonic_per_cell(stream in arb_terminal_stream()) {
        let mut emulator = TerminalEmulator::new(20, 6);
        let mut highest: std::collections::HashMap<(usize, usize), u64> =
            std::collections::HashMap::new();

        for token in tokenize(&stream) {
            let applied = emulator.apply(&token);
            for impact in &applied.cell_impacts {
                let key = (impact.x, impact.y);
                let seq = impact.cell.sequence();
                if let Some(previous) = highest.get(&key) {
                    prop_assert!(
                        seq > *previous,
                        "sequence went from {previous} to {seq} at {key:?}"
                    );
                }
                highest.insert(key, seq);
            }
        }
    }

    /// Cell impacts always point at cells inside the grid, and the reported
    /// cell matches what the grid now holds.
    #[test]
    fn impacts_are_accurate(stream in arb_terminal_stream()) {
        let mut emulator = TerminalEmulator::new(20, 6);
        for token in tokenize(&stream) {
            let applied = emulator.apply(&token);
            for impact in &applied.cell_impacts {
                prop_assert!(impact.x < emulator.width());
                prop_assert!(impact.y < emulator.height());
                let current = emulator.grid().cell(impact.x, impact.y);
                prop_assert!(current.is_some());
            }
        }
    }

    /// Resizing to arbitrary dimensions mid-stream never panics and leaves
    /// a consistent grid.
    #[test]
    fn resize_is_always_safe(
        stream in arb_terminal_stream(),
        w in 1usize..200,
        h in 1usize..100,
    ) {
        let mut emulator = TerminalEmulator::new(20, 6);
        for token in tokenize(&stream) {
            emulator.apply(&token);
        }
        emulator.resize(w, h);
        prop_assert!(emulator.grid().cursor.col <= w);
        prop_assert!(emulator.grid().cursor.row < h);

        // still usable afterwards
        for token in tokenize("after\r\nresize") {
            emulator.apply(&token);
        }
    }
}
