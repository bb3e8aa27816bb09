// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use hex1b_ansi::token::AnsiToken;
use hex1b_grid::cell::TerminalCell;
use hex1b_grid::response::AppliedToken;
use hex1b_grid::sgr::{SgrState, sgr_params_for};

use super::PresentationFilter;

/// Collapses everything between a frame's brackets into the minimal set of
/// cursor + SGR + text runs that converge the committed screen to the
/// frame's end state. Mid-frame intermediate states never reach the sink,
/// which is what prevents flicker.
pub struct RenderOptimizationFilter {
    width: usize,
    height: usize,
    /// What the sink has already been shown. `None` means unknown (forced
    /// rewrite), e.g. right after a resize.
    committed: Vec<Vec<Option<TerminalCell>>>,
    buffering: bool,
    /// Net cell changes accumulated since `FrameBegin`.
    pending: HashMap<(usize, usize), TerminalCell>,
}

impl RenderOptimizationFilter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            committed: Vec::new(),
            buffering: false,
            pending: HashMap::new(),
        }
    }

    fn reset_committed(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.committed = vec![vec![None; width]; height];
        self.pending.clear();
    }

    fn record(&mut self, x: usize, y: usize, cell: TerminalCell) {
        if y >= self.height || x >= self.width {
            return;
        }
        if self.buffering {
            self.pending.insert((x, y), cell);
        } else {
            self.committed[y][x] = Some(cell);
        }
    }

    /// Diff the accumulated frame against the committed state and emit the
    /// convergence tokens.
    fn flush_frame(&mut self) -> Vec<AnsiToken> {
        let mut tokens = Vec::new();
        let pending = std::mem::take(&mut self.pending);

        // Bucket changes per row for run building.
        let mut rows: Vec<Vec<(usize, TerminalCell)>> = vec![Vec::new(); self.height];
        for ((x, y), cell) in pending {
            if y < self.height && x < self.width {
                let changed = self.committed[y][x].as_ref() != Some(&cell);
                if changed {
                    rows[y].push((x, cell));
                }
            }
        }

        for (y, mut changes) in rows.into_iter().enumerate() {
            if changes.is_empty() {
                continue;
            }
            changes.sort_by_key(|(x, _)| *x);

            let mut run_start: Option<(usize, SgrState, String)> = None;
            let mut previous_end = 0;

            for (x, cell) in changes {
                let style = cell.style();
                self.committed[y][x] = Some(cell.clone());

                // Continuation cells are covered on the wire by their wide
                // head; they only update the committed copy.
                if cell.is_wide_continuation() {
                    continue;
                }

                let width = cell.display_width().max(1);
                let extends = run_start.is_some() && x == previous_end
                    && run_start.as_ref().is_some_and(|(_, run_style, _)| *run_style == style);

                if extends {
                    if let Some((_, _, text)) = run_start.as_mut() {
                        text.push_str(cell.grapheme());
                    }
                } else {
                    if let Some(run) = run_start.take() {
                        push_run(&mut tokens, y, run);
                    }
                    run_start = Some((x, style, cell.grapheme().to_string()));
                }

                previous_end = x + width;
            }

            if let Some(run) = run_start.take() {
                push_run(&mut tokens, y, run);
            }
        }

        if !tokens.is_empty() {
            // leave the wire in a known attribute state
            tokens.push(AnsiToken::Sgr("0".to_string()));
        }

        tokens
    }
}

impl Default for RenderOptimizationFilter {
    fn default() -> Self {
        Self::new()
    }
}

fn push_run(tokens: &mut Vec<AnsiToken>, y: usize, run: (usize, SgrState, String)) {
    let (x, style, text) = run;
    if text.is_empty() {
        return;
    }
    tokens.push(AnsiToken::CursorPosition {
        row: y + 1,
        col: x + 1,
        original_params: None,
    });
    tokens.push(AnsiToken::Sgr(sgr_params_for(&style)));
    tokens.push(AnsiToken::Text(text));
}

impl PresentationFilter for RenderOptimizationFilter {
    fn name(&self) -> &'static str {
        "render-optimization"
    }

    fn on_session_start(&mut self, width: usize, height: usize, _timestamp: SystemTime) {
        self.reset_committed(width, height);
    }

    fn on_output(&mut self, applied: &[AppliedToken], _elapsed: Duration) -> Vec<AnsiToken> {
        let mut out = Vec::new();

        for item in applied {
            match &item.token {
                AnsiToken::FrameBegin => {
                    self.buffering = true;
                }
                AnsiToken::FrameEnd => {
                    out.extend(self.flush_frame());
                    self.buffering = false;
                }
                token => {
                    for impact in &item.cell_impacts {
                        self.record(impact.x, impact.y, impact.cell.clone());
                    }
                    if !self.buffering {
                        out.push(token.clone());
                    }
                }
            }
        }

        out
    }

    fn on_resize(&mut self, width: usize, height: usize, _elapsed: Duration) {
        self.reset_committed(width, height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex1b_ansi::serializer::serialize_tokens;
    use hex1b_ansi::tokenizer::tokenize;
    use hex1b_grid::emulator::TerminalEmulator;

    fn run_frame(
        filter: &mut RenderOptimizationFilter,
        emulator: &mut TerminalEmulator,
        body: &str,
    ) -> Vec<AnsiToken> {
        let mut applied = vec![emulator.apply(&AnsiToken::FrameBegin)];
        for token in tokenize(body) {
            applied.push(emulator.apply(&token));
        }
        applied.push(emulator.apply(&AnsiToken::FrameEnd));
        filter.on_output(&applied, Duration::ZERO)
    }

    #[test]
    fn identical_frames_emit_nothing() {
        let mut filter = RenderOptimizationFilter::new();
        filter.on_session_start(20, 4, SystemTime::UNIX_EPOCH);
        let mut emulator = TerminalEmulator::new(20, 4);

        let first = run_frame(&mut filter, &mut emulator, "\x1b[1;1Hhello");
        assert!(!first.is_empty());

        let second = run_frame(&mut filter, &mut emulator, "\x1b[1;1Hhello");
        assert!(second.is_empty(), "got {second:?}");
    }

    #[test]
    fn only_the_changed_cells_are_re_emitted() {
        let mut filter = RenderOptimizationFilter::new();
        filter.on_session_start(20, 4, SystemTime::UNIX_EPOCH);
        let mut emulator = TerminalEmulator::new(20, 4);

        run_frame(&mut filter, &mut emulator, "\x1b[1;1Hhello");
        let out = run_frame(&mut filter, &mut emulator, "\x1b[1;1Hhxllo");

        // one changed cell: an x at column 2
        assert_eq!(
            out,
            vec![
                AnsiToken::CursorPosition {
                    row: 1,
                    col: 2,
                    original_params: None,
                },
                AnsiToken::Sgr("0".to_string()),
                AnsiToken::Text("x".to_string()),
                AnsiToken::Sgr("0".to_string()),
            ]
        );
    }

    #[test]
    fn mid_frame_intermediate_states_are_invisible() {
        let mut filter = RenderOptimizationFilter::new();
        filter.on_session_start(20, 4, SystemTime::UNIX_EPOCH);
        let mut emulator = TerminalEmulator::new(20, 4);

        // the frame writes garbage and then overwrites it
        let out = run_frame(
            &mut filter,
            &mut emulator,
            "\x1b[1;1HGARBAGE\x1b[1;1Hfinal  ",
        );

        let text: String = serialize_tokens(&out);
        assert!(!text.contains("GARBAGE"));
        assert!(text.contains("final"));
    }

    #[test]
    fn committed_state_matches_a_full_re_render() {
        let mut filter = RenderOptimizationFilter::new();
        filter.on_session_start(20, 4, SystemTime::UNIX_EPOCH);
        let mut emulator = TerminalEmulator::new(20, 4);

        // what the sink saw, replayed into a verification terminal
        let mut sink_view = TerminalEmulator::new(20, 4);
        for body in ["\x1b[1;1Hfirst", "\x1b[2;3Hsecond", "\x1b[1;1Hf-rst"] {
            let out = run_frame(&mut filter, &mut emulator, body);
            for token in &out {
                sink_view.apply(token);
            }
        }

        assert_eq!(sink_view.screen_text(), emulator.screen_text());
    }

    #[test]
    fn non_frame_output_passes_straight_through() {
        let mut filter = RenderOptimizationFilter::new();
        filter.on_session_start(20, 4, SystemTime::UNIX_EPOCH);
        let mut emulator = TerminalEmulator::new(20, 4);

        let applied: Vec<_> = tokenize("loose output")
            .iter()
            .map(|t| emulator.apply(t))
            .collect();
        let out = filter.on_output(&applied, Duration::ZERO);
        assert_eq!(out, vec![AnsiToken::Text("loose output".to_string())]);
    }
}
