// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::time::{Duration, Instant};

use crate::cell::TerminalCell;
use crate::charset::Charset;
use crate::response::CellImpact;
use crate::sgr::SgrState;

/// Cursor position, 0-based internally (1-based on the wire).
///
/// `col == width` is a valid state: it means the next printable character
/// wraps before being written ("pending wrap").
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CursorPosition {
    pub col: usize,
    pub row: usize,
}

impl CursorPosition {
    #[must_use]
    pub const fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }

    #[must_use]
    pub const fn origin() -> Self {
        Self { col: 0, row: 0 }
    }
}

/// One saved-cursor slot (ANSI `CSI s`/`CSI u` or DEC `ESC 7`/`ESC 8`).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SavedCursor {
    pub position: CursorPosition,
    pub sgr: SgrState,
    pub origin_mode: bool,
}

/// Terminal mode flags tracked by the grid.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GridModes {
    pub alternate_screen: bool,
    pub application_keypad: bool,
    pub bracketed_paste: bool,
    pub mouse_reporting: bool,
    pub origin: bool,
    pub auto_wrap: bool,
    pub cursor_visible: bool,
    pub margin_mode: bool,
}

impl Default for GridModes {
    fn default() -> Self {
        Self {
            alternate_screen: false,
            application_keypad: false,
            bracketed_paste: false,
            mouse_reporting: false,
            origin: false,
            auto_wrap: true,
            cursor_visible: true,
            margin_mode: false,
        }
    }
}

/// A width × height grid of styled cells plus the cursor/attribute state
/// that token application mutates.
#[derive(Debug, Clone)]
pub struct CellGrid {
    rows: Vec<Vec<TerminalCell>>,
    width: usize,
    height: usize,
    pub cursor: CursorPosition,
    pub sgr: SgrState,
    pub saved_ansi: Option<SavedCursor>,
    pub saved_dec: Option<SavedCursor>,
    scroll_top: usize,
    scroll_bottom: usize,
    left_margin: usize,
    right_margin: usize,
    pub modes: GridModes,
    pub g0: Charset,
    pub g1: Charset,
    pub cursor_shape: usize,
    sequence: u64,
    epoch: Instant,
}

impl CellGrid {
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        let width = width.max(1);
        let height = height.max(1);

        Self {
            rows: vec![vec![TerminalCell::default(); width]; height],
            width,
            height,
            cursor: CursorPosition::origin(),
            sgr: SgrState::default(),
            saved_ansi: None,
            saved_dec: None,
            scroll_top: 0,
            scroll_bottom: height - 1,
            left_margin: 0,
            right_margin: width - 1,
            modes: GridModes::default(),
            g0: Charset::Ascii,
            g1: Charset::Ascii,
            cursor_shape: 0,
            sequence: 0,
            epoch: Instant::now(),
        }
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn cell(&self, x: usize, y: usize) -> Option<&TerminalCell> {
        self.rows.get(y).and_then(|row| row.get(x))
    }

    #[must_use]
    pub fn row(&self, y: usize) -> Option<&[TerminalCell]> {
        self.rows.get(y).map(Vec::as_slice)
    }

    /// The inclusive scroll region `[top, bottom]`.
    #[must_use]
    pub const fn scroll_region(&self) -> (usize, usize) {
        (self.scroll_top, self.scroll_bottom)
    }

    /// The inclusive horizontal span affected by edits: the left/right
    /// margins when margin mode is on, otherwise the full width.
    #[must_use]
    pub const fn horizontal_span(&self) -> (usize, usize) {
        if self.modes.margin_mode {
            (self.left_margin, self.right_margin)
        } else {
            (0, self.width - 1)
        }
    }

    /// Set the scroll region from 0-based inclusive rows, clamping into
    /// validity. An inverted or degenerate request resets to full screen.
    pub fn set_scroll_region(&mut self, top: usize, bottom: usize) {
        let bottom = bottom.min(self.height - 1);
        if top >= bottom {
            self.reset_scroll_region();
        } else {
            self.scroll_top = top;
            self.scroll_bottom = bottom;
        }
        self.debug_assert_invariants();
    }

    pub const fn reset_scroll_region(&mut self) {
        self.scroll_top = 0;
        self.scroll_bottom = self.height - 1;
    }

    /// Set left/right margins from 0-based inclusive columns. Only honoured
    /// while margin mode is enabled; an invalid pair resets to full width.
    pub fn set_margins(&mut self, left: usize, right: usize) {
        let right = right.min(self.width - 1);
        if left >= right {
            self.left_margin = 0;
            self.right_margin = self.width - 1;
        } else {
            self.left_margin = left;
            self.right_margin = right;
        }
    }

    pub const fn reset_margins(&mut self) {
        self.left_margin = 0;
        self.right_margin = self.width - 1;
    }

    /// Allocate the next write-sequence number. Strictly monotonic for the
    /// lifetime of a session, including across screen swaps.
    pub const fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    #[must_use]
    pub const fn current_sequence(&self) -> u64 {
        self.sequence
    }

    /// Carry the session sequence counter and clock into this grid (used
    /// when screens swap so monotonicity holds session-wide).
    pub(crate) const fn adopt_session_counters(&mut self, sequence: u64, epoch: Instant) {
        if self.sequence < sequence {
            self.sequence = sequence;
        }
        self.epoch = epoch;
    }

    #[must_use]
    pub(crate) const fn epoch(&self) -> Instant {
        self.epoch
    }

    #[must_use]
    pub fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    /// A blank cell carrying the current background.
    #[must_use]
    pub fn blank_cell(&mut self) -> TerminalCell {
        let sequence = self.next_sequence();
        let now = self.now();
        TerminalCell::blank(self.sgr.bg, sequence, now)
    }

    /// Write a cell, recording an impact when the visible content changed.
    pub fn put_cell(&mut self, x: usize, y: usize, cell: TerminalCell, impacts: &mut Vec<CellImpact>) {
        if y >= self.height || x >= self.width {
            return;
        }

        if self.rows[y][x] == cell {
            // Visibly identical; refresh bookkeeping only.
            let sequence = cell.sequence();
            let at = cell.written_at();
            self.rows[y][x].set_sequence(sequence, at);
            return;
        }

        self.rows[y][x] = cell.clone();
        impacts.push(CellImpact::new(x, y, cell));
    }

    /// Blank the inclusive cell span `[x0, x1]` on row `y` with the current
    /// background.
    pub fn blank_span(&mut self, y: usize, x0: usize, x1: usize, impacts: &mut Vec<CellImpact>) {
        if y >= self.height {
            return;
        }
        let x1 = x1.min(self.width - 1);
        for x in x0..=x1 {
            let blank = self.blank_cell();
            self.put_cell(x, y, blank, impacts);
        }
    }

    /// Scroll rows `[top, bottom]` up by `n` inside the horizontal span,
    /// blanking the vacated rows with the current background.
    pub fn scroll_span_up(
        &mut self,
        top: usize,
        bottom: usize,
        n: usize,
        impacts: &mut Vec<CellImpact>,
    ) {
        let (left, right) = self.horizontal_span();
        let span = bottom - top + 1;
        let n = n.min(span);
        if n == 0 {
            return;
        }

        for y in top..=bottom {
            if y + n <= bottom {
                for x in left..=right {
                    let mut cell = self.rows[y + n][x].clone();
                    // a move is a fresh write at the destination
                    let sequence = self.next_sequence();
                    cell.set_sequence(sequence, self.now());
                    self.put_cell(x, y, cell, impacts);
                }
            } else {
                self.blank_span(y, left, right, impacts);
            }
        }
        self.debug_assert_invariants();
    }

    /// Scroll rows `[top, bottom]` down by `n` inside the horizontal span.
    pub fn scroll_span_down(
        &mut self,
        top: usize,
        bottom: usize,
        n: usize,
        impacts: &mut Vec<CellImpact>,
    ) {
        let (left, right) = self.horizontal_span();
        let span = bottom - top + 1;
        let n = n.min(span);
        if n == 0 {
            return;
        }

        for y in (top..=bottom).rev() {
            if y >= top + n {
                for x in left..=right {
                    let mut cell = self.rows[y - n][x].clone();
                    let sequence = self.next_sequence();
                    cell.set_sequence(sequence, self.now());
                    self.put_cell(x, y, cell, impacts);
                }
            } else {
                self.blank_span(y, left, right, impacts);
            }
        }
        self.debug_assert_invariants();
    }

    /// Resize the grid. Existing content stays at its coordinates; new
    /// cells are blanks with the current background; the cursor, scroll
    /// region, and margins are clamped. The entire visible grid is reported
    /// as impacted.
    pub fn resize(&mut self, new_width: usize, new_height: usize, impacts: &mut Vec<CellImpact>) {
        let new_width = new_width.max(1);
        let new_height = new_height.max(1);

        if new_width == self.width && new_height == self.height {
            return;
        }

        // Build the replacement buffer completely before swapping it in;
        // dimension fields must not change until the copy is done.
        let mut new_rows = Vec::with_capacity(new_height);
        for y in 0..new_height {
            let mut row = Vec::with_capacity(new_width);
            for x in 0..new_width {
                let cell = self
                    .rows
                    .get(y)
                    .and_then(|r| r.get(x))
                    .cloned()
                    .unwrap_or_else(|| {
                        TerminalCell::blank(self.sgr.bg, self.sequence, Duration::ZERO)
                    });
                row.push(cell);
            }
            new_rows.push(row);
        }

        self.rows = new_rows;
        self.width = new_width;
        self.height = new_height;

        self.cursor.col = self.cursor.col.min(new_width);
        self.cursor.row = self.cursor.row.min(new_height - 1);
        self.scroll_top = self.scroll_top.min(new_height - 1);
        self.scroll_bottom = self.scroll_bottom.min(new_height - 1);
        if self.scroll_top >= self.scroll_bottom {
            self.reset_scroll_region();
        }
        self.left_margin = self.left_margin.min(new_width - 1);
        self.right_margin = self.right_margin.min(new_width - 1);
        if self.left_margin >= self.right_margin {
            self.reset_margins();
        }

        // A resize dirties everything.
        impacts.clear();
        for (y, row) in self.rows.iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                impacts.push(CellImpact::new(x, y, cell.clone()));
            }
        }

        self.debug_assert_invariants();
    }

    /// The visible screen as plain text, one line per row. Lines are
    /// right-trimmed and trailing blank lines are dropped.
    #[must_use]
    pub fn screen_text(&self) -> String {
        let mut lines = Vec::with_capacity(self.height);
        for row in &self.rows {
            let mut line = String::new();
            for cell in row {
                line.push_str(cell.grapheme());
            }
            lines.push(line.trim_end().to_string());
        }
        while lines.last().is_some_and(String::is_empty) {
            lines.pop();
        }
        lines.join("\n")
    }

    /// Internal consistency checks for debug builds.
    #[cfg(debug_assertions)]
    pub(crate) fn debug_assert_invariants(&self) {
        debug_assert_eq!(self.rows.len(), self.height);
        for row in &self.rows {
            debug_assert_eq!(row.len(), self.width);
        }

        debug_assert!(
            self.cursor.col <= self.width,
            "cursor.col {} out of bounds for width {}",
            self.cursor.col,
            self.width
        );
        debug_assert!(
            self.cursor.row < self.height,
            "cursor.row {} out of bounds for height {}",
            self.cursor.row,
            self.height
        );

        debug_assert!(self.scroll_top <= self.scroll_bottom);
        debug_assert!(self.scroll_bottom < self.height);
        debug_assert!(self.left_margin <= self.right_margin);
        debug_assert!(self.right_margin < self.width);
    }

    // In release builds this is a no-op, so we can call it freely.
    #[cfg(not(debug_assertions))]
    #[inline]
    pub(crate) const fn debug_assert_invariants(&self) {}
}
