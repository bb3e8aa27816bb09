// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::sync::Arc;

use hex1b_ansi::token::{
    AnsiToken, CharsetTarget, ClearLineMode, ClearScreenMode, CursorMoveDirection,
    DeviceStatusKind,
};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::cell::{GraphicsPayload, TerminalCell};
use crate::charset::Charset;
use crate::grid::{CellGrid, CursorPosition, SavedCursor};
use crate::response::{AppliedToken, CellImpact};
use crate::sgr::apply_sgr_params;

/// Applies tokens to a cell grid and reports what changed.
///
/// The emulator owns the grid exclusively. Each [`TerminalEmulator::apply`]
/// call returns the token bundled with its cell impacts and the cursor
/// positions before and after, which is everything a presentation filter
/// needs to track the screen without re-implementing the semantics.
#[derive(Debug)]
pub struct TerminalEmulator {
    grid: CellGrid,
    /// The screen not currently displayed (primary while the alternate is
    /// active, and vice versa).
    inactive: Option<Box<CellGrid>>,
    last_grapheme: Option<String>,
    responses: Vec<String>,
}

impl TerminalEmulator {
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            grid: CellGrid::new(width, height),
            inactive: None,
            last_grapheme: None,
            responses: Vec::new(),
        }
    }

    #[must_use]
    pub const fn grid(&self) -> &CellGrid {
        &self.grid
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.grid.width()
    }

    #[must_use]
    pub const fn height(&self) -> usize {
        self.grid.height()
    }

    /// The visible screen as plain text.
    #[must_use]
    pub fn screen_text(&self) -> String {
        self.grid.screen_text()
    }

    /// Reply bytes owed to the application (cursor position reports and the
    /// like), drained by the host.
    pub fn take_responses(&mut self) -> Vec<String> {
        std::mem::take(&mut self.responses)
    }

    /// Apply one token to the grid.
    #[allow(clippy::too_many_lines)]
    pub fn apply(&mut self, token: &AnsiToken) -> AppliedToken {
        let cursor_before = self.grid.cursor;
        let mut impacts = Vec::new();

        match token {
            AnsiToken::Text(text) => self.write_text(text, &mut impacts),
            AnsiToken::Control('\r') => self.carriage_return(),
            AnsiToken::Control('\n') => self.index(&mut impacts),
            AnsiToken::Control('\t') => self.horizontal_tab(),
            AnsiToken::Control(other) => {
                trace!("ignoring control 0x{:02X}", *other as u32);
            }
            AnsiToken::Sgr(params) => apply_sgr_params(&mut self.grid.sgr, params),
            AnsiToken::CursorPosition { row, col, .. } => self.cursor_position(*row, *col),
            AnsiToken::CursorMove { direction, count } => self.cursor_move(*direction, *count),
            AnsiToken::CursorColumn(col) => {
                self.grid.cursor.col = col.saturating_sub(1).min(self.grid.width() - 1);
            }
            AnsiToken::CursorRow(row) => {
                self.grid.cursor.row = row.saturating_sub(1).min(self.grid.height() - 1);
            }
            AnsiToken::CursorShape(shape) => self.grid.cursor_shape = *shape,
            AnsiToken::ClearScreen(mode) => self.clear_screen(*mode, &mut impacts),
            AnsiToken::ClearLine(mode) => self.clear_line(*mode, &mut impacts),
            AnsiToken::ScrollRegion { top, bottom } => self.set_scroll_region(*top, *bottom),
            AnsiToken::ScrollUp(n) => {
                let (top, bottom) = self.grid.scroll_region();
                self.grid.scroll_span_up(top, bottom, *n, &mut impacts);
            }
            AnsiToken::ScrollDown(n) => {
                let (top, bottom) = self.grid.scroll_region();
                self.grid.scroll_span_down(top, bottom, *n, &mut impacts);
            }
            AnsiToken::InsertLines(n) => self.insert_lines(*n, &mut impacts),
            AnsiToken::DeleteLines(n) => self.delete_lines(*n, &mut impacts),
            AnsiToken::InsertCharacter(n) => self.insert_characters(*n, &mut impacts),
            AnsiToken::DeleteCharacter(n) => self.delete_characters(*n, &mut impacts),
            AnsiToken::EraseCharacter(n) => self.erase_characters(*n, &mut impacts),
            AnsiToken::RepeatCharacter(n) => self.repeat_character(*n, &mut impacts),
            AnsiToken::LeftRightMargin { left, right } => self.set_left_right_margin(*left, *right),
            AnsiToken::Index => self.index(&mut impacts),
            AnsiToken::ReverseIndex => self.reverse_index(&mut impacts),
            AnsiToken::CharacterSet { target, charset } => {
                let charset = Charset::from_designator(*charset);
                match target {
                    CharsetTarget::G0 => self.grid.g0 = charset,
                    CharsetTarget::G1 => self.grid.g1 = charset,
                }
            }
            AnsiToken::KeypadMode(application) => {
                self.grid.modes.application_keypad = *application;
            }
            AnsiToken::SaveCursor { dec } => self.save_cursor(*dec),
            AnsiToken::RestoreCursor { dec } => self.restore_cursor(*dec),
            AnsiToken::PrivateMode { mode, enable } => {
                self.private_mode(*mode, *enable, &mut impacts);
            }
            AnsiToken::Osc { command, .. } => {
                trace!("OSC {command} observed; no grid effect");
            }
            AnsiToken::Dcs(payload) => self.attach_graphics(payload, &mut impacts),
            AnsiToken::DeviceStatusReport(kind) => self.device_status_report(*kind),
            // Frame brackets and input-side tokens have no grid effect.
            AnsiToken::FrameBegin
            | AnsiToken::FrameEnd
            | AnsiToken::Ss3(_)
            | AnsiToken::SgrMouse { .. }
            | AnsiToken::SpecialKey { .. }
            | AnsiToken::Unrecognised(_) => {}
        }

        self.grid.debug_assert_invariants();

        AppliedToken {
            token: token.clone(),
            cell_impacts: impacts,
            cursor_before,
            cursor_after: self.grid.cursor,
        }
    }

    /// Apply a whole token stream.
    pub fn apply_all<'a>(
        &mut self,
        tokens: impl IntoIterator<Item = &'a AnsiToken>,
    ) -> Vec<AppliedToken> {
        tokens.into_iter().map(|t| self.apply(t)).collect()
    }

    /// Resize both screens. Content keeps its coordinates; the whole grid
    /// is reported as impacted.
    pub fn resize(&mut self, width: usize, height: usize) -> Vec<CellImpact> {
        let mut impacts = Vec::new();
        self.grid.resize(width, height, &mut impacts);

        if let Some(inactive) = self.inactive.as_mut() {
            let mut hidden = Vec::new();
            inactive.resize(width, height, &mut hidden);
        }

        impacts
    }

    // ------------------------------------------------------------------
    // Text
    // ------------------------------------------------------------------

    fn write_text(&mut self, text: &str, impacts: &mut Vec<CellImpact>) {
        for grapheme in text.graphemes(true) {
            let grapheme = self.translate_grapheme(grapheme);
            self.write_grapheme(&grapheme, impacts);
            self.last_grapheme = Some(grapheme);
        }
    }

    fn translate_grapheme(&self, grapheme: &str) -> String {
        let mut chars = grapheme.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => self.grid.g0.translate(c).to_string(),
            _ => grapheme.to_string(),
        }
    }

    /// The column at which the cursor must wrap, given the margins.
    fn wrap_limit(&self) -> (usize, usize) {
        let (left, right) = self.grid.horizontal_span();
        if self.grid.cursor.col >= left {
            (left, right + 1)
        } else {
            (0, self.grid.width())
        }
    }

    fn write_grapheme(&mut self, grapheme: &str, impacts: &mut Vec<CellImpact>) {
        let width = UnicodeWidthStr::width(grapheme).max(1);
        let (left, limit) = self.wrap_limit();

        // Pending wrap: the previous write left the cursor hanging past the
        // last column.
        if self.grid.cursor.col >= limit {
            if self.grid.modes.auto_wrap {
                self.grid.cursor.col = left;
                self.index(impacts);
            } else {
                self.grid.cursor.col = limit - 1;
            }
        }

        // A wide glyph that does not fit pads the final cell with a blank
        // and starts on the next line.
        if width == 2 && self.grid.cursor.col + width > limit {
            let pad = {
                let sequence = self.grid.next_sequence();
                let now = self.grid.now();
                TerminalCell::blank(self.grid.sgr.bg, sequence, now)
            };
            let CursorPosition { col, row } = self.grid.cursor;
            self.cleanup_wide_overwrite(col, row, impacts);
            self.grid.put_cell(col, row, pad, impacts);

            if self.grid.modes.auto_wrap {
                self.grid.cursor.col = left;
                self.index(impacts);
            } else {
                // nowhere to put it; drop the glyph
                return;
            }
        }

        let CursorPosition { col, row } = self.grid.cursor;
        self.cleanup_wide_overwrite(col, row, impacts);
        if width == 2 {
            self.cleanup_wide_overwrite(col + 1, row, impacts);
        }

        let cell = {
            let sequence = self.grid.next_sequence();
            let now = self.grid.now();
            TerminalCell::new(grapheme, &self.grid.sgr, sequence, now)
        };
        self.grid.put_cell(col, row, cell, impacts);

        if width == 2 && col + 1 < self.grid.width() {
            let filler = {
                let sequence = self.grid.next_sequence();
                let now = self.grid.now();
                TerminalCell::wide_continuation(&self.grid.sgr, sequence, now)
            };
            self.grid.put_cell(col + 1, row, filler, impacts);
        }

        // Advancing to exactly the limit leaves the cursor pending rather
        // than wrapping immediately.
        self.grid.cursor.col = (col + width).min(limit);
    }

    /// Writing over half of a wide glyph blanks the other half so no
    /// orphaned head or continuation survives.
    fn cleanup_wide_overwrite(&mut self, x: usize, y: usize, impacts: &mut Vec<CellImpact>) {
        let Some(cell) = self.grid.cell(x, y) else {
            return;
        };

        if cell.is_wide_continuation()
            && x > 0
            && self
                .grid
                .cell(x - 1, y)
                .is_some_and(TerminalCell::is_wide_head)
        {
            let blank = self.grid.blank_cell();
            self.grid.put_cell(x - 1, y, blank, impacts);
        } else if cell.is_wide_head()
            && self
                .grid
                .cell(x + 1, y)
                .is_some_and(TerminalCell::is_wide_continuation)
        {
            let blank = self.grid.blank_cell();
            self.grid.put_cell(x + 1, y, blank, impacts);
        }
    }

    // ------------------------------------------------------------------
    // Cursor movement
    // ------------------------------------------------------------------

    fn carriage_return(&mut self) {
        let (left, _) = self.grid.horizontal_span();
        self.grid.cursor.col = if self.grid.cursor.col >= left { left } else { 0 };
    }

    fn horizontal_tab(&mut self) {
        let col = self.grid.cursor.col.min(self.grid.width() - 1);
        let next = (col / 8 + 1) * 8;
        self.grid.cursor.col = next.min(self.grid.width() - 1);
    }

    fn index(&mut self, impacts: &mut Vec<CellImpact>) {
        let (top, bottom) = self.grid.scroll_region();
        if self.grid.cursor.row == bottom {
            self.grid.scroll_span_up(top, bottom, 1, impacts);
        } else if self.grid.cursor.row + 1 < self.grid.height() {
            self.grid.cursor.row += 1;
        }
    }

    fn reverse_index(&mut self, impacts: &mut Vec<CellImpact>) {
        let (top, bottom) = self.grid.scroll_region();
        if self.grid.cursor.row == top {
            self.grid.scroll_span_down(top, bottom, 1, impacts);
        } else if self.grid.cursor.row > 0 {
            self.grid.cursor.row -= 1;
        }
    }

    fn cursor_position(&mut self, row: usize, col: usize) {
        let row = row.saturating_sub(1);
        let col = col.saturating_sub(1);

        if self.grid.modes.origin {
            let (top, bottom) = self.grid.scroll_region();
            let (left, right) = self.grid.horizontal_span();
            self.grid.cursor.row = (top + row).min(bottom);
            self.grid.cursor.col = (left + col).min(right);
        } else {
            self.grid.cursor.row = row.min(self.grid.height() - 1);
            self.grid.cursor.col = col.min(self.grid.width() - 1);
        }
    }

    fn cursor_home(&mut self) {
        self.cursor_position(1, 1);
    }

    fn cursor_move(&mut self, direction: CursorMoveDirection, count: usize) {
        let (top, bottom) = self.grid.scroll_region();
        let width = self.grid.width();
        let height = self.grid.height();
        let cursor = &mut self.grid.cursor;

        // Vertical moves stop at the scroll-region edge when the cursor is
        // inside the region, and at the screen edge otherwise.
        let floor = if cursor.row >= top { top } else { 0 };
        let ceiling = if cursor.row <= bottom {
            bottom
        } else {
            height - 1
        };

        match direction {
            CursorMoveDirection::Up => {
                cursor.row = cursor.row.saturating_sub(count).max(floor);
            }
            CursorMoveDirection::Down => {
                cursor.row = (cursor.row + count).min(ceiling);
            }
            CursorMoveDirection::Forward => {
                let col = cursor.col.min(width - 1);
                cursor.col = (col + count).min(width - 1);
            }
            CursorMoveDirection::Back => {
                let col = cursor.col.min(width - 1);
                cursor.col = col.saturating_sub(count);
            }
            CursorMoveDirection::NextLine => {
                cursor.row = (cursor.row + count).min(ceiling);
                cursor.col = 0;
            }
            CursorMoveDirection::PreviousLine => {
                cursor.row = cursor.row.saturating_sub(count).max(floor);
                cursor.col = 0;
            }
        }
    }

    // ------------------------------------------------------------------
    // Erase / edit
    // ------------------------------------------------------------------

    fn clear_screen(&mut self, mode: ClearScreenMode, impacts: &mut Vec<CellImpact>) {
        let width = self.grid.width();
        let height = self.grid.height();
        let col = self.grid.cursor.col.min(width - 1);
        let row = self.grid.cursor.row;

        match mode {
            ClearScreenMode::ToEnd => {
                self.grid.blank_span(row, col, width - 1, impacts);
                for y in row + 1..height {
                    self.grid.blank_span(y, 0, width - 1, impacts);
                }
            }
            ClearScreenMode::ToStart => {
                for y in 0..row {
                    self.grid.blank_span(y, 0, width - 1, impacts);
                }
                self.grid.blank_span(row, 0, col, impacts);
            }
            ClearScreenMode::All | ClearScreenMode::AllAndScrollback => {
                for y in 0..height {
                    self.grid.blank_span(y, 0, width - 1, impacts);
                }
            }
        }
    }

    fn clear_line(&mut self, mode: ClearLineMode, impacts: &mut Vec<CellImpact>) {
        let width = self.grid.width();
        let col = self.grid.cursor.col.min(width - 1);
        let row = self.grid.cursor.row;

        match mode {
            ClearLineMode::ToEnd => self.grid.blank_span(row, col, width - 1, impacts),
            ClearLineMode::ToStart => self.grid.blank_span(row, 0, col, impacts),
            ClearLineMode::All => self.grid.blank_span(row, 0, width - 1, impacts),
        }
    }

    fn erase_characters(&mut self, n: usize, impacts: &mut Vec<CellImpact>) {
        let width = self.grid.width();
        let col = self.grid.cursor.col.min(width - 1);
        let row = self.grid.cursor.row;
        let end = (col + n.max(1) - 1).min(width - 1);
        self.grid.blank_span(row, col, end, impacts);
    }

    fn delete_characters(&mut self, n: usize, impacts: &mut Vec<CellImpact>) {
        let (_, right) = self.grid.horizontal_span();
        let col = self.grid.cursor.col.min(self.grid.width() - 1);
        let row = self.grid.cursor.row;
        if col > right {
            return;
        }

        let n = n.max(1);
        for x in col..=right {
            let replacement = if x + n <= right {
                self.grid.cell(x + n, row).cloned()
            } else {
                None
            };
            let cell = match replacement {
                Some(cell) => self.restamp(cell),
                None => self.grid.blank_cell(),
            };
            self.grid.put_cell(x, row, cell, impacts);
        }
    }

    /// Shifted cells count as fresh writes at their destination.
    fn restamp(&mut self, mut cell: TerminalCell) -> TerminalCell {
        let sequence = self.grid.next_sequence();
        let now = self.grid.now();
        cell.set_sequence(sequence, now);
        cell
    }

    fn insert_characters(&mut self, n: usize, impacts: &mut Vec<CellImpact>) {
        let (_, right) = self.grid.horizontal_span();
        let col = self.grid.cursor.col.min(self.grid.width() - 1);
        let row = self.grid.cursor.row;
        if col > right {
            return;
        }

        let n = n.max(1);
        for x in (col..=right).rev() {
            let cell = if x >= col + n {
                match self.grid.cell(x - n, row).cloned() {
                    Some(cell) => self.restamp(cell),
                    None => self.grid.blank_cell(),
                }
            } else {
                self.grid.blank_cell()
            };
            self.grid.put_cell(x, row, cell, impacts);
        }
    }

    fn repeat_character(&mut self, n: usize, impacts: &mut Vec<CellImpact>) {
        let Some(grapheme) = self.last_grapheme.clone() else {
            return;
        };
        for _ in 0..n.max(1) {
            self.write_grapheme(&grapheme, impacts);
        }
    }

    fn insert_lines(&mut self, n: usize, impacts: &mut Vec<CellImpact>) {
        let (top, bottom) = self.grid.scroll_region();
        let row = self.grid.cursor.row;
        if row < top || row > bottom {
            return;
        }
        self.grid.scroll_span_down(row, bottom, n.max(1), impacts);
    }

    fn delete_lines(&mut self, n: usize, impacts: &mut Vec<CellImpact>) {
        let (top, bottom) = self.grid.scroll_region();
        let row = self.grid.cursor.row;
        if row < top || row > bottom {
            return;
        }
        self.grid.scroll_span_up(row, bottom, n.max(1), impacts);
    }

    // ------------------------------------------------------------------
    // Regions and margins
    // ------------------------------------------------------------------

    fn set_scroll_region(&mut self, top: usize, bottom: usize) {
        let height = self.grid.height();
        // `top=1, bottom=0` is the reset spelling.
        let bottom = if bottom == 0 { height } else { bottom };
        self.grid
            .set_scroll_region(top.saturating_sub(1), bottom.saturating_sub(1));
        self.cursor_home();
    }

    fn set_left_right_margin(&mut self, left: usize, right: usize) {
        if !self.grid.modes.margin_mode {
            debug!("DECSLRM ignored while margin mode is off");
            return;
        }
        let width = self.grid.width();
        let right = if right == 0 { width } else { right };
        self.grid
            .set_margins(left.saturating_sub(1), right.saturating_sub(1));
        self.cursor_home();
    }

    // ------------------------------------------------------------------
    // Saved cursors and modes
    // ------------------------------------------------------------------

    fn save_cursor(&mut self, dec: bool) {
        let saved = SavedCursor {
            position: self.grid.cursor,
            sgr: self.grid.sgr,
            origin_mode: self.grid.modes.origin,
        };
        if dec {
            self.grid.saved_dec = Some(saved);
        } else {
            self.grid.saved_ansi = Some(saved);
        }
    }

    fn restore_cursor(&mut self, dec: bool) {
        let slot = if dec {
            self.grid.saved_dec
        } else {
            self.grid.saved_ansi
        };
        let Some(saved) = slot else {
            // restoring with nothing saved homes the cursor
            self.grid.cursor = CursorPosition::origin();
            return;
        };

        self.grid.cursor.col = saved.position.col.min(self.grid.width());
        self.grid.cursor.row = saved.position.row.min(self.grid.height() - 1);
        self.grid.sgr = saved.sgr;
        self.grid.modes.origin = saved.origin_mode;
    }

    fn private_mode(&mut self, mode: usize, enable: bool, impacts: &mut Vec<CellImpact>) {
        match mode {
            6 => {
                self.grid.modes.origin = enable;
                self.cursor_home();
            }
            7 => self.grid.modes.auto_wrap = enable,
            25 => self.grid.modes.cursor_visible = enable,
            69 => {
                self.grid.modes.margin_mode = enable;
                if !enable {
                    self.grid.reset_margins();
                }
            }
            1000 | 1002 | 1003 | 1006 => self.grid.modes.mouse_reporting = enable,
            2004 => self.grid.modes.bracketed_paste = enable,
            47 | 1047 => {
                if enable {
                    self.enter_alternate_screen(impacts);
                } else {
                    self.leave_alternate_screen(impacts);
                }
            }
            1048 => {
                if enable {
                    self.save_cursor(true);
                } else {
                    self.restore_cursor(true);
                }
            }
            1049 => {
                if enable {
                    self.save_cursor(true);
                    self.enter_alternate_screen(impacts);
                } else {
                    self.leave_alternate_screen(impacts);
                    self.restore_cursor(true);
                }
            }
            other => debug!("unhandled private mode {other} (enable: {enable})"),
        }
    }

    /// Install a freshly cleared alternate screen, saving the primary
    /// (cells, cursor, attributes) untouched for the switch back.
    fn enter_alternate_screen(&mut self, impacts: &mut Vec<CellImpact>) {
        if self.grid.modes.alternate_screen {
            return;
        }

        let mut fresh = CellGrid::new(self.grid.width(), self.grid.height());
        fresh.adopt_session_counters(self.grid.current_sequence(), self.grid.epoch());
        fresh.sgr = self.grid.sgr;
        fresh.modes = self.grid.modes;
        fresh.modes.alternate_screen = true;
        fresh.g0 = self.grid.g0;
        fresh.g1 = self.grid.g1;
        fresh.cursor_shape = self.grid.cursor_shape;
        fresh.saved_dec = self.grid.saved_dec;
        fresh.saved_ansi = self.grid.saved_ansi;
        fresh.cursor = CursorPosition {
            col: self.grid.cursor.col.min(self.grid.width()),
            row: self.grid.cursor.row,
        };

        self.inactive = Some(Box::new(std::mem::replace(&mut self.grid, fresh)));
        self.full_screen_impacts(impacts);
    }

    /// Swap the saved primary back in. Its cells, cursor, and attributes
    /// return exactly as saved; terminal-global modes follow the latest
    /// state.
    fn leave_alternate_screen(&mut self, impacts: &mut Vec<CellImpact>) {
        if !self.grid.modes.alternate_screen {
            return;
        }
        let Some(primary) = self.inactive.take() else {
            self.grid.modes.alternate_screen = false;
            return;
        };

        let alternate = std::mem::replace(&mut self.grid, *primary);
        self.grid
            .adopt_session_counters(alternate.current_sequence(), alternate.epoch());

        // Modes that belong to the terminal, not the screen, carry over.
        self.grid.modes.application_keypad = alternate.modes.application_keypad;
        self.grid.modes.bracketed_paste = alternate.modes.bracketed_paste;
        self.grid.modes.mouse_reporting = alternate.modes.mouse_reporting;
        self.grid.modes.cursor_visible = alternate.modes.cursor_visible;
        self.grid.modes.alternate_screen = false;
        self.grid.saved_dec = alternate.saved_dec;
        self.grid.saved_ansi = alternate.saved_ansi;

        self.full_screen_impacts(impacts);
    }

    fn full_screen_impacts(&self, impacts: &mut Vec<CellImpact>) {
        for y in 0..self.grid.height() {
            for x in 0..self.grid.width() {
                if let Some(cell) = self.grid.cell(x, y) {
                    impacts.push(CellImpact::new(x, y, cell.clone()));
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Reports and pass-through payloads
    // ------------------------------------------------------------------

    fn device_status_report(&mut self, kind: DeviceStatusKind) {
        match kind {
            DeviceStatusKind::Status => self.responses.push("\x1b[0n".to_string()),
            DeviceStatusKind::CursorPosition => {
                let row = self.grid.cursor.row + 1;
                let col = self.grid.cursor.col.min(self.grid.width() - 1) + 1;
                self.responses.push(format!("\x1b[{row};{col}R"));
            }
            DeviceStatusKind::Other(code) => debug!("unanswered DSR {code}"),
        }
    }

    /// Attach a bracketed graphics payload to the cell at the cursor.
    /// Payloads are preserved, never rendered.
    fn attach_graphics(&mut self, payload: &str, impacts: &mut Vec<CellImpact>) {
        let col = self.grid.cursor.col.min(self.grid.width() - 1);
        let row = self.grid.cursor.row;

        if let Some(cell) = self.grid.cell(col, row) {
            let mut updated = cell.clone();
            updated.set_graphics(Some(Arc::new(GraphicsPayload {
                data: payload.to_string(),
            })));
            let sequence = self.grid.next_sequence();
            let now = self.grid.now();
            updated.set_sequence(sequence, now);
            self.grid.put_cell(col, row, updated, impacts);
        }
    }
}
