// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::sync::Arc;
use std::time::Duration;

use hex1b_common::{attributes::CellAttributes, colors::Rgb};
use unicode_width::UnicodeWidthStr;

use crate::sgr::SgrState;

/// Opaque bracketed-graphics data (e.g. a Sixel payload) attached to the
/// cell it was emitted at. Preserved, never interpreted.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct GraphicsPayload {
    pub data: String,
}

/// One cell of the terminal grid.
///
/// Equality compares the visible fields only (grapheme, colors, attributes,
/// graphics); the write sequence and timestamp are bookkeeping and do not
/// make two otherwise identical cells different.
#[derive(Debug, Clone)]
pub struct TerminalCell {
    /// The grapheme cluster displayed here. Empty marks the second cell of
    /// a wide character.
    grapheme: String,
    fg: Option<Rgb>,
    bg: Option<Rgb>,
    attributes: CellAttributes,
    sequence: u64,
    written_at: Duration,
    graphics: Option<Arc<GraphicsPayload>>,
}

impl Default for TerminalCell {
    fn default() -> Self {
        Self {
            grapheme: " ".to_string(),
            fg: None,
            bg: None,
            attributes: CellAttributes::empty(),
            sequence: 0,
            written_at: Duration::ZERO,
            graphics: None,
        }
    }
}

impl PartialEq for TerminalCell {
    fn eq(&self, other: &Self) -> bool {
        self.grapheme == other.grapheme
            && self.fg == other.fg
            && self.bg == other.bg
            && self.attributes == other.attributes
            && self.graphics == other.graphics
    }
}

impl Eq for TerminalCell {}

impl TerminalCell {
    #[must_use]
    pub fn new(grapheme: &str, sgr: &SgrState, sequence: u64, written_at: Duration) -> Self {
        Self {
            grapheme: grapheme.to_string(),
            fg: sgr.fg,
            bg: sgr.bg,
            attributes: sgr.attributes,
            sequence,
            written_at,
            graphics: None,
        }
    }

    /// A blank cell filled with the given background. Erase and scroll
    /// operations always blank with the *current* background, never a
    /// hard-coded default.
    #[must_use]
    pub fn blank(bg: Option<Rgb>, sequence: u64, written_at: Duration) -> Self {
        Self {
            grapheme: " ".to_string(),
            fg: None,
            bg,
            attributes: CellAttributes::empty(),
            sequence,
            written_at,
            graphics: None,
        }
    }

    /// The zero-width filler occupying the second column of a wide glyph.
    #[must_use]
    pub fn wide_continuation(sgr: &SgrState, sequence: u64, written_at: Duration) -> Self {
        Self {
            grapheme: String::new(),
            fg: sgr.fg,
            bg: sgr.bg,
            attributes: sgr.attributes,
            sequence,
            written_at,
            graphics: None,
        }
    }

    #[must_use]
    pub fn grapheme(&self) -> &str {
        &self.grapheme
    }

    #[must_use]
    pub const fn fg(&self) -> Option<Rgb> {
        self.fg
    }

    #[must_use]
    pub const fn bg(&self) -> Option<Rgb> {
        self.bg
    }

    #[must_use]
    pub const fn attributes(&self) -> CellAttributes {
        self.attributes
    }

    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    #[must_use]
    pub const fn written_at(&self) -> Duration {
        self.written_at
    }

    #[must_use]
    pub const fn graphics(&self) -> Option<&Arc<GraphicsPayload>> {
        self.graphics.as_ref()
    }

    pub fn set_graphics(&mut self, graphics: Option<Arc<GraphicsPayload>>) {
        self.graphics = graphics;
    }

    pub(crate) fn set_sequence(&mut self, sequence: u64, written_at: Duration) {
        self.sequence = sequence;
        self.written_at = written_at;
    }

    #[must_use]
    pub fn is_wide_continuation(&self) -> bool {
        self.grapheme.is_empty()
    }

    #[must_use]
    pub fn is_wide_head(&self) -> bool {
        self.display_width() > 1
    }

    /// Number of columns this cell's grapheme occupies.
    #[must_use]
    pub fn display_width(&self) -> usize {
        if self.grapheme.is_empty() {
            0
        } else {
            UnicodeWidthStr::width(self.grapheme.as_str()).max(1)
        }
    }

    /// Visible style of this cell, for diffing and re-emission.
    #[must_use]
    pub const fn style(&self) -> SgrState {
        SgrState {
            fg: self.fg,
            bg: self.bg,
            attributes: self.attributes,
        }
    }
}
