// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use hex1b_ansi::token::AnsiToken;

use crate::cell::TerminalCell;
use crate::grid::CursorPosition;

/// A single-cell mutation produced while applying a token.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CellImpact {
    pub x: usize,
    pub y: usize,
    pub cell: TerminalCell,
}

impl CellImpact {
    #[must_use]
    pub const fn new(x: usize, y: usize, cell: TerminalCell) -> Self {
        Self { x, y, cell }
    }
}

/// A token bundled with everything it did to the grid.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AppliedToken {
    pub token: AnsiToken,
    pub cell_impacts: Vec<CellImpact>,
    pub cursor_before: CursorPosition,
    pub cursor_after: CursorPosition,
}

impl AppliedToken {
    /// Wrap a token that did not come out of an emulator (filter chains use
    /// this to keep feeding downstream stages).
    #[must_use]
    pub const fn passthrough(token: AnsiToken) -> Self {
        Self {
            token,
            cell_impacts: Vec::new(),
            cursor_before: CursorPosition::origin(),
            cursor_after: CursorPosition::origin(),
        }
    }
}
