// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use thiserror::Error;

/// Internal tokenizer failures. None of these escape the tokenizer: every
/// failure is converted into an `Unrecognised` token so the byte stream can
/// always be reconstituted; the error only feeds the diagnostic logs.
#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum TokenizeFailure {
    #[error("Invalid CSI parameter body: {0}")]
    InvalidCsiParams(String),
    #[error("Escape sequence interrupted by: 0x{0:02X}")]
    InterruptedEscape(u32),
}
