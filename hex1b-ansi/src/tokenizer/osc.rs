// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::ParseStep;
use crate::token::AnsiToken;

/// Parser for an operating-system command: `ESC ] body terminator`.
///
/// The terminator may be BEL, `ESC \`, or C1 ST; which style was used is
/// recorded on the token so serialization reproduces it.
#[derive(Debug, Default, Eq, PartialEq)]
pub(crate) struct OscParser {
    body: String,
    pending_esc: bool,
}

impl OscParser {
    pub(crate) fn new() -> Self {
        Self {
            body: String::with_capacity(32),
            pending_esc: false,
        }
    }

    pub(crate) fn raw(&self) -> String {
        if self.pending_esc {
            format!("{}\x1b", self.body)
        } else {
            self.body.clone()
        }
    }

    pub(crate) fn push(&mut self, c: char) -> ParseStep {
        if self.pending_esc {
            if c == '\\' {
                return ParseStep::Finished(vec![self.into_token(true)]);
            }
            // ESC followed by anything else aborts the command; the
            // consumed escape stays inside the unrecognised fragment.
            return ParseStep::Aborted {
                raw: format!("\x1b]{}\x1b", self.body),
                reprocess: Some(c),
            };
        }

        match c {
            '\x07' => ParseStep::Finished(vec![self.into_token(false)]),
            '\u{9c}' => ParseStep::Finished(vec![self.into_token(true)]),
            '\x1b' => {
                self.pending_esc = true;
                ParseStep::Continue
            }
            c => {
                self.body.push(c);
                ParseStep::Continue
            }
        }
    }

    fn into_token(&mut self, esc_terminated: bool) -> AnsiToken {
        let body = std::mem::take(&mut self.body);
        let mut segments = body.split(';');

        let command = segments.next().unwrap_or_default().to_string();
        let mut rest: Vec<String> = segments.map(str::to_string).collect();
        let payload = rest.pop().unwrap_or_default();

        AnsiToken::Osc {
            command,
            parameters: rest,
            payload,
            esc_terminated,
        }
    }
}
