// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

pub mod diagnostics;
pub mod recording;
pub mod render_optimization;

use std::time::{Duration, SystemTime};

use hex1b_ansi::token::AnsiToken;
use hex1b_grid::response::AppliedToken;

/// A transformer between the emulator's applied output and the byte sink.
///
/// Filters observe, rewrite, or suppress tokens. They compose in a fixed
/// order declared at construction; each filter's returned token list is the
/// next filter's input.
pub trait PresentationFilter {
    fn name(&self) -> &'static str;

    fn on_session_start(&mut self, width: usize, height: usize, timestamp: SystemTime) {
        let _ = (width, height, timestamp);
    }

    /// Transform one output batch. The default passes tokens through
    /// untouched.
    fn on_output(&mut self, applied: &[AppliedToken], elapsed: Duration) -> Vec<AnsiToken> {
        let _ = elapsed;
        applied.iter().map(|a| a.token.clone()).collect()
    }

    fn on_input(&mut self, tokens: &[AnsiToken], elapsed: Duration) {
        let _ = (tokens, elapsed);
    }

    fn on_resize(&mut self, width: usize, height: usize, elapsed: Duration) {
        let _ = (width, height, elapsed);
    }

    fn on_session_end(&mut self, elapsed: Duration) {
        let _ = elapsed;
    }
}

/// An ordered filter pipeline.
#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn PresentationFilter>>,
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&'static str> = self.filters.iter().map(|f| f.name()).collect();
        f.debug_struct("FilterChain").field("filters", &names).finish()
    }
}

impl FilterChain {
    #[must_use]
    pub fn new(filters: Vec<Box<dyn PresentationFilter>>) -> Self {
        Self { filters }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn session_start(&mut self, width: usize, height: usize, timestamp: SystemTime) {
        for filter in &mut self.filters {
            filter.on_session_start(width, height, timestamp);
        }
    }

    /// Push one output batch through every filter in order. The frame
    /// bracket markers are internal: whatever survives the chain is
    /// stripped of them before reaching the sink.
    pub fn process_output(
        &mut self,
        applied: Vec<AppliedToken>,
        elapsed: Duration,
    ) -> Vec<AnsiToken> {
        let mut current = applied;

        for filter in &mut self.filters {
            let tokens = filter.on_output(&current, elapsed);
            current = tokens.into_iter().map(AppliedToken::passthrough).collect();
        }

        current
            .into_iter()
            .map(|applied| applied.token)
            .filter(|token| !matches!(token, AnsiToken::FrameBegin | AnsiToken::FrameEnd))
            .collect()
    }

    pub fn process_input(&mut self, tokens: &[AnsiToken], elapsed: Duration) {
        for filter in &mut self.filters {
            filter.on_input(tokens, elapsed);
        }
    }

    pub fn process_resize(&mut self, width: usize, height: usize, elapsed: Duration) {
        for filter in &mut self.filters {
            filter.on_resize(width, height, elapsed);
        }
    }

    /// Tear down in reverse construction order.
    pub fn session_end(&mut self, elapsed: Duration) {
        for filter in self.filters.iter_mut().rev() {
            filter.on_session_end(elapsed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Tagger {
        tag: &'static str,
        log: std::rc::Rc<std::cell::RefCell<Vec<String>>>,
    }

    impl PresentationFilter for Tagger {
        fn name(&self) -> &'static str {
            self.tag
        }

        fn on_output(&mut self, applied: &[AppliedToken], _elapsed: Duration) -> Vec<AnsiToken> {
            self.log.borrow_mut().push(format!("{}:{}", self.tag, applied.len()));
            applied.iter().map(|a| a.token.clone()).collect()
        }

        fn on_session_end(&mut self, _elapsed: Duration) {
            self.log.borrow_mut().push(format!("end:{}", self.tag));
        }
    }

    #[test]
    fn filters_run_in_order_and_tear_down_in_reverse() {
        let log = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut chain = FilterChain::new(vec![
            Box::new(Tagger {
                tag: "a",
                log: std::rc::Rc::clone(&log),
            }),
            Box::new(Tagger {
                tag: "b",
                log: std::rc::Rc::clone(&log),
            }),
        ]);

        let applied = vec![AppliedToken::passthrough(AnsiToken::Text("x".to_string()))];
        chain.process_output(applied, Duration::ZERO);
        chain.session_end(Duration::ZERO);

        assert_eq!(
            log.borrow().as_slice(),
            ["a:1", "b:1", "end:b", "end:a"]
        );
    }

    #[test]
    fn frame_markers_never_reach_the_sink() {
        let mut chain = FilterChain::new(vec![]);
        let applied = vec![
            AppliedToken::passthrough(AnsiToken::FrameBegin),
            AppliedToken::passthrough(AnsiToken::Text("x".to_string())),
            AppliedToken::passthrough(AnsiToken::FrameEnd),
        ];

        let out = chain.process_output(applied, Duration::ZERO);
        assert_eq!(out, vec![AnsiToken::Text("x".to_string())]);
    }
}
