// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Deterministic in-process terminal for tests: a session wired to an
//! in-memory byte sink, with snapshotting, input-sequence building, and
//! wait-until polling. No real terminal, no timers, no races.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use std::time::Duration;

use hex1b_common::input::KeyModifiers;
use hex1b_grid::emulator::TerminalEmulator;

use crate::filters::FilterChain;
use crate::filters::render_optimization::RenderOptimizationFilter;
use crate::input::binding::{Key, KeyEvent, MouseEvent, MouseEventKind};
use crate::input::encode::{key_event_bytes, mouse_event_bytes};
use crate::session::{Builder, TerminalSession};

/// An in-memory sink shared between the session and the harness.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    bytes: Rc<RefCell<Vec<u8>>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contents(&self) -> Vec<u8> {
        self.bytes.borrow().clone()
    }
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.bytes.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// A deterministic terminal harness around [`TerminalSession`].
///
/// The default filter chain is just the render-optimisation filter, so the
/// sink sees exactly what a real terminal would.
#[derive(Debug)]
pub struct TestTerminal {
    session: TerminalSession<MemorySink>,
    sink: MemorySink,
    width: usize,
    height: usize,
}

impl TestTerminal {
    #[must_use]
    pub fn new(width: usize, height: usize, builder: Builder) -> Self {
        Self::with_filters(
            width,
            height,
            builder,
            FilterChain::new(vec![Box::new(RenderOptimizationFilter::new())]),
        )
    }

    #[must_use]
    pub fn with_filters(
        width: usize,
        height: usize,
        builder: Builder,
        filters: FilterChain,
    ) -> Self {
        let sink = MemorySink::new();
        let mut session = TerminalSession::new(width, height, builder, filters, sink.clone());
        session.start();

        Self {
            session,
            sink,
            width,
            height,
        }
    }

    #[must_use]
    pub const fn session(&self) -> &TerminalSession<MemorySink> {
        &self.session
    }

    pub const fn session_mut(&mut self) -> &mut TerminalSession<MemorySink> {
        &mut self.session
    }

    /// Every byte the sink has received so far.
    #[must_use]
    pub fn output_bytes(&self) -> Vec<u8> {
        self.sink.contents()
    }

    /// The screen a terminal showing the sink's bytes would display.
    ///
    /// This replays the full output through a fresh emulator, which
    /// exercises the whole pipeline end to end rather than peeking at
    /// internal state.
    #[must_use]
    pub fn snapshot(&self) -> String {
        self.replay().screen_text()
    }

    /// The replayed verification terminal itself, for cell-level asserts.
    #[must_use]
    pub fn replay(&self) -> TerminalEmulator {
        let mut verify = TerminalEmulator::new(self.width, self.height);
        let text = String::from_utf8_lossy(&self.output_bytes()).to_string();
        for token in hex1b_ansi::tokenizer::tokenize(&text) {
            verify.apply(&token);
        }
        verify
    }

    /// Feed raw wire bytes, as a terminal would send them.
    pub fn send_raw(&mut self, input: &str) {
        self.session.handle_input(input);
    }

    /// Type plain text.
    pub fn send_text(&mut self, text: &str) {
        self.send_raw(text);
    }

    /// Press one key.
    pub fn send_key(&mut self, key: Key) {
        self.send_key_with(key, KeyModifiers::empty());
    }

    pub fn send_key_with(&mut self, key: Key, modifiers: KeyModifiers) {
        let bytes = key_event_bytes(&KeyEvent::with_modifiers(key, modifiers));
        self.send_raw(&bytes);
    }

    /// Deliver a mouse event at 0-based grid coordinates.
    pub fn send_mouse(&mut self, x: usize, y: usize, kind: MouseEventKind) {
        let bytes = mouse_event_bytes(&MouseEvent {
            x,
            y,
            kind,
            modifiers: KeyModifiers::empty(),
        });
        self.send_raw(&bytes);
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.session.resize(width, height);
    }

    pub fn invalidate(&mut self) {
        self.session.invalidate();
    }

    /// Poll until the snapshot satisfies the predicate. Each poll runs a
    /// frame, so widgets that invalidate converge without wall-clock
    /// sleeping; `budget` bounds the number of polls (one per simulated
    /// millisecond).
    pub fn wait_until(&mut self, predicate: impl Fn(&str) -> bool, budget: Duration) -> bool {
        let attempts = budget.as_millis().max(1);
        for _ in 0..attempts {
            if predicate(&self.snapshot()) {
                return true;
            }
            self.session.invalidate();
        }
        predicate(&self.snapshot())
    }

    /// Tear the session down (filters release their resources).
    pub fn finish(&mut self) {
        self.session.cancel();
    }
}
