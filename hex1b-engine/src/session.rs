// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::collections::VecDeque;
use std::io::Write;
use std::time::{Duration, Instant, SystemTime};

use hex1b_ansi::serializer::serialize_tokens;
use hex1b_ansi::tokenizer::Tokenizer;
use hex1b_common::input::KeyModifiers;
use hex1b_grid::emulator::TerminalEmulator;

use crate::filters::FilterChain;
use crate::input::{
    EventContext, EventStatus, InputEvent, InputRouter, Key, events_from_tokens,
};
use crate::render::RenderEngine;
use crate::widget::WidgetBox;

/// Builds the description tree for each frame.
pub type Builder = Box<dyn FnMut() -> WidgetBox>;

/// How many bytes may sit unflushed before frames start being skipped.
const DEFAULT_BUFFER_LIMIT: usize = 1 << 20;

/// One running UI: builder → engine → emulator → filter chain → sink.
///
/// Everything here is single-threaded and cooperative. A frame runs once at
/// start and then once per input event or explicit invalidate; there is no
/// timer. When the sink cannot drain, frames are skipped (the builder's
/// intermediate results are dropped) but input keeps being accepted.
pub struct TerminalSession<W: Write> {
    builder: Builder,
    engine: RenderEngine,
    emulator: TerminalEmulator,
    filters: FilterChain,
    router: InputRouter,
    sink: W,
    tokenizer: Tokenizer,
    started_at: Instant,
    out_buffer: VecDeque<u8>,
    buffer_limit: usize,
    skipped_frame: bool,
    quit: bool,
}

impl<W: Write> TerminalSession<W> {
    pub fn new(
        width: usize,
        height: usize,
        builder: Builder,
        filters: FilterChain,
        sink: W,
    ) -> Self {
        Self {
            builder,
            engine: RenderEngine::new(width, height),
            emulator: TerminalEmulator::new(width, height),
            filters,
            router: InputRouter::new(),
            sink,
            tokenizer: Tokenizer::new(),
            started_at: Instant::now(),
            out_buffer: VecDeque::new(),
            buffer_limit: DEFAULT_BUFFER_LIMIT,
            skipped_frame: false,
            quit: false,
        }
    }

    /// Announce the session to the filters and paint the first frame.
    pub fn start(&mut self) {
        let size = self.engine.size();
        self.filters
            .session_start(size.width, size.height, SystemTime::now());
        self.render_frame();
    }

    #[must_use]
    pub const fn quit_requested(&self) -> bool {
        self.quit
    }

    #[must_use]
    pub const fn emulator(&self) -> &TerminalEmulator {
        &self.emulator
    }

    #[must_use]
    pub const fn engine(&self) -> &RenderEngine {
        &self.engine
    }

    #[must_use]
    pub const fn router(&self) -> &InputRouter {
        &self.router
    }

    pub const fn router_mut(&mut self) -> &mut InputRouter {
        &mut self.router
    }

    fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Feed raw input bytes from the terminal. Each decoded event is
    /// dispatched in arrival order; a frame runs afterwards when any
    /// handler asked for one.
    pub fn handle_input(&mut self, input: &str) {
        let tokens = self.tokenizer.push(input);
        self.filters.process_input(&tokens, self.elapsed());

        let events = events_from_tokens(&tokens);
        let mut needs_frame = false;

        for event in events {
            let mut ctx = EventContext::new();
            let status = match self.engine.root_mut() {
                Some(root) => self.router.dispatch(root, &event, &mut ctx),
                None => EventStatus::NotHandled,
            };

            if status == EventStatus::NotHandled {
                // session default: Ctrl+C quits
                if let InputEvent::Key(key) = &event {
                    if key.key == Key::Char('c') && key.modifiers == KeyModifiers::CONTROL {
                        self.quit = true;
                    }
                }
            }

            needs_frame |= ctx.frame_requested() || status == EventStatus::Handled;
            if ctx.quit_requested() {
                self.quit = true;
            }
        }

        if needs_frame {
            self.render_frame();
        }
    }

    /// Re-render on demand (widgets schedule this instead of running
    /// timers of their own).
    pub fn invalidate(&mut self) {
        self.render_frame();
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.engine.set_size(width, height);
        self.emulator.resize(width, height);
        self.filters.process_resize(width, height, self.elapsed());
        self.render_frame();
    }

    /// Cooperative teardown: filters are released in reverse construction
    /// order and the output buffer is given a final flush.
    pub fn cancel(&mut self) {
        self.quit = true;
        self.filters.session_end(self.elapsed());
        let _ = self.flush();
        let _ = self.sink.flush();
    }

    fn render_frame(&mut self) {
        // Backpressure: when the sink is hopelessly behind, drop this
        // frame's builder result instead of buffering more output. Input
        // is never dropped.
        if self.out_buffer.len() > self.buffer_limit {
            self.skipped_frame = true;
            debug!("sink is backed up; skipping frame");
            return;
        }

        let description = (self.builder)();
        let tokens = self.engine.render_frame(description.as_ref());
        let applied = self.emulator.apply_all(tokens.iter());
        let out = self.filters.process_output(applied, self.elapsed());

        self.out_buffer.extend(serialize_tokens(&out).as_bytes());
        let _ = self.flush();
        self.skipped_frame = false;
    }

    /// Push buffered bytes into the sink. Partial progress is fine; the
    /// remainder stays buffered.
    fn flush(&mut self) -> std::io::Result<()> {
        while !self.out_buffer.is_empty() {
            let (front, _) = self.out_buffer.as_slices();
            match self.sink.write(front) {
                Ok(0) => break,
                Ok(written) => {
                    self.out_buffer.drain(..written);
                }
                Err(error) if error.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(error) => return Err(error),
            }
        }

        // a frame was skipped while the buffer was full; catch up now
        if self.out_buffer.is_empty() && self.skipped_frame {
            self.skipped_frame = false;
            self.render_frame();
        }

        Ok(())
    }

    /// Consume the session, returning the sink.
    pub fn into_sink(self) -> W {
        self.sink
    }
}

impl<W: Write> std::fmt::Debug for TerminalSession<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalSession")
            .field("size", &self.engine.size())
            .field("buffered", &self.out_buffer.len())
            .field("quit", &self.quit)
            .finish_non_exhaustive()
    }
}
