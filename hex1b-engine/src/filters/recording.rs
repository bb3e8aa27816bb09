// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crossbeam_channel::{Sender, unbounded};
use hex1b_ansi::serializer::serialize_tokens;
use hex1b_ansi::token::AnsiToken;
use hex1b_grid::response::AppliedToken;
use serde::Serialize;

use super::PresentationFilter;

#[derive(Serialize)]
struct CastHeader {
    version: u8,
    width: usize,
    height: usize,
    timestamp: u64,
}

enum RecorderMessage {
    Header(CastHeader),
    Event { time: f64, kind: char, data: String },
    Finish,
}

/// Appends the output stream to an asciinema v2 file: a JSON header line
/// followed by `[time, "o", data]` event lines. Frame brackets surface as
/// marker events. The stream itself is never mutated.
///
/// File writes happen on a worker thread so the render path never blocks
/// on disk.
pub struct RecordingFilter {
    path: PathBuf,
    sender: Option<Sender<RecorderMessage>>,
    worker: Option<JoinHandle<()>>,
}

impl RecordingFilter {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sender: None,
            worker: None,
        }
    }

    fn send(&self, message: RecorderMessage) {
        if let Some(sender) = &self.sender {
            if sender.send(message).is_err() {
                warn!("recorder worker is gone; dropping event");
            }
        }
    }
}

impl PresentationFilter for RecordingFilter {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn on_session_start(&mut self, width: usize, height: usize, timestamp: SystemTime) {
        let (sender, receiver) = unbounded::<RecorderMessage>();
        let path = self.path.clone();

        let worker = std::thread::spawn(move || {
            let file = match File::create(&path) {
                Ok(file) => file,
                Err(error) => {
                    warn!("cannot create recording {}: {error}", path.display());
                    return;
                }
            };
            let mut writer = BufWriter::new(file);

            while let Ok(message) = receiver.recv() {
                let result = match message {
                    RecorderMessage::Header(header) => serde_json::to_string(&header)
                        .map_err(std::io::Error::other)
                        .and_then(|line| writeln!(writer, "{line}")),
                    RecorderMessage::Event { time, kind, data } => {
                        serde_json::to_string(&(time, kind.to_string(), data))
                            .map_err(std::io::Error::other)
                            .and_then(|line| writeln!(writer, "{line}"))
                    }
                    RecorderMessage::Finish => break,
                };

                if let Err(error) = result {
                    // the recording is best-effort; the session carries on
                    warn!("recording write failed: {error}");
                }
            }

            if let Err(error) = writer.flush() {
                warn!("recording flush failed: {error}");
            }
        });

        self.sender = Some(sender);
        self.worker = Some(worker);

        let unix = timestamp
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs();
        self.send(RecorderMessage::Header(CastHeader {
            version: 2,
            width,
            height,
            timestamp: unix,
        }));
    }

    fn on_output(&mut self, applied: &[AppliedToken], elapsed: Duration) -> Vec<AnsiToken> {
        let tokens: Vec<AnsiToken> = applied.iter().map(|a| a.token.clone()).collect();

        let mut printable = Vec::new();
        for token in &tokens {
            match token {
                AnsiToken::FrameEnd => {
                    self.send(RecorderMessage::Event {
                        time: elapsed.as_secs_f64(),
                        kind: 'm',
                        data: String::new(),
                    });
                }
                AnsiToken::FrameBegin => {}
                other => printable.push(other.clone()),
            }
        }

        if !printable.is_empty() {
            self.send(RecorderMessage::Event {
                time: elapsed.as_secs_f64(),
                kind: 'o',
                data: serialize_tokens(&printable),
            });
        }

        tokens
    }

    fn on_resize(&mut self, width: usize, height: usize, elapsed: Duration) {
        // asciinema models resizes as an `r` event
        self.send(RecorderMessage::Event {
            time: elapsed.as_secs_f64(),
            kind: 'r',
            data: format!("{width}x{height}"),
        });
    }

    fn on_session_end(&mut self, _elapsed: Duration) {
        self.send(RecorderMessage::Finish);
        self.sender = None;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("recorder worker panicked");
            }
        }
    }
}
