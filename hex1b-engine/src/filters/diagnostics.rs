// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Unix-domain-socket diagnostics endpoint.
//!
//! A host terminal exposes a socket at a pid-derived path. Clients send one
//! JSON object per line (`info`, `attach`, `detach`, `resize`, `shutdown`);
//! after a successful `attach` the connection switches to a streaming mode
//! with one frame per line:
//!
//! - `o:<base64>` output bytes from the host
//! - `i:<base64>` input bytes from the client
//! - `r:<cols>,<rows>` resize from whichever side leads
//! - `leader:true|false` leadership notifications
//! - `lead` client request to become the leader
//! - `shutdown` / `detach` / `exit` session control

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use crossbeam_channel::{Receiver, Sender, unbounded};
use hex1b_ansi::serializer::serialize_tokens;
use hex1b_ansi::token::AnsiToken;
use hex1b_grid::emulator::TerminalEmulator;
use hex1b_grid::response::AppliedToken;
use hex1b_grid::sgr::sgr_params_for;
use serde::{Deserialize, Serialize};

use super::PresentationFilter;

/// One command line from a client.
#[derive(Debug, Deserialize)]
pub struct Request {
    pub method: String,
    #[serde(default)]
    pub width: Option<usize>,
    #[serde(default)]
    pub height: Option<usize>,
}

/// One response line to a client.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leader: Option<bool>,
    /// Current screen snapshot, base64 text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<u64>,
}

impl Response {
    fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// Events surfaced to the host's main loop.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DiagnosticsEvent {
    /// Input bytes from an attached client.
    Input(String),
    /// Resize request from the leader.
    Resize(usize, usize),
    Shutdown,
}

/// Directory holding the per-process diagnostics sockets.
#[must_use]
pub fn sockets_dir() -> PathBuf {
    directories::ProjectDirs::from("io.github", "fredsystems", "hex1b").map_or_else(
        std::env::temp_dir,
        |dirs| {
            dirs.runtime_dir()
                .map_or_else(|| dirs.cache_dir().to_path_buf(), PathBuf::from)
        },
    )
}

/// The socket path a host with the given pid listens on.
#[must_use]
pub fn socket_path_for_pid(pid: u32) -> PathBuf {
    sockets_dir().join(format!("hex1b-{pid}.sock"))
}

struct HostInfo {
    width: usize,
    height: usize,
    app_name: String,
    process_id: u32,
    start_time: u64,
    snapshot: String,
}

struct ClientHandle {
    id: u64,
    stream: UnixStream,
    leader: bool,
}

struct Shared {
    info: Mutex<HostInfo>,
    clients: Mutex<Vec<ClientHandle>>,
    next_client_id: AtomicU64,
    running: AtomicBool,
}

impl Shared {
    fn broadcast(&self, line: &str) {
        let Ok(mut clients) = self.clients.lock() else {
            return;
        };
        clients.retain_mut(|client| writeln!(client.stream, "{line}").is_ok());
    }

    fn set_leader(&self, id: u64) {
        let Ok(mut clients) = self.clients.lock() else {
            return;
        };
        for client in clients.iter_mut() {
            let is_leader = client.id == id;
            if client.leader != is_leader {
                client.leader = is_leader;
                let _ = writeln!(client.stream, "leader:{is_leader}");
            }
        }
    }

    fn is_leader(&self, id: u64) -> bool {
        self.clients
            .lock()
            .ok()
            .is_some_and(|clients| clients.iter().any(|c| c.id == id && c.leader))
    }

    fn detach(&self, id: u64) {
        if let Ok(mut clients) = self.clients.lock() {
            clients.retain(|client| client.id != id);
        }
    }
}

/// Hosts the diagnostics socket and bridges attach sessions.
///
/// Owns a shadow emulator fed from the output stream, so `info` and
/// `attach` can hand out a faithful screen snapshot without touching the
/// session's own state.
pub struct DiagnosticsFilter {
    path: PathBuf,
    shared: Arc<Shared>,
    events_tx: Sender<DiagnosticsEvent>,
    events_rx: Receiver<DiagnosticsEvent>,
    shadow: TerminalEmulator,
    accept_worker: Option<JoinHandle<()>>,
}

impl DiagnosticsFilter {
    #[must_use]
    pub fn new(app_name: impl Into<String>) -> Self {
        let pid = std::process::id();
        Self::at_path(app_name, socket_path_for_pid(pid))
    }

    #[must_use]
    pub fn at_path(app_name: impl Into<String>, path: PathBuf) -> Self {
        let (events_tx, events_rx) = unbounded();
        Self {
            path,
            shared: Arc::new(Shared {
                info: Mutex::new(HostInfo {
                    width: 0,
                    height: 0,
                    app_name: app_name.into(),
                    process_id: std::process::id(),
                    start_time: 0,
                    snapshot: String::new(),
                }),
                clients: Mutex::new(Vec::new()),
                next_client_id: AtomicU64::new(1),
                running: AtomicBool::new(false),
            }),
            events_tx,
            events_rx,
            shadow: TerminalEmulator::new(80, 24),
            accept_worker: None,
        }
    }

    #[must_use]
    pub fn socket_path(&self) -> &PathBuf {
        &self.path
    }

    /// The host's receiving end for attach input, resizes, and shutdown.
    #[must_use]
    pub fn events(&self) -> Receiver<DiagnosticsEvent> {
        self.events_rx.clone()
    }

    fn refresh_snapshot(&self) {
        if let Ok(mut info) = self.shared.info.lock() {
            info.snapshot = dump_screen(&self.shadow);
        }
    }
}

impl PresentationFilter for DiagnosticsFilter {
    fn name(&self) -> &'static str {
        "diagnostics"
    }

    fn on_session_start(&mut self, width: usize, height: usize, timestamp: SystemTime) {
        self.shadow = TerminalEmulator::new(width, height);

        if let Ok(mut info) = self.shared.info.lock() {
            info.width = width;
            info.height = height;
            info.start_time = timestamp
                .duration_since(UNIX_EPOCH)
                .unwrap_or(Duration::ZERO)
                .as_secs();
        }

        if let Some(parent) = self.path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = std::fs::remove_file(&self.path);

        let listener = match UnixListener::bind(&self.path) {
            Ok(listener) => listener,
            Err(error) => {
                warn!(
                    "diagnostics socket unavailable at {}: {error}",
                    self.path.display()
                );
                return;
            }
        };
        if listener.set_nonblocking(true).is_err() {
            warn!("cannot make diagnostics listener non-blocking");
            return;
        }

        self.shared.running.store(true, Ordering::SeqCst);
        let shared = Arc::clone(&self.shared);
        let events = self.events_tx.clone();

        self.accept_worker = Some(std::thread::spawn(move || {
            while shared.running.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        let shared = Arc::clone(&shared);
                        let events = events.clone();
                        std::thread::spawn(move || serve_client(&stream, &shared, &events));
                    }
                    Err(error) if error.kind() == std::io::ErrorKind::WouldBlock => {
                        std::thread::sleep(Duration::from_millis(25));
                    }
                    Err(error) => {
                        debug!("diagnostics accept failed: {error}");
                        break;
                    }
                }
            }
        }));
    }

    fn on_output(&mut self, applied: &[AppliedToken], _elapsed: Duration) -> Vec<AnsiToken> {
        let tokens: Vec<AnsiToken> = applied.iter().map(|a| a.token.clone()).collect();

        for token in &tokens {
            self.shadow.apply(token);
        }
        self.refresh_snapshot();

        let printable: Vec<AnsiToken> = tokens
            .iter()
            .filter(|t| !matches!(t, AnsiToken::FrameBegin | AnsiToken::FrameEnd))
            .cloned()
            .collect();
        if !printable.is_empty() {
            let encoded = BASE64.encode(serialize_tokens(&printable).as_bytes());
            self.shared.broadcast(&format!("o:{encoded}"));
        }

        tokens
    }

    fn on_resize(&mut self, width: usize, height: usize, _elapsed: Duration) {
        self.shadow.resize(width, height);
        if let Ok(mut info) = self.shared.info.lock() {
            info.width = width;
            info.height = height;
        }
        self.refresh_snapshot();
        self.shared.broadcast(&format!("r:{width},{height}"));
    }

    fn on_session_end(&mut self, _elapsed: Duration) {
        self.shared.broadcast("exit");
        self.shared.running.store(false, Ordering::SeqCst);
        if let Some(worker) = self.accept_worker.take() {
            let _ = worker.join();
        }
        let _ = std::fs::remove_file(&self.path);
    }
}

fn respond(stream: &UnixStream, response: &Response) {
    let mut stream = stream;
    match serde_json::to_string(response) {
        Ok(line) => {
            let _ = writeln!(stream, "{line}");
        }
        Err(error) => warn!("cannot serialize diagnostics response: {error}"),
    }
}

#[allow(clippy::too_many_lines)]
fn serve_client(stream: &UnixStream, shared: &Arc<Shared>, events: &Sender<DiagnosticsEvent>) {
    let Ok(read_half) = stream.try_clone() else {
        return;
    };
    let reader = BufReader::new(read_half);
    let client_id = shared.next_client_id.fetch_add(1, Ordering::SeqCst);
    let mut attached = false;

    for line in reader.lines() {
        let Ok(line) = line else {
            break;
        };
        if !shared.running.load(Ordering::SeqCst) {
            break;
        }

        if attached {
            match parse_stream_frame(&line) {
                StreamFrame::Input(bytes) => {
                    let _ = events.send(DiagnosticsEvent::Input(bytes));
                }
                StreamFrame::Resize(width, height) => {
                    if shared.is_leader(client_id) {
                        let _ = events.send(DiagnosticsEvent::Resize(width, height));
                    }
                }
                StreamFrame::Lead => shared.set_leader(client_id),
                StreamFrame::Detach => {
                    shared.detach(client_id);
                    attached = false;
                }
                StreamFrame::Shutdown => {
                    let _ = events.send(DiagnosticsEvent::Shutdown);
                }
                StreamFrame::Exit => break,
                StreamFrame::Unknown => {
                    debug!("unknown stream frame: {line}");
                }
            }
            continue;
        }

        let request: Request = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(error) => {
                respond(stream, &Response::failure(format!("invalid JSON: {error}")));
                continue;
            }
        };

        match request.method.as_str() {
            "info" => {
                let response = shared.info.lock().map_or_else(
                    |_| Response::failure("host state unavailable"),
                    |info| Response {
                        success: true,
                        width: Some(info.width),
                        height: Some(info.height),
                        leader: Some(false),
                        data: Some(BASE64.encode(info.snapshot.as_bytes())),
                        app_name: Some(info.app_name.clone()),
                        process_id: Some(info.process_id),
                        start_time: Some(info.start_time),
                        ..Response::default()
                    },
                );
                respond(stream, &response);
            }
            "attach" => {
                let Ok(write_half) = stream.try_clone() else {
                    respond(stream, &Response::failure("cannot clone stream"));
                    continue;
                };
                if let Ok(mut clients) = shared.clients.lock() {
                    clients.push(ClientHandle {
                        id: client_id,
                        stream: write_half,
                        leader: false,
                    });
                }
                attached = true;

                let response = shared.info.lock().map_or_else(
                    |_| Response::failure("host state unavailable"),
                    |info| Response {
                        success: true,
                        width: Some(info.width),
                        height: Some(info.height),
                        leader: Some(false),
                        data: Some(BASE64.encode(info.snapshot.as_bytes())),
                        ..Response::default()
                    },
                );
                respond(stream, &response);
            }
            "detach" => {
                shared.detach(client_id);
                respond(
                    stream,
                    &Response {
                        success: true,
                        ..Response::default()
                    },
                );
            }
            "resize" => match (request.width, request.height) {
                (Some(width), Some(height)) => {
                    let _ = events.send(DiagnosticsEvent::Resize(width, height));
                    respond(
                        stream,
                        &Response {
                            success: true,
                            ..Response::default()
                        },
                    );
                }
                _ => respond(
                    stream,
                    &Response::failure("resize requires width and height"),
                ),
            },
            "shutdown" => {
                let _ = events.send(DiagnosticsEvent::Shutdown);
                respond(
                    stream,
                    &Response {
                        success: true,
                        ..Response::default()
                    },
                );
            }
            other => {
                respond(
                    stream,
                    &Response::failure(format!("unknown method: {other}")),
                );
            }
        }
    }

    shared.detach(client_id);
}

enum StreamFrame {
    Input(String),
    Resize(usize, usize),
    Lead,
    Detach,
    Shutdown,
    Exit,
    Unknown,
}

fn parse_stream_frame(line: &str) -> StreamFrame {
    if let Some(encoded) = line.strip_prefix("i:") {
        return BASE64.decode(encoded).map_or(StreamFrame::Unknown, |bytes| {
            StreamFrame::Input(String::from_utf8_lossy(&bytes).to_string())
        });
    }
    if let Some(dims) = line.strip_prefix("r:") {
        let mut parts = dims.splitn(2, ',');
        let cols = parts.next().and_then(|v| v.parse().ok());
        let rows = parts.next().and_then(|v| v.parse().ok());
        return match (cols, rows) {
            (Some(cols), Some(rows)) => StreamFrame::Resize(cols, rows),
            _ => StreamFrame::Unknown,
        };
    }

    match line {
        "lead" => StreamFrame::Lead,
        "detach" => StreamFrame::Detach,
        "shutdown" => StreamFrame::Shutdown,
        "exit" => StreamFrame::Exit,
        _ => StreamFrame::Unknown,
    }
}

/// A full-screen ANSI dump of the shadow emulator: clear, then one styled
/// run per row segment, then the cursor position.
#[must_use]
pub fn dump_screen(emulator: &TerminalEmulator) -> String {
    let grid = emulator.grid();
    let mut tokens = vec![
        AnsiToken::Sgr("0".to_string()),
        AnsiToken::ClearScreen(hex1b_ansi::token::ClearScreenMode::All),
    ];

    for y in 0..grid.height() {
        let Some(row) = grid.row(y) else {
            continue;
        };

        let mut x = 0;
        while x < row.len() {
            let cell = &row[x];
            if cell.is_wide_continuation() || (cell.grapheme() == " " && cell.style() == hex1b_grid::sgr::SgrState::default()) {
                x += 1;
                continue;
            }

            let style = cell.style();
            let start = x;
            let mut text = String::new();
            while x < row.len() {
                let cell = &row[x];
                if cell.is_wide_continuation() {
                    x += 1;
                    continue;
                }
                if cell.style() != style {
                    break;
                }
                if cell.grapheme() == " " && style == hex1b_grid::sgr::SgrState::default() {
                    break;
                }
                text.push_str(cell.grapheme());
                x += 1;
            }

            tokens.push(AnsiToken::CursorPosition {
                row: y + 1,
                col: start + 1,
                original_params: None,
            });
            tokens.push(AnsiToken::Sgr(sgr_params_for(&style)));
            tokens.push(AnsiToken::Text(text));
        }
    }

    tokens.push(AnsiToken::CursorPosition {
        row: grid.cursor.row + 1,
        col: grid.cursor.col.min(grid.width().saturating_sub(1)) + 1,
        original_params: None,
    });
    tokens.push(AnsiToken::Sgr("0".to_string()));

    serialize_tokens(&tokens)
}
