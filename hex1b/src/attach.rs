// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! `terminal attach`: bridge the local terminal to a hosted session over
//! the diagnostics socket's streaming protocol. Detach with Ctrl+].

use std::io::{BufRead, BufReader, Read, Write};
use std::os::fd::AsRawFd;
use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use nix::sys::termios::{self, LocalFlags, SetArg, Termios};
use serde_json::json;

use crate::UserError;
use crate::registry;

const DETACH_BYTE: u8 = 0x1d; // Ctrl+]

/// Puts stdin into raw mode for the duration of the attach.
struct RawModeGuard {
    original: Termios,
}

impl RawModeGuard {
    fn enable() -> Result<Self> {
        let stdin = std::io::stdin();
        let original =
            termios::tcgetattr(&stdin).context("stdin is not a terminal")?;

        let mut raw = original.clone();
        termios::cfmakeraw(&mut raw);
        // keep ISIG off so ^C travels to the remote session
        raw.local_flags.remove(LocalFlags::ISIG);
        termios::tcsetattr(&stdin, SetArg::TCSANOW, &raw)
            .context("cannot switch the terminal to raw mode")?;

        Ok(Self { original })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let stdin = std::io::stdin();
        let _ = termios::tcsetattr(&stdin, SetArg::TCSANOW, &self.original);
    }
}

/// The local terminal's size, via TIOCGWINSZ.
fn local_terminal_size() -> Option<(usize, usize)> {
    let mut size = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let fd = std::io::stdout().as_raw_fd();

    // SAFETY: TIOCGWINSZ only writes into the winsize out-parameter.
    let result = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &raw mut size) };
    if result == 0 && size.ws_col > 0 && size.ws_row > 0 {
        Some((usize::from(size.ws_col), usize::from(size.ws_row)))
    } else {
        None
    }
}

pub fn run_attach(id: &str, follow_resize: bool, lead: bool) -> Result<()> {
    let entry = registry::resolve(id)?;
    let mut stream = UnixStream::connect(&entry.path)
        .with_context(|| format!("session {} is not reachable", entry.pid))?;

    writeln!(stream, "{}", json!({"method": "attach"}))
        .context("cannot talk to the session")?;

    let mut reader = BufReader::new(stream.try_clone().context("cannot clone socket")?);
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .context("session closed the connection")?;
    let response: serde_json::Value =
        serde_json::from_str(&line).context("session sent a malformed response")?;

    if response["success"] != true {
        return Err(UserError(format!(
            "attach refused: {}",
            response["error"].as_str().unwrap_or("unknown error")
        ))
        .into());
    }

    let guard = RawModeGuard::enable()?;
    let mut stdout = std::io::stdout();

    // paint the current screen before streaming deltas
    if let Some(data) = response["data"].as_str() {
        if let Ok(bytes) = BASE64.decode(data) {
            let _ = stdout.write_all(&bytes);
            let _ = stdout.flush();
        }
    }

    if lead || follow_resize {
        writeln!(stream, "lead").context("cannot request leadership")?;
    }
    if let (true, Some((cols, rows))) = (follow_resize, local_terminal_size()) {
        writeln!(stream, "r:{cols},{rows}").context("cannot send resize")?;
    }

    let done = Arc::new(AtomicBool::new(false));

    // socket → stdout
    let socket_done = Arc::clone(&done);
    let output_thread = std::thread::spawn(move || {
        for line in reader.lines() {
            let Ok(line) = line else { break };
            if let Some(encoded) = line.strip_prefix("o:") {
                if let Ok(bytes) = BASE64.decode(encoded) {
                    let mut stdout = std::io::stdout();
                    let _ = stdout.write_all(&bytes);
                    let _ = stdout.flush();
                }
            } else if line == "exit" || line == "shutdown" {
                break;
            }
            // r: and leader: notifications need no action on this side
        }
        socket_done.store(true, Ordering::SeqCst);
    });

    // stdin → socket
    let mut stdin = std::io::stdin();
    let mut buffer = [0u8; 1024];
    while !done.load(Ordering::SeqCst) {
        let n = match stdin.read(&mut buffer) {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };

        if buffer[..n].contains(&DETACH_BYTE) {
            let _ = writeln!(stream, "detach");
            break;
        }

        let encoded = BASE64.encode(&buffer[..n]);
        if writeln!(stream, "i:{encoded}").is_err() {
            break;
        }
    }

    done.store(true, Ordering::SeqCst);
    let _ = stream.shutdown(std::net::Shutdown::Both);
    let _ = output_thread.join();
    drop(guard);

    println!();
    println!("detached from {}", entry.pid);
    Ok(())
}
