// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! `terminal start`: run a child command under a PTY, mirror its output
//! into an emulator, and expose the session over the diagnostics socket.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime};

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender, select, unbounded};
use hex1b_ansi::tokenizer::Tokenizer;
use hex1b_engine::filters::diagnostics::{DiagnosticsEvent, DiagnosticsFilter};
use hex1b_engine::filters::recording::RecordingFilter;
use hex1b_engine::filters::{FilterChain, PresentationFilter};
use hex1b_grid::emulator::TerminalEmulator;
use portable_pty::{
    Child, ChildKiller, CommandBuilder, MasterPty, PtySize, PtySystem, SlavePty,
    native_pty_system,
};
use serde_json::json;

use crate::UserError;

#[derive(Debug)]
pub struct StartOptions {
    pub width: usize,
    pub height: usize,
    pub cwd: Option<PathBuf>,
    pub record: Option<PathBuf>,
    pub command: Vec<String>,
    pub json: bool,
}

enum HostEvent {
    Output(Vec<u8>),
    ChildExited,
}

fn pty_size(width: usize, height: usize) -> PtySize {
    PtySize {
        rows: u16::try_from(height).unwrap_or(24),
        cols: u16::try_from(width).unwrap_or(80),
        pixel_width: 0,
        pixel_height: 0,
    }
}

#[allow(clippy::too_many_lines)]
pub fn run_start(options: &StartOptions) -> Result<()> {
    let program = options
        .command
        .first()
        .ok_or_else(|| UserError("no command given".to_string()))?;

    let pty = native_pty_system();
    let pair = pty
        .openpty(pty_size(options.width, options.height))
        .context("cannot allocate a pty")?;

    let mut command = CommandBuilder::new(program);
    command.args(&options.command[1..]);
    if let Some(cwd) = &options.cwd {
        command.cwd(cwd);
    }

    let mut child = pair
        .slave
        .spawn_command(command)
        .with_context(|| format!("cannot start '{program}'"))?;
    drop(pair.slave);

    let mut reader = pair
        .master
        .try_clone_reader()
        .context("cannot read from the pty")?;
    let mut writer = pair
        .master
        .take_writer()
        .context("cannot write to the pty")?;

    // Output and child exit funnel into one channel so the main loop can
    // select over everything.
    let (events_tx, events_rx): (Sender<HostEvent>, Receiver<HostEvent>) = unbounded();

    let output_tx = events_tx;
    std::thread::spawn(move || {
        let mut buffer = [0u8; 8192];
        loop {
            match reader.read(&mut buffer) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if output_tx.send(HostEvent::Output(buffer[..n].to_vec())).is_err() {
                        break;
                    }
                }
            }
        }
        // EOF on the pty also means the child is gone
        let _ = output_tx.send(HostEvent::ChildExited);
    });

    let diagnostics = DiagnosticsFilter::new(program.clone());
    let socket_path = diagnostics.socket_path().clone();
    let control_rx = diagnostics.events();

    let mut filters: Vec<Box<dyn PresentationFilter>> = vec![Box::new(diagnostics)];
    if let Some(record) = &options.record {
        filters.push(Box::new(RecordingFilter::new(record)));
    }
    let mut chain = FilterChain::new(filters);

    let session_id = std::process::id();
    if options.json {
        println!(
            "{}",
            json!({
                "id": session_id.to_string(),
                "socket": socket_path.display().to_string(),
                "command": options.command,
            })
        );
    } else {
        println!("session {session_id} hosting '{program}' ({}x{})", options.width, options.height);
        println!("socket: {}", socket_path.display());
    }

    let started = Instant::now();
    let mut emulator = TerminalEmulator::new(options.width, options.height);
    let mut tokenizer = Tokenizer::new();
    chain.session_start(options.width, options.height, SystemTime::now());

    // Poll the child from the main loop so a normal exit tears the
    // session down promptly.
    let mut exited = false;
    let exit_poll = crossbeam_channel::tick(Duration::from_millis(200));

    loop {
        select! {
            recv(events_rx) -> event => match event {
                Ok(HostEvent::Output(bytes)) => {
                    let text = String::from_utf8_lossy(&bytes).to_string();
                    let tokens = tokenizer.push(&text);
                    let applied = emulator.apply_all(tokens.iter());
                    let _ = chain.process_output(applied, started.elapsed());

                    // cursor position reports and the like go back to the child
                    for response in emulator.take_responses() {
                        let _ = writer.write_all(response.as_bytes());
                    }
                    let _ = writer.flush();
                }
                Ok(HostEvent::ChildExited) | Err(_) => break,
            },
            recv(control_rx) -> event => match event {
                Ok(DiagnosticsEvent::Input(input)) => {
                    chain.process_input(
                        &hex1b_ansi::tokenizer::tokenize(&input),
                        started.elapsed(),
                    );
                    let _ = writer.write_all(input.as_bytes());
                    let _ = writer.flush();
                }
                Ok(DiagnosticsEvent::Resize(width, height)) => {
                    let _ = pair.master.resize(pty_size(width, height));
                    emulator.resize(width, height);
                    chain.process_resize(width, height, started.elapsed());
                }
                Ok(DiagnosticsEvent::Shutdown) | Err(_) => {
                    let _ = child.kill();
                    break;
                }
            },
            recv(exit_poll) -> _ => {
                if let Ok(Some(status)) = child.try_wait() {
                    debug!("child exited with {status:?}");
                    exited = true;
                    break;
                }
            },
        }
    }

    if !exited {
        let _ = child.wait();
    }
    chain.session_end(started.elapsed());

    if options.json {
        println!("{}", json!({"id": session_id.to_string(), "exited": true}));
    } else {
        println!("session {session_id} ended");
    }
    Ok(())
}
