// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The session registry is nothing more than the directory of per-process
//! diagnostics sockets. A session id is its host's process id; commands
//! accept any unambiguous prefix.

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use hex1b_engine::filters::diagnostics::sockets_dir;
use serde_json::json;

use crate::UserError;

#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub pid: u32,
    pub path: PathBuf,
}

/// Scan the socket directory for session sockets.
#[must_use]
pub fn known_sessions() -> Vec<SessionEntry> {
    let Ok(entries) = std::fs::read_dir(sockets_dir()) else {
        return Vec::new();
    };

    let mut sessions: Vec<SessionEntry> = entries
        .filter_map(std::result::Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().to_string();
            let pid = name
                .strip_prefix("hex1b-")?
                .strip_suffix(".sock")?
                .parse()
                .ok()?;
            Some(SessionEntry {
                pid,
                path: entry.path(),
            })
        })
        .collect();

    sessions.sort_by_key(|s| s.pid);
    sessions
}

/// Resolve an id prefix to exactly one session.
pub fn resolve(id: &str) -> Result<SessionEntry> {
    let mut matches: Vec<SessionEntry> = known_sessions()
        .into_iter()
        .filter(|session| session.pid.to_string().starts_with(id))
        .collect();

    if matches.is_empty() {
        return Err(UserError(format!("no session matches '{id}'")).into());
    }
    if matches.len() > 1 {
        let ids: Vec<String> = matches.iter().map(|m| m.pid.to_string()).collect();
        return Err(UserError(format!(
            "'{id}' is ambiguous; candidates: {}",
            ids.join(", ")
        ))
        .into());
    }

    Ok(matches.remove(0))
}

/// Send one JSON command to a session and read the single-line response.
pub fn query(entry: &SessionEntry, request: &serde_json::Value) -> Result<serde_json::Value> {
    let mut stream = UnixStream::connect(&entry.path)
        .with_context(|| format!("session {} is not reachable", entry.pid))?;
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .context("cannot configure socket timeout")?;

    writeln!(stream, "{request}").context("cannot write to session socket")?;

    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .context("session closed the connection")?;

    serde_json::from_str(&line).context("session sent a malformed response")
}

fn alive(entry: &SessionEntry) -> bool {
    query(entry, &json!({"method": "info"}))
        .map(|response| response["success"] == true)
        .unwrap_or(false)
}

pub fn run_list(as_json: bool) -> Result<()> {
    let sessions = known_sessions();
    let mut rows = Vec::new();

    for session in sessions {
        if let Ok(response) = query(&session, &json!({"method": "info"})) {
            if response["success"] == true {
                rows.push(json!({
                    "id": session.pid.to_string(),
                    "appName": response["appName"],
                    "width": response["width"],
                    "height": response["height"],
                    "startTime": response["startTime"],
                }));
            }
        }
    }

    if as_json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("no running sessions");
        return Ok(());
    }

    println!("{:<10} {:<20} {:>9}", "ID", "APP", "SIZE");
    for row in rows {
        println!(
            "{:<10} {:<20} {:>9}",
            row["id"].as_str().unwrap_or("?"),
            row["appName"].as_str().unwrap_or("?"),
            format!(
                "{}x{}",
                row["width"].as_u64().unwrap_or(0),
                row["height"].as_u64().unwrap_or(0)
            ),
        );
    }
    Ok(())
}

pub fn run_info(id: &str, as_json: bool) -> Result<()> {
    let entry = resolve(id)?;
    let response = query(&entry, &json!({"method": "info"}))?;

    if response["success"] != true {
        return Err(UserError(format!(
            "session {} refused: {}",
            entry.pid,
            response["error"].as_str().unwrap_or("unknown error")
        ))
        .into());
    }

    if as_json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!("id:        {}", entry.pid);
    println!(
        "app:       {}",
        response["appName"].as_str().unwrap_or("?")
    );
    println!(
        "size:      {}x{}",
        response["width"].as_u64().unwrap_or(0),
        response["height"].as_u64().unwrap_or(0)
    );
    println!(
        "started:   {}",
        response["startTime"].as_u64().unwrap_or(0)
    );

    if let Some(data) = response["data"].as_str() {
        if let Ok(bytes) = BASE64.decode(data) {
            println!("--- screen ---");
            let mut replay = hex1b_grid::emulator::TerminalEmulator::new(
                usize::try_from(response["width"].as_u64().unwrap_or(80)).unwrap_or(80),
                usize::try_from(response["height"].as_u64().unwrap_or(24)).unwrap_or(24),
            );
            let text = String::from_utf8_lossy(&bytes).to_string();
            for token in hex1b_ansi::tokenizer::tokenize(&text) {
                replay.apply(&token);
            }
            println!("{}", replay.screen_text());
        }
    }

    Ok(())
}

pub fn run_stop(id: &str, as_json: bool) -> Result<()> {
    let entry = resolve(id)?;
    let response = query(&entry, &json!({"method": "shutdown"}))?;

    if response["success"] == true {
        if as_json {
            println!("{}", json!({"id": entry.pid.to_string(), "stopped": true}));
        } else {
            println!("stopped {}", entry.pid);
        }
        Ok(())
    } else {
        Err(UserError(format!("session {} refused to stop", entry.pid)).into())
    }
}

pub fn run_resize(
    id: &str,
    width: Option<usize>,
    height: Option<usize>,
    as_json: bool,
) -> Result<()> {
    if width.is_none() && height.is_none() {
        return Err(UserError("resize needs --width and/or --height".to_string()).into());
    }

    let entry = resolve(id)?;

    // fill in the missing axis from the session's current size
    let info = query(&entry, &json!({"method": "info"}))?;
    let width = width
        .or_else(|| info["width"].as_u64().and_then(|w| usize::try_from(w).ok()))
        .unwrap_or(80);
    let height = height
        .or_else(|| info["height"].as_u64().and_then(|h| usize::try_from(h).ok()))
        .unwrap_or(24);

    let response = query(
        &entry,
        &json!({"method": "resize", "width": width, "height": height}),
    )?;

    if response["success"] == true {
        if as_json {
            println!(
                "{}",
                json!({"id": entry.pid.to_string(), "width": width, "height": height})
            );
        } else {
            println!("resized {} to {width}x{height}", entry.pid);
        }
        Ok(())
    } else {
        Err(UserError(format!(
            "session {} refused the resize: {}",
            entry.pid,
            response["error"].as_str().unwrap_or("unknown error")
        ))
        .into())
    }
}

pub fn run_clean(as_json: bool) -> Result<()> {
    let mut removed = Vec::new();

    for session in known_sessions() {
        if !alive(&session) && std::fs::remove_file(&session.path).is_ok() {
            removed.push(session.pid.to_string());
        }
    }

    if as_json {
        println!("{}", json!({"removed": removed}));
    } else if removed.is_empty() {
        println!("nothing to clean");
    } else {
        println!("removed {} stale socket(s)", removed.len());
    }
    Ok(())
}
