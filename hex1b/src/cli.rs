// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "hex1b", version, about = "Terminal UI toolkit ops tool")]
pub struct Cli {
    /// Machine-readable JSON output
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage hosted terminal sessions
    #[command(subcommand)]
    Terminal(TerminalCommand),
}

#[derive(Debug, Subcommand)]
pub enum TerminalCommand {
    /// List running sessions
    List,

    /// Show one session's details and screen snapshot
    Info {
        /// Session id (a process-id prefix)
        id: String,
    },

    /// Host a command in a new terminal session
    Start {
        #[arg(long, default_value_t = 80)]
        width: usize,

        #[arg(long, default_value_t = 24)]
        height: usize,

        /// Working directory for the child process
        #[arg(long)]
        cwd: Option<PathBuf>,

        /// Record the session to an asciinema v2 file
        #[arg(long)]
        record: Option<PathBuf>,

        /// The command to run, after `--`
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },

    /// Ask a session to shut down
    Stop {
        id: String,
    },

    /// Resize a session
    Resize {
        id: String,

        #[arg(long)]
        width: Option<usize>,

        #[arg(long)]
        height: Option<usize>,
    },

    /// Attach this terminal to a session (detach with Ctrl+])
    Attach {
        id: String,

        /// Follow the local terminal's size (implies --lead)
        #[arg(long)]
        resize: bool,

        /// Become the session leader
        #[arg(long)]
        lead: bool,

        /// Serve the session to a browser instead (not in this build)
        #[arg(long)]
        web: bool,

        #[arg(long)]
        port: Option<u16>,
    },

    /// Remove sockets left behind by dead sessions
    Clean,
}
