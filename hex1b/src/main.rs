// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)] // Allow multiple versions from transitive dependencies
#![allow(clippy::cargo_common_metadata)] // Metadata is inherited from workspace

#[macro_use]
extern crate tracing;

mod attach;
mod cli;
mod host;
mod registry;

use std::process::ExitCode;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Command, TerminalCommand};

/// A failure caused by what the user asked for, as opposed to the tool
/// falling over. User errors exit with code 1, everything else with 2.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct UserError(pub String);

fn main() -> ExitCode {
    // RUST_LOG=hex1b=debug for diagnostics; errors only by default so the
    // CLI output stays clean.
    let env_filter = EnvFilter::builder()
        .with_default_directive(Level::WARN.into())
        .from_env_lossy();

    let stderr_layer = fmt::layer().with_writer(std::io::stderr).compact();
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error}");
            if error.downcast_ref::<UserError>().is_some() {
                ExitCode::from(1)
            } else {
                ExitCode::from(2)
            }
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Terminal(command) => match command {
            TerminalCommand::List => registry::run_list(cli.json),
            TerminalCommand::Info { id } => registry::run_info(&id, cli.json),
            TerminalCommand::Start {
                width,
                height,
                cwd,
                record,
                command,
            } => host::run_start(&host::StartOptions {
                width,
                height,
                cwd,
                record,
                command,
                json: cli.json,
            }),
            TerminalCommand::Stop { id } => registry::run_stop(&id, cli.json),
            TerminalCommand::Resize { id, width, height } => {
                registry::run_resize(&id, width, height, cli.json)
            }
            TerminalCommand::Attach {
                id,
                resize,
                lead,
                web,
                port,
            } => {
                if web || port.is_some() {
                    return Err(UserError(
                        "the web bridge is not available in this build".to_string(),
                    )
                    .into());
                }
                attach::run_attach(&id, resize, lead)
            }
            TerminalCommand::Clean => registry::run_clean(cli.json),
        },
    }
}
