// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! `pvemap`: inspect and validate Proxmox VE hardware mappings from the command line.

#![deny(clippy::pedantic, clippy::unwrap_used)]

mod args;
mod commands;

use std::process::ExitCode;

use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::args::{CmdArgs, Parser};

/// Logs go to stderr so that stdout only ever carries command output.
fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::builder().parse_lossy(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_level(true)
        .with_line_number(true)
        .init();
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn main() -> ExitCode {
    let args = CmdArgs::parse();
    init_logging(&args.log_level);
    match commands::run(&args.command, args.format) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            debug!("{err:?}");
            eprintln!("error: {}", error_chain(&err));
            ExitCode::FAILURE
        }
    }
}
