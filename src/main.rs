//! `oraload` command-line entry point.
//!
//! ```text
//! oraload init-config                      # write oraload.json with defaults
//! oraload inspect  --input planilha.xlsx   # show the column decisions
//! oraload generate --config oraload.json   # write every artifact
//! ```
//!
//! Any failure exits with status 1.

#![warn(clippy::all, rust_2018_idioms)]
#![expect(clippy::print_stdout, clippy::print_stderr)] // Operator-facing output

mod cli;

use clap::Parser as _;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    match cli::run_command(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
