//! @dose
//! purpose: This is the CLI entry point for dtscan. It parses command-line arguments using
//!     clap, initializes logging, determines the project root directory, and dispatches to the
//!     appropriate command handler (scan or watch).
//!
//! when-editing:
//!     - !All command handlers are imported from the dtscan crate
//!     - !The root directory defaults to current working directory if not specified
//!     - Error messages are printed to stderr and exit with code 1
//!
//! invariants:
//!     - One and only one subcommand is always executed per invocation
//!     - The process exits with 0 on success, 1 on any error
//!
//! do-not:
//!     - Never add business logic here - delegate to command modules
//!     - Never panic - always use proper error handling
//!
//! gotchas:
//!     - The --root flag can be placed before or after the subcommand due to global flag
//!     - Verbose mode raises the default log level; DTSCAN_LOG still wins when set

use anyhow::Context;
use clap::Parser;
use dtscan::cli::{Cli, Commands};
use dtscan::commands::{run_scan, run_watch};
use std::env;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    dtscan::logging::init(cli.verbose);

    let root = match cli.root {
        Some(root) => root,
        None => env::current_dir().context("Failed to get current directory")?,
    };

    match cli.command {
        Commands::Scan(args) => run_scan(&args, &root, cli.verbose),
        Commands::Watch(args) => run_watch(&args, &root, cli.verbose),
    }
}
