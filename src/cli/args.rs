//! @dose
//! purpose: This module defines the command-line interface for dtscan using the clap derive
//!     macros. It specifies the scan and watch commands and their arguments.
//!
//! when-editing:
//!     - !Each command struct must derive Args and be added to the Commands enum
//!     - !Global flags (root, verbose) are defined on Cli and propagate to all subcommands
//!     - Flags that mirror dtscan.toml keys override the file; unset flags defer to it
//!
//! invariants:
//!     - The Cli struct is the root parser that clap uses to parse command-line arguments
//!     - PathBuf is used for all file/directory path arguments
//!
//! do-not:
//!     - Never add positional arguments that could conflict with subcommands
//!
//! gotchas:
//!     - The --root flag is global but optional; defaults to current directory in main.rs
//!     - --concurrency is an Option so an absent flag keeps the configured value

use crate::config::Config;
use crate::exclusion::ExclusionConfig;
use crate::scanner::ScanOptions;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dtscan")]
#[command(author, version, about = "Fast TypeScript declaration surface extractor")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to project root (defaults to current directory)
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the declaration-only surface of TypeScript sources
    Scan(ScanArgs),

    /// Watch sources and print their declarations whenever they change
    Watch(WatchArgs),
}

/// Options shared between scan and watch
#[derive(Args, Clone, Default)]
pub struct CommonOptions {
    /// Retain documentation comments
    #[arg(long)]
    pub keep_comments: bool,

    /// Only infer types from assertions and literals
    #[arg(long)]
    pub isolated: bool,

    /// Exclude files/directories matching glob pattern (can be repeated)
    #[arg(long, value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Don't respect .gitignore files
    #[arg(long)]
    pub no_gitignore: bool,
}

impl CommonOptions {
    /// Scan flags: config values, switched on by the matching flags
    pub fn scan_options(&self, config: &Config) -> ScanOptions {
        ScanOptions {
            keep_comments: self.keep_comments || config.keep_comments,
            isolated: self.isolated || config.isolated,
        }
    }

    /// Create an ExclusionConfig from these options, merging with config file patterns
    pub fn exclusion_config(&self, config_patterns: &[String]) -> ExclusionConfig {
        let mut patterns = config_patterns.to_vec();
        patterns.extend(self.exclude.iter().cloned());
        ExclusionConfig {
            patterns,
            respect_gitignore: !self.no_gitignore,
        }
    }
}

#[derive(Args, Clone, Default)]
pub struct ScanArgs {
    /// Specific files or directories to process
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Print a JSON object mapping each path to its declaration records
    #[arg(long)]
    pub json: bool,

    /// Files scanned per parallel window (defaults to the configured value)
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    #[command(flatten)]
    pub common: CommonOptions,
}

#[derive(Args, Clone, Default)]
pub struct WatchArgs {
    /// Specific files or directories to watch
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Debounce delay in milliseconds
    #[arg(long, default_value_t = 100)]
    pub debounce: u64,

    /// Clear screen before each update
    #[arg(long)]
    pub clear: bool,

    #[command(flatten)]
    pub common: CommonOptions,
}
