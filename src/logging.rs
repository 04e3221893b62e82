//! @dose
//! purpose: Tracing subscriber setup for the dtscan binary.
//!
//! when-editing:
//!     - !All output goes to stderr; stdout carries only extracted declarations
//!     - The filter comes from DTSCAN_LOG, then RUST_LOG, then `warn` (`debug` with --verbose)
//!     - DTSCAN_LOG_FORMAT=json switches to newline-delimited JSON
//!
//! gotchas:
//!     - init() ignores an already-installed subscriber so tests can call it repeatedly

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn from_env() -> Self {
        match std::env::var("DTSCAN_LOG_FORMAT")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

fn build_filter(verbose: bool) -> EnvFilter {
    let directives = std::env::var("DTSCAN_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| if verbose { "debug" } else { "warn" }.to_string());
    EnvFilter::builder().parse_lossy(directives)
}

/// Install the global subscriber; a second call is a no-op
pub fn init(verbose: bool) {
    let filter = build_filter(verbose);
    let result = match LogFormat::from_env() {
        LogFormat::Json => Registry::default()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Text => Registry::default()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init(),
    };
    // Already installed (tests, embedding hosts)
    let _ = result;
}
