//! @dose
//! purpose: Error type for the fallible edges of the crate: reading files, loading
//!     dtscan.toml and compiling exclude patterns.
//!
//! do-not:
//!     - Never add a scan error; malformed source degrades to skipped spans

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DtsError {
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid exclude pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },
}

pub type Result<T> = std::result::Result<T, DtsError>;
