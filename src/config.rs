//! @dose
//! purpose: Configuration file parsing for dtscan.toml. Holds the scan flags, the batch
//!     window size, exclusion patterns and cache capacities. Command-line flags are merged
//!     on top by the commands.
//!
//! when-editing:
//!     - !Config is loaded once at startup and passed through the call chain
//!     - Every field has a default so a partial file is valid
//!
//! invariants:
//!     - Config::load returns the default config if dtscan.toml doesn't exist
//!     - Config::load never fails; a broken file is reported and ignored
//!
//! gotchas:
//!     - Exclude patterns are matched against paths relative to the project root

use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::error::{DtsError, Result};
use crate::extract::DEFAULT_CONCURRENCY;
use crate::resolve::DEFAULT_PATTERN_CAPACITY;
use crate::scanner::ScanOptions;

/// Name of the configuration file looked up in the project root
pub const CONFIG_FILE: &str = "dtscan.toml";

/// Main configuration structure matching dtscan.toml
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Retain documentation comments in the output
    pub keep_comments: bool,

    /// Restrict type inference to assertions and literals
    pub isolated: bool,

    /// Files scanned per parallel window
    pub concurrency: usize,

    /// Exclusion patterns (gitignore-style)
    pub exclude: Vec<String>,

    pub cache: CacheConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keep_comments: false,
            isolated: false,
            concurrency: DEFAULT_CONCURRENCY,
            exclude: Vec::new(),
            cache: CacheConfig::default(),
        }
    }
}

/// Cache bounds
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct CacheConfig {
    /// Files whose declarations are retained (0 disables caching)
    pub capacity: usize,

    /// Compiled name patterns retained
    pub pattern_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
            pattern_capacity: DEFAULT_PATTERN_CAPACITY,
        }
    }
}

impl Config {
    /// Load configuration from dtscan.toml in the given root directory
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILE);

        if !config_path.exists() {
            return Self::default();
        }

        match Self::from_file(&config_path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{e}; using defaults");
                Self::default()
            }
        }
    }

    /// Parse a configuration file, reporting any failure
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|source| DtsError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Scan flags from this config
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            keep_comments: self.keep_comments,
            isolated: self.isolated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.exclude.is_empty());
        assert!(!config.keep_comments);
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(config.cache.capacity, DEFAULT_CACHE_CAPACITY);
        assert_eq!(config.scan_options(), ScanOptions::default());
    }

    #[test]
    fn test_load_missing_config() {
        let temp_dir = TempDir::new().unwrap();
        assert_eq!(Config::load(temp_dir.path()), Config::default());
    }

    #[test]
    fn test_load_full_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_content = r#"
keep_comments = true
isolated = true
concurrency = 2
exclude = ["**/*.test.ts", "legacy/**"]

[cache]
capacity = 16
pattern_capacity = 32
"#;
        fs::write(temp_dir.path().join(CONFIG_FILE), config_content).unwrap();

        let config = Config::load(temp_dir.path());
        assert!(config.keep_comments);
        assert!(config.isolated);
        assert_eq!(config.concurrency, 2);
        assert_eq!(config.exclude, vec!["**/*.test.ts", "legacy/**"]);
        assert_eq!(
            config.cache,
            CacheConfig {
                capacity: 16,
                pattern_capacity: 32
            }
        );
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILE), "[cache]\ncapacity = 0\n").unwrap();

        let config = Config::load(temp_dir.path());
        assert_eq!(config.cache.capacity, 0);
        assert_eq!(config.cache.pattern_capacity, DEFAULT_PATTERN_CAPACITY);
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
    }

    #[test]
    fn test_invalid_config_falls_back_to_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE);
        fs::write(&path, "concurrency = \"many\"").unwrap();

        assert!(matches!(
            Config::from_file(&path),
            Err(DtsError::Config { .. })
        ));
        assert_eq!(Config::load(temp_dir.path()), Config::default());
    }
}
