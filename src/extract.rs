//! @dose
//! purpose: The cache-wrapped entry points. An Extractor owns the declaration cache and the
//!     name pattern cache; extract() fingerprints the source, returns the cached list on a
//!     hit and scans on a miss. batch_extract() processes files in fixed-size windows, each
//!     window scanned in parallel before the next one starts.
//!
//! when-editing:
//!     - !Each cache is locked around its own read-check-insert sequence, never across a scan
//!     - !Results are shared as Arc<[Declaration]>; callers must not expect owned copies
//!     - A poisoned lock is recovered; the caches hold no invariants a panic can break
//!
//! invariants:
//!     - An unchanged (file, options, source) triple never rescans
//!     - A changed source for the same file always rescans
//!
//! gotchas:
//!     - Two threads missing on the same file may both scan it; the later store wins and
//!       both results are identical
//!     - batch_extract keys results by path; a duplicated path keeps its last result

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::{fingerprint, CacheStats, DeclarationCache, DEFAULT_CACHE_CAPACITY};
use crate::resolve::{PatternCache, DEFAULT_PATTERN_CAPACITY};
use crate::scanner::{scan_with, ScanOptions};
use crate::types::Declaration;

/// Default number of files scanned per window
pub const DEFAULT_CONCURRENCY: usize = 8;

/// One input to batch_extract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// File identity used as the cache and result key
    pub path: String,
    pub content: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug)]
pub struct Extractor {
    cache: Mutex<DeclarationCache>,
    patterns: Mutex<PatternCache>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY, DEFAULT_PATTERN_CAPACITY)
    }
}

impl Extractor {
    pub fn new(cache_capacity: usize, pattern_capacity: usize) -> Self {
        Self {
            cache: Mutex::new(DeclarationCache::new(cache_capacity)),
            patterns: Mutex::new(PatternCache::new(pattern_capacity)),
        }
    }

    fn cache(&self) -> MutexGuard<'_, DeclarationCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Public declarations of `source`, served from the cache when unchanged
    pub fn extract(&self, file: &str, source: &str, options: ScanOptions) -> Arc<[Declaration]> {
        let fingerprint = fingerprint(source);
        if let Some(cached) = self.cache().lookup(file, options, fingerprint) {
            debug!(file, "cache hit");
            return cached;
        }
        debug!(file, "cache miss");
        let declarations = scan_with(source, file, options, &self.patterns);
        self.cache().store(file, options, fingerprint, declarations)
    }

    /// Extract many files, at most `concurrency` at a time
    pub fn batch_extract(
        &self,
        files: &[SourceFile],
        options: ScanOptions,
        concurrency: usize,
    ) -> HashMap<String, Arc<[Declaration]>> {
        let window = concurrency.max(1);
        let mut results = HashMap::with_capacity(files.len());
        for chunk in files.chunks(window) {
            let scanned: Vec<(String, Arc<[Declaration]>)> = chunk
                .par_iter()
                .map(|file| {
                    (
                        file.path.clone(),
                        self.extract(&file.path, &file.content, options),
                    )
                })
                .collect();
            results.extend(scanned);
        }
        debug!(files = files.len(), window, "batch extracted");
        results
    }

    pub fn stats(&self) -> CacheStats {
        self.cache().stats()
    }

    /// Drop every cached declaration list
    pub fn clear(&self) {
        self.cache().clear();
    }
}
