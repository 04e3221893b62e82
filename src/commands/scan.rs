//! @dose
//! purpose: Implements the scan command, which collects TypeScript sources, extracts their
//!     declaration-only surface through one Extractor and prints it. Text output is a
//!     `// <path>` header per file followed by its declaration texts; JSON output maps each
//!     path to its declaration records.
//!
//! when-editing:
//!     - !Nothing is written to disk; all output goes to stdout
//!     - !Paths in the output are relative to the root with forward slashes
//!     - A file that cannot be read is reported and counted, the rest still print
//!
//! invariants:
//!     - Files print in sorted path order regardless of scan order
//!     - The process fails when any file failed to read
//!
//! flows:
//!     - Collect: walk the requested paths through the exclusion rules
//!     - Extract: read sources, batch_extract in windows of --concurrency
//!     - Report: format text or JSON in path order

use crate::cli::ScanArgs;
use crate::config::Config;
use crate::exclusion::collect_source_files;
use crate::extract::{Extractor, SourceFile};
use crate::types::Declaration;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

pub fn run_scan(args: &ScanArgs, root: &Path, verbose: bool) -> Result<()> {
    let config = Config::load(root);
    let options = args.common.scan_options(&config);
    let exclusion = args.common.exclusion_config(&config.exclude);
    let paths = collect_source_files(root, &args.paths, &exclusion)
        .context("Failed to collect source files")?;

    let (files, errors) = read_sources(root, &paths);
    let extractor = Extractor::new(config.cache.capacity, config.cache.pattern_capacity);
    let concurrency = args.concurrency.unwrap_or(config.concurrency);
    let results = extractor.batch_extract(&files, options, concurrency);

    let report = if args.json {
        format_json(&files, &results)?
    } else {
        format_text(&files, &results)
    };
    print!("{report}");

    if verbose {
        let declarations: usize = results.values().map(|d| d.len()).sum();
        eprintln!(
            "Scanned: {}, Declarations: {}, Errors: {}",
            files.len(),
            declarations,
            errors
        );
    }
    debug!(files = files.len(), errors, "scan finished");

    if errors > 0 {
        anyhow::bail!("{} files failed to read", errors);
    }

    Ok(())
}

/// Read every path into a SourceFile keyed by its root-relative path
pub(crate) fn read_sources(root: &Path, paths: &[PathBuf]) -> (Vec<SourceFile>, usize) {
    let mut files = Vec::with_capacity(paths.len());
    let mut errors = 0;
    for path in paths {
        match fs::read_to_string(path) {
            Ok(content) => files.push(SourceFile::new(relative_path(root, path), content)),
            Err(e) => {
                eprintln!("Error reading {}: {}", path.display(), e);
                errors += 1;
            }
        }
    }
    (files, errors)
}

/// `path` relative to `root`, with forward slashes
pub(crate) fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// One file's declarations as printed by the text report
pub(crate) fn format_file(path: &str, declarations: &[Declaration]) -> String {
    let mut out = format!("// {path}\n");
    for decl in declarations {
        out.push_str(&decl.text);
        out.push('\n');
    }
    out
}

pub fn format_text(files: &[SourceFile], results: &HashMap<String, Arc<[Declaration]>>) -> String {
    let mut paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
    paths.sort_unstable();
    paths.dedup();
    paths
        .into_iter()
        .filter_map(|path| Some(format_file(path, results.get(path)?)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_json(
    files: &[SourceFile],
    results: &HashMap<String, Arc<[Declaration]>>,
) -> Result<String> {
    let mut map = serde_json::Map::new();
    for file in files {
        if let Some(declarations) = results.get(&file.path) {
            map.insert(file.path.clone(), serde_json::to_value(&**declarations)?);
        }
    }
    let mut json = serde_json::to_string_pretty(&serde_json::Value::Object(map))?;
    json.push('\n');
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::ScanOptions;

    fn extract(files: &[SourceFile]) -> HashMap<String, Arc<[Declaration]>> {
        Extractor::default().batch_extract(files, ScanOptions::default(), 2)
    }

    #[test]
    fn test_format_text_orders_by_path() {
        let files = vec![
            SourceFile::new("src/b.ts", "export type B = 1"),
            SourceFile::new("src/a.ts", "export const a = 1\nexport function f() {}"),
        ];
        let results = extract(&files);
        assert_eq!(
            format_text(&files, &results),
            "// src/a.ts\nexport declare const a: 1;\nexport declare function f(): void;\n\n// src/b.ts\nexport type B = 1;\n"
        );
    }

    #[test]
    fn test_format_json_maps_paths_to_records() {
        let files = vec![SourceFile::new("x.ts", "export interface X { id: number }")];
        let results = extract(&files);
        let json: serde_json::Value = serde_json::from_str(&format_json(&files, &results).unwrap()).unwrap();
        let records = json["x.ts"].as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["kind"], "interface");
        assert_eq!(records[0]["name"], "X");
        assert_eq!(records[0]["text"], "export declare interface X {\n  id: number\n}");
    }

    #[test]
    fn test_relative_path_uses_forward_slashes() {
        let root = Path::new("/project");
        assert_eq!(relative_path(root, Path::new("/project/src/a.ts")), "src/a.ts");
        assert_eq!(relative_path(root, Path::new("/elsewhere/b.ts")), "/elsewhere/b.ts");
    }

    #[test]
    fn test_read_sources_counts_failures() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let good = temp_dir.path().join("good.ts");
        fs::write(&good, "export const g = 1").unwrap();
        let missing = temp_dir.path().join("missing.ts");

        let (files, errors) = read_sources(temp_dir.path(), &[good, missing]);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "good.ts");
        assert_eq!(errors, 1);
    }
}
