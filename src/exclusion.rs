//! @dose
//! purpose: Source-file discovery for the CLI. Walks the requested paths with gitignore
//!     support, applies the default and user exclusions, and keeps TypeScript sources that
//!     are not already declaration files.
//!
//! when-editing:
//!     - !Override patterns use the ! prefix to negate (exclude), so user patterns get one
//!     - The ignore crate handles gitignore parsing automatically
//!     - Patterns come from the dtscan.toml exclude array and CLI --exclude flags
//!
//! invariants:
//!     - Default exclusions (node_modules, .git, etc.) are always applied
//!     - `.d.ts`, `.d.mts` and `.d.cts` files are never collected
//!     - The returned list is sorted and free of duplicates
//!
//! do-not:
//!     - Never remove default exclusions without explicit user override
//!
//! gotchas:
//!     - The ignore crate's override patterns are inclusive by default, so we negate them
//!     - Explicit file arguments bypass the walker but not the extension check

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{DtsError, Result};

/// Configuration for file exclusion during directory walking
#[derive(Debug, Clone)]
pub struct ExclusionConfig {
    /// Glob patterns to exclude (from dtscan.toml and --exclude flags)
    pub patterns: Vec<String>,
    /// Whether to respect .gitignore files (default: true)
    pub respect_gitignore: bool,
}

impl Default for ExclusionConfig {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            respect_gitignore: true,
        }
    }
}

/// Default directories that are always excluded
const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    "out",
    "coverage",
    ".next",
    ".nuxt",
    ".turbo",
    ".yarn",
];

/// Extensions of scannable TypeScript sources
const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts"];

/// Build a WalkBuilder with the given exclusion configuration
pub fn build_walker(root: &Path, config: &ExclusionConfig) -> Result<WalkBuilder> {
    let mut builder = WalkBuilder::new(root);

    builder.git_ignore(config.respect_gitignore);
    builder.git_global(config.respect_gitignore);
    builder.git_exclude(config.respect_gitignore);
    builder.hidden(false);

    let mut overrides = OverrideBuilder::new(root);
    for dir in DEFAULT_EXCLUDED_DIRS {
        let _ = overrides.add(&format!("!{dir}/**"));
        let _ = overrides.add(&format!("!{dir}"));
    }
    for pattern in &config.patterns {
        overrides
            .add(&format!("!{pattern}"))
            .map_err(|e| DtsError::Pattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
    }
    let built = overrides.build().map_err(|e| DtsError::Pattern {
        pattern: config.patterns.join(", "),
        message: e.to_string(),
    })?;
    builder.overrides(built);

    Ok(builder)
}

/// Build a GlobSet from patterns for filtering explicit file arguments
pub fn build_exclude_globset(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| DtsError::Pattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
        builder.add(glob);
    }

    builder.build().map(Some).map_err(|e| DtsError::Pattern {
        pattern: patterns.join(", "),
        message: e.to_string(),
    })
}

/// Check if a directory name should be excluded by default
pub fn is_default_excluded_dir(name: &str) -> bool {
    DEFAULT_EXCLUDED_DIRS.contains(&name)
}

/// Whether `path` is a TypeScript source that is not itself a declaration file
pub fn is_source_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let Some((stem, ext)) = name.rsplit_once('.') else {
        return false;
    };
    SOURCE_EXTENSIONS.contains(&ext) && !stem.ends_with(".d")
}

/// Collect the source files under `paths` (relative to `root`), or under `root` itself
pub fn collect_source_files(
    root: &Path,
    paths: &[PathBuf],
    config: &ExclusionConfig,
) -> Result<Vec<PathBuf>> {
    let search_paths = if paths.is_empty() {
        vec![root.to_path_buf()]
    } else {
        paths.iter().map(|p| root.join(p)).collect()
    };
    let globset = build_exclude_globset(&config.patterns)?;

    let mut files = Vec::new();
    for search_path in search_paths {
        if search_path.is_file() {
            let relative = search_path.strip_prefix(root).unwrap_or(&search_path);
            let excluded = globset.as_ref().is_some_and(|set| set.is_match(relative));
            if is_source_file(&search_path) && !excluded {
                files.push(search_path);
            }
        } else if search_path.is_dir() {
            let walker = build_walker(&search_path, config)?;
            for entry in walker.build().filter_map(|e| e.ok()) {
                let entry_path = entry.path();
                if entry_path.is_file() && is_source_file(entry_path) {
                    files.push(entry_path.to_path_buf());
                }
            }
        } else {
            debug!(path = %search_path.display(), "path does not exist, skipped");
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "export const a = 1").unwrap();
    }

    fn names(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_default_excluded_dirs() {
        assert!(is_default_excluded_dir("node_modules"));
        assert!(is_default_excluded_dir(".git"));
        assert!(is_default_excluded_dir("dist"));
        assert!(!is_default_excluded_dir("src"));
    }

    #[test]
    fn test_is_source_file() {
        assert!(is_source_file(Path::new("src/main.ts")));
        assert!(is_source_file(Path::new("App.tsx")));
        assert!(is_source_file(Path::new("esm.mts")));
        assert!(is_source_file(Path::new("cjs.cts")));
        assert!(!is_source_file(Path::new("types.d.ts")));
        assert!(!is_source_file(Path::new("types.d.mts")));
        assert!(!is_source_file(Path::new("main.js")));
        assert!(!is_source_file(Path::new("ts")));
    }

    #[test]
    fn test_build_exclude_globset() {
        assert!(build_exclude_globset(&[]).unwrap().is_none());

        let patterns = vec!["*.test.ts".to_string(), "docs/**".to_string()];
        let globset = build_exclude_globset(&patterns).unwrap().unwrap();
        assert!(globset.is_match("foo.test.ts"));
        assert!(globset.is_match("docs/readme.md"));
        assert!(!globset.is_match("main.ts"));

        let invalid = vec!["src/[".to_string()];
        assert!(matches!(
            build_exclude_globset(&invalid),
            Err(DtsError::Pattern { .. })
        ));
    }

    #[test]
    fn test_collect_skips_declarations_and_default_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "src/a.ts");
        write(root, "src/b.tsx");
        write(root, "src/types.d.ts");
        write(root, "src/readme.md");
        write(root, "node_modules/pkg/index.ts");
        write(root, "dist/out.ts");

        let files = collect_source_files(root, &[], &ExclusionConfig::default()).unwrap();
        assert_eq!(names(root, &files), vec!["src/a.ts", "src/b.tsx"]);
    }

    #[test]
    fn test_collect_applies_user_patterns() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "main.ts");
        write(root, "main.test.ts");
        write(root, "legacy/old.ts");

        let config = ExclusionConfig {
            patterns: vec!["*.test.ts".to_string(), "legacy/**".to_string()],
            respect_gitignore: true,
        };
        let files = collect_source_files(root, &[], &config).unwrap();
        assert_eq!(names(root, &files), vec!["main.ts"]);

        // Explicit files go through the same patterns
        let explicit = [PathBuf::from("main.test.ts"), PathBuf::from("main.ts")];
        let files = collect_source_files(root, &explicit, &config).unwrap();
        assert_eq!(names(root, &files), vec!["main.ts"]);
    }

    #[test]
    fn test_gitignore_respected() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join(".git")).unwrap();
        fs::write(root.join(".gitignore"), "ignored_dir/\n").unwrap();
        write(root, "ignored_dir/file.ts");
        write(root, "main.ts");

        let files = collect_source_files(root, &[], &ExclusionConfig::default()).unwrap();
        assert_eq!(names(root, &files), vec!["main.ts"]);

        let config = ExclusionConfig {
            patterns: vec![],
            respect_gitignore: false,
        };
        let files = collect_source_files(root, &[], &config).unwrap();
        assert_eq!(names(root, &files), vec!["ignored_dir/file.ts", "main.ts"]);
    }
}
