//! @dose
//! purpose: Implements the watch command that monitors TypeScript sources and prints the
//!     declaration surface of each file that changes. All extraction goes through one
//!     long-lived Extractor, so a save that leaves the content unchanged is a cache hit.
//!
//! when-editing:
//!     - !Debouncing is critical for handling rapid file changes (IDE saves)
//!     - !A dtscan.toml change reloads the config and rescans everything
//!     - Uses notify crate for cross-platform file system watching
//!
//! invariants:
//!     - The initial full scan completes before watching starts
//!     - Only files accepted by the exclusion rules are reported
//!
//! flows:
//!     - Initial: collect, batch_extract, print
//!     - Watch: receive notify events, coalesce per path, wait for the debounce window
//!     - Update: re-extract created/modified files, report deletions

use crate::cli::WatchArgs;
use crate::commands::scan::{format_file, format_text, read_sources, relative_path};
use crate::config::{Config, CONFIG_FILE};
use crate::exclusion::{
    build_exclude_globset, collect_source_files, is_default_excluded_dir, is_source_file,
    ExclusionConfig,
};
use crate::extract::Extractor;
use crate::scanner::ScanOptions;
use anyhow::{Context, Result};
use globset::GlobSet;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// The kind of change detected for a file
#[derive(Clone, Copy, PartialEq, Debug)]
enum ChangeKind {
    Create,
    Modify,
    Delete,
}

/// Settings derived from the config file and flags; rebuilt when the config changes
struct WatchState {
    options: ScanOptions,
    concurrency: usize,
    exclusion: ExclusionConfig,
    excluded: Option<GlobSet>,
}

impl WatchState {
    fn load(args: &WatchArgs, root: &Path) -> Result<(Self, Config)> {
        let config = Config::load(root);
        let exclusion = args.common.exclusion_config(&config.exclude);
        let state = Self {
            options: args.common.scan_options(&config),
            concurrency: config.concurrency,
            excluded: build_exclude_globset(&exclusion.patterns)?,
            exclusion,
        };
        Ok((state, config))
    }

    fn accepts(&self, root: &Path, path: &Path) -> bool {
        let relative = path.strip_prefix(root).unwrap_or(path);
        is_source_file(path)
            && !relative.components().any(|c| {
                c.as_os_str()
                    .to_str()
                    .is_some_and(is_default_excluded_dir)
            })
            && !self.excluded.as_ref().is_some_and(|set| set.is_match(relative))
    }
}

pub fn run_watch(args: &WatchArgs, root: &Path, verbose: bool) -> Result<()> {
    let (mut state, config) = WatchState::load(args, root)?;
    let extractor = Extractor::new(config.cache.capacity, config.cache.pattern_capacity);

    println!("Running initial scan...");
    scan_all(args, root, &state, &extractor)?;

    let (tx, rx) = mpsc::channel();
    let mut watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.send(event);
            }
        },
        notify::Config::default(),
    )?;

    let watch_paths = if args.paths.is_empty() {
        vec![root.to_path_buf()]
    } else {
        args.paths.iter().map(|p| root.join(p)).collect()
    };
    for path in &watch_paths {
        watcher
            .watch(path, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch {}", path.display()))?;
        if verbose {
            println!("Watching: {}", path.display());
        }
    }

    println!("Watching for changes... (press Ctrl+C to stop)");

    let mut pending: HashMap<PathBuf, ChangeKind> = HashMap::new();
    let mut last_event = Instant::now();
    let debounce = Duration::from_millis(args.debounce);
    let poll_interval = Duration::from_millis(50);

    loop {
        match rx.recv_timeout(poll_interval) {
            Ok(event) => {
                process_event(&event, &mut pending, root, &state);
                last_event = Instant::now();
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                if !pending.is_empty() && last_event.elapsed() >= debounce {
                    if args.clear {
                        print!("\x1B[2J\x1B[1;1H");
                    }
                    if pending.contains_key(&root.join(CONFIG_FILE)) {
                        pending.clear();
                        println!("Config changed, rescanning...");
                        match WatchState::load(args, root) {
                            Ok((reloaded, _)) => state = reloaded,
                            Err(e) => warn!("{e:#}; keeping previous settings"),
                        }
                        if let Err(e) = scan_all(args, root, &state, &extractor) {
                            eprintln!("Error: {e:#}");
                        }
                        continue;
                    }
                    process_pending_changes(&mut pending, root, &state, &extractor);
                }
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                println!("Watcher disconnected");
                break;
            }
        }
    }

    Ok(())
}

fn scan_all(args: &WatchArgs, root: &Path, state: &WatchState, extractor: &Extractor) -> Result<()> {
    let paths = collect_source_files(root, &args.paths, &state.exclusion)
        .context("Failed to collect source files")?;
    let (files, errors) = read_sources(root, &paths);
    let results = extractor.batch_extract(&files, state.options, state.concurrency);
    print!("{}", format_text(&files, &results));
    if errors > 0 {
        eprintln!("{errors} files failed to read");
    }
    Ok(())
}

/// Record a notify event in `pending`, coalescing repeated events per path
fn process_event(
    event: &Event,
    pending: &mut HashMap<PathBuf, ChangeKind>,
    root: &Path,
    state: &WatchState,
) {
    let kind = match &event.kind {
        EventKind::Create(_) => ChangeKind::Create,
        EventKind::Modify(_) => ChangeKind::Modify,
        EventKind::Remove(_) => ChangeKind::Delete,
        _ => return,
    };

    for path in &event.paths {
        let is_config = path.file_name().is_some_and(|n| n == CONFIG_FILE);
        if !is_config && !state.accepts(root, path) {
            continue;
        }
        pending
            .entry(path.clone())
            .and_modify(|existing| *existing = coalesce(*existing, kind))
            .or_insert(kind);
    }
}

/// Create + Modify = Create, anything + Delete = Delete
fn coalesce(existing: ChangeKind, new: ChangeKind) -> ChangeKind {
    match (existing, new) {
        (ChangeKind::Create, ChangeKind::Modify) => ChangeKind::Create,
        (_, new) => new,
    }
}

fn process_pending_changes(
    pending: &mut HashMap<PathBuf, ChangeKind>,
    root: &Path,
    state: &WatchState,
    extractor: &Extractor,
) {
    let mut changes: Vec<_> = pending.drain().collect();
    changes.sort_by(|a, b| a.0.cmp(&b.0));
    let timestamp = chrono_lite_timestamp();

    for (path, kind) in changes {
        let rel_path = relative_path(root, &path);
        match kind {
            ChangeKind::Delete => println!("[{}] Deleted: {}", timestamp, rel_path),
            ChangeKind::Create | ChangeKind::Modify => {
                let source = match fs::read_to_string(&path) {
                    Ok(source) => source,
                    Err(e) => {
                        eprintln!("Error reading {}: {}", path.display(), e);
                        continue;
                    }
                };
                let action = if kind == ChangeKind::Create {
                    "Created"
                } else {
                    "Modified"
                };
                println!("[{}] {}: {}", timestamp, action, rel_path);
                let declarations = extractor.extract(&rel_path, &source, state.options);
                print!("{}", format_file(&rel_path, &declarations));
            }
        }
    }
    debug!(stats = ?extractor.stats(), "changes processed");
}

fn chrono_lite_timestamp() -> String {
    use std::time::SystemTime;
    let duration = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default();
    let secs = duration.as_secs();
    let hours = (secs / 3600) % 24;
    let mins = (secs / 60) % 60;
    let secs = secs % 60;
    format!("{:02}:{:02}:{:02}", hours, mins, secs)
}
