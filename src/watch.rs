//! File system watcher for rebuild on change.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Event Loop                              │
//! │                                                              │
//! │  ┌──────────┐    ┌──────────┐    ┌────────────────────────┐  │
//! │  │ notify   │───▶│ Debouncer│───▶│    handle_changes()    │  │
//! │  │ events   │    │ (300ms)  │    │                        │  │
//! │  └──────────┘    └──────────┘    │  kiln.toml → reload +  │  │
//! │                                  │              full build│  │
//! │                                  │  otherwise → WatchMap  │  │
//! │                                  │              stages    │  │
//! │                                  └────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rebuilds run on the watcher thread, one per debounced batch. A new batch
//! is not picked up until the current rebuild returns.

use crate::{
    build::{build_site, run_stages},
    compiler::watch::WatchMap,
    config::{SiteConfig, cfg, reload_config},
    log,
};
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;
use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

// =============================================================================
// Constants
// =============================================================================

const DEBOUNCE_MS: u64 = 300;
const REBUILD_COOLDOWN_MS: u64 = 800;

// =============================================================================
// Path Utilities
// =============================================================================

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

fn rel_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

// =============================================================================
// Debounce State
// =============================================================================

/// Batches rapid file events with debouncing and rebuild cooldown.
struct Debouncer {
    pending: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
    last_rebuild: Option<Instant>,
}

impl Debouncer {
    fn new() -> Self {
        Self {
            pending: FxHashSet::default(),
            last_event: None,
            last_rebuild: None,
        }
    }

    fn in_cooldown(&self) -> bool {
        self.last_rebuild
            .is_some_and(|t| t.elapsed() < Duration::from_millis(REBUILD_COOLDOWN_MS))
    }

    fn add(&mut self, event: Event) {
        for path in event.paths {
            if !is_temp_file(&path) {
                self.pending.insert(path);
            }
        }
        self.last_event = Some(Instant::now());
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty()
            && self
                .last_event
                .is_some_and(|t| t.elapsed() >= Duration::from_millis(DEBOUNCE_MS))
    }

    /// Drain the batch in a stable order.
    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        let mut paths: Vec<_> = self.pending.drain().collect();
        paths.sort();
        paths
    }

    fn mark_rebuild(&mut self) {
        self.last_rebuild = Some(Instant::now());
    }

    fn timeout(&self) -> Duration {
        if self.pending.is_empty() {
            Duration::from_secs(60)
        } else {
            Duration::from_millis(DEBOUNCE_MS)
        }
    }
}

// =============================================================================
// Event Handler
// =============================================================================

/// Full rebuild after a config change. Returns true on success.
fn try_full_rebuild(config: &SiteConfig) -> bool {
    match build_site(config) {
        Ok(()) => true,
        Err(e) => {
            log!("watch"; "full build failed");
            log!("watch"; "{e:#}");
            false
        }
    }
}

/// Process one batch. Returns true if a full rebuild ran (for cooldown).
fn handle_changes(paths: &[PathBuf]) -> bool {
    let config = cfg();
    if paths.is_empty() {
        return false;
    }

    if paths.iter().any(|p| p == &config.config_path) {
        match reload_config() {
            Ok(true) => log!("watch"; "config changed, rebuilding..."),
            Ok(false) => return false,
            Err(e) => {
                log!("watch"; "config not reloaded: {e:#}");
                return false;
            }
        }
        return try_full_rebuild(&cfg());
    }

    let map = match WatchMap::from_config(&config) {
        Ok(map) => map,
        Err(e) => {
            log!("watch"; "{e:#}");
            return false;
        }
    };
    let groups = map.plan(paths);
    if groups.is_empty() {
        return false;
    }

    let root = config.get_root();
    let changed: Vec<_> = paths.iter().map(|p| rel_path(p, root)).collect();
    let stages: Vec<_> = groups
        .iter()
        .map(|group| group.iter().map(|s| s.name()).collect::<Vec<_>>().join(" → "))
        .collect();
    log!("watch"; "{} changed, running {}", changed.join(", "), stages.join(", "));

    let report = run_stages(&groups, &config);
    if !report.is_ok() {
        log!("watch"; "{} files failed", report.failures.len());
    }
    eprintln!(); // Blank line to separate rebuild sessions

    false
}

// =============================================================================
// Watcher Setup
// =============================================================================

/// Paths to watch and how.
fn watched_paths(config: &SiteConfig) -> Vec<(PathBuf, RecursiveMode)> {
    let build = &config.build;
    [
        (&build.content, RecursiveMode::Recursive),
        (&build.templates, RecursiveMode::Recursive),
        (&build.assets, RecursiveMode::Recursive),
        (&build.uploads, RecursiveMode::Recursive),
        (&config.config_path, RecursiveMode::NonRecursive),
    ]
    .into_iter()
    .filter(|(path, _)| path.exists())
    .map(|(path, mode)| (path.clone(), mode))
    .collect()
}

fn setup_watchers(watcher: &mut impl Watcher, paths: &[(PathBuf, RecursiveMode)]) -> Result<()> {
    for (path, mode) in paths {
        watcher
            .watch(path, *mode)
            .with_context(|| format!("Failed to watch {}", path.display()))?;
    }
    Ok(())
}

/// Swap watched directories after a config reload moved them.
fn rewatch(watcher: &mut impl Watcher, old: &[(PathBuf, RecursiveMode)], new: &[(PathBuf, RecursiveMode)]) {
    for (path, _) in old {
        watcher.unwatch(path).ok();
    }
    if let Err(e) = setup_watchers(watcher, new) {
        log!("watch"; "{e:#}");
    }
}

const fn is_relevant(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    )
}

// =============================================================================
// Public API
// =============================================================================

/// Start blocking file watcher with debouncing and rebuild on change.
pub fn watch_for_changes_blocking() -> Result<()> {
    let config = cfg();
    if !config.serve.watch {
        return Ok(());
    }

    let (tx, rx) = std::sync::mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;

    let mut watched = watched_paths(&config);
    setup_watchers(&mut watcher, &watched)?;
    let root = config.get_root();
    let names: Vec<_> = watched.iter().map(|(p, _)| rel_path(p, root)).collect();
    log!("watch"; "watching {}", names.join(", "));
    eprintln!(); // Blank line to separate init logs from change events

    let mut debouncer = Debouncer::new();

    loop {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(event)) if is_relevant(&event) && !debouncer.in_cooldown() => {
                debouncer.add(event);
            }
            Ok(Err(e)) => log!("watch"; "error: {e}"),
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) if debouncer.ready() => {
                if handle_changes(&debouncer.take()) {
                    debouncer.mark_rebuild();

                    let now_watched = watched_paths(&cfg());
                    if now_watched != watched {
                        rewatch(&mut watcher, &watched, &now_watched);
                        watched = now_watched;
                    }
                }
            }
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
            // Other cases: irrelevant events, timeout without ready, etc.
            _ => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, ModifyKind};
    use std::fs;
    use tempfile::TempDir;

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        let mut event = Event::new(kind);
        for path in paths {
            event = event.add_path(PathBuf::from(path));
        }
        event
    }

    #[test]
    fn test_is_temp_file() {
        assert!(is_temp_file(Path::new("a.md~")));
        assert!(is_temp_file(Path::new(".a.md.swp")));
        assert!(is_temp_file(Path::new("dir/4913.tmp")));
        assert!(!is_temp_file(Path::new("content/a.md")));
    }

    #[test]
    fn test_is_relevant() {
        assert!(is_relevant(&event(EventKind::Create(CreateKind::File), &[])));
        assert!(is_relevant(&event(EventKind::Modify(ModifyKind::Any), &[])));
        assert!(!is_relevant(&event(EventKind::Access(AccessKind::Any), &[])));
    }

    #[test]
    fn test_debouncer_batches_and_filters() {
        let mut debouncer = Debouncer::new();
        assert!(!debouncer.ready());
        assert_eq!(debouncer.timeout(), Duration::from_secs(60));

        debouncer.add(event(
            EventKind::Modify(ModifyKind::Any),
            &["/s/content/b.md", "/s/content/a.md", "/s/content/a.md~"],
        ));
        debouncer.add(event(EventKind::Modify(ModifyKind::Any), &["/s/content/a.md"]));
        assert_eq!(debouncer.timeout(), Duration::from_millis(DEBOUNCE_MS));

        let batch = debouncer.take();
        assert_eq!(
            batch,
            [PathBuf::from("/s/content/a.md"), PathBuf::from("/s/content/b.md")]
        );
        assert!(!debouncer.ready());
    }

    #[test]
    fn test_debouncer_cooldown() {
        let mut debouncer = Debouncer::new();
        assert!(!debouncer.in_cooldown());
        debouncer.mark_rebuild();
        assert!(debouncer.in_cooldown());
    }

    #[test]
    fn test_watched_paths_skip_missing() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("content")).unwrap();
        fs::write(dir.path().join("kiln.toml"), "").unwrap();

        let mut config = SiteConfig::default();
        config.build.content = dir.path().join("content");
        config.build.templates = dir.path().join("templates");
        config.build.assets = dir.path().join("assets");
        config.build.uploads = dir.path().join("uploads");
        config.config_path = dir.path().join("kiln.toml");

        let paths = watched_paths(&config);
        assert_eq!(
            paths,
            [
                (dir.path().join("content"), RecursiveMode::Recursive),
                (dir.path().join("kiln.toml"), RecursiveMode::NonRecursive),
            ]
        );
    }
}
