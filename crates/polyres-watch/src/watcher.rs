//! Config file watcher.
//!
//! Watches the project root and the directory of every `extends` parent
//! (non-recursively) and reloads path mappings when a JSON file there changes.

use notify::{
    event::{ModifyKind, RenameMode},
    Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode,
    Watcher as NotifyWatcher,
};
use polyres_core::tsconfig::{config_sources, PathMappingStore};
use polyres_core::Config;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Event coalescing window.
const COALESCE_WINDOW_MS: u64 = 50;

/// Watcher event for internal processing.
#[derive(Debug, Clone)]
pub struct WatchEvent {
    /// Paths that changed.
    pub paths: Vec<PathBuf>,
    /// Kind of change.
    pub kind: WatchEventKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEventKind {
    Create,
    Modify,
    Remove,
    Other,
}

impl From<&EventKind> for WatchEventKind {
    fn from(kind: &EventKind) -> Self {
        match kind {
            EventKind::Create(_) => Self::Create,
            EventKind::Modify(_) => Self::Modify,
            EventKind::Remove(_) => Self::Remove,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WatchError {
    #[error("watcher is already running")]
    AlreadyRunning,

    #[error("watcher is not running")]
    NotRunning,

    #[error("invalid watch root: {0}")]
    InvalidRoot(PathBuf),

    #[error("no tokio runtime available to process watch events")]
    NoRuntime,

    #[error("watcher failed: {0}")]
    WatcherFailed(String),
}

/// Counters shared with the consumer task.
#[derive(Debug, Default)]
struct ReloadStats {
    reloads: AtomicU64,
    /// Timestamp of the last reload (ms since Unix epoch). Updated after the swap.
    last_reload_unix_ms: AtomicU64,
}

/// The notify watcher and the `extends` directories it watches besides the root.
#[derive(Debug, Default)]
struct WatchSet {
    watcher: Option<RecommendedWatcher>,
    extends_dirs: HashSet<PathBuf>,
}

/// Watches path-mapping sources and swaps the store snapshot on change.
#[derive(Debug)]
pub struct ConfigWatcher {
    root: PathBuf,
    store: Arc<PathMappingStore>,
    running: AtomicBool,
    stats: Arc<ReloadStats>,
    watch_set: Arc<Mutex<WatchSet>>,
    event_tx: Mutex<Option<mpsc::UnboundedSender<WatchEvent>>>,
}

impl ConfigWatcher {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, store: Arc<PathMappingStore>) -> Self {
        Self {
            root: root.into(),
            store,
            running: AtomicBool::new(false),
            stats: Arc::new(ReloadStats::default()),
            watch_set: Arc::new(Mutex::new(WatchSet::default())),
            event_tx: Mutex::new(None),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store(&self) -> &Arc<PathMappingStore> {
        &self.store
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Number of reloads performed since creation.
    pub fn reload_count(&self) -> u64 {
        self.stats.reloads.load(Ordering::Relaxed)
    }

    pub fn last_reload_unix_ms(&self) -> Option<u64> {
        match self.stats.last_reload_unix_ms.load(Ordering::Relaxed) {
            0 => None,
            ts => Some(ts),
        }
    }

    /// Directories outside the root watched for `extends` parents.
    pub fn extends_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self
            .watch_set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extends_dirs
            .iter()
            .cloned()
            .collect();
        dirs.sort();
        dirs
    }

    /// Reload synchronously, bypassing the file system events.
    ///
    /// Returns whether path mapping is enabled afterwards.
    pub fn reload_now(&self) -> bool {
        reload(&self.root, &self.store, &self.stats)
    }

    /// Start watching. Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The watcher is already running
    /// - The root is not a directory
    /// - No tokio runtime is available
    /// - The notify watcher cannot be created
    pub fn start(&self) -> Result<(), WatchError> {
        if self.running.load(Ordering::Relaxed) {
            return Err(WatchError::AlreadyRunning);
        }
        if !self.root.is_dir() {
            return Err(WatchError::InvalidRoot(self.root.clone()));
        }
        let handle = tokio::runtime::Handle::try_current().map_err(|_| WatchError::NoRuntime)?;

        let (tx, mut rx) = mpsc::unbounded_channel::<WatchEvent>();
        let tx_clone = tx.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| match res {
                Ok(event) => {
                    if should_process_event(&event) {
                        let watch_event = WatchEvent {
                            paths: event.paths.clone(),
                            kind: WatchEventKind::from(&event.kind),
                        };
                        if let Err(e) = tx_clone.send(watch_event) {
                            warn!(error = %e, "Failed to send watch event");
                        }
                    }
                }
                Err(e) => {
                    error!(error = %e, "Watch error");
                }
            },
            NotifyConfig::default().with_poll_interval(Duration::from_secs(2)),
        )
        .map_err(|e| WatchError::WatcherFailed(e.to_string()))?;

        watcher
            .watch(&self.root, RecursiveMode::NonRecursive)
            .map_err(|e| WatchError::WatcherFailed(e.to_string()))?;
        info!(root = %self.root.display(), "Watching path-mapping config");

        let root = dunce::canonicalize(&self.root).unwrap_or_else(|_| self.root.clone());
        {
            let mut watch_set = self.watch_set.lock().unwrap_or_else(PoisonError::into_inner);
            watch_set.watcher = Some(watcher);
            sync_extends_dirs(&root, &mut watch_set);
        }
        *self.event_tx.lock().unwrap_or_else(PoisonError::into_inner) = Some(tx);
        self.running.store(true, Ordering::Relaxed);

        let store = Arc::clone(&self.store);
        let stats = Arc::clone(&self.stats);
        let watch_set = Arc::clone(&self.watch_set);
        handle.spawn(async move {
            process_events(&mut rx, &root, &store, &stats, &watch_set).await;
        });

        Ok(())
    }

    /// Stop watching. The consumer task exits once the channel drains.
    ///
    /// # Errors
    /// Returns an error if the watcher is not running.
    pub fn stop(&self) -> Result<(), WatchError> {
        if !self.running.load(Ordering::Relaxed) {
            return Err(WatchError::NotRunning);
        }

        *self.watch_set.lock().unwrap_or_else(PoisonError::into_inner) = WatchSet::default();
        *self.event_tx.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.running.store(false, Ordering::Relaxed);

        info!("Config watcher stopped");
        Ok(())
    }
}

impl Drop for ConfigWatcher {
    fn drop(&mut self) {
        if self.is_running() {
            let _ = self.stop();
        }
    }
}

/// Start a watcher when the session calls for one.
///
/// Returns `Ok(None)` for export or non-interactive sessions and when path
/// mapping is disabled.
///
/// # Errors
/// See [`ConfigWatcher::start`].
pub fn start_path_mapping_watch(
    config: &Config,
    store: Arc<PathMappingStore>,
) -> Result<Option<ConfigWatcher>, WatchError> {
    if !config.should_watch_path_mappings() {
        debug!(
            exporting = config.exporting,
            interactive = config.interactive,
            "Path-mapping hot reload disabled"
        );
        return Ok(None);
    }
    let watcher = ConfigWatcher::new(&config.project_root, store);
    watcher.start()?;
    Ok(Some(watcher))
}

fn reload(root: &Path, store: &PathMappingStore, stats: &ReloadStats) -> bool {
    let enabled = store.reload_from(root);
    #[allow(clippy::cast_possible_truncation)]
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    stats.reloads.fetch_add(1, Ordering::Relaxed);
    stats.last_reload_unix_ms.store(now, Ordering::Relaxed);
    info!(
        enabled,
        generation = store.generation(),
        "Reloaded path mappings"
    );
    enabled
}

/// Watch the directory of every `extends` parent outside `root` and drop
/// directories the chain no longer reaches.
fn sync_extends_dirs(root: &Path, watch_set: &mut WatchSet) {
    let wanted: HashSet<PathBuf> = config_sources(root)
        .iter()
        .filter_map(|file| file.parent())
        .filter_map(|dir| dunce::canonicalize(dir).ok())
        .filter(|dir| dir != root)
        .collect();

    let WatchSet {
        watcher,
        extends_dirs,
    } = watch_set;
    let Some(watcher) = watcher.as_mut() else {
        return;
    };

    for dir in extends_dirs.difference(&wanted) {
        if let Err(e) = watcher.unwatch(dir) {
            debug!(dir = %dir.display(), error = %e, "Failed to unwatch extends directory");
        }
    }
    extends_dirs.retain(|dir| wanted.contains(dir));

    for dir in wanted {
        if extends_dirs.contains(&dir) {
            continue;
        }
        match watcher.watch(&dir, RecursiveMode::NonRecursive) {
            Ok(()) => {
                debug!(dir = %dir.display(), "Watching extends directory");
                extends_dirs.insert(dir);
            }
            Err(e) => warn!(dir = %dir.display(), error = %e, "Failed to watch extends directory"),
        }
    }
}

/// Coalesce events and reload once per quiet window.
async fn process_events(
    rx: &mut mpsc::UnboundedReceiver<WatchEvent>,
    root: &Path,
    store: &PathMappingStore,
    stats: &ReloadStats,
    watch_set: &Mutex<WatchSet>,
) {
    let mut pending_paths: HashSet<PathBuf> = HashSet::new();
    let mut last_event_time = Instant::now();

    loop {
        let timeout =
            tokio::time::timeout(Duration::from_millis(COALESCE_WINDOW_MS), rx.recv()).await;

        match timeout {
            Ok(Some(event)) => {
                pending_paths.extend(event.paths.into_iter().filter(|p| is_config_file(p)));
                last_event_time = Instant::now();
            }
            Ok(None) => {
                debug!("Watch event channel closed");
                break;
            }
            Err(_) => {
                if !pending_paths.is_empty()
                    && last_event_time.elapsed() >= Duration::from_millis(COALESCE_WINDOW_MS)
                {
                    for path in &pending_paths {
                        debug!(path = %path.display(), "Config changed");
                    }
                    pending_paths.clear();
                    reload(root, store, stats);
                    // The chain may now reach different parents.
                    sync_extends_dirs(
                        root,
                        &mut watch_set.lock().unwrap_or_else(PoisonError::into_inner),
                    );
                }
            }
        }
    }
}

/// Only config directories are watched, and any JSON file in them may be
/// part of the `extends` chain.
fn is_config_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

fn should_process_event(event: &Event) -> bool {
    match &event.kind {
        EventKind::Create(_) | EventKind::Remove(_) => true,
        EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any) => true,
        EventKind::Modify(ModifyKind::Name(
            RenameMode::To | RenameMode::From | RenameMode::Both | RenameMode::Any,
        )) => true,
        _ => false,
    }
}
