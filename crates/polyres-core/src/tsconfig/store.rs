//! Hot-swappable path-mapping snapshot.

use super::{load_path_mappings, PathMappingConfig};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

/// Current path-mapping configuration.
///
/// Readers take an `Arc` snapshot and never observe a half-applied reload.
/// Every replacement bumps [`PathMappingStore::generation`].
#[derive(Debug, Default)]
pub struct PathMappingStore {
    current: RwLock<Option<Arc<PathMappingConfig>>>,
    generation: AtomicU64,
}

impl PathMappingStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with a configuration.
    #[must_use]
    pub fn with_config(config: Option<PathMappingConfig>) -> Self {
        let store = Self::new();
        store.replace(config);
        store
    }

    /// Current snapshot (`None` while path mapping is disabled).
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<PathMappingConfig>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the snapshot. Inactive configs disable path mapping.
    pub fn replace(&self, config: Option<PathMappingConfig>) {
        let next = config.filter(PathMappingConfig::is_active).map(Arc::new);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = next;
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Reload from the project root.
    ///
    /// A load failure is logged and disables path mapping until the next
    /// successful reload. Returns whether path mapping is enabled afterwards.
    pub fn reload_from(&self, project_root: &Path) -> bool {
        match load_path_mappings(project_root) {
            Ok(config) => {
                if config.is_none() {
                    debug!("Path mapping disabled: no paths or baseUrl");
                }
                self.replace(config);
            }
            Err(e) => {
                warn!("Failed to load path mappings from {}: {}", e.path().display(), e);
                self.replace(None);
            }
        }
        self.is_enabled()
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Number of replacements so far.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}
