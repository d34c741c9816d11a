//! Package.json parse cache.
//!
//! Entries carry an mtime/size stamp and are dropped when the file changes.

use crate::error::ResolveError;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

/// File stamp for cache invalidation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PkgJsonStamp {
    /// Modification time in milliseconds since epoch.
    pub mtime_ms: Option<u64>,
    /// File size in bytes.
    pub size: Option<u64>,
}

impl PkgJsonStamp {
    /// Create stamp from a path by reading its metadata.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_path(path: &Path) -> Self {
        let Ok(meta) = path.metadata() else {
            return Self::default();
        };
        let mtime_ms = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as u64);
        Self {
            mtime_ms,
            size: Some(meta.len()),
        }
    }

    /// Whether the file on disk still matches this stamp.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        self.size.is_some() && *self == Self::from_path(path)
    }
}

/// Cached package.json entry.
#[derive(Debug, Clone)]
pub struct CachedPkgJson {
    pub value: Arc<Value>,
    pub stamp: PkgJsonStamp,
}

/// Cache of parsed package.json files.
pub trait PkgJsonCache: Send + Sync + std::fmt::Debug {
    /// Cached value, or `None` if absent or stale.
    fn get(&self, path: &Path) -> Option<Arc<Value>>;

    /// Store a parsed value.
    fn set(&self, path: &Path, value: Arc<Value>);
}

/// No-op cache implementation (always misses, never stores).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPkgJsonCache;

impl PkgJsonCache for NoPkgJsonCache {
    fn get(&self, _path: &Path) -> Option<Arc<Value>> {
        None
    }

    fn set(&self, _path: &Path, _value: Arc<Value>) {}
}

/// In-memory cache validated against the file stamp on every hit.
#[derive(Debug, Default)]
pub struct MemoryPkgJsonCache {
    entries: RwLock<FxHashMap<PathBuf, CachedPkgJson>>,
}

impl MemoryPkgJsonCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PkgJsonCache for MemoryPkgJsonCache {
    fn get(&self, path: &Path) -> Option<Arc<Value>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let cached = entries.get(path)?;
        cached
            .stamp
            .matches(path)
            .then(|| Arc::clone(&cached.value))
    }

    fn set(&self, path: &Path, value: Arc<Value>) {
        let stamp = PkgJsonStamp::from_path(path);
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_path_buf(), CachedPkgJson { value, stamp });
    }
}

/// Read and parse a package.json through the cache.
///
/// # Errors
/// Returns [`ResolveError::Io`] if the file cannot be read and
/// [`ResolveError::PackageJson`] if it is not valid JSON.
pub fn read_package_json(
    path: &Path,
    cache: &dyn PkgJsonCache,
) -> Result<Arc<Value>, ResolveError> {
    if let Some(value) = cache.get(path) {
        return Ok(value);
    }

    let content = std::fs::read_to_string(path).map_err(|e| ResolveError::io(path, e))?;
    let value: Value =
        serde_json::from_str(&content).map_err(|source| ResolveError::PackageJson {
            path: path.to_path_buf(),
            source,
        })?;
    let value = Arc::new(value);
    cache.set(path, Arc::clone(&value));
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_stamp_from_path() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("package.json");
        fs::write(&file, r#"{"name": "test"}"#).unwrap();

        let stamp = PkgJsonStamp::from_path(&file);
        assert!(stamp.mtime_ms.is_some());
        assert!(stamp.matches(&file));
    }

    #[test]
    fn test_stamp_nonexistent_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("nonexistent.json");

        let stamp = PkgJsonStamp::from_path(&file);
        assert!(stamp.size.is_none());
        assert!(!stamp.matches(&file));
    }

    #[test]
    fn test_memory_cache_invalidates_on_change() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("package.json");
        fs::write(&file, r#"{"name": "a"}"#).unwrap();

        let cache = MemoryPkgJsonCache::new();
        let first = read_package_json(&file, &cache).unwrap();
        assert_eq!(first["name"], "a");
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&file).is_some());

        // Size changes, so the stamp no longer matches.
        fs::write(&file, r#"{"name": "changed"}"#).unwrap();
        assert!(cache.get(&file).is_none());
        let second = read_package_json(&file, &cache).unwrap();
        assert_eq!(second["name"], "changed");
    }

    #[test]
    fn test_no_cache_always_misses() {
        let cache = NoPkgJsonCache;
        let path = Path::new("/fake/package.json");
        cache.set(path, Arc::new(serde_json::json!({"name": "test"})));
        assert!(cache.get(path).is_none());
    }

    #[test]
    fn test_invalid_json_is_unclassified() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("package.json");
        fs::write(&file, "{ nope").unwrap();

        let err = read_package_json(&file, &NoPkgJsonCache).unwrap_err();
        assert!(matches!(err, ResolveError::PackageJson { .. }));
        assert!(!err.is_resolution_failure());
    }
}
