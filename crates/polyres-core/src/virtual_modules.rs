//! Virtual module registry.
//!
//! Virtual modules are addressed by ids of the form `\0<namespace>:<key>`.
//! The NUL sentinel can never appear in a real filesystem path, so virtual
//! ids never collide with files on disk.
//!
//! One registry is owned by one [`crate::ResolverPipeline`]. Entries are
//! written as a side effect of resolution and read by the host's content
//! loader.

use polyres_util::hash::ContentDigest;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::trace;

/// Reserved sentinel that starts every virtual id.
pub const VIRTUAL_SENTINEL: char = '\0';

/// Namespace for server passthrough modules of Node.js built-ins.
pub const NS_NODE: &str = "node";
/// Namespace for web shims.
pub const NS_SHIM: &str = "shim";
/// Namespace for runtime polyfills.
pub const NS_POLYFILL: &str = "polyfill";

/// Identifier of a virtual module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VirtualId(String);

impl VirtualId {
    /// Build an id from a namespace tag and a stable key.
    #[must_use]
    pub fn new(namespace: &str, key: &str) -> Self {
        Self(format!("{VIRTUAL_SENTINEL}{namespace}:{key}"))
    }

    /// Parse an id; returns `None` when the sentinel is missing.
    #[must_use]
    pub fn parse(id: &str) -> Option<Self> {
        id.starts_with(VIRTUAL_SENTINEL)
            .then(|| Self(id.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Namespace tag (text between the sentinel and the first `:`).
    #[must_use]
    pub fn namespace(&self) -> &str {
        let body = &self.0[VIRTUAL_SENTINEL.len_utf8()..];
        body.split_once(':').map_or(body, |(ns, _)| ns)
    }

    /// Key (text after the first `:`).
    #[must_use]
    pub fn key(&self) -> &str {
        let body = &self.0[VIRTUAL_SENTINEL.len_utf8()..];
        body.split_once(':').map_or("", |(_, key)| key)
    }

    /// The id as a resolution file path.
    #[must_use]
    pub fn to_path(&self) -> PathBuf {
        PathBuf::from(&self.0)
    }
}

impl std::fmt::Display for VirtualId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Render the sentinel visibly for logs.
        write!(f, "\\0{}", &self.0[VIRTUAL_SENTINEL.len_utf8()..])
    }
}

/// Whether a resolved path is a virtual id.
#[must_use]
pub fn is_virtual_path(path: &Path) -> bool {
    path.to_str()
        .is_some_and(|s| s.starts_with(VIRTUAL_SENTINEL))
}

#[derive(Debug)]
struct Entry {
    contents: Arc<str>,
    digest: ContentDigest,
}

/// In-memory store of generated module sources.
#[derive(Debug, Default)]
pub struct VirtualModuleRegistry {
    modules: RwLock<FxHashMap<String, Entry>>,
}

impl VirtualModuleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or overwrite) a virtual module.
    ///
    /// Returns `false` without touching the entry when the id already holds
    /// identical contents.
    pub fn set(&self, id: &VirtualId, contents: impl Into<String>) -> bool {
        let contents = contents.into();
        let digest = ContentDigest::of(&contents);

        if self
            .modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id.as_str())
            .is_some_and(|e| e.digest == digest)
        {
            return false;
        }

        trace!(id = %id, digest = %digest.to_hex(), "Registering virtual module");
        self.modules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                id.as_str().to_string(),
                Entry {
                    contents: Arc::from(contents),
                    digest,
                },
            );
        true
    }

    /// Register a module only if the id is absent, generating contents lazily.
    ///
    /// The generator is not called when the id already exists.
    ///
    /// # Errors
    /// Propagates the generator's error; nothing is registered in that case.
    pub fn get_or_try_insert_with<E>(
        &self,
        id: &VirtualId,
        generate: impl FnOnce() -> Result<String, E>,
    ) -> Result<Arc<str>, E> {
        if let Some(existing) = self.get(id.as_str()) {
            return Ok(existing);
        }

        let contents: Arc<str> = Arc::from(generate()?);
        let digest = ContentDigest::of(&contents);
        let mut modules = self.modules.write().unwrap_or_else(PoisonError::into_inner);
        let entry = modules
            .entry(id.as_str().to_string())
            .or_insert(Entry { contents, digest });
        Ok(Arc::clone(&entry.contents))
    }

    #[must_use]
    pub fn contains(&self, id: &VirtualId) -> bool {
        self.modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id.as_str())
    }

    /// Contents of a virtual module by raw id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<str>> {
        self.modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .map(|e| Arc::clone(&e.contents))
    }

    /// Content lookup for the host's file reader.
    ///
    /// Returns `None` for real paths so the caller falls through to disk.
    #[must_use]
    pub fn read(&self, path: &Path) -> Option<Arc<str>> {
        if !is_virtual_path(path) {
            return None;
        }
        self.get(path.to_str()?)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All registered ids, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<VirtualId> {
        let mut ids: Vec<VirtualId> = self
            .modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .map(|k| VirtualId(k.clone()))
            .collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_format() {
        let id = VirtualId::new(NS_NODE, "fs");
        assert_eq!(id.as_str(), "\0node:fs");
        assert_eq!(id.namespace(), "node");
        assert_eq!(id.key(), "fs");
        assert_eq!(id.to_string(), "\\0node:fs");
        assert!(is_virtual_path(&id.to_path()));
    }

    #[test]
    fn test_id_key_keeps_later_colons() {
        let id = VirtualId::new(NS_SHIM, "pkg/a:b.js");
        assert_eq!(id.namespace(), "shim");
        assert_eq!(id.key(), "pkg/a:b.js");
    }

    #[test]
    fn test_parse_requires_sentinel() {
        assert!(VirtualId::parse("node:fs").is_none());
        assert!(VirtualId::parse("\0node:fs").is_some());
        assert!(!is_virtual_path(Path::new("/app/node:fs")));
    }

    #[test]
    fn test_set_identical_is_noop() {
        let registry = VirtualModuleRegistry::new();
        let id = VirtualId::new(NS_NODE, "fs");
        assert!(registry.set(&id, "a"));
        assert!(!registry.set(&id, "a"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_set_last_write_wins() {
        let registry = VirtualModuleRegistry::new();
        let id = VirtualId::new(NS_NODE, "fs");
        registry.set(&id, "a");
        assert!(registry.set(&id, "b"));
        assert_eq!(registry.get(id.as_str()).as_deref(), Some("b"));
    }

    #[test]
    fn test_get_or_try_insert_skips_generator_when_present() {
        let registry = VirtualModuleRegistry::new();
        let id = VirtualId::new(NS_SHIM, "pkg/index.js");
        let first: Result<_, std::io::Error> =
            registry.get_or_try_insert_with(&id, || Ok("one".to_string()));
        assert_eq!(first.unwrap().as_ref(), "one");

        let second: Result<_, std::io::Error> =
            registry.get_or_try_insert_with(&id, || panic!("generator must not run"));
        assert_eq!(second.unwrap().as_ref(), "one");
    }

    #[test]
    fn test_get_or_try_insert_error_registers_nothing() {
        let registry = VirtualModuleRegistry::new();
        let id = VirtualId::new(NS_SHIM, "broken.js");
        let result: Result<_, String> =
            registry.get_or_try_insert_with(&id, || Err("missing".to_string()));
        assert!(result.is_err());
        assert!(!registry.contains(&id));
    }

    #[test]
    fn test_read_ignores_real_paths() {
        let registry = VirtualModuleRegistry::new();
        let id = VirtualId::new(NS_NODE, "path");
        registry.set(&id, "module.exports = 1;");
        assert!(registry.read(&id.to_path()).is_some());
        assert!(registry.read(Path::new("/app/index.js")).is_none());
    }

    #[test]
    fn test_ids_sorted() {
        let registry = VirtualModuleRegistry::new();
        registry.set(&VirtualId::new(NS_NODE, "path"), "");
        registry.set(&VirtualId::new(NS_NODE, "fs"), "");
        let ids = registry.ids();
        assert_eq!(ids[0].key(), "fs");
        assert_eq!(ids[1].key(), "path");
    }
}
