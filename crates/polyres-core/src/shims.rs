//! Static module tables keyed by dependency-relative name.
//!
//! The rewriter only needs a lookup contract: given `"react-native/Libraries/Foo.js"`,
//! return the replacement file, if any. Tables can be in-memory maps or backed
//! by a directory on disk.

use rustc_hash::FxHashMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// Lookup from dependency-relative name to a replacement file.
pub trait ModuleTable: Send + Sync + Debug {
    /// Replacement file for `name`, if the table has one.
    fn lookup(&self, name: &str) -> Option<PathBuf>;
}

/// Table that never matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyTable;

impl ModuleTable for EmptyTable {
    fn lookup(&self, _name: &str) -> Option<PathBuf> {
        None
    }
}

/// In-memory table.
#[derive(Debug, Default, Clone)]
pub struct StaticTable {
    entries: FxHashMap<String, PathBuf>,
}

impl StaticTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry.
    #[must_use]
    pub fn with(mut self, name: &str, path: impl Into<PathBuf>) -> Self {
        self.entries.insert(name.to_string(), path.into());
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ModuleTable for StaticTable {
    fn lookup(&self, name: &str) -> Option<PathBuf> {
        self.entries.get(name).cloned()
    }
}

/// Table backed by a directory mirroring dependency-relative names.
///
/// `lookup("pkg/lib/x.js")` hits when `<root>/pkg/lib/x.js` is a file.
#[derive(Debug, Clone)]
pub struct DirectoryTable {
    root: PathBuf,
    prefix: Option<String>,
}

impl DirectoryTable {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            prefix: None,
        }
    }

    /// Only consider names starting with `prefix` (e.g. `"react-native/"`).
    #[must_use]
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ModuleTable for DirectoryTable {
    fn lookup(&self, name: &str) -> Option<PathBuf> {
        if let Some(prefix) = &self.prefix {
            if !name.starts_with(prefix.as_str()) {
                return None;
            }
        }
        // Names come from resolved paths; never let them escape the root.
        if name.split('/').any(|segment| segment == "..") {
            return None;
        }
        let candidate = self.root.join(name);
        candidate.is_file().then_some(candidate)
    }
}
