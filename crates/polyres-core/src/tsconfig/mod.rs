//! `compilerOptions.paths` / `baseUrl` support.
//!
//! - [`load`] reads `tsconfig.json` or `jsconfig.json` (JSONC, `extends` chains)
//! - [`resolve`] maps a specifier to ordered candidate paths
//! - [`store`] holds the current snapshot and swaps it on reload

pub mod load;
pub mod resolve;
pub mod store;

pub use load::{
    config_sources, find_config_file, load_path_mappings, CONFIG_FILE_NAMES, MAX_EXTENDS_DEPTH,
};
pub use resolve::{match_pattern, resolve_with_path_mappings};
pub use store::PathMappingStore;

use std::path::PathBuf;

/// One loaded path-mapping configuration.
///
/// Replaced wholesale on reload, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMappingConfig {
    /// Directory candidates are joined to.
    pub base_url: PathBuf,
    /// Pattern keys with their candidates, in declaration order.
    pub paths: Vec<(String, Vec<String>)>,
    /// `baseUrl` was set explicitly (enables bare `baseUrl + specifier` lookups).
    pub has_explicit_base_url: bool,
    /// File the configuration was loaded from.
    pub source: PathBuf,
}

impl PathMappingConfig {
    /// Whether there is anything to resolve with.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.paths.is_empty() || self.has_explicit_base_url
    }
}
