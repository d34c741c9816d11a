use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;

/// Enables `tsconfig.json` / `jsconfig.json` path mapping.
pub const ENV_TSCONFIG_PATHS: &str = "POLYRES_TSCONFIG_PATHS";
/// Redirects native renderer modules to the canary build.
pub const ENV_REACT_CANARY: &str = "POLYRES_REACT_CANARY";
/// Disables the per-platform preferred main fields.
pub const ENV_NO_MAIN_FIELD_OVERRIDE: &str = "POLYRES_NO_MAIN_FIELD_OVERRIDE";

/// Pipeline configuration.
///
/// Fixed for the lifetime of one pipeline. The only part of resolution that
/// changes at runtime is the path-mapping snapshot, which lives in
/// [`crate::tsconfig::PathMappingStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Project root (directory holding `tsconfig.json` / `package.json`).
    pub project_root: PathBuf,

    /// Export/build session (config is loaded once, never watched).
    pub exporting: bool,

    /// Interactive session (a terminal is attached and not running in CI).
    pub interactive: bool,

    /// Resolve through `compilerOptions.paths` / `baseUrl`.
    pub tsconfig_paths: bool,

    /// Redirect renderer internals to the canary build on native platforms.
    pub react_canary: bool,

    /// Apply per-platform preferred main fields for client bundles.
    pub main_field_override: bool,

    /// Pinned replacement for the web asset registry module.
    pub asset_registry_path: Option<PathBuf>,

    /// Directory of web shim files, keyed by dependency-relative name.
    pub shims_dir: Option<PathBuf>,

    /// Directory of canary build files, keyed by dependency-relative name.
    pub canary_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_root: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            exporting: false,
            interactive: false,
            tsconfig_paths: true,
            react_canary: false,
            main_field_override: true,
            asset_registry_path: None,
            shims_dir: None,
            canary_dir: None,
        }
    }
}

impl Config {
    /// Create a new config rooted at the given project directory.
    #[must_use]
    pub fn new(project_root: PathBuf) -> Self {
        Self {
            project_root,
            ..Default::default()
        }
    }

    /// Create a config from environment variables.
    ///
    /// Flags are truthy when set to anything but `0`, `false` or the empty string.
    #[must_use]
    pub fn from_env(project_root: PathBuf) -> Self {
        let mut config = Self::new(project_root);
        if let Some(v) = env_flag(ENV_TSCONFIG_PATHS) {
            config.tsconfig_paths = v;
        }
        if let Some(v) = env_flag(ENV_REACT_CANARY) {
            config.react_canary = v;
        }
        if env_flag(ENV_NO_MAIN_FIELD_OVERRIDE) == Some(true) {
            config.main_field_override = false;
        }
        config.interactive = detect_interactive();
        config
    }

    #[must_use]
    pub fn with_exporting(mut self, exporting: bool) -> Self {
        self.exporting = exporting;
        self
    }

    #[must_use]
    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    #[must_use]
    pub fn with_tsconfig_paths(mut self, enabled: bool) -> Self {
        self.tsconfig_paths = enabled;
        self
    }

    #[must_use]
    pub fn with_react_canary(mut self, enabled: bool) -> Self {
        self.react_canary = enabled;
        self
    }

    #[must_use]
    pub fn with_main_field_override(mut self, enabled: bool) -> Self {
        self.main_field_override = enabled;
        self
    }

    #[must_use]
    pub fn with_asset_registry_path(mut self, path: PathBuf) -> Self {
        self.asset_registry_path = Some(path);
        self
    }

    #[must_use]
    pub fn with_shims_dir(mut self, dir: PathBuf) -> Self {
        self.shims_dir = Some(dir);
        self
    }

    #[must_use]
    pub fn with_canary_dir(mut self, dir: PathBuf) -> Self {
        self.canary_dir = Some(dir);
        self
    }

    /// Whether path-mapping sources should be watched and hot-reloaded.
    #[must_use]
    pub fn should_watch_path_mappings(&self) -> bool {
        self.tsconfig_paths && self.interactive && !self.exporting
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let value = std::env::var(name).ok()?;
    Some(!matches!(value.trim(), "" | "0" | "false"))
}

/// A session is interactive when stdin is a terminal and `CI` is not set.
fn detect_interactive() -> bool {
    if env_flag("CI") == Some(true) {
        return false;
    }
    std::io::stdin().is_terminal()
}
