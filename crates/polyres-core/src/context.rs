//! Resolution context and the per-request context mutator.
//!
//! A [`ResolutionContext`] is immutable; the mutator derives an adjusted copy
//! for the target platform/environment before the strategy chain runs. The
//! list-valued fields are `Arc<[String]>` so the derived copies share storage.

use crate::platform::{Environment, Platform, WEB};
use rustc_hash::{FxHashMap, FxHasher};
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Default source extensions (without the leading dot), in probe order.
pub const DEFAULT_SOURCE_EXTS: &[&str] = &["ts", "tsx", "mjs", "js", "jsx", "cjs", "json"];

/// Default asset extensions.
pub const DEFAULT_ASSET_EXTS: &[&str] = &[
    "bmp", "gif", "jpg", "jpeg", "png", "webp", "svg", "ttf", "otf", "woff", "woff2", "mp3",
    "mp4", "wav",
];

/// Default package entry fields.
pub const DEFAULT_MAIN_FIELDS: &[&str] = &["react-native", "browser", "main"];

/// Default `exports` condition names.
pub const DEFAULT_CONDITION_NAMES: &[&str] = &["require", "import"];

/// Entry fields for server bundles.
pub const SERVER_MAIN_FIELDS: &[&str] = &["main", "module"];

/// Conditions for generic server bundles.
pub const NODE_CONDITION_NAMES: &[&str] = &["node", "require"];

/// Conditions for react-server / edge bundles.
pub const REACT_SERVER_CONDITION_NAMES: &[&str] = &["node", "require", "react-server", "workerd"];

/// Per-request resolution parameters.
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    /// File containing the import.
    pub origin_module_path: PathBuf,
    /// Execution environment, if the host set one.
    pub environment: Option<Environment>,
    /// Development build.
    pub dev: bool,
    /// Source extensions in probe order (no leading dot).
    pub source_exts: Arc<[String]>,
    /// Asset extensions (no leading dot).
    pub asset_exts: Arc<[String]>,
    /// Package entry fields in preference order.
    pub main_fields: Arc<[String]>,
    /// Active `exports` / `imports` condition names.
    pub condition_names: Arc<[String]>,
    /// Extra conditions per platform.
    pub conditions_by_platform: Arc<FxHashMap<String, Vec<String>>>,
    /// Probe `.native.<ext>` variants.
    pub prefer_native_platform: bool,
    /// Honor package.json `exports`.
    pub enable_package_exports: bool,
}

impl ResolutionContext {
    /// Create a context with the default resolver settings.
    #[must_use]
    pub fn new(origin_module_path: impl Into<PathBuf>) -> Self {
        let mut conditions_by_platform = FxHashMap::default();
        conditions_by_platform.insert(WEB.to_string(), vec!["browser".to_string()]);

        Self {
            origin_module_path: origin_module_path.into(),
            environment: None,
            dev: false,
            source_exts: to_shared(DEFAULT_SOURCE_EXTS),
            asset_exts: to_shared(DEFAULT_ASSET_EXTS),
            main_fields: to_shared(DEFAULT_MAIN_FIELDS),
            condition_names: to_shared(DEFAULT_CONDITION_NAMES),
            conditions_by_platform: Arc::new(conditions_by_platform),
            prefer_native_platform: true,
            enable_package_exports: false,
        }
    }

    #[must_use]
    pub fn with_environment(mut self, environment: Option<Environment>) -> Self {
        self.environment = environment;
        self
    }

    #[must_use]
    pub fn with_dev(mut self, dev: bool) -> Self {
        self.dev = dev;
        self
    }

    #[must_use]
    pub fn with_source_exts(mut self, exts: &[&str]) -> Self {
        self.source_exts = to_shared(exts);
        self
    }

    /// Same request parameters, different importing file.
    #[must_use]
    pub fn with_origin(&self, origin_module_path: impl Into<PathBuf>) -> Self {
        Self {
            origin_module_path: origin_module_path.into(),
            ..self.clone()
        }
    }

    /// Directory containing the importing file.
    #[must_use]
    pub fn origin_dir(&self) -> &Path {
        self.origin_module_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
    }

    /// Whether this request targets a server-class environment.
    #[must_use]
    pub fn is_server(&self) -> bool {
        self.environment.is_some_and(|e| e.is_server())
    }

    /// Condition names active for `platform`, `default` excluded.
    #[must_use]
    pub fn active_conditions(&self, platform: Option<&Platform>) -> Vec<&str> {
        let mut active: Vec<&str> = self.condition_names.iter().map(String::as_str).collect();
        if let Some(extra) = platform.and_then(|p| self.conditions_by_platform.get(p.as_str())) {
            for c in extra {
                if !active.contains(&c.as_str()) {
                    active.push(c);
                }
            }
        }
        active
    }

    /// Hash of every setting besides origin, environment and dev that can
    /// change a resolution. Equal settings always give equal fingerprints.
    #[must_use]
    pub fn settings_fingerprint(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.source_exts.hash(&mut hasher);
        self.asset_exts.hash(&mut hasher);
        self.main_fields.hash(&mut hasher);
        self.condition_names.hash(&mut hasher);

        let mut by_platform: Vec<_> = self.conditions_by_platform.iter().collect();
        by_platform.sort_unstable_by(|a, b| a.0.cmp(b.0));
        by_platform.hash(&mut hasher);

        self.prefer_native_platform.hash(&mut hasher);
        self.enable_package_exports.hash(&mut hasher);
        hasher.finish()
    }
}

fn to_shared(items: &[&str]) -> Arc<[String]> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Reorder source extensions for server runtimes.
///
/// Every `mjs`-class extension (including platform variants such as
/// `ios.mjs`) is moved to sit immediately after the last `js`/`jsx`-class
/// extension. Relative order within each group is preserved.
#[must_use]
pub fn node_extensions(source_exts: &[String]) -> Vec<String> {
    let (mjs, mut rest): (Vec<String>, Vec<String>) = source_exts
        .iter()
        .cloned()
        .partition(|ext| ext.ends_with("mjs"));

    let insert_at = rest
        .iter()
        .rposition(|ext| ext.ends_with("js") || ext.ends_with("jsx"))
        .map_or(0, |i| i + 1);

    rest.splice(insert_at..insert_at, mjs);
    rest
}

/// Derives the per-request context from platform and environment.
#[derive(Debug)]
pub struct ContextMutator {
    /// Preferred entry fields for client bundles, keyed by platform.
    preferred_main_fields: FxHashMap<String, Arc<[String]>>,
    /// Apply `preferred_main_fields` at all.
    main_field_override: bool,
    /// Memoized server extension orders keyed by input list.
    node_exts: Mutex<FxHashMap<Vec<String>, Arc<[String]>>>,
}

impl Default for ContextMutator {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ContextMutator {
    /// Create a mutator with the default preferred main fields
    /// (`web`: `browser`, `module`, `main`).
    #[must_use]
    pub fn new(main_field_override: bool) -> Self {
        let mut preferred_main_fields = FxHashMap::default();
        preferred_main_fields.insert(WEB.to_string(), to_shared(&["browser", "module", "main"]));
        Self {
            preferred_main_fields,
            main_field_override,
            node_exts: Mutex::new(FxHashMap::default()),
        }
    }

    /// Set the preferred main fields for a platform.
    #[must_use]
    pub fn with_preferred_main_fields(mut self, platform: &str, fields: &[&str]) -> Self {
        self.preferred_main_fields
            .insert(platform.to_string(), to_shared(fields));
        self
    }

    /// Adjust `context` for the target platform and environment.
    #[must_use]
    pub fn mutate(
        &self,
        context: &ResolutionContext,
        _specifier: &str,
        platform: Option<&Platform>,
    ) -> ResolutionContext {
        let mut next = context.clone();
        next.prefer_native_platform = !crate::platform::is_web(platform);

        match context.environment {
            Some(env) if env.is_server() => {
                next.source_exts = self.server_extensions(&context.source_exts);
                next.enable_package_exports = true;
                next.conditions_by_platform = Arc::new(FxHashMap::default());
                next.main_fields = to_shared(SERVER_MAIN_FIELDS);
                next.condition_names = if env == Environment::ReactServer {
                    to_shared(REACT_SERVER_CONDITION_NAMES)
                } else {
                    to_shared(NODE_CONDITION_NAMES)
                };
            }
            _ => {
                if self.main_field_override {
                    if let Some(fields) =
                        platform.and_then(|p| self.preferred_main_fields.get(p.as_str()))
                    {
                        next.main_fields = Arc::clone(fields);
                    }
                }
            }
        }

        next
    }

    /// Memoized [`node_extensions`].
    fn server_extensions(&self, source_exts: &Arc<[String]>) -> Arc<[String]> {
        let mut cache = self.node_exts.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(hit) = cache.get(&source_exts[..]) {
            return Arc::clone(hit);
        }
        let computed: Arc<[String]> = node_extensions(source_exts).into();
        cache.insert(source_exts.to_vec(), Arc::clone(&computed));
        computed
    }

    /// Number of distinct extension lists reordered so far.
    #[must_use]
    pub fn memoized_extension_sets(&self) -> usize {
        self.node_exts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
