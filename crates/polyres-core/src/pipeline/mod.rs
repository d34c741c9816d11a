//! Resolver chain orchestration.
//!
//! Per import edge:
//! 1. the context mutator derives the per-request context
//! 2. strategies run in order (dev production suppression, path mapping,
//!    Node.js externals, aliases, then host strategies); the first `Some` wins
//! 3. otherwise the default resolver runs and its result is post-processed
//!    by the [`PostResolutionRewriter`]

mod cache;
mod strategy;

pub use cache::{MemoryResolutionCache, NoCache, ResolutionCache, ResolutionCacheKey};
pub use strategy::{
    AliasStrategy, DevProductionSuppression, NodeExternalsStrategy, PathMappingStrategy,
    ResolverStrategy, StrategyContext,
};

use crate::aliases::{AliasTable, VECTOR_ICONS_PACKAGE, VECTOR_ICONS_PATTERN, VECTOR_ICONS_TEMPLATE};
use crate::config::Config;
use crate::context::{ContextMutator, ResolutionContext};
use crate::error::ResolveError;
use crate::externals::register_polyfills;
use crate::platform::Platform;
use crate::resolution::Resolution;
use crate::resolver::{FsResolver, ModuleResolver};
use crate::rewrite::{PostResolutionRewriter, ASSET_REGISTRY_SPECIFIER};
use crate::shims::{DirectoryTable, ModuleTable};
use crate::tsconfig::PathMappingStore;
use crate::virtual_modules::VirtualModuleRegistry;
use polyres_util::fs::realpath_or_self;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Only renderer internals are redirected to the canary build.
const CANARY_PREFIX: &str = "react-native/";

/// Builder for [`ResolverPipeline`].
#[derive(Debug)]
pub struct PipelineBuilder {
    config: Config,
    resolver: Option<Box<dyn ModuleResolver>>,
    host_strategies: Vec<Box<dyn ResolverStrategy>>,
    cache: Box<dyn ResolutionCache>,
    path_mappings: Option<Arc<PathMappingStore>>,
    shims: Option<Box<dyn ModuleTable>>,
    canary: Option<Box<dyn ModuleTable>>,
}

impl PipelineBuilder {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            resolver: None,
            host_strategies: Vec::new(),
            cache: Box::new(NoCache),
            path_mappings: None,
            shims: None,
            canary: None,
        }
    }

    /// Replace the default file-system resolver.
    #[must_use]
    pub fn resolver(mut self, resolver: Box<dyn ModuleResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Append a host strategy. Host strategies run after the built-in ones.
    #[must_use]
    pub fn strategy(mut self, strategy: Box<dyn ResolverStrategy>) -> Self {
        self.host_strategies.push(strategy);
        self
    }

    #[must_use]
    pub fn cache(mut self, cache: Box<dyn ResolutionCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Share a path-mapping store (e.g. with a config watcher).
    ///
    /// A supplied store is used as is; otherwise one is created and, when path
    /// mapping is enabled, loaded once from the project root.
    #[must_use]
    pub fn path_mappings(mut self, store: Arc<PathMappingStore>) -> Self {
        self.path_mappings = Some(store);
        self
    }

    #[must_use]
    pub fn shims(mut self, table: Box<dyn ModuleTable>) -> Self {
        self.shims = Some(table);
        self
    }

    #[must_use]
    pub fn canary(mut self, table: Box<dyn ModuleTable>) -> Self {
        self.canary = Some(table);
        self
    }

    /// Build the pipeline.
    ///
    /// # Errors
    /// Returns [`ResolveError::InvalidPattern`] if a built-in pattern fails
    /// to compile.
    pub fn build(self) -> Result<ResolverPipeline, ResolveError> {
        let config = self.config;
        let resolver = self
            .resolver
            .unwrap_or_else(|| Box::new(FsResolver::default()) as Box<dyn ModuleResolver>);

        if config.react_canary {
            warn!("Experimental React canary version is enabled.");
        }

        let path_mappings = match self.path_mappings {
            Some(store) => store,
            None => {
                let store = Arc::new(PathMappingStore::new());
                if config.tsconfig_paths {
                    store.reload_from(&config.project_root);
                } else {
                    debug!("Skipping tsconfig.json paths support");
                }
                store
            }
        };

        let mut aliases = AliasTable::with_defaults();
        if probe(resolver.as_ref(), &config.project_root, VECTOR_ICONS_PACKAGE).is_some() {
            debug!("Enabling alias: react-native-vector-icons -> {}", VECTOR_ICONS_PACKAGE);
            aliases.pattern(VECTOR_ICONS_PATTERN, VECTOR_ICONS_TEMPLATE)?;
        }

        let mut rewriter = PostResolutionRewriter::new();
        let asset_registry = config.asset_registry_path.clone().or_else(|| {
            probe(resolver.as_ref(), &config.project_root, ASSET_REGISTRY_SPECIFIER)
                .map(|p| realpath_or_self(&p))
        });
        match asset_registry {
            Some(path) => rewriter = rewriter.with_asset_registry(path),
            None => debug!("No asset registry found; web asset registry redirect disabled"),
        }

        let shims = self.shims.or_else(|| {
            config
                .shims_dir
                .as_ref()
                .map(|dir| Box::new(DirectoryTable::new(dir)) as Box<dyn ModuleTable>)
        });
        if let Some(shims) = shims {
            rewriter = rewriter.with_shims(shims);
        }

        let canary = self.canary.or_else(|| {
            config.canary_dir.as_ref().map(|dir| {
                Box::new(DirectoryTable::new(dir).with_prefix(CANARY_PREFIX)) as Box<dyn ModuleTable>
            })
        });
        if let Some(canary) = canary {
            rewriter = rewriter.with_canary(canary, config.react_canary);
        }

        let mut strategies: Vec<Box<dyn ResolverStrategy>> = vec![
            Box::new(DevProductionSuppression::new()?),
            Box::new(PathMappingStrategy::new(Arc::clone(&path_mappings))),
            Box::new(NodeExternalsStrategy),
            Box::new(AliasStrategy::new(aliases)),
        ];
        strategies.extend(self.host_strategies);

        Ok(ResolverPipeline {
            mutator: ContextMutator::new(config.main_field_override),
            config,
            registry: Arc::new(VirtualModuleRegistry::new()),
            path_mappings,
            resolver,
            strategies,
            rewriter,
            cache: self.cache,
        })
    }
}

/// Resolve `specifier` as if imported from a file in `project_root`.
/// Any failure means "absent".
fn probe(resolver: &dyn ModuleResolver, project_root: &Path, specifier: &str) -> Option<PathBuf> {
    let context = ResolutionContext::new(project_root.join("package.json"));
    match resolver.resolve(&context, specifier, None) {
        Ok(Resolution::SourceFile { file_path }) => Some(file_path),
        Ok(_) => None,
        Err(e) => {
            debug!("{} is not resolvable from the project root: {}", specifier, e);
            None
        }
    }
}

/// The multi-platform resolution pipeline.
///
/// One instance per worker; it owns its virtual module registry and caches.
#[derive(Debug)]
pub struct ResolverPipeline {
    config: Config,
    registry: Arc<VirtualModuleRegistry>,
    path_mappings: Arc<PathMappingStore>,
    mutator: ContextMutator,
    resolver: Box<dyn ModuleResolver>,
    strategies: Vec<Box<dyn ResolverStrategy>>,
    rewriter: PostResolutionRewriter,
    cache: Box<dyn ResolutionCache>,
}

impl ResolverPipeline {
    /// Pipeline with the default resolver and no cache.
    ///
    /// # Errors
    /// See [`PipelineBuilder::build`].
    pub fn new(config: Config) -> Result<Self, ResolveError> {
        PipelineBuilder::new(config).build()
    }

    #[must_use]
    pub fn builder(config: Config) -> PipelineBuilder {
        PipelineBuilder::new(config)
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Registry the host's content loader reads virtual modules from.
    #[must_use]
    pub fn registry(&self) -> &Arc<VirtualModuleRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn path_mappings(&self) -> &Arc<PathMappingStore> {
        &self.path_mappings
    }

    /// Strategy names in execution order.
    #[must_use]
    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Resolve one import edge.
    ///
    /// # Errors
    /// Resolution-class errors when nothing matched, or any unclassified
    /// error raised along the way.
    pub fn resolve(
        &self,
        context: &ResolutionContext,
        specifier: &str,
        platform: Option<&Platform>,
    ) -> Result<Resolution, ResolveError> {
        let key = ResolutionCacheKey {
            origin: context.origin_module_path.clone(),
            specifier: specifier.to_string(),
            platform: platform.cloned(),
            environment: context.environment,
            dev: context.dev,
            settings: context.settings_fingerprint(),
            generation: self.path_mappings.generation(),
        };
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }

        let result = self.resolve_uncached(context, specifier, platform)?;
        self.cache.set(key, result.clone());
        Ok(result)
    }

    fn resolve_uncached(
        &self,
        context: &ResolutionContext,
        specifier: &str,
        platform: Option<&Platform>,
    ) -> Result<Resolution, ResolveError> {
        let context = self.mutator.mutate(context, specifier, platform);
        let cx = StrategyContext::new(self.resolver.as_ref(), &self.registry);

        for strategy in &self.strategies {
            if let Some(result) = strategy.resolve(&cx, &context, specifier, platform)? {
                debug!(
                    strategy = strategy.name(),
                    kind = result.kind(),
                    "Resolved {}",
                    specifier
                );
                return Ok(result);
            }
        }

        let result = match cx.resolve_strict(&context, specifier, platform) {
            Ok(result) => result,
            Err(e) => {
                error!(
                    origin = %context.origin_module_path.display(),
                    specifier,
                    platform = platform.map_or("none", Platform::as_str),
                    code = e.code(),
                    "{}",
                    e
                );
                return Err(e);
            }
        };
        self.rewriter.rewrite(&self.registry, result, platform)
    }

    /// Register the runtime polyfills and return the ordered polyfill list.
    #[must_use]
    pub fn polyfills(&self, platform: Option<&Platform>, host_polyfills: &[String]) -> Vec<String> {
        register_polyfills(&self.registry, platform, host_polyfills)
    }

    /// Contents of a virtual module, or `None` for real files.
    #[must_use]
    pub fn read_virtual(&self, path: &Path) -> Option<Arc<str>> {
        self.registry.read(path)
    }
}
