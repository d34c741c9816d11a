//! Resolution strategies and the helpers they are given.

use crate::aliases::AliasTable;
use crate::context::ResolutionContext;
use crate::error::ResolveError;
use crate::externals::resolve_node_external;
use crate::platform::{is_web, Platform};
use crate::resolution::Resolution;
use crate::resolver::ModuleResolver;
use crate::tsconfig::{resolve_with_path_mappings, PathMappingStore};
use crate::virtual_modules::VirtualModuleRegistry;
use regex_lite::Regex;
use std::sync::Arc;
use tracing::debug;

/// Shared services handed to every strategy.
#[derive(Clone, Copy)]
pub struct StrategyContext<'a> {
    resolver: &'a dyn ModuleResolver,
    registry: &'a VirtualModuleRegistry,
}

impl<'a> StrategyContext<'a> {
    #[must_use]
    pub fn new(resolver: &'a dyn ModuleResolver, registry: &'a VirtualModuleRegistry) -> Self {
        Self { resolver, registry }
    }

    #[must_use]
    pub fn registry(&self) -> &'a VirtualModuleRegistry {
        self.registry
    }

    /// Run the default resolver; every failure is returned.
    ///
    /// # Errors
    /// Any error from the default resolver.
    pub fn resolve_strict(
        &self,
        context: &ResolutionContext,
        specifier: &str,
        platform: Option<&Platform>,
    ) -> Result<Resolution, ResolveError> {
        self.resolver.resolve(context, specifier, platform)
    }

    /// Run the default resolver, turning resolution-class failures into `None`.
    ///
    /// # Errors
    /// Unclassified errors from the default resolver.
    pub fn resolve_optional(
        &self,
        context: &ResolutionContext,
        specifier: &str,
        platform: Option<&Platform>,
    ) -> Result<Option<Resolution>, ResolveError> {
        match self.resolve_strict(context, specifier, platform) {
            Ok(result) => Ok(Some(result)),
            Err(e) if e.is_resolution_failure() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl std::fmt::Debug for StrategyContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyContext")
            .field("resolver", &self.resolver)
            .field("virtual_modules", &self.registry.len())
            .finish()
    }
}

/// One step of the pipeline.
///
/// `Ok(None)` defers to the next strategy. Any error aborts the pipeline.
pub trait ResolverStrategy: Send + Sync + std::fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Decide the import, or defer.
    ///
    /// # Errors
    /// Errors abort resolution of the current import edge.
    fn resolve(
        &self,
        cx: &StrategyContext<'_>,
        context: &ResolutionContext,
        specifier: &str,
        platform: Option<&Platform>,
    ) -> Result<Option<Resolution>, ResolveError>;
}

/// Replace production React builds with empty modules in development.
#[derive(Debug)]
pub struct DevProductionSuppression {
    renderer_origin: Regex,
    renderer_specifier: Regex,
    production_specifier: Regex,
    react_origin: Regex,
}

impl DevProductionSuppression {
    /// # Errors
    /// Returns [`ResolveError::InvalidPattern`] if a built-in pattern fails to compile.
    pub fn new() -> Result<Self, ResolveError> {
        Ok(Self {
            renderer_origin: compile(r"[\\/]node_modules[\\/]react-native[\\/]")?,
            renderer_specifier: compile(r"([\\/]ReactFabric|ReactNativeRenderer)-prod")?,
            production_specifier: compile(r"\.production(\.min)?\.js$")?,
            react_origin: compile(r"[\\/]node_modules[\\/](react[-\\/]|scheduler[\\/])")?,
        })
    }

    fn matches(&self, origin: &str, specifier: &str, platform: Option<&Platform>) -> bool {
        let native_renderer = !is_web(platform)
            && self.renderer_origin.is_match(origin)
            && self.renderer_specifier.is_match(specifier);
        let react_production =
            self.production_specifier.is_match(specifier) && self.react_origin.is_match(origin);
        native_renderer || react_production
    }
}

fn compile(pattern: &str) -> Result<Regex, ResolveError> {
    Regex::new(pattern).map_err(|e| ResolveError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

impl ResolverStrategy for DevProductionSuppression {
    fn name(&self) -> &str {
        "dev-production-suppression"
    }

    fn resolve(
        &self,
        _cx: &StrategyContext<'_>,
        context: &ResolutionContext,
        specifier: &str,
        platform: Option<&Platform>,
    ) -> Result<Option<Resolution>, ResolveError> {
        if !context.dev {
            return Ok(None);
        }
        let origin = context.origin_module_path.to_string_lossy();
        if self.matches(&origin, specifier, platform) {
            debug!("Skipping production module: {}", specifier);
            return Ok(Some(Resolution::Empty));
        }
        Ok(None)
    }
}

/// `compilerOptions.paths` / `baseUrl` lookups against the current snapshot.
#[derive(Debug)]
pub struct PathMappingStrategy {
    store: Arc<PathMappingStore>,
}

impl PathMappingStrategy {
    #[must_use]
    pub fn new(store: Arc<PathMappingStore>) -> Self {
        Self { store }
    }
}

impl ResolverStrategy for PathMappingStrategy {
    fn name(&self) -> &str {
        "path-mapping"
    }

    fn resolve(
        &self,
        cx: &StrategyContext<'_>,
        context: &ResolutionContext,
        specifier: &str,
        platform: Option<&Platform>,
    ) -> Result<Option<Resolution>, ResolveError> {
        let Some(config) = self.store.snapshot() else {
            return Ok(None);
        };
        resolve_with_path_mappings(&config, specifier, |candidate| {
            cx.resolve_optional(context, candidate, platform)
        })
    }
}

/// Node.js built-ins on web and in server environments.
#[derive(Debug, Default, Clone, Copy)]
pub struct NodeExternalsStrategy;

impl ResolverStrategy for NodeExternalsStrategy {
    fn name(&self) -> &str {
        "node-externals"
    }

    fn resolve(
        &self,
        cx: &StrategyContext<'_>,
        context: &ResolutionContext,
        specifier: &str,
        platform: Option<&Platform>,
    ) -> Result<Option<Resolution>, ResolveError> {
        let is_server = context.is_server();
        if !is_web(platform) && !is_server {
            return Ok(None);
        }
        resolve_node_external(cx.registry(), specifier, is_server, |spec| {
            cx.resolve_optional(context, spec, platform)
        })
    }
}

/// Alias substitution followed by a strict re-resolve of the target.
#[derive(Debug)]
pub struct AliasStrategy {
    table: AliasTable,
}

impl AliasStrategy {
    #[must_use]
    pub fn new(table: AliasTable) -> Self {
        Self { table }
    }
}

impl ResolverStrategy for AliasStrategy {
    fn name(&self) -> &str {
        "alias"
    }

    fn resolve(
        &self,
        cx: &StrategyContext<'_>,
        context: &ResolutionContext,
        specifier: &str,
        platform: Option<&Platform>,
    ) -> Result<Option<Resolution>, ResolveError> {
        let Some(target) = self.table.lookup(specifier, platform) else {
            return Ok(None);
        };
        debug!("Alias \"{}\" to \"{}\"", specifier, target);
        cx.resolve_strict(context, &target, platform).map(Some)
    }
}
