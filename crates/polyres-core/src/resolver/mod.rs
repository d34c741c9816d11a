//! Default resolution algorithm.
//!
//! The pipeline only depends on [`ModuleResolver`]; [`FsResolver`] is the
//! Node-style implementation used unless the host supplies its own.

mod exports;
mod fs;
mod pkg_json_cache;

pub use exports::{
    resolve_exports, resolve_exports_pattern, resolve_exports_root, resolve_exports_subpath,
    resolve_imports_map, DEFAULT_CONDITION,
};
pub use fs::FsResolver;
pub use pkg_json_cache::{
    read_package_json, CachedPkgJson, MemoryPkgJsonCache, NoPkgJsonCache, PkgJsonCache,
    PkgJsonStamp,
};

use crate::context::ResolutionContext;
use crate::error::ResolveError;
use crate::platform::Platform;
use crate::resolution::Resolution;

/// A resolution algorithm.
///
/// "Not found" must be reported as [`ResolveError::FailedToResolveName`] or
/// [`ResolveError::FailedToResolvePath`]; any other error aborts the pipeline.
pub trait ModuleResolver: Send + Sync + std::fmt::Debug {
    /// Resolve `specifier` imported from `context.origin_module_path`.
    ///
    /// # Errors
    /// Returns a resolution-class error when nothing matches, or an
    /// unclassified error on I/O or manifest failures.
    fn resolve(
        &self,
        context: &ResolutionContext,
        specifier: &str,
        platform: Option<&Platform>,
    ) -> Result<Resolution, ResolveError>;
}
