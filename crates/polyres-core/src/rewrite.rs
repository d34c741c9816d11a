//! Post-resolution rewriting.
//!
//! Runs after the default resolver succeeded. Only `SourceFile` results are
//! rewritten; assets and empty modules pass through untouched.

use crate::error::ResolveError;
use crate::platform::Platform;
use crate::resolution::Resolution;
use crate::shims::{EmptyTable, ModuleTable};
use crate::virtual_modules::{VirtualId, VirtualModuleRegistry, NS_SHIM};
use polyres_util::fs::{dependency_relative_name, normalize_slashes, read_to_string_lossy};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Canonical tail of the web asset registry module.
pub const WEB_ASSET_REGISTRY_SUFFIX: &str = "react-native-web/dist/modules/AssetRegistry/index.js";

/// Specifier used to discover the pinned asset registry replacement.
pub const ASSET_REGISTRY_SPECIFIER: &str = "@react-native/assets-registry/registry.js";

/// A web-only redirect applied when the resolved path ends with `suffix`.
#[derive(Debug, Clone)]
struct SuffixRedirect {
    suffix: String,
    target: PathBuf,
}

/// Rewrites resolved files into shims, pinned replacements or canary builds.
#[derive(Debug)]
pub struct PostResolutionRewriter {
    web_redirects: Vec<SuffixRedirect>,
    shims: Box<dyn ModuleTable>,
    canary: Box<dyn ModuleTable>,
    canary_enabled: bool,
}

impl Default for PostResolutionRewriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PostResolutionRewriter {
    /// A rewriter with no redirects and empty tables.
    #[must_use]
    pub fn new() -> Self {
        Self {
            web_redirects: Vec::new(),
            shims: Box::new(EmptyTable),
            canary: Box::new(EmptyTable),
            canary_enabled: false,
        }
    }

    /// Pin the web asset registry to `target`.
    #[must_use]
    pub fn with_asset_registry(self, target: impl Into<PathBuf>) -> Self {
        self.with_web_redirect(WEB_ASSET_REGISTRY_SUFFIX, target)
    }

    /// Redirect any web result whose path ends with `suffix`.
    #[must_use]
    pub fn with_web_redirect(mut self, suffix: &str, target: impl Into<PathBuf>) -> Self {
        self.web_redirects.push(SuffixRedirect {
            suffix: suffix.to_string(),
            target: target.into(),
        });
        self
    }

    #[must_use]
    pub fn with_shims(mut self, table: Box<dyn ModuleTable>) -> Self {
        self.shims = table;
        self
    }

    #[must_use]
    pub fn with_canary(mut self, table: Box<dyn ModuleTable>, enabled: bool) -> Self {
        self.canary = table;
        self.canary_enabled = enabled;
        self
    }

    /// Rewrite a successful resolution.
    ///
    /// # Errors
    /// Returns [`ResolveError::Io`] when a matched shim file cannot be read.
    pub fn rewrite(
        &self,
        registry: &VirtualModuleRegistry,
        result: Resolution,
        platform: Option<&Platform>,
    ) -> Result<Resolution, ResolveError> {
        let Resolution::SourceFile { file_path } = result else {
            return Ok(result);
        };
        let Some(path_str) = file_path.to_str() else {
            return Ok(Resolution::SourceFile { file_path });
        };
        let normal = normalize_slashes(path_str);

        if crate::platform::is_web(platform) {
            if let Some(redirect) = self
                .web_redirects
                .iter()
                .find(|r| normal.ends_with(r.suffix.as_str()))
            {
                debug!(
                    "Redirecting {} to {}",
                    redirect.suffix,
                    redirect.target.display()
                );
                return Ok(Resolution::source_file(redirect.target.clone()));
            }

            if let Some(name) = dependency_relative_name(&normal) {
                if let Some(shim_file) = self.shims.lookup(&name) {
                    return self.redirect_to_shim(registry, &name, &shim_file);
                }
            }
        } else if self.canary_enabled {
            if let Some(name) = dependency_relative_name(&normal) {
                if let Some(canary_file) = self.canary.lookup(&name) {
                    debug!(
                        "Redirecting React Native module \"{}\" to canary build",
                        file_path.display()
                    );
                    return Ok(Resolution::source_file(canary_file));
                }
            }
        }

        Ok(Resolution::SourceFile { file_path })
    }

    fn redirect_to_shim(
        &self,
        registry: &VirtualModuleRegistry,
        name: &str,
        shim_file: &Path,
    ) -> Result<Resolution, ResolveError> {
        let id = VirtualId::new(NS_SHIM, name);
        registry.get_or_try_insert_with(&id, || {
            read_to_string_lossy(shim_file).map_err(|e| ResolveError::io(shim_file, e))
        })?;
        debug!("Shimming {} with {}", name, shim_file.display());
        Ok(Resolution::source_file(id.to_path()))
    }
}
