//! Default file-system resolution.
//!
//! Supports:
//! - Relative (`./`, `../`) and absolute specifiers
//! - Bare specifiers with `node_modules` lookup
//! - Extension probing with platform variants (`a.ios.js`, `a.native.js`, `a.js`)
//! - Directory resolution (`package.json` main fields, `index.*`)
//! - Package `exports` (when enabled by the context) and `#` imports
//! - Asset files with `@2x` / `@3x` scale variants

use super::exports::{resolve_exports, resolve_imports_map};
use super::pkg_json_cache::{read_package_json, MemoryPkgJsonCache, PkgJsonCache};
use super::ModuleResolver;
use crate::context::ResolutionContext;
use crate::error::ResolveError;
use crate::paths::{clean_path, is_absolute_specifier, is_relative_specifier};
use crate::platform::Platform;
use crate::resolution::Resolution;
use serde_json::Value;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Maximum number of tried paths to record.
const MAX_TRIED_PATHS: usize = 20;

/// Scale variants probed for assets.
const ASSET_SCALES: &[&str] = &["@2x", "@3x"];

/// Node-style resolver over the real file system.
#[derive(Debug, Clone)]
pub struct FsResolver {
    pkg_json_cache: Arc<dyn PkgJsonCache>,
}

impl Default for FsResolver {
    fn default() -> Self {
        Self::new(Arc::new(MemoryPkgJsonCache::new()))
    }
}

impl FsResolver {
    #[must_use]
    pub fn new(pkg_json_cache: Arc<dyn PkgJsonCache>) -> Self {
        Self { pkg_json_cache }
    }
}

impl ModuleResolver for FsResolver {
    fn resolve(
        &self,
        context: &ResolutionContext,
        specifier: &str,
        platform: Option<&Platform>,
    ) -> Result<Resolution, ResolveError> {
        let mut run = Run {
            resolver: self,
            context,
            platform,
            tried: Vec::new(),
        };
        run.resolve(specifier)
    }
}

/// State of one resolution attempt.
struct Run<'a> {
    resolver: &'a FsResolver,
    context: &'a ResolutionContext,
    platform: Option<&'a Platform>,
    tried: Vec<PathBuf>,
}

impl Run<'_> {
    fn resolve(&mut self, specifier: &str) -> Result<Resolution, ResolveError> {
        if specifier.is_empty() || is_url_like(specifier) {
            return Err(self.name_failure(specifier));
        }

        if specifier.starts_with('#') {
            return self.resolve_hash_import(specifier);
        }

        if is_relative_specifier(specifier) || is_absolute_specifier(specifier) {
            let base = clean_path(&self.context.origin_dir().join(specifier));
            return match self.resolve_path(&base)? {
                Some(result) => Ok(result),
                None => Err(ResolveError::FailedToResolvePath {
                    path: base,
                    origin: self.context.origin_module_path.clone(),
                    tried: std::mem::take(&mut self.tried),
                }),
            };
        }

        match self.resolve_bare(specifier)? {
            Some(result) => Ok(result),
            None => Err(self.name_failure(specifier)),
        }
    }

    fn name_failure(&mut self, specifier: &str) -> ResolveError {
        ResolveError::FailedToResolveName {
            specifier: specifier.to_string(),
            origin: self.context.origin_module_path.clone(),
            tried: std::mem::take(&mut self.tried),
        }
    }

    fn add_tried(&mut self, path: &Path) {
        if self.tried.len() < MAX_TRIED_PATHS {
            self.tried.push(path.to_path_buf());
        }
    }

    fn active_conditions(&self) -> Vec<&str> {
        self.context.active_conditions(self.platform)
    }

    /// File, then extension probing, then directory.
    fn resolve_path(&mut self, base: &Path) -> Result<Option<Resolution>, ResolveError> {
        if let Some(result) = self.resolve_file(base) {
            return Ok(Some(result));
        }
        if base.is_dir() {
            return self.resolve_directory(base);
        }
        Ok(None)
    }

    /// Exact file (or asset), then source extensions with platform variants.
    fn resolve_file(&mut self, base: &Path) -> Option<Resolution> {
        if let Some(assets) = self.resolve_asset(base) {
            return Some(assets);
        }

        self.add_tried(base);
        if base.is_file() {
            return Some(Resolution::source_file(base));
        }

        let exts = Arc::clone(&self.context.source_exts);
        for ext in exts.iter() {
            for candidate in self.variants(base, ext) {
                self.add_tried(&candidate);
                if candidate.is_file() {
                    return Some(Resolution::source_file(candidate));
                }
            }
        }
        None
    }

    /// `base.<platform>.<ext>`, `base.native.<ext>`, `base.<ext>`.
    fn variants(&self, base: &Path, ext: &str) -> Vec<PathBuf> {
        let mut out = Vec::with_capacity(3);
        if let Some(platform) = self.platform {
            out.push(with_suffix(base, &format!(".{platform}.{ext}")));
        }
        if self.context.prefer_native_platform {
            out.push(with_suffix(base, &format!(".native.{ext}")));
        }
        out.push(with_suffix(base, &format!(".{ext}")));
        out
    }

    /// Asset with its scale variants, when the extension is an asset extension.
    fn resolve_asset(&mut self, base: &Path) -> Option<Resolution> {
        let ext = base.extension()?.to_str()?;
        if !self.context.asset_exts.iter().any(|e| e == ext) {
            return None;
        }
        let stem = base.file_stem()?.to_str()?;
        let dir = base.parent()?;

        let mut file_paths = Vec::new();
        if base.is_file() {
            file_paths.push(base.to_path_buf());
        }
        for scale in ASSET_SCALES {
            let variant = dir.join(format!("{stem}{scale}.{ext}"));
            if variant.is_file() {
                file_paths.push(variant);
            }
        }
        self.add_tried(base);
        (!file_paths.is_empty()).then_some(Resolution::AssetFiles { file_paths })
    }

    /// `package.json` main fields, then `index.*`.
    fn resolve_directory(&mut self, dir: &Path) -> Result<Option<Resolution>, ResolveError> {
        let pkg_json_path = dir.join("package.json");
        if pkg_json_path.is_file() {
            self.add_tried(&pkg_json_path);
            let pkg_json = read_package_json(&pkg_json_path, self.resolver.pkg_json_cache.as_ref())?;
            if let Some(result) = self.resolve_main_fields(dir, &pkg_json)? {
                return Ok(Some(result));
            }
        }
        Ok(self.resolve_file(&dir.join("index")))
    }

    fn resolve_main_fields(
        &mut self,
        dir: &Path,
        pkg_json: &Value,
    ) -> Result<Option<Resolution>, ResolveError> {
        let fields = Arc::clone(&self.context.main_fields);
        for field in fields.iter() {
            // Object-valued fields (browser replacement maps) are not entry points.
            let Some(entry) = pkg_json.get(field.as_str()).and_then(Value::as_str) else {
                continue;
            };
            let target = clean_path(&dir.join(entry));
            if let Some(result) = self.resolve_file(&target) {
                return Ok(Some(result));
            }
            if target.is_dir() {
                if let Some(result) = self.resolve_file(&target.join("index")) {
                    return Ok(Some(result));
                }
            }
            debug!("Main field \"{}\" of {} did not resolve", field, dir.display());
        }
        Ok(None)
    }

    /// Walk `node_modules` directories up from the origin.
    fn resolve_bare(&mut self, specifier: &str) -> Result<Option<Resolution>, ResolveError> {
        let (pkg_name, subpath) = parse_bare_specifier(specifier);
        let origin_dir = self.context.origin_dir().to_path_buf();
        let mut current = Some(origin_dir.as_path());

        while let Some(dir) = current {
            let pkg_dir = dir.join("node_modules").join(pkg_name);
            if pkg_dir.is_dir() {
                self.add_tried(&pkg_dir);
                if let Some(result) = self.resolve_package(&pkg_dir, subpath)? {
                    return Ok(Some(result));
                }
            }
            current = dir.parent();
        }
        Ok(None)
    }

    fn resolve_package(
        &mut self,
        pkg_dir: &Path,
        subpath: Option<&str>,
    ) -> Result<Option<Resolution>, ResolveError> {
        if self.context.enable_package_exports {
            let pkg_json_path = pkg_dir.join("package.json");
            if pkg_json_path.is_file() {
                let pkg_json =
                    read_package_json(&pkg_json_path, self.resolver.pkg_json_cache.as_ref())?;
                if pkg_json.get("exports").is_some() {
                    let exports_subpath = subpath.map(|s| format!("./{s}"));
                    let conditions = self.active_conditions();
                    let target =
                        resolve_exports(&pkg_json, exports_subpath.as_deref(), &conditions);
                    if let Some(target) = target {
                        let target_path = clean_path(&pkg_dir.join(&target));
                        if let Some(result) = self.resolve_file(&target_path) {
                            return Ok(Some(result));
                        }
                    }
                    debug!(
                        "No exports match for {:?} in {}; falling back to file resolution",
                        subpath,
                        pkg_dir.display()
                    );
                }
            }
        }

        match subpath {
            Some(sub) => self.resolve_path(&clean_path(&pkg_dir.join(sub))),
            None => self.resolve_directory(pkg_dir),
        }
    }

    /// `#` specifiers through the nearest package.json `imports`.
    fn resolve_hash_import(&mut self, specifier: &str) -> Result<Resolution, ResolveError> {
        let origin_dir = self.context.origin_dir().to_path_buf();
        let mut current = Some(origin_dir.as_path());

        while let Some(dir) = current {
            let pkg_json_path = dir.join("package.json");
            if pkg_json_path.is_file() {
                self.add_tried(&pkg_json_path);
                let pkg_json =
                    read_package_json(&pkg_json_path, self.resolver.pkg_json_cache.as_ref())?;
                let conditions = self.active_conditions();
                let Some(target) = resolve_imports_map(&pkg_json, specifier, &conditions) else {
                    break;
                };

                if target.starts_with("./") {
                    if let Some(result) = self.resolve_path(&clean_path(&dir.join(&target)))? {
                        return Ok(result);
                    }
                    break;
                }
                // Bare target: resolve as a dependency of this package.
                if let Some(result) = self.resolve_bare(&target)? {
                    return Ok(result);
                }
                break;
            }
            current = dir.parent();
        }

        Err(self.name_failure(specifier))
    }
}

fn is_url_like(specifier: &str) -> bool {
    specifier.contains("://") || specifier.starts_with("node:") || specifier.starts_with("data:")
}

/// Append a raw suffix to the file name (`a.b` + `.ios.js` = `a.b.ios.js`).
fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Split a bare specifier into package name and optional subpath.
///
/// `"lodash/fp"` gives `("lodash", Some("fp"))`, `"@scope/pkg/sub"` gives
/// `("@scope/pkg", Some("sub"))`.
pub(crate) fn parse_bare_specifier(spec: &str) -> (&str, Option<&str>) {
    let name_end = if spec.starts_with('@') {
        spec.match_indices('/').nth(1).map(|(i, _)| i)
    } else {
        spec.find('/')
    };
    match name_end {
        Some(i) => (&spec[..i], Some(&spec[i + 1..]).filter(|s| !s.is_empty())),
        None => (spec, None),
    }
}
