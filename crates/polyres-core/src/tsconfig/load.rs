//! Loading of `tsconfig.json` / `jsconfig.json`.

use super::PathMappingConfig;
use crate::error::ConfigError;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Candidate config files, in preference order.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["tsconfig.json", "jsconfig.json"];

/// Maximum length of an `extends` chain.
pub const MAX_EXTENDS_DEPTH: usize = 16;

/// First existing config file in the project root.
#[must_use]
pub fn find_config_file(project_root: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| project_root.join(name))
        .find(|p| p.is_file())
}

/// Load path mappings for a project.
///
/// Returns `Ok(None)` when no config file exists or when it declares neither
/// `paths` nor `baseUrl`.
///
/// # Errors
/// Returns a [`ConfigError`] when a file in the `extends` chain cannot be read
/// or parsed, or when the chain is too deep.
pub fn load_path_mappings(project_root: &Path) -> Result<Option<PathMappingConfig>, ConfigError> {
    let Some(file) = find_config_file(project_root) else {
        return Ok(None);
    };

    let mut options = CompilerOptions::default();
    collect(&file, 0, &mut options)?;

    let config_dir = parent_dir(&file);
    let has_explicit_base_url = options.base_url.is_some();
    let base_url = options
        .base_url
        .or(options.paths_dir)
        .unwrap_or(config_dir);

    let config = PathMappingConfig {
        base_url,
        paths: options.paths.unwrap_or_default(),
        has_explicit_base_url,
        source: file,
    };

    if !config.is_active() {
        debug!("No path mappings in {}", config.source.display());
        return Ok(None);
    }
    Ok(Some(config))
}

/// Files the project's path mappings are read from: the root config plus
/// every reachable relative `extends` parent, child first. A file that cannot
/// be read ends its branch.
#[must_use]
pub fn config_sources(project_root: &Path) -> Vec<PathBuf> {
    let mut sources = Vec::new();
    if let Some(file) = find_config_file(project_root) {
        gather_sources(&file, 0, &mut sources);
    }
    sources
}

fn gather_sources(file: &Path, depth: usize, out: &mut Vec<PathBuf>) {
    if depth > MAX_EXTENDS_DEPTH || out.iter().any(|seen| seen == file) {
        return;
    }
    out.push(file.to_path_buf());
    let Ok(value) = read_jsonc(file) else {
        return;
    };
    let dir = parent_dir(file);
    for parent in extends_of(&value) {
        if let Some(parent_file) = resolve_extends(&dir, parent) {
            gather_sources(&parent_file, depth + 1, out);
        }
    }
}

/// Effective compiler options after merging an `extends` chain.
#[derive(Debug, Default)]
struct CompilerOptions {
    /// Absolute `baseUrl`, resolved against the file that declared it.
    base_url: Option<PathBuf>,
    paths: Option<Vec<(String, Vec<String>)>>,
    /// Directory of the file that declared `paths`.
    paths_dir: Option<PathBuf>,
}

/// Fold `file` and its parents into `out`. Children win: a field set once is
/// never overwritten by a parent.
fn collect(file: &Path, depth: usize, out: &mut CompilerOptions) -> Result<(), ConfigError> {
    if depth > MAX_EXTENDS_DEPTH {
        return Err(ConfigError::ExtendsTooDeep {
            path: file.to_path_buf(),
        });
    }

    let value = read_jsonc(file)?;
    let dir = parent_dir(file);

    if let Some(compiler_options) = value.get("compilerOptions").and_then(Value::as_object) {
        if out.base_url.is_none() {
            if let Some(base) = compiler_options.get("baseUrl").and_then(Value::as_str) {
                out.base_url = Some(dir.join(base));
            }
        }
        if out.paths.is_none() {
            if let Some(paths) = compiler_options.get("paths").and_then(Value::as_object) {
                out.paths = Some(
                    paths
                        .iter()
                        .map(|(key, targets)| (key.clone(), string_list(targets)))
                        .collect(),
                );
                out.paths_dir = Some(dir.clone());
            }
        }
    }

    for parent in extends_of(&value) {
        if let Some(parent_file) = resolve_extends(&dir, parent) {
            collect(&parent_file, depth + 1, out)?;
        } else {
            debug!("Ignoring non-relative extends \"{}\" in {}", parent, file.display());
        }
    }

    Ok(())
}

fn read_jsonc(file: &Path) -> Result<Value, ConfigError> {
    let text = std::fs::read_to_string(file).map_err(|source| ConfigError::Read {
        path: file.to_path_buf(),
        source,
    })?;
    let parsed = jsonc_parser::parse_to_serde_value(&text, &Default::default()).map_err(|e| {
        ConfigError::Parse {
            path: file.to_path_buf(),
            message: e.to_string(),
        }
    })?;
    // An empty file behaves like `{}`.
    Ok(parsed.unwrap_or_else(|| Value::Object(serde_json::Map::new())))
}

/// `extends` as a list (string or array form).
fn extends_of(value: &Value) -> Vec<&str> {
    match value.get("extends") {
        Some(Value::String(s)) => vec![s.as_str()],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

/// Resolve a relative or absolute `extends` target. Package targets are skipped.
fn resolve_extends(dir: &Path, target: &str) -> Option<PathBuf> {
    let is_relative = target.starts_with("./") || target.starts_with("../");
    if !is_relative && !Path::new(target).is_absolute() {
        return None;
    }
    let path = dir.join(target);
    if path.is_file() || path.extension().is_some_and(|e| e == "json") {
        return Some(path);
    }
    let mut with_ext = path.into_os_string();
    with_ext.push(".json");
    Some(PathBuf::from(with_ext))
}

fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Value::String(s) => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn parent_dir(file: &Path) -> PathBuf {
    file.parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_no_config() {
        let dir = tempdir().unwrap();
        assert!(load_path_mappings(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_jsonc_with_comments_and_trailing_commas() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("tsconfig.json"),
            r#"{
                // comment
                "compilerOptions": {
                    "baseUrl": ".",
                    "paths": { "@/*": ["src/*", "lib/*",], },
                },
            }"#,
        )
        .unwrap();

        let config = load_path_mappings(dir.path()).unwrap().unwrap();
        assert!(config.has_explicit_base_url);
        assert_eq!(config.base_url, dir.path().join("."));
        assert_eq!(
            config.paths,
            vec![("@/*".to_string(), vec!["src/*".to_string(), "lib/*".to_string()])]
        );
    }

    #[test]
    fn test_tsconfig_preferred_over_jsconfig() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("jsconfig.json"),
            r#"{"compilerOptions":{"paths":{"js/*":["js/*"]}}}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("tsconfig.json"),
            r#"{"compilerOptions":{"paths":{"ts/*":["ts/*"]}}}"#,
        )
        .unwrap();

        let config = load_path_mappings(dir.path()).unwrap().unwrap();
        assert_eq!(config.paths[0].0, "ts/*");
        assert!(config.source.ends_with("tsconfig.json"));
    }

    #[test]
    fn test_jsconfig_fallback() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("jsconfig.json"),
            r#"{"compilerOptions":{"paths":{"js/*":["js/*"]}}}"#,
        )
        .unwrap();
        let config = load_path_mappings(dir.path()).unwrap().unwrap();
        assert_eq!(config.paths[0].0, "js/*");
        assert!(!config.has_explicit_base_url);
        assert_eq!(config.base_url, dir.path());
    }

    #[test]
    fn test_extends_child_wins() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("base")).unwrap();
        fs::write(
            dir.path().join("base/tsconfig.base.json"),
            r#"{"compilerOptions":{"baseUrl":"..","paths":{"parent/*":["p/*"]}}}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("tsconfig.json"),
            r#"{"extends":"./base/tsconfig.base","compilerOptions":{"paths":{"child/*":["c/*"]}}}"#,
        )
        .unwrap();

        let config = load_path_mappings(dir.path()).unwrap().unwrap();
        assert_eq!(config.paths.len(), 1);
        assert_eq!(config.paths[0].0, "child/*");
        // Parent baseUrl is relative to the parent file.
        assert_eq!(config.base_url, dir.path().join("base").join(".."));
        assert!(config.has_explicit_base_url);
    }

    #[test]
    fn test_config_sources_follow_extends() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("base")).unwrap();
        fs::write(
            dir.path().join("base/tsconfig.base.json"),
            r#"{"extends":["../missing.json","expo/tsconfig.base"]}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("tsconfig.json"),
            r#"{"extends":"./base/tsconfig.base","compilerOptions":{"paths":{}}}"#,
        )
        .unwrap();

        let sources = config_sources(dir.path());
        assert_eq!(
            sources,
            vec![
                dir.path().join("tsconfig.json"),
                dir.path().join("base/tsconfig.base.json"),
                dir.path().join("base/../missing.json"),
            ]
        );
    }

    #[test]
    fn test_config_sources_cycle_terminates() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("tsconfig.json"),
            r#"{"extends":"./tsconfig.json"}"#,
        )
        .unwrap();
        // `./tsconfig.json` and `tsconfig.json` compare equal component-wise.
        assert_eq!(config_sources(dir.path()), vec![dir.path().join("tsconfig.json")]);
    }

    #[test]
    fn test_extends_cycle_too_deep() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("tsconfig.json"),
            r#"{"extends":"./tsconfig.json"}"#,
        )
        .unwrap();
        let err = load_path_mappings(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ExtendsTooDeep { .. }));
    }

    #[test]
    fn test_parse_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("tsconfig.json"), "{ not json").unwrap();
        let err = load_path_mappings(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.path().ends_with("tsconfig.json"));
    }

    #[test]
    fn test_missing_parent_is_read_error() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("tsconfig.json"),
            r#"{"extends":"./missing.json","compilerOptions":{"baseUrl":"."}}"#,
        )
        .unwrap();
        let err = load_path_mappings(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_no_paths_or_base_url_is_inactive() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("tsconfig.json"),
            r#"{"compilerOptions":{"strict":true}}"#,
        )
        .unwrap();
        assert!(load_path_mappings(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_package_extends_ignored() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("tsconfig.json"),
            r#"{"extends":"expo/tsconfig.base","compilerOptions":{"paths":{"@/*":["./*"]}}}"#,
        )
        .unwrap();
        let config = load_path_mappings(dir.path()).unwrap().unwrap();
        assert_eq!(config.paths.len(), 1);
    }
}
