//! Package.json `exports` / `imports` evaluation.
//!
//! - Root exports (string, `"."` key, or a root conditions object)
//! - Subpath keys (`"./feature"`)
//! - Pattern keys with one `*` (`"./features/*"`), most specific wins
//! - Conditional targets: the first key (in object order) that is an active
//!   condition or `"default"` is taken; nesting is followed
//! - Array targets: first entry that yields a valid target

use serde_json::Value;

/// Condition that always matches.
pub const DEFAULT_CONDITION: &str = "default";

/// Resolve exports for the package root (`subpath == None`) or a `./` subpath.
///
/// Returns a target starting with `./`.
#[must_use]
pub fn resolve_exports(
    pkg_json: &Value,
    subpath: Option<&str>,
    conditions: &[&str],
) -> Option<String> {
    match subpath {
        None => resolve_exports_root(pkg_json, conditions),
        Some(sub) => resolve_exports_subpath(pkg_json, sub, conditions)
            .or_else(|| resolve_exports_pattern(pkg_json, sub, conditions)),
    }
}

/// Root export.
#[must_use]
pub fn resolve_exports_root(pkg_json: &Value, conditions: &[&str]) -> Option<String> {
    let exports = pkg_json.get("exports")?;

    let Some(obj) = exports.as_object() else {
        // String or array shorthand.
        return resolve_target(exports, conditions);
    };

    if let Some(dot) = obj.get(".") {
        return resolve_target(dot, conditions);
    }

    if !has_subpath_keys(obj) {
        return resolve_target(exports, conditions);
    }

    None
}

/// Exact `./subpath` export.
#[must_use]
pub fn resolve_exports_subpath(
    pkg_json: &Value,
    subpath: &str,
    conditions: &[&str],
) -> Option<String> {
    if !subpath.starts_with("./") {
        return None;
    }
    let obj = pkg_json.get("exports")?.as_object()?;
    if !has_subpath_keys(obj) {
        return None;
    }
    resolve_target(obj.get(subpath)?, conditions)
}

/// Pattern export. The key with the longest prefix before `*` wins.
#[must_use]
pub fn resolve_exports_pattern(
    pkg_json: &Value,
    subpath: &str,
    conditions: &[&str],
) -> Option<String> {
    if !subpath.starts_with("./") {
        return None;
    }
    let obj = pkg_json.get("exports")?.as_object()?;
    resolve_pattern_map(obj, subpath, conditions)
}

/// `#`-prefixed import from the package.json `imports` field.
#[must_use]
pub fn resolve_imports_map(pkg_json: &Value, spec: &str, conditions: &[&str]) -> Option<String> {
    if !spec.starts_with('#') {
        return None;
    }
    let imports = pkg_json.get("imports")?.as_object()?;
    if let Some(target) = imports.get(spec) {
        return resolve_import_target(target, conditions);
    }
    let (key, star) = best_pattern(imports, spec)?;
    let target = resolve_import_target(imports.get(key)?, conditions)?;
    substitute_star(&target, star)
}

fn resolve_pattern_map(
    obj: &serde_json::Map<String, Value>,
    subpath: &str,
    conditions: &[&str],
) -> Option<String> {
    let (key, star) = best_pattern(obj, subpath)?;
    let target = resolve_target(obj.get(key)?, conditions)?;
    substitute_star(&target, star)
}

/// Most specific `*` key matching `subpath`, with the captured text.
fn best_pattern<'a>(
    obj: &'a serde_json::Map<String, Value>,
    subpath: &'a str,
) -> Option<(&'a str, &'a str)> {
    let mut best: Option<(&str, &str)> = None;
    for key in obj.keys() {
        if key.matches('*').count() != 1 {
            continue;
        }
        let Some(star) = match_pattern(key, subpath) else {
            continue;
        };
        let better = best.map_or(true, |(current, _)| {
            let (new_prefix, current_prefix) = (prefix_len(key), prefix_len(current));
            new_prefix > current_prefix || (new_prefix == current_prefix && key.len() > current.len())
        });
        if better {
            best = Some((key.as_str(), star));
        }
    }
    best
}

fn prefix_len(key: &str) -> usize {
    key.find('*').unwrap_or(key.len())
}

fn has_subpath_keys(obj: &serde_json::Map<String, Value>) -> bool {
    obj.keys().any(|k| k.starts_with('.'))
}

/// Match a `*` pattern key, returning the non-empty captured text.
fn match_pattern<'a>(pattern: &str, subpath: &'a str) -> Option<&'a str> {
    let (prefix, suffix) = pattern.split_once('*')?;
    if subpath.len() < prefix.len() + suffix.len()
        || !subpath.starts_with(prefix)
        || !subpath.ends_with(suffix)
    {
        return None;
    }
    let star = &subpath[prefix.len()..subpath.len() - suffix.len()];
    (!star.is_empty()).then_some(star)
}

/// Substitute every `*` in the target. Rejects traversal out of the package.
fn substitute_star(target: &str, star: &str) -> Option<String> {
    let result = target.replace('*', star);
    if result.split('/').any(|segment| segment == "..") {
        return None;
    }
    validate_export_path(&result)
}

fn resolve_target(target: &Value, conditions: &[&str]) -> Option<String> {
    match target {
        Value::String(s) => validate_export_path(s),
        Value::Array(items) => items.iter().find_map(|t| resolve_target(t, conditions)),
        Value::Object(obj) => obj
            .iter()
            .filter(|(key, _)| is_active(key, conditions))
            .find_map(|(_, t)| resolve_target(t, conditions)),
        _ => None,
    }
}

/// Like [`resolve_target`] but `imports` targets may also name a bare package.
fn resolve_import_target(target: &Value, conditions: &[&str]) -> Option<String> {
    match target {
        Value::String(s) if !s.starts_with("./") && !s.starts_with('/') => Some(s.clone()),
        Value::Array(items) => items
            .iter()
            .find_map(|t| resolve_import_target(t, conditions)),
        Value::Object(obj) => obj
            .iter()
            .filter(|(key, _)| is_active(key, conditions))
            .find_map(|(_, t)| resolve_import_target(t, conditions)),
        _ => resolve_target(target, conditions),
    }
}

fn is_active(key: &str, conditions: &[&str]) -> bool {
    key == DEFAULT_CONDITION || conditions.contains(&key)
}

/// Export targets must be package-relative (`./`).
fn validate_export_path(path: &str) -> Option<String> {
    path.starts_with("./").then(|| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const REQUIRE: &[&str] = &["require"];
    const IMPORT: &[&str] = &["import"];

    #[test]
    fn test_exports_string_root() {
        let pkg = json!({ "exports": "./dist/index.js" });
        assert_eq!(
            resolve_exports_root(&pkg, REQUIRE),
            Some("./dist/index.js".to_string())
        );
    }

    #[test]
    fn test_exports_dot_conditions_first_active_key_wins() {
        let pkg = json!({
            "exports": {
                ".": {
                    "react-native": "./native.js",
                    "import": "./esm.js",
                    "require": "./cjs.cjs",
                    "default": "./d.js"
                }
            }
        });
        assert_eq!(resolve_exports_root(&pkg, IMPORT), Some("./esm.js".to_string()));
        assert_eq!(resolve_exports_root(&pkg, REQUIRE), Some("./cjs.cjs".to_string()));
        assert_eq!(resolve_exports_root(&pkg, &[]), Some("./d.js".to_string()));
        assert_eq!(
            resolve_exports_root(&pkg, &["require", "react-native"]),
            Some("./native.js".to_string())
        );
    }

    #[test]
    fn test_exports_root_conditions_object() {
        let pkg = json!({ "exports": { "node": "./node.js", "default": "./browser.js" } });
        assert_eq!(
            resolve_exports_root(&pkg, &["node", "require"]),
            Some("./node.js".to_string())
        );
        assert_eq!(
            resolve_exports_root(&pkg, &["browser"]),
            Some("./browser.js".to_string())
        );
    }

    #[test]
    fn test_exports_nested_conditions() {
        let pkg = json!({
            "exports": {
                ".": {
                    "react-server": { "workerd": "./edge.js", "default": "./rsc.js" },
                    "default": "./index.js"
                }
            }
        });
        assert_eq!(
            resolve_exports_root(&pkg, &["node", "require", "react-server", "workerd"]),
            Some("./edge.js".to_string())
        );
        assert_eq!(
            resolve_exports_root(&pkg, &["node", "react-server"]),
            Some("./rsc.js".to_string())
        );
        assert_eq!(
            resolve_exports_root(&pkg, &["node"]),
            Some("./index.js".to_string())
        );
    }

    #[test]
    fn test_exports_array_fallback() {
        let pkg = json!({ "exports": { ".": ["invalid", "./ok.js"] } });
        assert_eq!(resolve_exports_root(&pkg, REQUIRE), Some("./ok.js".to_string()));
    }

    #[test]
    fn test_exports_subpath() {
        let pkg = json!({
            "exports": {
                ".": "./index.js",
                "./feature": { "require": "./feature.cjs", "default": "./feature.js" }
            }
        });
        assert_eq!(
            resolve_exports(&pkg, Some("./feature"), REQUIRE),
            Some("./feature.cjs".to_string())
        );
        assert_eq!(resolve_exports(&pkg, Some("./missing"), REQUIRE), None);
    }

    #[test]
    fn test_exports_pattern_most_specific() {
        let pkg = json!({
            "exports": {
                "./*": "./dist/*.js",
                "./features/*": "./dist/features/*.js",
                "./features/private/*": null
            }
        });
        assert_eq!(
            resolve_exports(&pkg, Some("./features/a"), REQUIRE),
            Some("./dist/features/a.js".to_string())
        );
        assert_eq!(
            resolve_exports(&pkg, Some("./util"), REQUIRE),
            Some("./dist/util.js".to_string())
        );
        assert_eq!(resolve_exports(&pkg, Some("./features/private/x"), REQUIRE), None);
    }

    #[test]
    fn test_exports_pattern_rejects_traversal() {
        let pkg = json!({ "exports": { "./*": "./dist/*" } });
        assert_eq!(resolve_exports(&pkg, Some("./../secret"), REQUIRE), None);
    }

    #[test]
    fn test_exports_invalid_target() {
        let pkg = json!({ "exports": "dist/index.js" });
        assert_eq!(resolve_exports_root(&pkg, REQUIRE), None);
    }

    #[test]
    fn test_imports_exact_and_pattern() {
        let pkg = json!({
            "imports": {
                "#internal": { "node": "./node.js", "default": "./browser.js" },
                "#utils/*": "./src/utils/*.js",
                "#dep": "some-package"
            }
        });
        assert_eq!(
            resolve_imports_map(&pkg, "#internal", &["node"]),
            Some("./node.js".to_string())
        );
        assert_eq!(
            resolve_imports_map(&pkg, "#utils/x", REQUIRE),
            Some("./src/utils/x.js".to_string())
        );
        assert_eq!(
            resolve_imports_map(&pkg, "#dep", REQUIRE),
            Some("some-package".to_string())
        );
        assert_eq!(resolve_imports_map(&pkg, "#nope", REQUIRE), None);
        assert_eq!(resolve_imports_map(&pkg, "internal", REQUIRE), None);
    }
}
