//! Node.js built-in externalization and runtime polyfills.
//!
//! Server bundles keep built-ins external: each import becomes a tiny virtual
//! module forwarding to `$$require_external`, the late-bound accessor defined
//! by the `external-require` polyfill. Browser bundles resolve a same-named
//! package if one is installed, otherwise get an empty module.

use crate::error::ResolveError;
use crate::platform::Platform;
use crate::resolution::Resolution;
use crate::virtual_modules::{VirtualId, VirtualModuleRegistry, NS_NODE, NS_POLYFILL};
use tracing::debug;

/// Prefix accepted in front of built-in names.
pub const NODE_PREFIX: &str = "node:";

/// Polyfill key of the runtime accessor module.
pub const EXTERNAL_REQUIRE_KEY: &str = "external-require";

/// Polyfill key of the environment-variable placeholder module.
pub const ENVIRONMENT_VARIABLES_KEY: &str = "environment-variables";

/// Node.js standard library modules, sorted for binary search.
pub static NODE_BUILTIN_MODULES: &[&str] = &[
    "assert",
    "assert/strict",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "diagnostics_channel",
    "dns",
    "dns/promises",
    "domain",
    "events",
    "fs",
    "fs/promises",
    "http",
    "http2",
    "https",
    "inspector",
    "module",
    "net",
    "os",
    "path",
    "path/posix",
    "path/win32",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "readline/promises",
    "repl",
    "stream",
    "stream/consumers",
    "stream/promises",
    "stream/web",
    "string_decoder",
    "sys",
    "timers",
    "timers/promises",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "util/types",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

/// Canonical built-in name for a specifier, with any `node:` prefix removed.
///
/// `node:test` is only a built-in with the prefix, matching Node.
#[must_use]
pub fn node_builtin_name(specifier: &str) -> Option<&str> {
    if let Some(name) = specifier.strip_prefix(NODE_PREFIX) {
        if name == "test" || NODE_BUILTIN_MODULES.binary_search(&name).is_ok() {
            return Some(name);
        }
        return None;
    }
    NODE_BUILTIN_MODULES
        .binary_search(&specifier)
        .is_ok()
        .then_some(specifier)
}

/// Source of the server passthrough module for a built-in.
#[must_use]
pub fn passthrough_module(name: &str) -> String {
    format!("module.exports=$$require_external('node:{name}');")
}

/// Accessor for web bundles: real `require` outside the browser, a null stub inside.
#[must_use]
pub fn web_external_require() -> &'static str {
    r#"global.$$require_external = typeof window === "undefined" ? require : () => null;"#
}

/// Accessor for native bundles: host `require` outside the app runtime,
/// otherwise a stub that throws when a built-in is actually used.
#[must_use]
pub fn native_external_require() -> &'static str {
    concat!(
        r#"global.$$require_external = typeof expo === "undefined" ? eval("require") : "#,
        "(moduleId) => { throw new Error(`Node.js standard library module ${moduleId} ",
        "is not available in this JavaScript environment`); };"
    )
}

/// Register the runtime polyfills for a platform and return the ordered
/// polyfill list.
///
/// Web gets only the accessor and the environment placeholder. Other
/// platforms get the host's polyfills first.
pub fn register_polyfills(
    registry: &VirtualModuleRegistry,
    platform: Option<&Platform>,
    host_polyfills: &[String],
) -> Vec<String> {
    let env_id = VirtualId::new(NS_POLYFILL, ENVIRONMENT_VARIABLES_KEY);
    registry.set(&env_id, "//");

    let accessor_id = VirtualId::new(NS_POLYFILL, EXTERNAL_REQUIRE_KEY);
    let web = crate::platform::is_web(platform);
    let accessor = if web {
        web_external_require()
    } else {
        native_external_require()
    };
    registry.set(&accessor_id, accessor);

    let mut polyfills = if web {
        Vec::with_capacity(2)
    } else {
        host_polyfills.to_vec()
    };
    polyfills.push(accessor_id.as_str().to_string());
    polyfills.push(env_id.as_str().to_string());
    polyfills
}

/// Decide a built-in import.
///
/// Returns `Ok(None)` when the specifier is not a built-in. `optional` is
/// only invoked for browser requests.
///
/// # Errors
/// Propagates errors returned by `optional`.
pub fn resolve_node_external<F>(
    registry: &VirtualModuleRegistry,
    specifier: &str,
    is_server: bool,
    optional: F,
) -> Result<Option<Resolution>, ResolveError>
where
    F: FnOnce(&str) -> Result<Option<Resolution>, ResolveError>,
{
    let Some(name) = node_builtin_name(specifier) else {
        return Ok(None);
    };

    if !is_server {
        return Ok(Some(optional(specifier)?.unwrap_or(Resolution::Empty)));
    }

    debug!("Virtualizing Node.js \"{}\"", name);
    let id = VirtualId::new(NS_NODE, name);
    registry.set(&id, passthrough_module(name));
    Ok(Some(Resolution::source_file(id.to_path())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_list_sorted() {
        let mut sorted = NODE_BUILTIN_MODULES.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, NODE_BUILTIN_MODULES);
    }

    #[test]
    fn test_builtin_name() {
        assert_eq!(node_builtin_name("fs"), Some("fs"));
        assert_eq!(node_builtin_name("node:fs"), Some("fs"));
        assert_eq!(node_builtin_name("fs/promises"), Some("fs/promises"));
        assert_eq!(node_builtin_name("node:test"), Some("test"));
        assert_eq!(node_builtin_name("test"), None);
        assert_eq!(node_builtin_name("lodash"), None);
        assert_eq!(node_builtin_name("node:lodash"), None);
    }

    #[test]
    fn test_server_registers_passthrough() {
        let registry = VirtualModuleRegistry::new();
        let result =
            resolve_node_external(&registry, "node:fs", true, |_| panic!("not consulted"))
                .unwrap()
                .unwrap();
        let path = result.file_path().unwrap().to_str().unwrap().to_string();
        assert_eq!(path, "\0node:fs");
        let contents = registry.get(&path).unwrap();
        assert_eq!(contents.as_ref(), "module.exports=$$require_external('node:fs');");
    }

    #[test]
    fn test_browser_falls_back_to_empty() {
        let registry = VirtualModuleRegistry::new();
        let result = resolve_node_external(&registry, "node:fs", false, |_| Ok(None))
            .unwrap()
            .unwrap();
        assert_eq!(result, Resolution::Empty);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_browser_prefers_installed_package() {
        let registry = VirtualModuleRegistry::new();
        let result = resolve_node_external(&registry, "path", false, |spec| {
            assert_eq!(spec, "path");
            Ok(Some(Resolution::source_file("/app/node_modules/path/index.js")))
        })
        .unwrap()
        .unwrap();
        assert_eq!(
            result,
            Resolution::source_file("/app/node_modules/path/index.js")
        );
    }

    #[test]
    fn test_not_builtin_defers() {
        let registry = VirtualModuleRegistry::new();
        assert!(resolve_node_external(&registry, "react", true, |_| Ok(None))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_polyfills_web() {
        let registry = VirtualModuleRegistry::new();
        let list = register_polyfills(&registry, Some(&Platform::web()), &["host.js".into()]);
        assert_eq!(
            list,
            vec![
                "\0polyfill:external-require".to_string(),
                "\0polyfill:environment-variables".to_string()
            ]
        );
        assert_eq!(
            registry.get("\0polyfill:external-require").as_deref(),
            Some(web_external_require())
        );
        assert_eq!(
            registry.get("\0polyfill:environment-variables").as_deref(),
            Some("//")
        );
    }

    #[test]
    fn test_polyfills_native() {
        let registry = VirtualModuleRegistry::new();
        let list = register_polyfills(
            &registry,
            Some(&Platform::new("ios")),
            &["host.js".into()],
        );
        assert_eq!(list[0], "host.js");
        assert_eq!(list.len(), 3);
        let accessor = registry.get("\0polyfill:external-require").unwrap();
        assert!(accessor.contains("is not available in this JavaScript environment"));
        assert!(!accessor.contains("try"));
    }
}
