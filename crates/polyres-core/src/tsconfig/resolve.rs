//! Resolution through `compilerOptions.paths`.

use super::PathMappingConfig;
use crate::error::ResolveError;
use crate::resolution::Resolution;
use tracing::debug;

/// A matched `paths` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch<'a> {
    /// The `paths` key that matched.
    pub key: &'a str,
    /// Text captured by `*` (`None` for exact keys).
    pub star: Option<&'a str>,
}

/// Pick the `paths` key for `specifier`.
///
/// An exact key wins. Otherwise the `*` pattern with the longest prefix wins;
/// ties keep declaration order.
#[must_use]
pub fn match_pattern<'a>(
    keys: impl IntoIterator<Item = &'a str>,
    specifier: &'a str,
) -> Option<PatternMatch<'a>> {
    let mut best: Option<(usize, PatternMatch<'a>)> = None;

    for key in keys {
        let Some((prefix, suffix)) = key.split_once('*') else {
            if key == specifier {
                return Some(PatternMatch { key, star: None });
            }
            continue;
        };

        if specifier.len() < prefix.len() + suffix.len()
            || !specifier.starts_with(prefix)
            || !specifier.ends_with(suffix)
        {
            continue;
        }

        if best.as_ref().map_or(true, |(len, _)| prefix.len() > *len) {
            let star = &specifier[prefix.len()..specifier.len() - suffix.len()];
            best = Some((
                prefix.len(),
                PatternMatch {
                    key,
                    star: Some(star),
                },
            ));
        }
    }

    best.map(|(_, m)| m)
}

fn is_relative_or_absolute(specifier: &str) -> bool {
    specifier.starts_with("./")
        || specifier.starts_with("../")
        || specifier == "."
        || specifier == ".."
        || std::path::Path::new(specifier).is_absolute()
}

/// Resolve `specifier` through the path mappings.
///
/// `optional` resolves an absolute candidate path and returns `Ok(None)` when
/// it does not exist. Candidates are tried in declaration order. When
/// `baseUrl` was explicit and no candidate resolved, `baseUrl/<specifier>` is
/// tried last.
///
/// # Errors
/// Propagates errors returned by `optional`.
pub fn resolve_with_path_mappings<F>(
    config: &PathMappingConfig,
    specifier: &str,
    mut optional: F,
) -> Result<Option<Resolution>, ResolveError>
where
    F: FnMut(&str) -> Result<Option<Resolution>, ResolveError>,
{
    if is_relative_or_absolute(specifier) {
        return Ok(None);
    }

    let keys = config.paths.iter().map(|(key, _)| key.as_str());
    if let Some(matched) = match_pattern(keys, specifier) {
        let candidates = config
            .paths
            .iter()
            .find(|(key, _)| key == matched.key)
            .map(|(_, candidates)| candidates.as_slice())
            .unwrap_or_default();

        for candidate in candidates {
            let substituted = match matched.star {
                Some(star) => candidate.replacen('*', star, 1),
                None => candidate.clone(),
            };
            let full = config.base_url.join(&substituted);
            if let Some(result) = optional(&full.to_string_lossy())? {
                debug!("Path mapping {} -> {}", specifier, full.display());
                return Ok(Some(result));
            }
        }
    }

    if config.has_explicit_base_url {
        let full = config.base_url.join(specifier);
        if let Some(result) = optional(&full.to_string_lossy())? {
            debug!("baseUrl {} -> {}", specifier, full.display());
            return Ok(Some(result));
        }
    }

    Ok(None)
}
