//! Specifier alias table.
//!
//! Exact aliases are scoped to a platform. Pattern aliases are universal and
//! only consulted when no exact alias matched; the first matching pattern in
//! registration order wins.

use crate::error::ResolveError;
use crate::platform::{Platform, WEB};
use regex_lite::Regex;
use rustc_hash::FxHashMap;

/// Default pattern redirecting the legacy icon package.
pub const VECTOR_ICONS_PATTERN: &str = r"^react-native-vector-icons(/.*)?";
/// Replacement for [`VECTOR_ICONS_PATTERN`].
pub const VECTOR_ICONS_TEMPLATE: &str = "@expo/vector-icons$1";
/// Package that must be resolvable before [`VECTOR_ICONS_PATTERN`] is registered.
pub const VECTOR_ICONS_PACKAGE: &str = "@expo/vector-icons";

#[derive(Debug)]
struct PatternAlias {
    regex: Regex,
    template: String,
}

/// Platform-scoped exact aliases plus universal pattern aliases.
#[derive(Debug, Default)]
pub struct AliasTable {
    per_platform: FxHashMap<String, FxHashMap<String, String>>,
    patterns: Vec<PatternAlias>,
}

impl AliasTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the built-in web aliases (`react-native` to `react-native-web`).
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        table.platform_alias(WEB, "react-native", "react-native-web");
        table.platform_alias(WEB, "react-native/index", "react-native-web");
        table
    }

    /// Register an exact alias for one platform.
    pub fn platform_alias(&mut self, platform: &str, from: &str, to: &str) -> &mut Self {
        self.per_platform
            .entry(platform.to_string())
            .or_default()
            .insert(from.to_string(), to.to_string());
        self
    }

    /// Register a universal pattern alias.
    ///
    /// `template` may reference capture groups as `$1`..`$9`.
    ///
    /// # Errors
    /// Returns [`ResolveError::InvalidPattern`] if the regex does not compile.
    pub fn pattern(&mut self, pattern: &str, template: &str) -> Result<&mut Self, ResolveError> {
        let regex = Regex::new(pattern).map_err(|e| ResolveError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        self.patterns.push(PatternAlias {
            regex,
            template: template.to_string(),
        });
        Ok(self)
    }

    /// Find the alias target for a specifier.
    #[must_use]
    pub fn lookup(&self, specifier: &str, platform: Option<&Platform>) -> Option<String> {
        if let Some(target) = platform
            .and_then(|p| self.per_platform.get(p.as_str()))
            .and_then(|aliases| aliases.get(specifier))
        {
            return Some(target.clone());
        }

        self.patterns.iter().find_map(|alias| {
            let caps = alias.regex.captures(specifier)?;
            Some(expand_template(&alias.template, &caps))
        })
    }

    #[must_use]
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }
}

/// Substitute `$N` back-references. Unmatched groups expand to "".
fn expand_template(template: &str, caps: &regex_lite::Captures<'_>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '$' {
            if let Some(d) = chars.peek().and_then(|d| d.to_digit(10)) {
                chars.next();
                if let Some(m) = caps.get(d as usize) {
                    out.push_str(m.as_str());
                }
                continue;
            }
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn icons_table() -> AliasTable {
        let mut table = AliasTable::with_defaults();
        table
            .pattern(VECTOR_ICONS_PATTERN, VECTOR_ICONS_TEMPLATE)
            .unwrap();
        table
    }

    #[test]
    fn test_exact_alias_is_web_only() {
        let table = AliasTable::with_defaults();
        assert_eq!(
            table.lookup("react-native", Some(&Platform::web())).as_deref(),
            Some("react-native-web")
        );
        assert_eq!(
            table.lookup("react-native/index", Some(&Platform::web())).as_deref(),
            Some("react-native-web")
        );
        assert!(table.lookup("react-native", Some(&Platform::new("ios"))).is_none());
        assert!(table.lookup("react-native", None).is_none());
    }

    #[test]
    fn test_pattern_with_subpath() {
        let table = icons_table();
        assert_eq!(
            table
                .lookup("react-native-vector-icons/Ionicons", Some(&Platform::new("ios")))
                .as_deref(),
            Some("@expo/vector-icons/Ionicons")
        );
    }

    #[test]
    fn test_pattern_missing_group_is_empty() {
        let table = icons_table();
        assert_eq!(
            table.lookup("react-native-vector-icons", None).as_deref(),
            Some("@expo/vector-icons")
        );
    }

    #[test]
    fn test_exact_wins_over_pattern() {
        let mut table = AliasTable::with_defaults();
        table.pattern("^react-native$", "should-not-win").unwrap();
        assert_eq!(
            table.lookup("react-native", Some(&Platform::web())).as_deref(),
            Some("react-native-web")
        );
        assert_eq!(
            table.lookup("react-native", Some(&Platform::new("android"))).as_deref(),
            Some("should-not-win")
        );
    }

    #[test]
    fn test_first_pattern_wins() {
        let mut table = AliasTable::new();
        table.pattern("^a(.*)", "first$1").unwrap();
        table.pattern("^ab(.*)", "second$1").unwrap();
        assert_eq!(table.lookup("abc", None).as_deref(), Some("firstbc"));
    }

    #[test]
    fn test_invalid_pattern() {
        let mut table = AliasTable::new();
        let err = table.pattern("(unclosed", "x").unwrap_err();
        assert!(matches!(err, ResolveError::InvalidPattern { .. }));
        assert_eq!(table.pattern_count(), 0);
    }

    #[test]
    fn test_literal_dollar_kept() {
        let mut table = AliasTable::new();
        table.pattern("^money$", "cost$").unwrap();
        assert_eq!(table.lookup("money", None).as_deref(), Some("cost$"));
    }
}
