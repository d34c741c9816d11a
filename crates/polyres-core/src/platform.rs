//! Platform and environment tags.
//!
//! Platforms are an open set of strings (`"web"`, `"ios"`, `"android"`, ...).
//! Only `"web"` is privileged; every other tag gets native-style behavior.
//! Environments are a closed set orthogonal to the platform.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The privileged platform tag.
pub const WEB: &str = "web";

/// Deployment target tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Platform(String);

impl Platform {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn web() -> Self {
        Self(WEB.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_web(&self) -> bool {
        self.0 == WEB
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Platform {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for Platform {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Whether an optional platform is `web`.
#[must_use]
pub fn is_web(platform: Option<&Platform>) -> bool {
    platform.is_some_and(Platform::is_web)
}

/// Execution environment within a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Environment {
    /// Browser / client bundle.
    Client,
    /// Generic server runtime.
    Node,
    /// Edge runtime rendering server components.
    ReactServer,
}

impl Environment {
    /// Parse an environment tag. Unknown tags return `None`.
    #[must_use]
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "client" => Some(Self::Client),
            "node" => Some(Self::Node),
            "react-server" => Some(Self::ReactServer),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Node => "node",
            Self::ReactServer => "react-server",
        }
    }

    #[must_use]
    pub fn is_server(&self) -> bool {
        matches!(self, Self::Node | Self::ReactServer)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an optional environment is server-class.
#[must_use]
pub fn is_server_environment(environment: Option<Environment>) -> bool {
    environment.is_some_and(|e| e.is_server())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_web() {
        assert!(Platform::web().is_web());
        assert!(!Platform::new("ios").is_web());
        assert!(is_web(Some(&Platform::from("web"))));
        assert!(!is_web(None));
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse("node"), Some(Environment::Node));
        assert_eq!(
            Environment::parse("react-server"),
            Some(Environment::ReactServer)
        );
        assert_eq!(Environment::parse("client"), Some(Environment::Client));
        assert_eq!(Environment::parse("worker"), None);
    }

    #[test]
    fn test_server_environment() {
        assert!(is_server_environment(Some(Environment::Node)));
        assert!(is_server_environment(Some(Environment::ReactServer)));
        assert!(!is_server_environment(Some(Environment::Client)));
        assert!(!is_server_environment(None));
    }

    #[test]
    fn test_environment_serde_kebab_case() {
        let json = serde_json::to_string(&Environment::ReactServer).unwrap();
        assert_eq!(json, "\"react-server\"");
    }
}
