use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error raised while turning a specifier into a [`crate::Resolution`].
///
/// Only [`ResolveError::FailedToResolveName`] and
/// [`ResolveError::FailedToResolvePath`] are "expected" failures; every other
/// variant aborts the resolution of the current import edge.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Unable to resolve module '{specifier}' from '{}'", origin.display())]
    FailedToResolveName {
        specifier: String,
        origin: PathBuf,
        tried: Vec<PathBuf>,
    },

    #[error("Unable to resolve path '{}' from '{}'", path.display(), origin.display())]
    FailedToResolvePath {
        path: PathBuf,
        origin: PathBuf,
        tried: Vec<PathBuf>,
    },

    #[error("Invalid alias pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Failed to parse package.json at {}: {source}", path.display())]
    PackageJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Other(String),
}

impl ResolveError {
    /// Whether this is a resolution-class failure that the optional resolver may swallow.
    ///
    /// A host substituting its own default algorithm must map its "not found"
    /// errors onto these two variants.
    #[must_use]
    pub fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            Self::FailedToResolveName { .. } | Self::FailedToResolvePath { .. }
        )
    }

    /// Candidate paths that were probed before failing (empty for other errors).
    #[must_use]
    pub fn tried(&self) -> &[PathBuf] {
        match self {
            Self::FailedToResolveName { tried, .. } | Self::FailedToResolvePath { tried, .. } => {
                tried
            }
            _ => &[],
        }
    }

    /// Stable error code for machine-readable output.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::FailedToResolveName { .. } => "FAILED_TO_RESOLVE_NAME",
            Self::FailedToResolvePath { .. } => "FAILED_TO_RESOLVE_PATH",
            Self::InvalidPattern { .. } => "INVALID_PATTERN",
            Self::PackageJson { .. } => "PACKAGE_JSON_INVALID",
            Self::Io { .. } => "IO_ERROR",
            Self::Other(_) => "UNCLASSIFIED",
        }
    }

    #[must_use]
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Failure to load a path-mapping source (`tsconfig.json` / `jsconfig.json`).
///
/// Never escapes the pipeline: the loader logs it and disables path mapping
/// until the next successful reload.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config at {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Config inheritance is too deep at {}", path.display())]
    ExtendsTooDeep { path: PathBuf },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } | Self::ExtendsTooDeep { path } => {
                path
            }
        }
    }
}
