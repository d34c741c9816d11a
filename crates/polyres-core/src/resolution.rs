use crate::virtual_modules::is_virtual_path;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Outcome of resolving one import edge.
///
/// Strategies return `Option<Resolution>`: `None` defers to the next
/// strategy, which is not the same thing as [`Resolution::Empty`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Resolution {
    /// A source file on disk, or a virtual module id.
    #[serde(rename_all = "camelCase")]
    SourceFile { file_path: PathBuf },
    /// An asset and its scale variants.
    #[serde(rename_all = "camelCase")]
    AssetFiles { file_paths: Vec<PathBuf> },
    /// Explicit no-op stub.
    Empty,
}

impl Resolution {
    #[must_use]
    pub fn source_file(path: impl Into<PathBuf>) -> Self {
        Self::SourceFile {
            file_path: path.into(),
        }
    }

    /// The source file path, if this is a `SourceFile`.
    #[must_use]
    pub fn file_path(&self) -> Option<&Path> {
        match self {
            Self::SourceFile { file_path } => Some(file_path),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Whether this points at a virtual module rather than a file on disk.
    #[must_use]
    pub fn is_virtual(&self) -> bool {
        self.file_path().is_some_and(is_virtual_path)
    }

    /// Short tag used in logs and JSON output.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SourceFile { .. } => "sourceFile",
            Self::AssetFiles { .. } => "assetFiles",
            Self::Empty => "empty",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_tagged() {
        let json = serde_json::to_value(Resolution::source_file("/app/a.js")).unwrap();
        assert_eq!(json["type"], "sourceFile");
        assert_eq!(json["filePath"], "/app/a.js");

        let json = serde_json::to_value(Resolution::Empty).unwrap();
        assert_eq!(json["type"], "empty");
    }

    #[test]
    fn test_virtual_detection() {
        assert!(Resolution::source_file("\0node:fs").is_virtual());
        assert!(!Resolution::source_file("/app/a.js").is_virtual());
        assert!(!Resolution::Empty.is_virtual());
    }
}
