use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Marker directory that separates a project from its installed dependencies.
pub const NODE_MODULES: &str = "node_modules";

/// Read a file to string, replacing invalid UTF-8 sequences with the replacement character.
///
/// # Errors
/// Returns an error if the file cannot be read.
pub fn read_to_string_lossy(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => Ok(String::from_utf8_lossy(e.as_bytes()).into_owned()),
    }
}

/// Replace Windows path separators with forward slashes.
///
/// Borrows when the input already uses forward slashes only.
#[must_use]
pub fn normalize_slashes(path: &str) -> Cow<'_, str> {
    if path.contains('\\') {
        Cow::Owned(path.replace('\\', "/"))
    } else {
        Cow::Borrowed(path)
    }
}

/// Resolve symlinks and return an absolute path without the `\\?\` prefix on Windows.
///
/// # Errors
/// Returns an error if the path does not exist.
pub fn realpath(path: &Path) -> io::Result<PathBuf> {
    dunce::canonicalize(path)
}

/// Canonicalize when possible, otherwise return the path unchanged.
#[must_use]
pub fn realpath_or_self(path: &Path) -> PathBuf {
    dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Return the part of `path` after the last `node_modules/` segment.
///
/// `"/app/node_modules/a/node_modules/b/index.js"` becomes `"b/index.js"`.
/// Returns `None` when the path is not inside a dependency tree.
#[must_use]
pub fn dependency_relative_name(path: &str) -> Option<String> {
    let normal = normalize_slashes(path);
    let marker = format!("{NODE_MODULES}/");
    let idx = normal.rfind(&marker)?;
    Some(normal[idx + marker.len()..].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn test_read_to_string_lossy_valid_utf8() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"export default 1;").unwrap();
        file.flush().unwrap();

        let content = read_to_string_lossy(file.path()).unwrap();
        assert_eq!(content, "export default 1;");
    }

    #[test]
    fn test_read_to_string_lossy_invalid_utf8() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0x48, 0x69, 0x80]).unwrap();
        file.flush().unwrap();

        let content = read_to_string_lossy(file.path()).unwrap();
        assert!(content.starts_with("Hi"));
        assert!(content.contains('\u{FFFD}'));
    }

    #[test]
    fn test_normalize_slashes() {
        assert_eq!(normalize_slashes("a/b/c"), "a/b/c");
        assert!(matches!(normalize_slashes("a/b"), Cow::Borrowed(_)));
        assert_eq!(normalize_slashes(r"C:\app\node_modules\x"), "C:/app/node_modules/x");
    }

    #[test]
    fn test_dependency_relative_name() {
        assert_eq!(
            dependency_relative_name("/app/node_modules/react-native/index.js").as_deref(),
            Some("react-native/index.js")
        );
        assert_eq!(
            dependency_relative_name("/app/node_modules/a/node_modules/b/lib/x.js").as_deref(),
            Some("b/lib/x.js")
        );
        assert_eq!(
            dependency_relative_name(r"C:\app\node_modules\pkg\x.js").as_deref(),
            Some("pkg/x.js")
        );
        assert!(dependency_relative_name("/app/src/index.js").is_none());
    }

    #[test]
    fn test_realpath_or_self_missing() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.js");
        assert_eq!(realpath_or_self(&missing), missing);
    }

    #[test]
    fn test_realpath_existing() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.js");
        fs::write(&file, "").unwrap();
        assert!(realpath(&file).unwrap().ends_with("a.js"));
    }
}
