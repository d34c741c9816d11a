use std::path::{Component, Path, PathBuf};

/// Files that mark a project root.
const ROOT_MARKERS: &[&str] = &["package.json", "tsconfig.json", "jsconfig.json", ".git"];

/// Find the project root by walking up from `cwd`.
///
/// Returns the first directory containing `package.json`, a path-mapping
/// config, or `.git`.
#[must_use]
pub fn project_root(cwd: &Path) -> Option<PathBuf> {
    let mut current = cwd.to_path_buf();

    loop {
        if ROOT_MARKERS.iter().any(|m| current.join(m).exists()) {
            return Some(current);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Lexically normalize a path: drop `.` segments and fold `..` into its parent.
///
/// Does not touch the filesystem, so symlinks are preserved.
#[must_use]
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// `./x`, `../x`, `.` or `..`.
#[must_use]
pub fn is_relative_specifier(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

/// Unix absolute, Windows drive (`C:\`, `C:/`) or UNC path.
#[must_use]
pub fn is_absolute_specifier(specifier: &str) -> bool {
    if specifier.starts_with('/') || specifier.starts_with("\\\\") {
        return true;
    }
    let bytes = specifier.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/')
}
