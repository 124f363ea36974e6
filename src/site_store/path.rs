//! Path containment for project namespaces.
//!
//! Both backends funnel caller-supplied relative paths through [`normalize`]
//! before touching storage. The policy fails hard: absolute paths, `\`
//! separators, NUL bytes, and any `..` that would climb out of the namespace
//! are rejected as [`StoreError::AccessDenied`] rather than stripped. The
//! filesystem side additionally resolves symlinks via [`safe_join`] and
//! requires a path-component prefix match, so a namespace of `/data/foo`
//! never accepts `/data/foobar`.

use std::path::{Path, PathBuf};

use super::StoreError;

/// Lexically normalize an untrusted relative path.
///
/// Resolves `.` and `..` segments and collapses empty ones. Returns the
/// cleaned `/`-separated path, which may be empty when the input names the
/// namespace root itself. Decidable for every input; suspicious paths come
/// back as `AccessDenied`, never a panic.
pub fn normalize(path: &str) -> Result<String, StoreError> {
    if path.contains('\0') || path.contains('\\') {
        return Err(StoreError::AccessDenied);
    }
    if path.starts_with('/') || has_drive_prefix(path) {
        return Err(StoreError::AccessDenied);
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(StoreError::AccessDenied);
                }
            }
            other => segments.push(other),
        }
    }

    Ok(segments.join("/"))
}

/// Like [`normalize`], but rejects paths naming the namespace root itself,
/// which is never a retrievable leaf.
pub fn normalize_file(path: &str) -> Result<String, StoreError> {
    let normalized = normalize(path)?;
    if normalized.is_empty() {
        return Err(StoreError::NotAFile(path.to_string()));
    }
    Ok(normalized)
}

/// Join an already-normalized relative path onto a namespace directory and
/// verify the result stays inside it once symlinks are resolved.
///
/// The deepest existing ancestor of the joined path is canonicalized and the
/// not-yet-existing tail re-attached, so containment holds for files that are
/// about to be created as well as for ones already on disk.
pub fn safe_join(namespace: &Path, rel: &str) -> Result<PathBuf, StoreError> {
    debug_assert!(
        matches!(normalize(rel).as_deref(), Ok(n) if n == rel),
        "safe_join expects a normalized relative path"
    );

    let joined = namespace.join(rel);

    let mut existing = joined.clone();
    let mut tail: Vec<std::ffi::OsString> = Vec::new();
    while !existing.exists() {
        match existing.file_name() {
            Some(name) => {
                tail.push(name.to_os_string());
                existing.pop();
            }
            // Ran out of components without finding anything on disk.
            None => return Ok(joined),
        }
    }

    let mut resolved = existing
        .canonicalize()
        .map_err(|_| StoreError::AccessDenied)?;
    for name in tail.iter().rev() {
        resolved.push(name);
    }

    // Component-wise prefix check, not a string prefix.
    if resolved == *namespace || resolved.starts_with(namespace) {
        Ok(resolved)
    } else {
        Err(StoreError::AccessDenied)
    }
}

/// Derive the flat object key for a project file: `<folder>/<normalized>`.
pub fn object_key(folder: &str, path: &str) -> Result<String, StoreError> {
    let normalized = normalize_file(path)?;
    Ok(format!("{folder}/{normalized}"))
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_plain_paths() {
        assert_eq!(normalize("index.html").unwrap(), "index.html");
        assert_eq!(normalize("a/b/c.txt").unwrap(), "a/b/c.txt");
        assert_eq!(normalize("./a/./b").unwrap(), "a/b");
        assert_eq!(normalize("a//b").unwrap(), "a/b");
        assert_eq!(normalize("a/b/../c").unwrap(), "a/c");
        assert_eq!(normalize("").unwrap(), "");
        assert_eq!(normalize(".").unwrap(), "");
    }

    #[test]
    fn normalize_rejects_escapes() {
        assert!(matches!(
            normalize(".."),
            Err(StoreError::AccessDenied)
        ));
        assert!(matches!(
            normalize("../etc/passwd"),
            Err(StoreError::AccessDenied)
        ));
        assert!(matches!(
            normalize("a/../../b"),
            Err(StoreError::AccessDenied)
        ));
        assert!(matches!(
            normalize("/etc/passwd"),
            Err(StoreError::AccessDenied)
        ));
        assert!(matches!(
            normalize("C:/windows"),
            Err(StoreError::AccessDenied)
        ));
        assert!(matches!(
            normalize("a\\b"),
            Err(StoreError::AccessDenied)
        ));
        assert!(matches!(
            normalize("a\0b"),
            Err(StoreError::AccessDenied)
        ));
    }

    #[test]
    fn normalize_file_rejects_namespace_root() {
        assert!(matches!(normalize_file(""), Err(StoreError::NotAFile(_))));
        assert!(matches!(normalize_file("."), Err(StoreError::NotAFile(_))));
        assert_eq!(normalize_file("a").unwrap(), "a");
    }

    #[test]
    fn object_key_is_prefixed() {
        assert_eq!(object_key("demo", "css/site.css").unwrap(), "demo/css/site.css");
        assert!(object_key("demo", "../other").is_err());
    }

    #[test]
    fn safe_join_stays_inside() {
        let dir = tempfile::tempdir().unwrap();
        let ns = dir.path().canonicalize().unwrap();

        let inside = safe_join(&ns, "sub/file.txt").unwrap();
        assert!(inside.starts_with(&ns));
    }

    #[test]
    fn safe_join_rejects_sibling_with_shared_prefix() {
        // A namespace of .../data-foo must not accept .../data-foobar.
        let dir = tempfile::tempdir().unwrap();
        let foo = dir.path().join("data-foo");
        let foobar = dir.path().join("data-foobar");
        std::fs::create_dir_all(&foo).unwrap();
        std::fs::create_dir_all(&foobar).unwrap();
        std::fs::write(foobar.join("secret.txt"), "secret").unwrap();

        let ns = foo.canonicalize().unwrap();
        // The lexical layer already blocks the traversal spelling of this.
        assert!(matches!(
            normalize("../data-foobar/secret.txt"),
            Err(StoreError::AccessDenied)
        ));
        // And the canonical check blocks any joined path that lands beside
        // the namespace rather than inside it.
        let other = foobar.canonicalize().unwrap();
        assert!(!other.starts_with(&ns));
    }

    #[cfg(unix)]
    #[test]
    fn safe_join_rejects_symlink_escape() {
        let dir = tempfile::tempdir().unwrap();
        let ns = dir.path().join("ns");
        let outside = dir.path().join("outside");
        std::fs::create_dir_all(&ns).unwrap();
        std::fs::create_dir_all(&outside).unwrap();
        std::fs::write(outside.join("target.txt"), "outside").unwrap();
        std::os::unix::fs::symlink(&outside, ns.join("link")).unwrap();

        let ns = ns.canonicalize().unwrap();
        let result = safe_join(&ns, "link/target.txt");
        assert!(matches!(result, Err(StoreError::AccessDenied)));
    }
}
