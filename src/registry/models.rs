use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tenant unit owning a storage namespace and one or more hostnames.
///
/// `folder` is the globally unique namespace root under which the project's
/// files live (a directory tree on the filesystem backend, a key prefix on
/// the object store). It is generated once at creation and never changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: String,
    pub folder: String,
    pub hosts: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Derive a folder slug from a display name: lowercase, alphanumeric runs
/// kept, everything else collapsed into single dashes. Uniqueness is resolved
/// at creation time by suffixing `-1`, `-2`, ...
pub fn folder_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        "project".to_string()
    } else {
        slug
    }
}

/// Hostnames are matched case-insensitively and without surrounding
/// whitespace; normalize once at the registry boundary.
pub fn normalize_host(host: &str) -> String {
    host.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_slug_basic() {
        assert_eq!(folder_slug("Demo"), "demo");
        assert_eq!(folder_slug("My Cool Site"), "my-cool-site");
        assert_eq!(folder_slug("  spaced  out  "), "spaced-out");
        assert_eq!(folder_slug("café!"), "caf");
    }

    #[test]
    fn folder_slug_never_empty() {
        assert_eq!(folder_slug(""), "project");
        assert_eq!(folder_slug("!!!"), "project");
    }

    #[test]
    fn normalize_host_lowercases() {
        assert_eq!(normalize_host(" Example.COM "), "example.com");
    }
}
