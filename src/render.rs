//! HTML layout composition.
//!
//! Projects may ship a shared `_layout.html` at the root of their namespace.
//! When present, the page content is injected into the first `{{content}}`
//! placeholder and remaining `{{identifier}}` placeholders are filled from
//! the project's attributes. Substitution is a single pass; substituted
//! values are never re-scanned.

use std::sync::OnceLock;

use regex::Regex;

use crate::registry::Project;
use crate::site_store::{SiteStore, StoreError};

/// Shared layout template, looked up per request at the namespace root.
const LAYOUT_FILE: &str = "_layout.html";
/// Injection point for the page content; only the first occurrence counts.
const CONTENT_SLOT: &str = "{{content}}";

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{\{([A-Za-z_][A-Za-z0-9_]*)\}\}").unwrap())
}

/// Compose the final HTML body for a page.
///
/// A project without a layout gets its content back unchanged; that is the
/// expected path, not an error. Any layout-loading failure other than a plain
/// miss degrades to raw content as well, logged server-side, rather than
/// failing the request.
pub async fn render_page(store: &dyn SiteStore, project: &Project, content: &str) -> String {
    let layout = match store.read(project, LAYOUT_FILE).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(StoreError::NotFound(_)) => return content.to_string(),
        Err(e) => {
            tracing::warn!(project_id = %project.id, error = %e, "Failed to load layout, serving raw content");
            return content.to_string();
        }
    };

    let composed = layout.replacen(CONTENT_SLOT, content, 1);
    substitute(&composed, project)
}

/// Replace every `{{identifier}}` with the matching project attribute:
/// strings verbatim, other values JSON-encoded, unknown identifiers blanked.
fn substitute(input: &str, project: &Project) -> String {
    let attrs = match serde_json::to_value(project) {
        Ok(serde_json::Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    };

    placeholder_regex()
        .replace_all(input, |caps: &regex::Captures<'_>| {
            match attrs.get(&caps[1]) {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(value) => value.to_string(),
                None => String::new(),
            }
        })
        .into_owned()
}
