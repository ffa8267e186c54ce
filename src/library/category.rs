//! Category detection from a folder's position under the library root.

use std::path::{Component, Path};

/// Derive the top-level category of `folder` within `library_root`.
///
/// The first path segment below the root is the category. Well-known
/// spellings are normalised; anything else is kept as-is.
pub fn classify(folder: &Path, library_root: &Path) -> Option<String> {
    let relative = folder.strip_prefix(library_root).ok()?;
    let first = relative.components().find(|c| matches!(c, Component::Normal(_)))?;

    Some(normalize_category(&first.as_os_str().to_string_lossy()))
}

fn normalize_category(segment: &str) -> String {
    match segment.to_lowercase().as_str() {
        "fiction" => "Fiction".to_string(),
        "non-fiction" | "nonfiction" => "Non-Fiction".to_string(),
        "fanfiction" | "fanfic" => "FanFiction".to_string(),
        _ => segment.to_string(),
    }
}
