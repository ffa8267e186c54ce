//! Book folder discovery.

use crate::config::BookFormat;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Find every directory under `root` that directly contains a book file.
///
/// A matching directory is terminal: its own subdirectories are not
/// scanned. Hidden directories are never entered, and directories that
/// cannot be read are left out instead of failing the walk. The root itself
/// is never returned. Results are depth-first in file-name order.
pub fn discover(root: &Path) -> Vec<PathBuf> {
    let mut folders = Vec::new();
    let mut walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || (e.file_type().is_dir() && !is_hidden(e)));

    loop {
        let entry = match walker.next() {
            None => break,
            Some(Ok(entry)) => entry,
            Some(Err(e)) => {
                tracing::debug!(error = %e, "Skipping unreadable directory");
                continue;
            }
        };

        match contains_book_file(entry.path()) {
            Ok(true) => {
                folders.push(entry.into_path());
                walker.skip_current_dir();
            }
            Ok(false) => {}
            Err(e) => {
                tracing::debug!(path = %entry.path().display(), error = %e, "Skipping unreadable directory");
                walker.skip_current_dir();
            }
        }
    }

    folders
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

/// Whether `dir` directly contains a file with a recognized book extension.
fn contains_book_file(dir: &Path) -> std::io::Result<bool> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && BookFormat::from_path(&path).is_some() {
            return Ok(true);
        }
    }
    Ok(false)
}
