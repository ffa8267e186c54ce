//! Canonical file selection within a book folder.

use crate::config::BookFormat;
use std::path::{Path, PathBuf};

/// Pick the file that drives deep metadata extraction for a book folder.
///
/// Formats are tried in [`BookFormat::PREFERENCE`] order and extensions are
/// matched case-sensitively (`book.epub`, not `book.EPUB`). Several files of
/// the same format are resolved by lexicographic file name so the choice is
/// stable across filesystems.
pub fn select_canonical_file(folder: &Path) -> Option<(PathBuf, BookFormat)> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(folder)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    BookFormat::PREFERENCE.into_iter().find_map(|format| {
        files
            .iter()
            .find(|p| p.extension().and_then(|e| e.to_str()) == Some(format.extension()))
            .map(|p| (p.clone(), format))
    })
}
