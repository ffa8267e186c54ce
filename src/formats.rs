mod epub;
mod pdf;
pub mod text;

pub use epub::EpubHandler;
pub use pdf::PdfHandler;

use crate::config::BookFormat;
use crate::error::Result;
use serde::Serialize;
use std::path::Path;

/// Metadata read from inside a book file.
///
/// `None` always means the file did not provide the field, never that it
/// provided an explicitly empty value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractedMetadata {
    /// Title.
    pub title: Option<String>,
    /// Authors in document order.
    pub authors: Option<Vec<String>>,
    /// Four-digit publication year.
    pub publication_year: Option<i32>,
    /// Plain-text summary.
    pub summary: Option<String>,
    /// Sanitized tags.
    pub tags: Option<Vec<String>>,
    /// Approximate word count.
    pub word_count: Option<u64>,
    /// Series name.
    pub series: Option<String>,
    /// Position in series.
    pub series_number: Option<String>,
}

/// Trait for format-specific metadata extractors.
pub trait FormatHandler: Send + Sync {
    /// Extract metadata from a book file.
    ///
    /// Returns an error only when the file cannot be opened as its container
    /// format at all. Problems inside a readable container degrade to
    /// missing fields.
    fn extract_metadata(&self, path: &Path) -> Result<ExtractedMetadata>;
}

/// Get the appropriate handler for a book format.
pub fn get_handler(format: BookFormat) -> Box<dyn FormatHandler> {
    match format {
        BookFormat::Epub => Box::new(EpubHandler),
        BookFormat::Pdf => Box::new(PdfHandler),
        // Kindle formats carry no metadata we read
        BookFormat::Mobi | BookFormat::Azw3 => Box::new(MinimalHandler),
    }
}

/// Extract metadata, degrading any failure to an empty result.
pub fn extract_or_default(path: &Path, format: BookFormat) -> ExtractedMetadata {
    get_handler(format)
        .extract_metadata(path)
        .unwrap_or_else(|e| {
            tracing::debug!(path = %path.display(), error = %e, "Failed to extract metadata");
            ExtractedMetadata::default()
        })
}

/// Minimal handler for formats without special metadata.
struct MinimalHandler;

impl FormatHandler for MinimalHandler {
    fn extract_metadata(&self, _path: &Path) -> Result<ExtractedMetadata> {
        Ok(ExtractedMetadata::default())
    }
}
