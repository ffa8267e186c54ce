//! Merged book metadata for one folder.

use crate::cover::generate_cover_colors;
use crate::db::Title;
use crate::formats::ExtractedMetadata;
use crate::library::ParsedFolder;
use serde::Serialize;
use std::path::PathBuf;

/// Everything the sync engine knows about a book folder before writing it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookRecord {
    /// Book title.
    pub title: String,
    /// Authors, never empty.
    pub authors: Vec<String>,
    /// Series name.
    pub series: Option<String>,
    /// Position in series.
    pub series_number: Option<String>,
    /// Top-level category.
    pub category: Option<String>,
    /// Publication year.
    pub publication_year: Option<i32>,
    /// Approximate word count.
    pub word_count: Option<u64>,
    /// Plain-text summary.
    pub summary: Option<String>,
    /// Sanitized tags.
    pub tags: Vec<String>,
    /// Canonical file the metadata was extracted from.
    pub file_path: Option<PathBuf>,
}

impl BookRecord {
    /// Start from the folder-name guess.
    pub fn from_parsed(parsed: ParsedFolder, category: Option<String>) -> Self {
        Self {
            title: parsed.title,
            authors: parsed.authors,
            series: parsed.series,
            series_number: parsed.series_number,
            category,
            publication_year: None,
            word_count: None,
            summary: None,
            tags: Vec::new(),
            file_path: None,
        }
    }

    /// Overlay extracted metadata.
    ///
    /// Extracted title, authors, year, summary, tags and word count win
    /// whenever present. Series fields are only replaced when the file
    /// itself names a series; the folder name is authoritative otherwise.
    pub fn overlay(&mut self, extracted: ExtractedMetadata) {
        if let Some(title) = extracted.title {
            self.title = title;
        }
        if let Some(authors) = extracted.authors
            && !authors.is_empty()
        {
            self.authors = authors;
        }
        if extracted.publication_year.is_some() {
            self.publication_year = extracted.publication_year;
        }
        if extracted.summary.is_some() {
            self.summary = extracted.summary;
        }
        if let Some(tags) = extracted.tags
            && !tags.is_empty()
        {
            self.tags = tags;
        }
        if extracted.word_count.is_some() {
            self.word_count = extracted.word_count;
        }
        if extracted.series.is_some() {
            self.series = extracted.series;
            self.series_number = extracted.series_number;
        }
    }

    /// Keep stored optional fields the fresh extraction did not produce.
    pub fn retain_existing(&mut self, existing: &Title) {
        if self.publication_year.is_none() {
            self.publication_year = existing.publication_year;
        }
        if self.word_count.is_none() {
            self.word_count = existing.word_count;
        }
        if self.summary.is_none() {
            self.summary = existing.summary.clone();
        }
        if self.tags.is_empty() {
            self.tags = existing.tags.clone();
        }
    }

    /// Build the persisted row for `folder_path`.
    pub fn into_title(self, folder_path: String, created_at: i64, updated_at: i64) -> Title {
        let series_number = self.series.as_ref().and(self.series_number);

        let mut title = Title {
            id: Title::id_for_folder(&folder_path),
            title: self.title,
            authors: self.authors,
            series: self.series,
            series_number,
            category: self.category,
            publication_year: self.publication_year,
            word_count: self.word_count,
            summary: self.summary,
            tags: self.tags,
            folder_path,
            file_path: self.file_path.map(|p| p.to_string_lossy().to_string()),
            cover_color_1: String::new(),
            cover_color_2: String::new(),
            created_at,
            updated_at,
        };

        let (first, second) = generate_cover_colors(&title.title, title.first_author());
        title.cover_color_1 = first;
        title.cover_color_2 = second;
        title
    }
}
