mod schema;

pub use schema::Database;

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted title, keyed by the folder it was discovered in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Title {
    /// Unique title ID (UUID v5 of the folder path).
    pub id: String,
    /// Book title.
    pub title: String,
    /// Ordered authors (JSON array at rest).
    pub authors: Vec<String>,
    /// Series name.
    pub series: Option<String>,
    /// Position in series, as text ("1", "1.5").
    pub series_number: Option<String>,
    /// Top-level category derived from the folder position.
    pub category: Option<String>,
    /// Publication year.
    pub publication_year: Option<i32>,
    /// Approximate word count.
    pub word_count: Option<u64>,
    /// Plain-text summary.
    pub summary: Option<String>,
    /// Sanitized tags (JSON array at rest).
    pub tags: Vec<String>,
    /// Absolute folder path, the natural key.
    pub folder_path: String,
    /// Canonical file used for extraction.
    pub file_path: Option<String>,
    /// First cover gradient colour.
    pub cover_color_1: String,
    /// Second cover gradient colour.
    pub cover_color_2: String,
    /// Creation timestamp.
    pub created_at: i64,
    /// Last update timestamp.
    pub updated_at: i64,
}

impl Title {
    /// Deterministic ID for a folder path.
    pub fn id_for_folder(folder_path: &str) -> String {
        uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_URL, folder_path.as_bytes()).to_string()
    }

    /// Primary author, used for cover colours and display.
    pub fn first_author(&self) -> &str {
        self.authors
            .first()
            .map(String::as_str)
            .unwrap_or(crate::library::UNKNOWN_AUTHOR)
    }
}

/// Database access consumed by the sync engine.
///
/// Every write is committed on its own so that a failure on one folder
/// never rolls back folders already written.
pub trait TitleStore: Send + Sync {
    /// Look up a title by its folder path.
    fn find_title_by_folder(&self, folder_path: &str) -> Result<Option<Title>>;

    /// Insert a new title. Fails if the folder path is already known.
    fn insert_title(&self, title: &Title) -> Result<()>;

    /// Overwrite the mutable fields of an existing title.
    fn update_title(&self, title: &Title) -> Result<()>;
}

/// Timestamp helper.
pub fn now_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Convert timestamp to DateTime.
pub fn timestamp_to_datetime(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or_else(Utc::now)
}
