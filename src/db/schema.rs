use crate::db::*;
use crate::error::{AppError, Result};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::Arc;

const TITLE_COLUMNS: &str = "id, title, authors, series, series_number, category, publication_year,
     word_count, summary, tags, folder_path, file_path, cover_color_1, cover_color_2,
     created_at, updated_at";

/// Database wrapper for thread-safe access.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        // Create parent directories if needed
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| AppError::Database(format!("Failed to open database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.initialize_schema()?;
        Ok(db)
    }

    /// Open in-memory database (for testing).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Database(format!("Failed to open database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.initialize_schema()?;
        Ok(db)
    }

    /// Initialize database schema.
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS titles (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                authors TEXT NOT NULL DEFAULT '[]',
                series TEXT,
                series_number TEXT,
                category TEXT,
                publication_year INTEGER,
                word_count INTEGER,
                summary TEXT,
                tags TEXT NOT NULL DEFAULT '[]',
                folder_path TEXT NOT NULL UNIQUE,
                file_path TEXT,
                cover_color_1 TEXT NOT NULL,
                cover_color_2 TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_titles_category ON titles(category);
            CREATE INDEX IF NOT EXISTS idx_titles_series ON titles(series);
            "#,
        )
        .map_err(|e| AppError::Database(format!("Failed to initialize schema: {}", e)))?;

        Ok(())
    }

    /// Get title by ID.
    pub fn get_title(&self, id: &str) -> Result<Option<Title>> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("SELECT {TITLE_COLUMNS} FROM titles WHERE id = ?1"),
            params![id],
            Self::row_to_title,
        )
        .optional()
        .map_err(|e| AppError::Database(format!("Failed to get title: {}", e)))
    }

    /// Get all titles ordered by title.
    pub fn list_titles(&self) -> Result<Vec<Title>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {TITLE_COLUMNS} FROM titles ORDER BY title COLLATE NOCASE"
            ))
            .map_err(|e| AppError::Database(format!("Failed to prepare query: {}", e)))?;

        let titles = stmt
            .query_map([], Self::row_to_title)
            .map_err(|e| AppError::Database(format!("Failed to get titles: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AppError::Database(format!("Failed to collect titles: {}", e)))?;

        Ok(titles)
    }

    /// Number of persisted titles.
    pub fn count_titles(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM titles", [], |row| row.get(0))
            .map_err(|e| AppError::Database(format!("Failed to count titles: {}", e)))?;
        Ok(count as usize)
    }

    /// Helper to convert a row to Title.
    fn row_to_title(row: &rusqlite::Row<'_>) -> rusqlite::Result<Title> {
        let authors: String = row.get(2)?;
        let tags: String = row.get(9)?;
        let word_count: Option<i64> = row.get(7)?;

        Ok(Title {
            id: row.get(0)?,
            title: row.get(1)?,
            authors: serde_json::from_str(&authors).unwrap_or_default(),
            series: row.get(3)?,
            series_number: row.get(4)?,
            category: row.get(5)?,
            publication_year: row.get(6)?,
            word_count: word_count.map(|w| w.max(0) as u64),
            summary: row.get(8)?,
            tags: serde_json::from_str(&tags).unwrap_or_default(),
            folder_path: row.get(10)?,
            file_path: row.get(11)?,
            cover_color_1: row.get(12)?,
            cover_color_2: row.get(13)?,
            created_at: row.get(14)?,
            updated_at: row.get(15)?,
        })
    }

    fn encode_list(values: &[String]) -> Result<String> {
        serde_json::to_string(values)
            .map_err(|e| AppError::Internal(format!("Failed to encode list: {}", e)))
    }
}

impl TitleStore for Database {
    fn find_title_by_folder(&self, folder_path: &str) -> Result<Option<Title>> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("SELECT {TITLE_COLUMNS} FROM titles WHERE folder_path = ?1"),
            params![folder_path],
            Self::row_to_title,
        )
        .optional()
        .map_err(|e| AppError::Database(format!("Failed to look up folder: {}", e)))
    }

    fn insert_title(&self, title: &Title) -> Result<()> {
        let authors = Self::encode_list(&title.authors)?;
        let tags = Self::encode_list(&title.tags)?;

        let conn = self.conn.lock();
        conn.execute(
            &format!(
                "INSERT INTO titles ({TITLE_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
            ),
            params![
                title.id,
                title.title,
                authors,
                title.series,
                title.series_number,
                title.category,
                title.publication_year,
                title.word_count.map(|w| w as i64),
                title.summary,
                tags,
                title.folder_path,
                title.file_path,
                title.cover_color_1,
                title.cover_color_2,
                title.created_at,
                title.updated_at,
            ],
        )
        .map_err(|e| AppError::Database(format!("Failed to insert title: {}", e)))?;
        Ok(())
    }

    fn update_title(&self, title: &Title) -> Result<()> {
        let authors = Self::encode_list(&title.authors)?;
        let tags = Self::encode_list(&title.tags)?;

        let conn = self.conn.lock();
        let rows = conn
            .execute(
                "UPDATE titles SET
                    title = ?2,
                    authors = ?3,
                    series = ?4,
                    series_number = ?5,
                    category = ?6,
                    publication_year = ?7,
                    word_count = ?8,
                    summary = ?9,
                    tags = ?10,
                    file_path = ?11,
                    cover_color_1 = ?12,
                    cover_color_2 = ?13,
                    updated_at = ?14
                 WHERE folder_path = ?1",
                params![
                    title.folder_path,
                    title.title,
                    authors,
                    title.series,
                    title.series_number,
                    title.category,
                    title.publication_year,
                    title.word_count.map(|w| w as i64),
                    title.summary,
                    tags,
                    title.file_path,
                    title.cover_color_1,
                    title.cover_color_2,
                    title.updated_at,
                ],
            )
            .map_err(|e| AppError::Database(format!("Failed to update title: {}", e)))?;

        if rows == 0 {
            return Err(AppError::NotFound(title.folder_path.clone()));
        }
        Ok(())
    }
}
