//! Library synchronization engine.
//!
//! One pass walks the library, turns every book folder into a
//! [`BookRecord`] and reconciles it against the stored titles, keyed by
//! folder path. Folders are committed one at a time; a failing folder is
//! counted and the pass moves on.

use crate::db::{Title, TitleStore, now_timestamp};
use crate::error::{AppError, Result};
use crate::formats;
use crate::library::{self, BookRecord};
use parking_lot::RwLock;
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Summary of a finished sync pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Folders seen for the first time and inserted.
    pub added: usize,
    /// Known folders rewritten by a full rescan.
    pub updated: usize,
    /// Known folders left untouched.
    pub skipped: usize,
    /// Folders that failed to process.
    pub errors: usize,
    /// Folders discovered.
    pub total: usize,
    /// Human-readable summary.
    pub message: String,
}

/// Live progress of the current (or last) sync pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    /// Whether a pass is running.
    pub in_progress: bool,
    /// Folder being processed.
    pub current_folder: Option<String>,
    /// Folders finished so far.
    pub processed: usize,
    /// Folders discovered in this pass.
    pub total: usize,
}

/// What to do with a discovered folder.
enum Plan {
    Skip,
    Insert,
    Update(Box<Title>),
}

enum Outcome {
    Added,
    Updated,
    Skipped,
}

/// Reconciles the folder tree with the title store.
pub struct SyncEngine {
    store: Arc<dyn TitleStore>,
    library_root: PathBuf,
    workers: usize,
    running: AtomicBool,
    status: RwLock<SyncStatus>,
}

/// Clears the in-progress state when a pass ends, however it ends.
struct RunGuard<'a> {
    engine: &'a SyncEngine,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        {
            let mut status = self.engine.status.write();
            status.in_progress = false;
            status.current_folder = None;
        }
        self.engine.running.store(false, Ordering::SeqCst);
    }
}

impl SyncEngine {
    /// Create an engine over `library_root`, extracting sequentially.
    pub fn new(store: Arc<dyn TitleStore>, library_root: impl Into<PathBuf>) -> Self {
        Self {
            store,
            library_root: library_root.into(),
            workers: 1,
            running: AtomicBool::new(false),
            status: RwLock::new(SyncStatus::default()),
        }
    }

    /// Extract metadata for up to `workers` folders in parallel.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Configured library root.
    pub fn library_root(&self) -> &Path {
        &self.library_root
    }

    /// Snapshot of the current progress.
    pub fn status(&self) -> SyncStatus {
        let mut status = self.status.read().clone();
        status.in_progress = self.running.load(Ordering::SeqCst);
        status
    }

    /// Run one pass. With `full`, already-known folders are re-extracted and
    /// rewritten; otherwise they are skipped.
    ///
    /// Fails outright only when another pass is running or the library root
    /// is missing. Per-folder failures are counted in the report.
    pub fn run(&self, full: bool) -> Result<SyncReport> {
        let _guard = self.begin()?;

        let root = std::fs::canonicalize(&self.library_root)
            .ok()
            .filter(|p| p.is_dir())
            .ok_or_else(|| AppError::LibraryNotFound(self.library_root.clone()))?;

        tracing::info!(root = %root.display(), full = full, workers = self.workers, "Starting library sync");
        let start = std::time::Instant::now();

        let folders = library::discover(&root);
        self.status.write().total = folders.len();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build worker pool: {}", e)))?;

        let mut report = SyncReport {
            total: folders.len(),
            ..Default::default()
        };

        for chunk in folders.chunks(self.workers) {
            let plans: Vec<Result<Plan>> = chunk.iter().map(|f| self.plan(f, full)).collect();

            self.set_current(&chunk[0]);
            let records: Vec<Option<Result<BookRecord>>> = pool.install(|| {
                chunk
                    .par_iter()
                    .zip(plans.par_iter())
                    .map(|(folder, plan)| match plan {
                        Ok(Plan::Insert) | Ok(Plan::Update(_)) => {
                            Some(build_record(folder, &root))
                        }
                        _ => None,
                    })
                    .collect()
            });

            for ((folder, plan), record) in chunk.iter().zip(plans).zip(records) {
                self.set_current(folder);

                match self.commit(folder, plan, record) {
                    Ok(Outcome::Added) => report.added += 1,
                    Ok(Outcome::Updated) => report.updated += 1,
                    Ok(Outcome::Skipped) => report.skipped += 1,
                    Err(e) => {
                        tracing::warn!(folder = %folder.display(), error = %e, "Failed to sync folder");
                        report.errors += 1;
                    }
                }

                self.status.write().processed += 1;
            }
        }

        report.message = if report.total == 0 {
            format!("No book folders found in {}", root.display())
        } else {
            format!(
                "Sync complete: {} added, {} updated, {} skipped, {} errors",
                report.added, report.updated, report.skipped, report.errors
            )
        };

        tracing::info!(
            added = report.added,
            updated = report.updated,
            skipped = report.skipped,
            errors = report.errors,
            total = report.total,
            elapsed = ?start.elapsed(),
            "Library sync complete"
        );

        Ok(report)
    }

    /// Claim the in-progress flag, rejecting a concurrent pass.
    fn begin(&self) -> Result<RunGuard<'_>> {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::info!("Sync already in progress, rejecting");
            return Err(AppError::SyncInProgress);
        }

        *self.status.write() = SyncStatus {
            in_progress: true,
            ..Default::default()
        };

        Ok(RunGuard { engine: self })
    }

    fn set_current(&self, folder: &Path) {
        self.status.write().current_folder = Some(folder_key(folder));
    }

    fn plan(&self, folder: &Path, full: bool) -> Result<Plan> {
        match self.store.find_title_by_folder(&folder_key(folder))? {
            None => Ok(Plan::Insert),
            Some(existing) if full => Ok(Plan::Update(Box::new(existing))),
            Some(_) => Ok(Plan::Skip),
        }
    }

    fn commit(
        &self,
        folder: &Path,
        plan: Result<Plan>,
        record: Option<Result<BookRecord>>,
    ) -> Result<Outcome> {
        let (plan, record) = match (plan?, record) {
            (Plan::Skip, _) => return Ok(Outcome::Skipped),
            (plan, Some(record)) => (plan, record?),
            (_, None) => {
                return Err(AppError::Internal(format!(
                    "No metadata prepared for {}",
                    folder.display()
                )));
            }
        };

        let now = now_timestamp();
        match plan {
            Plan::Update(existing) => {
                let mut record = record;
                record.retain_existing(&existing);
                let title = record.into_title(folder_key(folder), existing.created_at, now);
                self.store.update_title(&title)?;
                tracing::debug!(folder = %folder.display(), title = %title.title, "Updated title");
                Ok(Outcome::Updated)
            }
            _ => {
                let title = record.into_title(folder_key(folder), now, now);
                self.store.insert_title(&title)?;
                tracing::debug!(folder = %folder.display(), title = %title.title, "Added title");
                Ok(Outcome::Added)
            }
        }
    }
}

/// Stored identity of a folder.
fn folder_key(folder: &Path) -> String {
    folder.to_string_lossy().to_string()
}

/// Folder-name guess plus category, before any file is opened.
fn base_record(folder: &Path, library_root: &Path) -> BookRecord {
    let name = folder
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    BookRecord::from_parsed(
        library::parse_folder_name(&name),
        library::classify(folder, library_root),
    )
}

/// Merge the folder-name guess with metadata from the canonical file.
///
/// Fails when the canonical file cannot be opened as its format at all.
pub fn build_record(folder: &Path, library_root: &Path) -> Result<BookRecord> {
    let mut record = base_record(folder, library_root);

    if let Some((file, format)) = library::select_canonical_file(folder) {
        let extracted = formats::get_handler(format).extract_metadata(&file)?;
        record.overlay(extracted);
        record.file_path = Some(file);
    }

    Ok(record)
}

/// Like [`build_record`], but an unreadable file only loses its metadata.
pub fn preview_record(folder: &Path, library_root: &Path) -> BookRecord {
    let mut record = base_record(folder, library_root);

    if let Some((file, format)) = library::select_canonical_file(folder) {
        record.overlay(formats::extract_or_default(&file, format));
        record.file_path = Some(file);
    }

    record
}
