//! shelfsync: keeps a title database in step with a folder-organised ebook library.
//!
//! Every book lives in its own folder, optionally grouped under a category
//! folder, and named `Author - [Series N] Title`. A sync pass walks the
//! library, guesses metadata from the folder name, refines it from the best
//! file in the folder (EPUB, PDF, MOBI, AZW3) and records one title per
//! folder.
//!
//! # Features
//!
//! - Incremental and full sync passes
//! - EPUB OPF and PDF info dictionary extraction
//! - Word counts, publication years, summaries and tags
//! - Deterministic cover gradient colours
//! - Category detection based on directory structure
//! - Parallel extraction with a configurable worker count

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Configuration and CLI.
pub mod config;
/// Cover colour generation.
pub mod cover;
/// Database operations.
pub mod db;
/// Error types.
pub mod error;
/// Book format handlers.
pub mod formats;
/// Library layout: discovery, naming and categories.
pub mod library;
/// HTTP server.
pub mod server;
/// Synchronization engine.
pub mod sync;


pub use config::{Cli, Command, Config};
pub use db::{Database, Title, TitleStore};
pub use error::{AppError, Result};
pub use server::AppState;
pub use sync::{SyncEngine, SyncReport, SyncStatus};
