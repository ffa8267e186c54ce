//! Folder-level library model: discovery, naming conventions and merging.

pub mod book;
pub mod category;
pub mod naming;
pub mod selector;
pub mod walker;

pub use book::BookRecord;
pub use category::classify;
pub use naming::{ParsedFolder, parse_folder_name};
pub use selector::select_canonical_file;
pub use walker::discover;

/// Author used when none can be inferred.
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";
