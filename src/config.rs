use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Library synchronization engine for folder-organised ebook collections.
#[derive(Parser, Debug, Clone)]
#[command(name = "shelfsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file.
    #[arg(short, long, env = "SHELFSYNC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the HTTP server (default if no command given).
    Serve {
        /// Address to bind the server to.
        #[arg(short, long)]
        bind: Option<SocketAddr>,

        /// Library root, overriding the config file.
        #[arg(short, long)]
        library: Option<PathBuf>,
    },

    /// Run one synchronization pass and print the summary.
    Sync {
        /// Re-extract and overwrite metadata for folders already known.
        #[arg(long)]
        full: bool,

        /// Library root, overriding the config file.
        #[arg(short, long)]
        library: Option<PathBuf>,
    },

    /// List synchronized titles.
    Titles,

    /// Show the metadata a sync would record for one folder, without writing.
    Inspect {
        /// Book folder to inspect.
        folder: PathBuf,
    },

    /// Initialize database and create default config.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
}

/// Main configuration from TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Library configuration.
    #[serde(default)]
    pub library: LibraryConfig,

    /// Sync configuration.
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to.
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::new(
        std::net::IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0)),
        8080,
    )
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/shelfsync.db")
}

/// Library configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Root of the folder tree to synchronize.
    #[serde(default = "default_library_path")]
    pub path: PathBuf,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            path: default_library_path(),
        }
    }
}

fn default_library_path() -> PathBuf {
    PathBuf::from("library")
}

/// Sync configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Number of parallel workers for metadata extraction (1 = sequential).
    /// Keep low for NAS/network storage to avoid saturation.
    #[serde(default = "default_sync_workers")]
    pub workers: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            workers: default_sync_workers(),
        }
    }
}

fn default_sync_workers() -> usize {
    1
}

impl Config {
    /// Load configuration from file.
    pub fn load(path: &PathBuf) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::error::AppError::Config(format!("Failed to read config file: {}", e))
        })?;

        toml::from_str(&content).map_err(|e| {
            crate::error::AppError::Config(format!("Failed to parse config file: {}", e))
        })
    }

    /// Find config file in default locations.
    pub fn find_config_file() -> Option<PathBuf> {
        let candidates = [
            PathBuf::from("config.toml"),
            PathBuf::from("shelfsync.toml"),
            dirs::config_dir()
                .map(|p| p.join("shelfsync").join("config.toml"))
                .unwrap_or_default(),
            PathBuf::from("/etc/shelfsync/config.toml"),
        ];

        candidates.into_iter().find(|p| p.exists())
    }

    /// Generate default config file content.
    pub fn generate_default() -> String {
        r#"# shelfsync configuration

[server]
bind = "0.0.0.0:8080"

[database]
# path = "/var/lib/shelfsync/shelfsync.db"

[library]
# One folder per book, optionally grouped under category folders:
#   Fiction/Brandon Sanderson - [Mistborn 1] The Final Empire/book.epub
path = "library"

[sync]
# Parallel metadata extraction workers (1 = sequential)
workers = 1
"#
        .to_string()
    }
}

/// Supported book formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookFormat {
    /// EPUB format (Electronic Publication).
    Epub,
    /// PDF format (Portable Document Format).
    Pdf,
    /// MOBI format (Mobipocket eBook).
    Mobi,
    /// AZW3 format (Kindle Format 8).
    Azw3,
}

impl BookFormat {
    /// Formats in the order the canonical file selector prefers them.
    pub const PREFERENCE: [BookFormat; 4] = [
        BookFormat::Epub,
        BookFormat::Pdf,
        BookFormat::Mobi,
        BookFormat::Azw3,
    ];

    /// Lower-case file extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            BookFormat::Epub => "epub",
            BookFormat::Pdf => "pdf",
            BookFormat::Mobi => "mobi",
            BookFormat::Azw3 => "azw3",
        }
    }

    /// Try to detect format from file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "epub" => Some(BookFormat::Epub),
            "pdf" => Some(BookFormat::Pdf),
            "mobi" => Some(BookFormat::Mobi),
            "azw3" => Some(BookFormat::Azw3),
            _ => None,
        }
    }

    /// Detect the format of a file from its path.
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}
