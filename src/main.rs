//! shelfsync entry point.

use clap::Parser;
use shelfsync::{
    config::{Cli, Command, Config},
    db::{Database, timestamp_to_datetime},
    server, sync,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Find or load config
    let config_path = cli.config.clone().or_else(Config::find_config_file);

    let config = if let Some(ref path) = config_path {
        Config::load(path)?
    } else {
        Config::default()
    };

    init_logging();

    match cli.command {
        Some(Command::Init { force }) => cmd_init(force),
        Some(Command::Sync { full, library }) => cmd_sync(config, full, library).await,
        Some(Command::Titles) => cmd_titles(&config),
        Some(Command::Inspect { folder }) => cmd_inspect(&config, folder),
        Some(Command::Serve { bind, library }) => cmd_serve(config, bind, library).await,
        None => {
            // Default: start server
            cmd_serve(config, None, None).await
        }
    }
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shelfsync=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Initialize config and database.
fn cmd_init(force: bool) -> anyhow::Result<()> {
    let config_path = PathBuf::from("config.toml");

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, Config::generate_default())?;
    println!("Created config file: {}", config_path.display());

    let config = Config::default();
    let _db = Database::open(&config.database.path)?;
    println!("Initialized database: {}", config.database.path.display());

    println!("\nEdit config.toml to point [library] path at your books.");
    println!("Then run: shelfsync sync");

    Ok(())
}

/// Run one sync pass and print the summary.
async fn cmd_sync(mut config: Config, full: bool, library: Option<PathBuf>) -> anyhow::Result<()> {
    if let Some(path) = library {
        config.library.path = path;
    }

    let db = Database::open(&config.database.path)?;
    let engine = sync::SyncEngine::new(Arc::new(db), config.library.path.clone())
        .with_workers(config.sync.workers);

    let report = tokio::task::spawn_blocking(move || engine.run(full)).await??;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

/// List persisted titles.
fn cmd_titles(config: &Config) -> anyhow::Result<()> {
    let db = Database::open(&config.database.path)?;
    let titles = db.list_titles()?;

    if titles.is_empty() {
        println!("No titles found.");
        return Ok(());
    }

    println!("{:<40} {:<25} {:<15} UPDATED", "TITLE", "AUTHOR", "CATEGORY");
    println!("{}", "-".repeat(100));
    for title in &titles {
        println!(
            "{:<40} {:<25} {:<15} {}",
            truncate(&title.title, 40),
            truncate(title.first_author(), 25),
            title.category.as_deref().unwrap_or("-"),
            timestamp_to_datetime(title.updated_at).format("%Y-%m-%d %H:%M")
        );
    }
    println!("\n{} titles", titles.len());

    Ok(())
}

/// Print what a sync would record for one folder.
fn cmd_inspect(config: &Config, folder: PathBuf) -> anyhow::Result<()> {
    let folder = std::fs::canonicalize(&folder)?;
    let root = std::fs::canonicalize(&config.library.path).unwrap_or_else(|_| {
        folder
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| folder.clone())
    });

    let record = sync::preview_record(&folder, &root);
    println!("{}", serde_json::to_string_pretty(&record)?);

    Ok(())
}

/// Start the server.
async fn cmd_serve(
    mut config: Config,
    bind: Option<std::net::SocketAddr>,
    library: Option<PathBuf>,
) -> anyhow::Result<()> {
    if let Some(addr) = bind {
        config.server.bind = addr;
    }
    if let Some(path) = library {
        config.library.path = path;
    }

    let db = Database::open(&config.database.path)?;

    tracing::info!(
        bind = %config.server.bind,
        database = %config.database.path.display(),
        library = %config.library.path.display(),
        "Starting shelfsync server"
    );

    let state = server::AppState::new(config.clone(), db);

    // Initial incremental pass (non-blocking)
    state.start_background_sync();

    let app = server::create_router(state);

    let listener = TcpListener::bind(config.server.bind).await?;
    tracing::info!(address = %config.server.bind, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
