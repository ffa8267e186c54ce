//! Application state shared across handlers.

use crate::config::Config;
use crate::db::Database;
use crate::sync::SyncEngine;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<Config>,
    /// Database connection.
    pub db: Database,
    /// Sync engine over the configured library.
    pub engine: Arc<SyncEngine>,
}

impl AppState {
    /// Create application state, wiring the engine to `db`.
    pub fn new(config: Config, db: Database) -> Self {
        let engine = SyncEngine::new(Arc::new(db.clone()), config.library.path.clone())
            .with_workers(config.sync.workers);

        Self {
            config: Arc::new(config),
            db,
            engine: Arc::new(engine),
        }
    }

    /// Start a sync pass on a background thread (non-blocking).
    pub fn start_background_sync(&self) {
        let engine = self.engine.clone();
        std::thread::spawn(move || match engine.run(false) {
            Ok(report) => tracing::info!(message = %report.message, "Background sync finished"),
            Err(e) => tracing::error!(error = %e, "Background sync failed"),
        });
    }
}
