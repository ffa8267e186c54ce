//! HTTP server and routes.

mod handlers;
mod state;

pub use state::AppState;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let sync_routes = Router::new()
        .route("/", post(handlers::sync_run))
        .route("/status", get(handlers::sync_status));

    let api_routes = Router::new()
        .route("/titles", get(handlers::list_titles))
        .route("/titles/{id}", get(handlers::get_title));

    Router::new()
        .nest("/api/sync", sync_routes)
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
