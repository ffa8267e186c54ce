//! HTTP request handlers.

use crate::db::{Title, timestamp_to_datetime};
use crate::error::{AppError, Result};
use crate::server::AppState;
use crate::sync::{SyncReport, SyncStatus};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

/// Sync trigger parameters.
#[derive(Debug, Default, Deserialize)]
pub struct SyncQuery {
    /// Re-extract folders that are already known.
    #[serde(default)]
    pub full: bool,
}

/// API: Run one sync pass and return its summary.
pub async fn sync_run(
    State(state): State<AppState>,
    Query(query): Query<SyncQuery>,
) -> Result<Json<SyncReport>> {
    let engine = state.engine.clone();
    let report = tokio::task::spawn_blocking(move || engine.run(query.full))
        .await
        .map_err(|e| AppError::Internal(format!("Sync task failed: {}", e)))??;

    Ok(Json(report))
}

/// API: Progress of the running (or last) sync pass.
pub async fn sync_status(State(state): State<AppState>) -> Json<SyncStatus> {
    Json(state.engine.status())
}

/// Title as served over the API.
#[derive(Debug, Serialize)]
pub struct TitleEntry {
    #[serde(flatten)]
    title: Title,
    updated: String,
}

impl From<Title> for TitleEntry {
    fn from(title: Title) -> Self {
        let updated = timestamp_to_datetime(title.updated_at).to_rfc3339();
        Self { title, updated }
    }
}

/// Title list response.
#[derive(Serialize)]
pub struct TitlesResponse {
    titles: Vec<TitleEntry>,
    total: usize,
}

/// API: List all synchronized titles.
pub async fn list_titles(State(state): State<AppState>) -> Result<Json<TitlesResponse>> {
    let titles: Vec<TitleEntry> = state
        .db
        .list_titles()?
        .into_iter()
        .map(TitleEntry::from)
        .collect();
    let total = titles.len();

    Ok(Json(TitlesResponse { titles, total }))
}

/// API: Get one title by ID.
pub async fn get_title(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TitleEntry>> {
    let title = state
        .db
        .get_title(&id)?
        .ok_or_else(|| AppError::NotFound(id.clone()))?;

    Ok(Json(title.into()))
}
