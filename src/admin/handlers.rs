use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;
use crate::cache::CacheStats;
use crate::precache::{map_resources, PrecacheKind};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub download_url: Option<String>,
    pub serve_precached: bool,
    pub precached_paths: usize,
    pub cache: CacheStats,
}

#[derive(Debug, Deserialize)]
pub struct PrecacheEntry {
    pub kind: PrecacheKind,
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct PrecacheBatch {
    pub resources: Vec<PrecacheEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ActivateRequest {
    pub map: String,
    #[serde(default)]
    pub sky_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PrecacheSummary {
    pub precached_paths: usize,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        download_url: state.download_url.clone(),
        serve_precached: state.precached.is_enabled(),
        precached_paths: state.precached.len(),
        cache: state.cache.stats(),
    })
}

pub async fn append_precached(
    State(state): State<AdminState>,
    Json(batch): Json<PrecacheBatch>,
) -> Json<PrecacheSummary> {
    for entry in &batch.resources {
        state.precached.append(&entry.kind.resource_path(&entry.path));
    }

    Json(PrecacheSummary {
        precached_paths: state.precached.len(),
    })
}

pub async fn activate_map(
    State(state): State<AdminState>,
    Json(request): Json<ActivateRequest>,
) -> Json<PrecacheSummary> {
    tracing::info!(map = %request.map, sky = %request.sky_name, "Map activated");

    for resource in map_resources(&request.map, &request.sky_name) {
        state.precached.append(&resource);
    }

    Json(PrecacheSummary {
        precached_paths: state.precached.len(),
    })
}

pub async fn reset_precached(State(state): State<AdminState>) -> StatusCode {
    state.precached.reset();
    StatusCode::NO_CONTENT
}
