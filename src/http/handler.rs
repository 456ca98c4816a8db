//! File request handling.
//!
//! ```text
//! normalize → cache hit? ─yes→ serve
//!               │no
//!               stat ─err→ 404
//!               ├─ dir  → listing
//!               └─ file → access check ─deny→ 404
//!                           └─ read ─err→ 500 → cache fill → serve
//! ```

use std::path::PathBuf;
use std::time::Instant;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, Uri},
    response::{IntoResponse, Response},
};

use crate::access::Decision;
use crate::cache::{CacheFile, FileMeta, VirtualFile};
use crate::http::listing;
use crate::http::path::normalize_request_path;
use crate::http::response::{file_response, ServeError};
use crate::http::server::AppState;
use crate::observability::metrics;

pub async fn serve_root(State(state): State<AppState>, uri: Uri, headers: HeaderMap) -> Response {
    serve(&state, "/", uri.path(), &headers).await
}

pub async fn serve_path(
    State(state): State<AppState>,
    Path(path): Path<String>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    serve(&state, &path, uri.path(), &headers).await
}

async fn serve(state: &AppState, decoded_path: &str, raw_path: &str, headers: &HeaderMap) -> Response {
    let start = Instant::now();
    let key = normalize_request_path(decoded_path);

    let response = match resolve(state, &key, raw_path, headers).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    };

    metrics::record_request(response.status().as_u16(), start);
    response
}

async fn resolve(
    state: &AppState,
    key: &str,
    raw_path: &str,
    headers: &HeaderMap,
) -> Result<Response, ServeError> {
    let file_name = key.rsplit('/').next().unwrap_or_default();

    if let Ok(file) = state.cache.open(key) {
        metrics::record_cache_lookup(true);
        tracing::debug!(path = %key, "Serving from cache");
        return Ok(file_response(file, file_name, headers));
    }
    metrics::record_cache_lookup(false);

    let fs_path = filesystem_path(state, key);
    let metadata = tokio::fs::metadata(&fs_path)
        .await
        .map_err(|_| ServeError::NotFound)?;

    if metadata.is_dir() {
        return listing::list_directory(state, key, raw_path, &fs_path).await;
    }

    if let Decision::Deny(reason) = state.access.check_file(key) {
        tracing::debug!(path = %key, reason = ?reason, "File access denied");
        return Err(ServeError::NotFound);
    }

    let contents = tokio::fs::read(&fs_path)
        .await
        .map_err(|source| ServeError::Read {
            path: fs_path.clone(),
            source,
        })?;

    let meta = FileMeta {
        len: contents.len() as u64,
        ..FileMeta::from_metadata(&metadata)
    };
    let file = CacheFile::new(contents, meta);
    state.cache.put(key, file.clone());

    Ok(file_response(
        VirtualFile::new(file.contents, file.meta),
        file_name,
        headers,
    ))
}

/// Location of a normalized request key under the game directory.
fn filesystem_path(state: &AppState, key: &str) -> PathBuf {
    let relative = key.trim_start_matches('/');
    if relative.is_empty() {
        state.base_dir.to_path_buf()
    } else {
        state.base_dir.join(relative)
    }
}
