//! Control API for the game server process.
//!
//! The host engine reports precached resources, map activation and level
//! resets here. Bound to loopback by default and guarded by a Bearer key.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::cache::FileCache;
use crate::precache::PrecachedSet;
use self::auth::admin_auth_middleware;
use self::handlers::*;

/// State shared by the control API handlers.
#[derive(Clone)]
pub struct AdminState {
    pub precached: Arc<PrecachedSet>,
    pub cache: Arc<FileCache>,
    pub api_key: Arc<str>,
    pub download_url: Option<String>,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/precache", post(append_precached))
        .route("/admin/activate", post(activate_map))
        .route("/admin/reset", post(reset_precached))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
