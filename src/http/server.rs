//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the file handler
//! - Wire up middleware (IP block, rate limit, timeout, request ID, tracing)
//! - Bind server to listener
//! - Run rate limiter housekeeping while serving

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{body::Body, http::Request, middleware, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::access::{AccessEngine, AccessError, AccessRules};
use crate::cache::FileCache;
use crate::config::FastDlConfig;
use crate::http::handler::{serve_path, serve_root};
use crate::precache::PrecachedSet;
use crate::security::ip_block::{ip_block_middleware, IpBlockFilter};
use crate::security::rate_limit::{rate_limit_middleware, RateLimiter};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub base_dir: Arc<PathBuf>,
    pub cache: Arc<FileCache>,
    pub access: Arc<AccessEngine>,
    pub auto_index: bool,
}

/// HTTP server for the game directory.
pub struct HttpServer {
    router: Router,
    cache: Arc<FileCache>,
    precached: Arc<PrecachedSet>,
    limiter: Arc<RateLimiter>,
}

impl HttpServer {
    /// Create a server for `base_dir`.
    ///
    /// Fails when a forbidden pattern does not compile; serving with a
    /// partial rule set is never attempted.
    pub fn new(
        config: FastDlConfig,
        base_dir: PathBuf,
        precached: Arc<PrecachedSet>,
    ) -> Result<Self, AccessError> {
        let rules = AccessRules::from_config(&config.access)?;
        let access = Arc::new(AccessEngine::new(rules, precached.clone()));
        let cache = Arc::new(FileCache::new(config.cache.size.capacity()));
        let limiter = Arc::new(RateLimiter::new(&config.rate_limits));
        let block_list = Arc::new(IpBlockFilter::from_entries(&config.block_list_ip));

        tracing::debug!(
            cache_capacity = cache.capacity(),
            rate_limits = config.rate_limits.len(),
            serve_precached = precached.is_enabled(),
            "File server configured"
        );

        let state = AppState {
            base_dir: Arc::new(base_dir),
            cache: cache.clone(),
            access,
            auto_index: config.auto_index_enabled,
        };

        let router = Self::build_router(&config, state, limiter.clone(), block_list);

        Ok(Self {
            router,
            cache,
            precached,
            limiter,
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Blocked clients are rejected before they are charged against a rate limit.
    #[allow(deprecated)]
    fn build_router(
        config: &FastDlConfig,
        state: AppState,
        limiter: Arc<RateLimiter>,
        block_list: Arc<IpBlockFilter>,
    ) -> Router {
        let mut router = Router::new()
            .route("/", get(serve_root))
            .route("/{*path}", get(serve_path))
            .with_state(state);

        if limiter.is_enabled() {
            router = router.layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));
        }

        if !block_list.is_empty() {
            router = router.layer(middleware::from_fn_with_state(block_list, ip_block_middleware));
        }

        router
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let housekeeping = self.limiter.purge_interval().map(|period| {
            let limiter = self.limiter.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(period);
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    let removed = limiter.purge_expired(Instant::now());
                    if removed > 0 {
                        tracing::debug!(removed, "Purged expired rate limit windows");
                    }
                }
            })
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        if let Some(task) = housekeeping {
            task.abort();
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn cache(&self) -> Arc<FileCache> {
        self.cache.clone()
    }

    pub fn precached(&self) -> Arc<PrecachedSet> {
        self.precached.clone()
    }
}
