//! FastDL server.
//!
//! Serves a game directory over plain HTTP so clients can fetch maps,
//! models and sounds without the engine's in-band transfer.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ ip_block ──▶ rate_limit ──▶ file handler ──▶ cache ──▶ response
//!                                              │   ▲
//!                                              ▼   │
//!                                      access engine ◀── precached set
//!                                                              ▲
//!   Game server ──▶ admin API (precache / activate / reset) ───┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use fastdl::admin::{setup_admin_router, AdminState};
use fastdl::config::{load_config, load_for_game_dir};
use fastdl::lifecycle::{bind_listener, wait_for_signal, Shutdown};
use fastdl::observability::{logging, metrics};
use fastdl::precache::PrecachedSet;
use fastdl::HttpServer;

#[derive(Parser)]
#[command(name = "fastdl", version)]
#[command(about = "HTTP download server for game assets", long_about = None)]
struct Cli {
    /// Game directory to serve.
    #[arg(short, long, default_value = ".")]
    game_dir: PathBuf,

    /// Config file; defaults to fastdl.toml in the game directory or addons/fastdl.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let (config, source) = match &cli.config {
        Some(path) => (load_config(path)?, Some(path.clone())),
        None => load_for_game_dir(&cli.game_dir)?,
    };

    logging::init_logging(&config.observability, cli.log_level.as_deref());

    tracing::info!("fastdl v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        source = ?source,
        game_dir = %cli.game_dir.display(),
        auto_index = config.auto_index_enabled,
        serve_precached = config.serve_precached,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let precached = Arc::new(PrecachedSet::new(config.serve_precached));
    let listener = bind_listener(&config.listener).await?;
    let local_addr = listener.local_addr()?;

    let download_url = config.download_url(local_addr.port());
    match &download_url {
        Some(url) => tracing::info!(url = %url, "Download URL"),
        None => tracing::warn!(
            address = %local_addr,
            "No routable download URL; set listener.host or custom_download_url"
        ),
    }

    let admin = config.admin.clone();
    let server = HttpServer::new(config, cli.game_dir.clone(), precached.clone())?;
    let shutdown = Shutdown::new();
    let mut tasks = Vec::new();

    if admin.enabled {
        let state = AdminState {
            precached,
            cache: server.cache(),
            api_key: Arc::from(admin.api_key.as_str()),
            download_url,
        };
        let admin_listener = TcpListener::bind(&admin.bind_address).await?;
        tracing::info!(address = %admin_listener.local_addr()?, "Control API listening");

        let mut admin_shutdown = shutdown.subscribe();
        tasks.push(tokio::spawn(async move {
            axum::serve(admin_listener, setup_admin_router(state))
                .with_graceful_shutdown(async move {
                    let _ = admin_shutdown.recv().await;
                })
                .await
        }));
    }

    tasks.push(tokio::spawn(server.run(listener, shutdown.subscribe())));

    wait_for_signal().await;
    shutdown.trigger();

    for task in tasks {
        if let Err(e) = task.await? {
            tracing::error!(error = %e, "Server exited with error");
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
