//! Shared utilities for integration tests.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use fastdl::admin::{setup_admin_router, AdminState};
use fastdl::cache::FileCache;
use fastdl::precache::PrecachedSet;
use fastdl::{FastDlConfig, HttpServer, Shutdown};
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const API_KEY: &str = "test-key";

/// A running file server plus the handles tests poke at.
pub struct TestServer {
    pub addr: SocketAddr,
    pub cache: Arc<FileCache>,
    pub precached: Arc<PrecachedSet>,
    pub shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Lay out a small game directory.
pub fn game_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    write(root, "maps/de_dust2.bsp", b"BSP30-dust2");
    write(root, "maps/de_dust2.txt", b"Dust II");
    write(root, "maps/de_aztec.bsp", b"BSP30-aztec");
    write(root, "sound/ambience/wind.wav", b"RIFF-wind");
    write(root, "models/player.mdl", b"IDST");
    write(root, "gfx/env/desertup.tga", b"TGA");
    write(root, "readme.exe", b"MZ");
    write(root, "server.cfg", b"rcon_password secret");
    write(root, ".htaccess", b"deny");
    write(root, "addons/fastdl/fastdl.toml", b"");

    dir
}

fn write(root: &Path, relative: &str, contents: &[u8]) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

pub async fn spawn_server(config: FastDlConfig, game_dir: &Path) -> TestServer {
    let precached = Arc::new(PrecachedSet::new(config.serve_precached));
    let server = HttpServer::new(config, game_dir.to_path_buf(), precached.clone()).unwrap();
    let cache = server.cache();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();

    tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestServer {
        addr,
        cache,
        precached,
        shutdown,
    }
}

/// Start the control API against a running server. Returns its base URL.
pub async fn spawn_admin(server: &TestServer) -> String {
    let state = AdminState {
        precached: server.precached.clone(),
        cache: server.cache.clone(),
        api_key: Arc::from(API_KEY),
        download_url: Some(format!("http://{}", server.addr)),
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let mut shutdown = server.shutdown.subscribe();

    tokio::spawn(async move {
        axum::serve(listener, setup_admin_router(state))
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await
    });

    format!("http://{}", addr)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
