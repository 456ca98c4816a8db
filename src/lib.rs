//! FastDL: HTTP download server for game assets.

// Request pipeline
pub mod access;
pub mod cache;
pub mod http;
pub mod precache;
pub mod security;

// Host integration
pub mod admin;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::schema::FastDlConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
