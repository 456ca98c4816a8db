//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, admission middleware, request ID, tracing)
//!     → handler.rs (normalize path, cache lookup, stat, access decision)
//!         → listing.rs (directory requests, auto-index only)
//!     → response.rs (content type, Last-Modified, conditional GET)
//!     → Send to client
//! ```

pub mod handler;
pub mod listing;
pub mod path;
pub mod response;
pub mod server;

pub use response::ServeError;
pub use server::{AppState, HttpServer};
