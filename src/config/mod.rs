//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! fastdl.toml (game dir, then addons/fastdl)
//!     → loader.rs (locate, parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → FastDlConfig (validated, immutable)
//!     → shared with all subsystems at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - A missing config file means stock defaults, not an error

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_for_game_dir, ConfigError};
pub use schema::{
    AccessConfig, AdminConfig, CacheConfig, CacheSize, FastDlConfig, ListenerConfig,
    ObservabilityConfig, RateLimitRule, TimeoutConfig,
};
