//! Access control for served paths.
//!
//! # Data Flow
//! ```text
//! AccessConfig (extensions, path prefixes, patterns)
//!     → rules.rs (normalize, compile regexes once)
//!     → engine.rs (AccessEngine: rules + precached set)
//!
//! File handler / directory listing
//!     → engine.rs (check_file / check_dir)
//!     → Decision::Allow | Decision::Deny(reason)
//! ```
//!
//! # Design Decisions
//! - Rules are evaluated top to bottom; the first matching rule decides
//! - `cfg`/`ini` files and dotfiles can never be allowed by configuration
//! - An empty allow list means "no restriction" for that dimension
//! - Invalid patterns abort startup instead of serving with weaker filtering

pub mod engine;
pub mod rules;

pub use engine::{AccessEngine, Decision, DenyReason};
pub use rules::{AccessError, AccessRules};
