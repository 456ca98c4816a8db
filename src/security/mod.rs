//! Admission layer.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → ip_block.rs (403 for block-listed clients)
//!     → rate_limit.rs (429 with Retry-After over any limit)
//!     → Pass to file handler
//! ```
//!
//! # Design Decisions
//! - Clients are identified by the connection's remote address only
//! - Both layers are skipped entirely when unconfigured

pub mod ip_block;
pub mod rate_limit;

pub use ip_block::{ip_block_middleware, IpBlockFilter};
pub use rate_limit::{rate_limit_middleware, Admission, RateLimiter};
