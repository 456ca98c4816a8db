//! In-memory file cache subsystem.
//!
//! # Data Flow
//! ```text
//! File handler (cache miss, access allowed)
//!     → file.rs (CacheFile: bytes + stat metadata)
//!     → recency.rs (FileCache::put, byte-bounded eviction)
//!
//! File handler (next request for the same path)
//!     → recency.rs (FileCache::open, recency refresh)
//!     → file.rs (VirtualFile served instead of disk)
//! ```
//!
//! # Design Decisions
//! - Capacity is measured in bytes of file content, not entry count
//! - Index and recency order live behind one mutex
//! - Entries larger than the whole capacity are never cached
//! - Contents are `Bytes`, so a cache hit never copies the payload

pub mod file;
pub mod recency;

pub use file::{CacheFile, FileMeta, VirtualFile};
pub use recency::{CacheStats, FileCache, DEFAULT_CAPACITY};
