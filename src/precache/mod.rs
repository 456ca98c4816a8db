//! Precached resource tracking.
//!
//! # Data Flow
//! ```text
//! Host engine (via admin API)
//!     → events.rs (model/sound/generic precache, map activation)
//!     → tracker.rs (PrecachedSet::append, ancestors included)
//!
//! Access engine
//!     → tracker.rs (PrecachedSet::contains)
//!
//! Level change
//!     → tracker.rs (PrecachedSet::reset, wholesale swap)
//! ```
//!
//! # Design Decisions
//! - The set only grows between resets
//! - A disabled tracker ignores appends entirely
//! - Readers never see a half-cleared set

pub mod events;
pub mod tracker;

pub use events::{map_resources, PrecacheKind};
pub use tracker::PrecachedSet;
