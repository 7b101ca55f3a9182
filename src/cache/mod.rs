//! Client-side notice cache.
//!
//! This module keeps the notice list in memory so views can share it:
//! - Serves the cached list while it is younger than the freshness window
//! - Refetches on demand, coalescing concurrent refreshes into one store call
//! - Applies optimistic add/update/remove after confirmed remote writes
//! - Keeps showing stale items when a refresh fails

mod layer;
mod traits;

pub use layer::{NoticeCache, FRESHNESS_WINDOW_MINUTES};
pub use traits::{CacheSnapshot, Clock, RefreshOutcome, SystemClock};
