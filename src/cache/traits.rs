//! Core traits and types for the notice cache.

use chrono::{DateTime, Utc};

use crate::notice::types::Notice;

/// Source of the current time.
///
/// The cache asks the clock whenever it decides freshness, so tests can
/// move time forward without sleeping.
pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

/// What a `refresh` call ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
  /// Cached data was fresh, the store was not contacted
  Fresh,
  /// The store answered, items were replaced with this many notices
  Fetched(usize),
  /// The store call failed; items were left untouched
  Failed(String),
  /// The cache was disposed; nothing was stored
  Disposed,
}

impl RefreshOutcome {
  pub fn is_failed(&self) -> bool {
    matches!(self, RefreshOutcome::Failed(_))
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      RefreshOutcome::Failed(e) => Some(e),
      _ => None,
    }
  }
}

/// Point-in-time copy of the cache state for rendering.
#[derive(Debug, Clone, Default)]
pub struct CacheSnapshot {
  pub items: Vec<Notice>,
  pub is_loading: bool,
  pub last_error: Option<String>,
  pub last_fetched_at: Option<DateTime<Utc>>,
}
