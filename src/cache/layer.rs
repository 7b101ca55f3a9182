//! Notice cache that sits between the UI and the notice store.

use chrono::{DateTime, Duration, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

use super::traits::{CacheSnapshot, Clock, RefreshOutcome, SystemClock};
use crate::notice::store::NoticeStore;
use crate::notice::types::{Department, Notice, NoticeFilter, NoticeId};

/// How long a populated cache is served without asking the store again.
pub const FRESHNESS_WINDOW_MINUTES: i64 = 5;

type PendingRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

#[derive(Default)]
struct CacheState {
  items: Vec<Notice>,
  last_fetched_at: Option<DateTime<Utc>>,
  is_loading: bool,
  last_error: Option<String>,
  /// Fetches started so far; numbers the in-flight one
  generation: u64,
  /// The refresh callers join while it is running
  in_flight: Option<InFlight>,
  disposed: bool,
}

struct InFlight {
  generation: u64,
  pending: PendingRefresh,
}

fn lock_state(state: &Mutex<CacheState>) -> MutexGuard<'_, CacheState> {
  // Nothing panics while holding the lock, so a poisoned state is still consistent
  state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the loading flag when the fetch task ends, however it ends.
struct LoadingGuard(Arc<Mutex<CacheState>>);

impl Drop for LoadingGuard {
  fn drop(&mut self) {
    let mut state = lock_state(&self.0);
    state.is_loading = false;
    state.in_flight = None;
  }
}

/// In-memory, time-boundedly fresh list of notices.
///
/// - `refresh` fetches the full list from the store unless the cache is
///   populated and younger than the freshness window (or `force` is set).
///   Concurrent refreshes share one store call.
/// - `add` / `update` / `remove` are optimistic local edits applied after a
///   caller has confirmed the matching remote write. A later successful
///   refresh replaces the items wholesale.
/// - A failed refresh keeps the previous items and records `last_error`.
///
/// Cloning yields another handle to the same state.
pub struct NoticeCache<S: NoticeStore> {
  store: Arc<S>,
  state: Arc<Mutex<CacheState>>,
  clock: Arc<dyn Clock>,
  stale_time: Duration,
}

impl<S: NoticeStore> NoticeCache<S> {
  /// Create an empty cache reading from `store`.
  pub fn new(store: Arc<S>) -> Self {
    Self {
      store,
      state: Arc::new(Mutex::new(CacheState::default())),
      clock: Arc::new(SystemClock),
      stale_time: Duration::minutes(FRESHNESS_WINDOW_MINUTES),
    }
  }

  /// Use a different clock for freshness decisions.
  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  /// Set the freshness window.
  pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
    self.stale_time = stale_time;
    self
  }

  fn lock(&self) -> MutexGuard<'_, CacheState> {
    lock_state(&self.state)
  }

  fn is_fresh_at(&self, state: &CacheState, now: DateTime<Utc>) -> bool {
    !state.items.is_empty()
      && state
        .last_fetched_at
        .is_some_and(|fetched| now - fetched < self.stale_time)
  }

  /// Bring the cache up to date with the store.
  ///
  /// Returns `Fresh` without contacting the store when `force` is false and
  /// the cache holds items fetched within the freshness window. Otherwise
  /// joins the in-flight fetch or starts one. A forced refresh only joins a
  /// fetch that started after it was called; an older one is awaited first
  /// so its response cannot stand in for writes made since. Never fails:
  /// errors land in `last_error` and the returned outcome.
  pub async fn refresh(&self, force: bool) -> RefreshOutcome {
    let mut first_seen = None;

    loop {
      let (pending, joinable) = {
        let mut state = self.lock();
        if state.disposed {
          debug!("notice cache disposed, skipping fetch");
          return RefreshOutcome::Disposed;
        }
        if !force && self.is_fresh_at(&state, self.clock.now()) {
          debug!("notice cache fresh, skipping fetch");
          return RefreshOutcome::Fresh;
        }
        let called_at = *first_seen.get_or_insert(state.generation);
        let running = state
          .in_flight
          .as_ref()
          .map(|fetch| (fetch.generation, fetch.pending.clone()));
        match running {
          Some((generation, pending)) if !force || generation > called_at => {
            debug!(generation, "joining in-flight notice refresh");
            (pending, true)
          }
          Some((generation, pending)) => {
            debug!(generation, "waiting out older notice refresh");
            (pending, false)
          }
          None => (self.start_fetch(&mut state), true),
        }
      };

      let outcome = pending.await;
      if joinable {
        return outcome;
      }
    }
  }

  /// Spawn the store fetch and register it as the in-flight refresh.
  fn start_fetch(&self, state: &mut CacheState) -> PendingRefresh {
    state.is_loading = true;
    state.last_error = None;
    state.generation += 1;
    let generation = state.generation;

    let store = Arc::clone(&self.store);
    let shared = Arc::clone(&self.state);
    let started_at = self.clock.now();

    let task = tokio::spawn(async move {
      let _loading = LoadingGuard(Arc::clone(&shared));
      let result = store.list_notices(&NoticeFilter::default()).await;

      let mut state = lock_state(&shared);
      let outcome = match result {
        Ok(_) if state.disposed => RefreshOutcome::Disposed,
        Ok(items) => {
          let count = items.len();
          state.items = items;
          state.last_fetched_at = Some(started_at);
          state.last_error = None;
          debug!(count, "notice cache refreshed");
          RefreshOutcome::Fetched(count)
        }
        Err(e) => {
          warn!(error = %e, "notice refresh failed");
          let message = format!("Failed to fetch notices: {}", e);
          state.last_error = Some(message.clone());
          RefreshOutcome::Failed(message)
        }
      };
      drop(state);
      outcome
    });

    let shared = Arc::clone(&self.state);
    let pending = async move {
      match task.await {
        Ok(outcome) => outcome,
        Err(e) => {
          let message = format!("Failed to fetch notices: {}", e);
          lock_state(&shared).last_error = Some(message.clone());
          RefreshOutcome::Failed(message)
        }
      }
    }
    .boxed()
    .shared();

    state.in_flight = Some(InFlight {
      generation,
      pending: pending.clone(),
    });
    pending
  }

  /// Insert a notice the store just created at the front of the list.
  pub fn add(&self, notice: Notice) {
    self.lock().items.insert(0, notice);
  }

  /// Replace the notice with `id` in place. Unknown ids are ignored.
  pub fn update(&self, id: &NoticeId, notice: Notice) {
    let mut state = self.lock();
    if let Some(slot) = state.items.iter_mut().find(|n| &n.id == id) {
      *slot = notice;
    }
  }

  /// Drop the notice with `id`. Unknown ids are ignored.
  pub fn remove(&self, id: &NoticeId) {
    self.lock().items.retain(|n| &n.id != id);
  }

  /// Forget when the data was fetched so the next refresh goes to the store.
  pub fn invalidate(&self) {
    self.lock().last_fetched_at = None;
  }

  /// End the cache's life. Items are dropped, a refresh still in flight
  /// will not repopulate them, and later refreshes skip the store.
  pub fn dispose(self) {
    let mut state = self.lock();
    state.disposed = true;
    state.items.clear();
    state.last_fetched_at = None;
    debug!("notice cache disposed");
  }

  pub fn snapshot(&self) -> CacheSnapshot {
    let state = self.lock();
    CacheSnapshot {
      items: state.items.clone(),
      is_loading: state.is_loading,
      last_error: state.last_error.clone(),
      last_fetched_at: state.last_fetched_at,
    }
  }

  pub fn items(&self) -> Vec<Notice> {
    self.lock().items.clone()
  }

  pub fn get(&self, id: &NoticeId) -> Option<Notice> {
    self.lock().items.iter().find(|n| &n.id == id).cloned()
  }

  pub fn is_loading(&self) -> bool {
    self.lock().is_loading
  }

  pub fn last_error(&self) -> Option<String> {
    self.lock().last_error.clone()
  }

  pub fn last_fetched_at(&self) -> Option<DateTime<Utc>> {
    self.lock().last_fetched_at
  }

  /// Whether a non-forced refresh would skip the store right now.
  pub fn is_fresh(&self) -> bool {
    let state = self.lock();
    self.is_fresh_at(&state, self.clock.now())
  }

  /// The featured notice, or the newest one when none is flagged.
  pub fn featured(&self) -> Option<Notice> {
    let state = self.lock();
    state
      .items
      .iter()
      .find(|n| n.is_featured)
      .or_else(|| state.items.first())
      .cloned()
  }

  /// Notices shown for `department` (its own plus the wildcard ones).
  pub fn filtered(&self, department: Department) -> Vec<Notice> {
    self
      .lock()
      .items
      .iter()
      .filter(|n| n.applies_to(department))
      .cloned()
      .collect()
  }

  /// Per-department notice counts for departments that have notices of
  /// their own. Wildcard notices count toward each listed department.
  pub fn department_counts(&self) -> Vec<(Department, usize)> {
    let state = self.lock();
    Department::concrete()
      .filter(|dept| state.items.iter().any(|n| n.department == *dept))
      .map(|dept| {
        let count = state.items.iter().filter(|n| n.applies_to(dept)).count();
        (dept, count)
      })
      .collect()
  }
}

impl<S: NoticeStore> Clone for NoticeCache<S> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      state: Arc::clone(&self.state),
      clock: Arc::clone(&self.clock),
      stale_time: self.stale_time,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::notice::memory::{day, fixed_time, sample_notice, MemoryStore};

  /// Clock that only moves when told to
  struct ManualClock(Mutex<DateTime<Utc>>);

  impl ManualClock {
    fn new() -> Arc<Self> {
      Arc::new(Self(Mutex::new(fixed_time())))
    }

    fn advance(&self, by: Duration) {
      *self.0.lock().unwrap() += by;
    }
  }

  impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
      *self.0.lock().unwrap()
    }
  }

  fn setup(notices: Vec<Notice>) -> (Arc<MemoryStore>, NoticeCache<MemoryStore>, Arc<ManualClock>) {
    let store = Arc::new(MemoryStore::with_notices(notices));
    let clock = ManualClock::new();
    let cache = NoticeCache::new(Arc::clone(&store)).with_clock(clock.clone());
    (store, cache, clock)
  }

  fn ids(items: &[Notice]) -> Vec<&str> {
    items.iter().map(|n| n.id.as_str()).collect()
  }

  async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(std::time::Duration::from_secs(2), async {
      while !condition() {
        tokio::task::yield_now().await;
      }
    })
    .await
    .expect("condition was never reached");
  }

  #[tokio::test]
  async fn test_fresh_cache_skips_store() {
    let (store, cache, clock) = setup(vec![sample_notice("a", Department::CS, day(1))]);
    assert_eq!(cache.refresh(false).await, RefreshOutcome::Fetched(1));

    clock.advance(Duration::minutes(1));
    store.set_notices(Vec::new());

    assert_eq!(cache.refresh(false).await, RefreshOutcome::Fresh);
    assert_eq!(store.list_calls(), 1);
    assert_eq!(ids(&cache.items()), vec!["a"]);
  }

  #[tokio::test]
  async fn test_stale_cache_refetches() {
    let (store, cache, clock) = setup(vec![sample_notice("a", Department::CS, day(1))]);
    cache.refresh(false).await;

    clock.advance(Duration::minutes(6));
    store.set_notices(vec![
      sample_notice("b", Department::ME, day(2)),
      sample_notice("c", Department::ME, day(1)),
    ]);

    assert_eq!(cache.refresh(false).await, RefreshOutcome::Fetched(2));
    assert_eq!(store.list_calls(), 2);
    assert_eq!(ids(&cache.items()), vec!["b", "c"]);
    assert_eq!(
      cache.last_fetched_at(),
      Some(fixed_time() + Duration::minutes(6))
    );
  }

  #[tokio::test]
  async fn test_force_bypasses_freshness() {
    let (store, cache, _clock) = setup(vec![sample_notice("a", Department::CS, day(1))]);
    cache.refresh(false).await;
    assert!(cache.is_fresh());

    assert_eq!(cache.refresh(true).await, RefreshOutcome::Fetched(1));
    assert_eq!(store.list_calls(), 2);
  }

  #[tokio::test]
  async fn test_empty_cache_is_never_fresh() {
    let (store, cache, _clock) = setup(Vec::new());
    assert_eq!(cache.refresh(false).await, RefreshOutcome::Fetched(0));
    assert_eq!(cache.refresh(false).await, RefreshOutcome::Fetched(0));
    assert_eq!(store.list_calls(), 2);
  }

  #[tokio::test]
  async fn test_add_prepends_without_store_call() {
    let (store, cache, _clock) = setup(vec![
      sample_notice("b", Department::CS, day(3)),
      sample_notice("c", Department::CS, day(2)),
    ]);
    cache.refresh(false).await;

    cache.add(sample_notice("a", Department::EE, day(1)));

    assert_eq!(ids(&cache.items()), vec!["a", "b", "c"]);
    assert_eq!(store.list_calls(), 1);
  }

  #[tokio::test]
  async fn test_update_keeps_position() {
    let (_store, cache, _clock) = setup(vec![
      sample_notice("a", Department::CS, day(3)),
      sample_notice("b", Department::CS, day(2)),
      sample_notice("c", Department::CS, day(1)),
    ]);
    cache.refresh(false).await;

    let mut edited = sample_notice("b", Department::Exams, day(2));
    edited.title = "Rescheduled".to_string();
    cache.update(&NoticeId::from("b"), edited);

    let items = cache.items();
    assert_eq!(ids(&items), vec!["a", "b", "c"]);
    assert_eq!(items[1].title, "Rescheduled");
    assert_eq!(items[1].department, Department::Exams);
  }

  #[tokio::test]
  async fn test_update_and_remove_unknown_id_are_noops() {
    let (_store, cache, _clock) = setup(vec![sample_notice("a", Department::CS, day(1))]);
    cache.refresh(false).await;

    cache.update(&NoticeId::from("zzz"), sample_notice("zzz", Department::CS, day(1)));
    cache.remove(&NoticeId::from("zzz"));

    assert_eq!(ids(&cache.items()), vec!["a"]);
  }

  #[tokio::test]
  async fn test_remove_drops_item() {
    let (_store, cache, _clock) = setup(vec![
      sample_notice("a", Department::CS, day(2)),
      sample_notice("b", Department::CS, day(1)),
    ]);
    cache.refresh(false).await;

    cache.remove(&NoticeId::from("a"));
    assert_eq!(ids(&cache.items()), vec!["b"]);
    assert!(cache.get(&NoticeId::from("a")).is_none());
  }

  #[tokio::test]
  async fn test_refresh_discards_unpersisted_add() {
    let (_store, cache, _clock) = setup(vec![sample_notice("a", Department::CS, day(1))]);
    cache.refresh(false).await;

    cache.add(sample_notice("x", Department::CS, day(9)));
    cache.refresh(true).await;

    assert_eq!(ids(&cache.items()), vec!["a"]);
  }

  #[tokio::test]
  async fn test_failure_keeps_previous_state() {
    let (store, cache, clock) = setup(vec![
      sample_notice("a", Department::CS, day(2)),
      sample_notice("b", Department::CS, day(1)),
    ]);
    cache.refresh(false).await;
    let fetched_at = cache.last_fetched_at();

    clock.advance(Duration::minutes(1));
    store.fail_with(Some("database down"));

    let outcome = cache.refresh(true).await;
    assert!(outcome.is_failed());

    let snapshot = cache.snapshot();
    assert_eq!(ids(&snapshot.items), vec!["a", "b"]);
    assert!(snapshot.last_error.unwrap().contains("database down"));
    assert_eq!(snapshot.last_fetched_at, fetched_at);
    assert!(!snapshot.is_loading);
  }

  #[tokio::test]
  async fn test_first_fetch_failure_leaves_cache_empty() {
    let (store, cache, _clock) = setup(vec![sample_notice("a", Department::CS, day(1))]);
    store.fail_with(Some("unreachable"));

    assert!(cache.refresh(false).await.is_failed());
    assert!(cache.items().is_empty());
    assert!(cache.last_fetched_at().is_none());
    assert!(cache.last_error().is_some());

    // Recovery clears the error
    store.fail_with(None);
    assert_eq!(cache.refresh(true).await, RefreshOutcome::Fetched(1));
    assert!(cache.last_error().is_none());
  }

  #[tokio::test]
  async fn test_loading_flag_spans_successful_call() {
    let (store, cache, _clock) = setup(vec![sample_notice("a", Department::CS, day(1))]);
    store.hold();

    let handle = {
      let cache = cache.clone();
      tokio::spawn(async move { cache.refresh(true).await })
    };

    wait_until(|| cache.is_loading()).await;
    assert!(cache.items().is_empty());

    store.release();
    assert_eq!(handle.await.unwrap(), RefreshOutcome::Fetched(1));
    assert!(!cache.is_loading());
  }

  #[tokio::test]
  async fn test_loading_flag_spans_failed_call() {
    let (store, cache, _clock) = setup(Vec::new());
    store.fail_with(Some("boom"));
    store.hold();

    let handle = {
      let cache = cache.clone();
      tokio::spawn(async move { cache.refresh(true).await })
    };

    wait_until(|| cache.is_loading()).await;
    store.release();

    assert!(handle.await.unwrap().is_failed());
    assert!(!cache.is_loading());
  }

  #[tokio::test]
  async fn test_concurrent_refreshes_share_one_fetch() {
    let (store, cache, _clock) = setup(vec![sample_notice("a", Department::CS, day(1))]);
    store.hold();

    let first = {
      let cache = cache.clone();
      tokio::spawn(async move { cache.refresh(true).await })
    };
    wait_until(|| cache.is_loading()).await;

    let second = {
      let cache = cache.clone();
      tokio::spawn(async move { cache.refresh(false).await })
    };
    tokio::task::yield_now().await;

    store.release();
    assert_eq!(first.await.unwrap(), RefreshOutcome::Fetched(1));
    assert_eq!(second.await.unwrap(), RefreshOutcome::Fetched(1));
    assert_eq!(store.list_calls(), 1);
  }

  #[tokio::test]
  async fn test_forced_refresh_waits_out_older_fetch() {
    let (store, cache, _clock) = setup(vec![sample_notice("a", Department::CS, day(1))]);
    store.hold();

    let older = {
      let cache = cache.clone();
      tokio::spawn(async move { cache.refresh(false).await })
    };
    wait_until(|| store.list_calls() == 1).await;

    // Written after the older fetch read its rows
    store.set_notices(vec![
      sample_notice("a", Department::CS, day(1)),
      sample_notice("b", Department::CS, day(1)),
    ]);

    let forced: Vec<_> = (0..2)
      .map(|_| {
        let cache = cache.clone();
        tokio::spawn(async move { cache.refresh(true).await })
      })
      .collect();
    for _ in 0..3 {
      tokio::task::yield_now().await;
    }

    store.release();
    assert_eq!(older.await.unwrap(), RefreshOutcome::Fetched(1));
    for handle in forced {
      assert_eq!(handle.await.unwrap(), RefreshOutcome::Fetched(2));
    }

    // One follow-up fetch serves both forced calls
    assert_eq!(store.list_calls(), 2);
    assert_eq!(ids(&cache.items()), vec!["a", "b"]);
  }

  #[tokio::test]
  async fn test_stale_time_is_configurable() {
    let store = Arc::new(MemoryStore::with_notices(vec![sample_notice("a", Department::CS, day(1))]));
    let clock = ManualClock::new();
    let cache = NoticeCache::new(Arc::clone(&store))
      .with_clock(clock.clone())
      .with_stale_time(Duration::seconds(30));
    cache.refresh(false).await;

    clock.advance(Duration::seconds(20));
    assert_eq!(cache.refresh(false).await, RefreshOutcome::Fresh);

    clock.advance(Duration::seconds(20));
    assert!(!cache.is_fresh());
    assert_eq!(cache.refresh(false).await, RefreshOutcome::Fetched(1));
    assert_eq!(store.list_calls(), 2);
  }

  #[tokio::test]
  async fn test_invalidate_forces_next_refresh() {
    let (store, cache, _clock) = setup(vec![sample_notice("a", Department::CS, day(1))]);
    cache.refresh(false).await;
    cache.invalidate();

    assert_eq!(cache.refresh(false).await, RefreshOutcome::Fetched(1));
    assert_eq!(store.list_calls(), 2);
  }

  #[tokio::test]
  async fn test_featured_falls_back_to_first() {
    let (store, cache, _clock) = setup(vec![
      sample_notice("a", Department::CS, day(2)),
      sample_notice("b", Department::CS, day(1)),
    ]);
    cache.refresh(false).await;
    assert_eq!(cache.featured().unwrap().id.as_str(), "a");

    store.set_featured(&NoticeId::from("b")).await.unwrap();
    cache.refresh(true).await;
    assert_eq!(cache.featured().unwrap().id.as_str(), "b");
  }

  #[tokio::test]
  async fn test_department_counts_include_wildcard() {
    let (_store, cache, _clock) = setup(vec![
      sample_notice("a", Department::CS, day(3)),
      sample_notice("b", Department::All, day(2)),
      sample_notice("c", Department::ME, day(1)),
      sample_notice("d", Department::CS, day(1)),
    ]);
    cache.refresh(false).await;

    // Listed in display order, wildcard-only departments omitted
    assert_eq!(
      cache.department_counts(),
      vec![(Department::ME, 2), (Department::CS, 3)]
    );
    assert_eq!(ids(&cache.filtered(Department::ME)), vec!["b", "c"]);
  }

  #[tokio::test]
  async fn test_dispose_clears_items() {
    let (_store, cache, _clock) = setup(vec![sample_notice("a", Department::CS, day(1))]);
    cache.refresh(false).await;
    let other = cache.clone();

    cache.dispose();
    assert!(other.items().is_empty());
    assert!(other.last_fetched_at().is_none());
  }

  #[tokio::test]
  async fn test_refresh_after_dispose_skips_store() {
    let (store, cache, _clock) = setup(vec![sample_notice("a", Department::CS, day(1))]);
    let other = cache.clone();
    cache.dispose();

    assert_eq!(other.refresh(true).await, RefreshOutcome::Disposed);
    assert_eq!(store.list_calls(), 0);
    assert!(other.items().is_empty());
  }

  #[tokio::test]
  async fn test_dispose_drops_in_flight_result() {
    let (store, cache, _clock) = setup(vec![sample_notice("a", Department::CS, day(1))]);
    store.hold();

    let pending = {
      let cache = cache.clone();
      tokio::spawn(async move { cache.refresh(true).await })
    };
    wait_until(|| store.list_calls() == 1).await;

    let other = cache.clone();
    cache.dispose();
    store.release();

    assert_eq!(pending.await.unwrap(), RefreshOutcome::Disposed);
    assert!(other.items().is_empty());
    assert!(!other.is_loading());
  }
}
