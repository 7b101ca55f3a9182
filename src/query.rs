//! Background work for the UI loop.
//!
//! Views never await. A `Query<T>` owns a fetcher closure that it can run
//! repeatedly (the notice refresh), a `Mutation<T>` runs one-off writes
//! (delete, feature). Both spawn onto the tokio runtime and hand results back
//! through a channel that the view drains in `tick()`.
//!
//! ```ignore
//! let board = board.clone();
//! let mut refresh = Query::new(move || {
//!     let board = board.clone();
//!     async move { Ok::<_, String>(board.reload().await) }
//! });
//!
//! refresh.fetch();
//!
//! // In tick
//! if refresh.poll() {
//!     // re-render from the cache snapshot
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use tokio::sync::mpsc;

/// The state of a query
#[derive(Debug, Clone)]
pub enum QueryState<T> {
  /// Never started
  Idle,
  Loading,
  Success(T),
  Error(String),
}

impl<T> QueryState<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, QueryState::Loading)
  }

  pub fn data(&self) -> Option<&T> {
    match self {
      QueryState::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      QueryState::Error(e) => Some(e),
      _ => None,
    }
  }
}

type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, String>> + Send>>;

type FetcherFn<T> = Box<dyn Fn() -> BoxFuture<T> + Send + Sync>;

/// Channel end shared by `Query` and `Mutation`
struct Pending<T> {
  receiver: Option<mpsc::UnboundedReceiver<Result<T, String>>>,
}

impl<T: Send + 'static> Pending<T> {
  fn new() -> Self {
    Self { receiver: None }
  }

  fn is_pending(&self) -> bool {
    self.receiver.is_some()
  }

  fn spawn(&mut self, future: BoxFuture<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    tokio::spawn(async move {
      // The receiver is gone if the view was closed meanwhile
      let _ = tx.send(future.await);
    });
  }

  /// `Some` once the spawned future has finished
  fn try_take(&mut self) -> Option<Result<T, String>> {
    let receiver = self.receiver.as_mut()?;
    let result = match receiver.try_recv() {
      Ok(result) => result,
      Err(mpsc::error::TryRecvError::Empty) => return None,
      Err(mpsc::error::TryRecvError::Disconnected) => Err("Task was cancelled".to_string()),
    };
    self.receiver = None;
    Some(result)
  }
}

/// Repeatable background fetch with loading/success/error state.
pub struct Query<T> {
  state: QueryState<T>,
  fetcher: FetcherFn<T>,
  pending: Pending<T>,
}

impl<T: Send + 'static> Query<T> {
  pub fn new<F, Fut>(fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    Self {
      state: QueryState::Idle,
      fetcher: Box::new(move || Box::pin(fetcher())),
      pending: Pending::new(),
    }
  }

  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  pub fn data(&self) -> Option<&T> {
    self.state.data()
  }

  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  pub fn error(&self) -> Option<&str> {
    self.state.error()
  }

  /// Start fetching unless a fetch is already running.
  pub fn fetch(&mut self) {
    if self.pending.is_pending() {
      return;
    }
    self.start();
  }

  /// Start a new fetch; the result of any running one is discarded.
  pub fn refetch(&mut self) {
    self.start();
  }

  /// Drain a finished fetch. Returns `true` if the state changed.
  pub fn poll(&mut self) -> bool {
    match self.pending.try_take() {
      Some(Ok(data)) => {
        self.state = QueryState::Success(data);
        true
      }
      Some(Err(error)) => {
        self.state = QueryState::Error(error);
        true
      }
      None => false,
    }
  }

  fn start(&mut self) {
    self.state = QueryState::Loading;
    let future = (self.fetcher)();
    self.pending.spawn(future);
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("state", &self.state)
      .finish_non_exhaustive()
  }
}

/// One write at a time, e.g. deleting the selected notice.
pub struct Mutation<T> {
  pending: Pending<T>,
}

impl<T: Send + 'static> Mutation<T> {
  pub fn new() -> Self {
    Self {
      pending: Pending::new(),
    }
  }

  pub fn is_running(&self) -> bool {
    self.pending.is_pending()
  }

  /// Run `future` in the background. Ignored while another write is running.
  pub fn start<Fut>(&mut self, future: Fut) -> bool
  where
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    if self.is_running() {
      return false;
    }
    self.pending.spawn(Box::pin(future));
    true
  }

  /// The outcome of the running write, once it has finished
  pub fn poll(&mut self) -> Option<Result<T, String>> {
    self.pending.try_take()
  }
}

impl<T: Send + 'static> Default for Mutation<T> {
  fn default() -> Self {
    Self::new()
  }
}
