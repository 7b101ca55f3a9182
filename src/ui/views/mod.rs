mod actions;
mod dashboard;
mod notice_detail;
mod notice_list;

pub use dashboard::DashboardView;
pub use notice_detail::NoticeDetailView;
pub use notice_list::NoticeListView;

use crate::cache::RefreshOutcome;
use crate::notice::board::NoticeBoard;
use crate::notice::store::NoticeStore;
use crate::query::Query;
use crate::ui::renderfns::StatusMessage;

/// Keeps a view's cache up to date: `load` honours the freshness window,
/// `reload` (the `r` key) always goes to the server.
pub struct CacheRefresh {
  load: Query<RefreshOutcome>,
  reload: Query<RefreshOutcome>,
}

impl CacheRefresh {
  /// Starts a non-forced load right away
  pub fn new<S: NoticeStore>(board: &NoticeBoard<S>) -> Self {
    let for_load = board.clone();
    let mut load = Query::new(move || {
      let board = for_load.clone();
      async move { Ok::<_, String>(board.load().await) }
    });
    let for_reload = board.clone();
    let reload = Query::new(move || {
      let board = for_reload.clone();
      async move { Ok::<_, String>(board.reload().await) }
    });

    load.fetch();
    Self { load, reload }
  }

  pub fn reload(&mut self) -> StatusMessage {
    self.reload.fetch();
    StatusMessage::Info("Refreshing notices...".to_string())
  }

  /// Reports the outcome of a reload, and of a load only when it failed
  pub fn tick(&mut self) -> Option<StatusMessage> {
    let mut message = None;
    if self.load.poll() {
      if let Some(RefreshOutcome::Failed(error)) = self.load.data() {
        message = Some(StatusMessage::Error(error.clone()));
      }
    }
    if self.reload.poll() {
      message = self.reload.data().map(|outcome| match outcome {
        RefreshOutcome::Failed(error) => StatusMessage::Error(error.clone()),
        RefreshOutcome::Fetched(count) => StatusMessage::Info(format!("Loaded {} notices", count)),
        RefreshOutcome::Fresh => StatusMessage::Info("Notices are up to date".to_string()),
        RefreshOutcome::Disposed => StatusMessage::Info("Notice board closed".to_string()),
      });
    }
    message
  }
}
