use crate::notice::board::NoticeBoard;
use crate::notice::store::{NoticeStore, StoreError};
use crate::notice::types::{Notice, NoticeId};
use crate::query::Mutation;
use crate::ui::renderfns::{truncate, StatusMessage};
use crossterm::event::{KeyCode, KeyEvent};

/// Admin writes shared by the list and detail views: feature a notice,
/// delete one after a `y` confirmation.
pub struct NoticeActions<S: NoticeStore> {
  board: NoticeBoard<S>,
  mutation: Mutation<String>,
  confirm_delete: Option<(NoticeId, String)>,
}

impl<S: NoticeStore> NoticeActions<S> {
  pub fn new(board: NoticeBoard<S>) -> Self {
    Self {
      board,
      mutation: Mutation::new(),
      confirm_delete: None,
    }
  }

  pub fn is_running(&self) -> bool {
    self.mutation.is_running()
  }

  pub fn is_confirming(&self) -> bool {
    self.confirm_delete.is_some()
  }

  fn busy() -> StatusMessage {
    StatusMessage::Error("Another change is still being saved".to_string())
  }

  pub fn feature(&mut self, notice: &Notice) -> StatusMessage {
    let board = self.board.clone();
    let id = notice.id.clone();
    let title = truncate(&notice.title, 40);
    let started = self.mutation.start(async move {
      board
        .set_featured(&id)
        .await
        .map(|_| format!("Featured \"{}\"", title))
        .map_err(describe)
    });
    if started {
      StatusMessage::Info("Featuring notice...".to_string())
    } else {
      Self::busy()
    }
  }

  /// Ask for confirmation before deleting
  pub fn request_delete(&mut self, notice: &Notice) -> StatusMessage {
    let title = truncate(&notice.title, 40);
    let prompt = format!("Delete \"{}\"? y to confirm, any other key cancels", title);
    self.confirm_delete = Some((notice.id.clone(), title));
    StatusMessage::Info(prompt)
  }

  /// While a delete awaits confirmation every key is answered here.
  pub fn handle_confirm_key(&mut self, key: KeyEvent) -> Option<StatusMessage> {
    let (id, title) = self.confirm_delete.take()?;
    if key.code != KeyCode::Char('y') {
      return Some(StatusMessage::Info("Delete cancelled".to_string()));
    }

    let board = self.board.clone();
    let started = self.mutation.start(async move {
      board
        .delete(&id)
        .await
        .map(|_| format!("Deleted \"{}\"", title))
        .map_err(describe)
    });
    Some(if started {
      StatusMessage::Info("Deleting notice...".to_string())
    } else {
      Self::busy()
    })
  }

  pub fn tick(&mut self) -> Option<StatusMessage> {
    self.mutation.poll().map(|result| match result {
      Ok(message) => StatusMessage::Info(message),
      Err(message) => StatusMessage::Error(message),
    })
  }
}

/// Footer text for a failed write
fn describe(error: StoreError) -> String {
  if error.is_unauthorized() {
    format!("{} (sign in with `noticeboard login`)", error)
  } else {
    error.to_string()
  }
}
