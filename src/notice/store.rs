//! The remote notice store the cache reads from.

use std::future::Future;

use super::types::{Notice, NoticeDraft, NoticeFilter, NoticeId};

/// Errors surfaced by a notice store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  #[error("notice {0} not found")]
  NotFound(NoticeId),

  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("server returned {status}: {message}")]
  Server { status: u16, message: String },

  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("invalid response: {0}")]
  Decode(String),

  #[error("invalid notice: {0}")]
  Invalid(String),
}

impl StoreError {
  pub fn is_not_found(&self) -> bool {
    matches!(self, StoreError::NotFound(_))
  }

  pub fn is_unauthorized(&self) -> bool {
    matches!(self, StoreError::Unauthorized(_))
  }
}

/// Authoritative CRUD service for notices.
///
/// Listing returns notices featured first, then by date descending, then by
/// creation time descending. A department filter also returns notices
/// tagged `All`. `set_featured` clears the flag on every other notice.
pub trait NoticeStore: Send + Sync + 'static {
  fn list_notices(
    &self,
    filter: &NoticeFilter,
  ) -> impl Future<Output = Result<Vec<Notice>, StoreError>> + Send;

  fn get_notice(&self, id: &NoticeId) -> impl Future<Output = Result<Notice, StoreError>> + Send;

  fn create_notice(
    &self,
    draft: &NoticeDraft,
  ) -> impl Future<Output = Result<Notice, StoreError>> + Send;

  fn update_notice(
    &self,
    id: &NoticeId,
    draft: &NoticeDraft,
  ) -> impl Future<Output = Result<Notice, StoreError>> + Send;

  fn delete_notice(&self, id: &NoticeId) -> impl Future<Output = Result<(), StoreError>> + Send;

  fn set_featured(&self, id: &NoticeId) -> impl Future<Output = Result<Notice, StoreError>> + Send;
}
