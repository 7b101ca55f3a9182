//! In-memory notice store used by tests.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use super::store::{NoticeStore, StoreError};
use super::types::{Department, Notice, NoticeDraft, NoticeFilter, NoticeId};

/// Store that keeps notices in a Vec and mimics the service's ordering,
/// filtering and featured semantics. Listing can be made to fail or to
/// block until released; a blocked list still answers with the rows it saw
/// on arrival.
#[derive(Default)]
pub struct MemoryStore {
  notices: Mutex<Vec<Notice>>,
  next_id: AtomicUsize,
  list_calls: AtomicUsize,
  failure: Mutex<Option<String>>,
  gated: AtomicBool,
  gate: Arc<Notify>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_notices(notices: Vec<Notice>) -> Self {
    let store = Self::new();
    store.next_id.store(notices.len(), Ordering::SeqCst);
    *store.notices.lock().unwrap() = notices;
    store
  }

  /// Number of list calls served so far
  pub fn list_calls(&self) -> usize {
    self.list_calls.load(Ordering::SeqCst)
  }

  /// Replace the stored notices wholesale
  pub fn set_notices(&self, notices: Vec<Notice>) {
    *self.notices.lock().unwrap() = notices;
  }

  /// Make every list call fail with `message` until cleared with `None`
  pub fn fail_with(&self, message: Option<&str>) {
    *self.failure.lock().unwrap() = message.map(String::from);
  }

  /// Hold list calls until `release` is called
  pub fn hold(&self) {
    self.gated.store(true, Ordering::SeqCst);
  }

  pub fn release(&self) {
    self.gated.store(false, Ordering::SeqCst);
    self.gate.notify_one();
  }

  fn find_mut<'a>(notices: &'a mut [Notice], id: &NoticeId) -> Result<&'a mut Notice, StoreError> {
    notices
      .iter_mut()
      .find(|n| &n.id == id)
      .ok_or_else(|| StoreError::NotFound(id.clone()))
  }
}

fn apply_draft(notice: &mut Notice, draft: &NoticeDraft) {
  notice.title = draft.title.clone();
  notice.date = draft.date;
  notice.subject = draft.subject.clone();
  notice.department = draft.department;
  notice.body = draft.body.clone();
  notice.attachments = draft.attachments.clone();
}

impl NoticeStore for MemoryStore {
  async fn list_notices(&self, filter: &NoticeFilter) -> Result<Vec<Notice>, StoreError> {
    self.list_calls.fetch_add(1, Ordering::SeqCst);

    // Rows are read when the request arrives; a held call answers with them
    let mut notices: Vec<Notice> = self
      .notices
      .lock()
      .unwrap()
      .iter()
      .filter(|n| !filter.featured_only || n.is_featured)
      .filter(|n| match filter.department {
        Some(dept) if !dept.is_wildcard() => n.department == dept || n.department.is_wildcard(),
        _ => true,
      })
      .cloned()
      .collect();

    notices.sort_by(|a, b| {
      b.is_featured
        .cmp(&a.is_featured)
        .then(b.date.cmp(&a.date))
        .then(b.created_at.cmp(&a.created_at))
    });
    if filter.featured_only {
      notices.truncate(1);
    }

    if self.gated.load(Ordering::SeqCst) {
      self.gate.notified().await;
    }

    if let Some(message) = self.failure.lock().unwrap().clone() {
      return Err(StoreError::Server {
        status: 500,
        message,
      });
    }
    Ok(notices)
  }

  async fn get_notice(&self, id: &NoticeId) -> Result<Notice, StoreError> {
    let mut notices = self.notices.lock().unwrap();
    Self::find_mut(&mut notices, id).map(|n| n.clone())
  }

  async fn create_notice(&self, draft: &NoticeDraft) -> Result<Notice, StoreError> {
    let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
    let mut notice = sample_notice(&format!("n{}", n), draft.department, draft.date);
    apply_draft(&mut notice, draft);
    self.notices.lock().unwrap().push(notice.clone());
    Ok(notice)
  }

  async fn update_notice(&self, id: &NoticeId, draft: &NoticeDraft) -> Result<Notice, StoreError> {
    let mut notices = self.notices.lock().unwrap();
    let notice = Self::find_mut(&mut notices, id)?;
    apply_draft(notice, draft);
    Ok(notice.clone())
  }

  async fn delete_notice(&self, id: &NoticeId) -> Result<(), StoreError> {
    let mut notices = self.notices.lock().unwrap();
    let before = notices.len();
    notices.retain(|n| &n.id != id);
    if notices.len() == before {
      return Err(StoreError::NotFound(id.clone()));
    }
    Ok(())
  }

  async fn set_featured(&self, id: &NoticeId) -> Result<Notice, StoreError> {
    let mut notices = self.notices.lock().unwrap();
    Self::find_mut(&mut notices, id)?;
    for notice in notices.iter_mut() {
      notice.is_featured = &notice.id == id;
    }
    Self::find_mut(&mut notices, id).map(|n| n.clone())
  }
}

/// A notice with predictable content for tests
pub fn sample_notice(id: &str, department: Department, date: NaiveDate) -> Notice {
  Notice {
    id: NoticeId::new(id),
    title: format!("Notice {}", id),
    subject: format!("Subject {}", id),
    body: format!("<p>Body of {}</p>", id),
    department,
    date,
    attachments: Vec::new(),
    is_featured: false,
    created_at: fixed_time(),
  }
}

pub fn fixed_time() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
}

pub fn day(d: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}
