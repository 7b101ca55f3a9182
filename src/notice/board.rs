//! Notice board facade that pairs the store with the cache.

use std::sync::Arc;
use tracing::debug;

use crate::cache::{NoticeCache, RefreshOutcome};

use super::store::{NoticeStore, StoreError};
use super::types::{Notice, NoticeDraft, NoticeId};

/// Store handle plus the cache views read from.
///
/// Writes go to the store first; the matching optimistic cache edit is only
/// applied once the store has confirmed the write.
pub struct NoticeBoard<S: NoticeStore> {
  store: Arc<S>,
  cache: NoticeCache<S>,
}

impl<S: NoticeStore> NoticeBoard<S> {
  pub fn new(store: Arc<S>) -> Self {
    let cache = NoticeCache::new(Arc::clone(&store));
    Self { store, cache }
  }

  pub fn cache(&self) -> &NoticeCache<S> {
    &self.cache
  }

  pub fn store(&self) -> &S {
    &self.store
  }

  /// Load notices unless the cache is still fresh
  pub async fn load(&self) -> RefreshOutcome {
    self.cache.refresh(false).await
  }

  /// Load notices from the store regardless of freshness
  pub async fn reload(&self) -> RefreshOutcome {
    self.cache.refresh(true).await
  }

  /// Look a notice up in the cache, falling back to the store.
  pub async fn get(&self, id: &NoticeId) -> Result<Notice, StoreError> {
    if let Some(notice) = self.cache.get(id) {
      debug!(%id, "notice served from cache");
      return Ok(notice);
    }
    self.store.get_notice(id).await
  }

  pub async fn create(&self, draft: &NoticeDraft) -> Result<Notice, StoreError> {
    let notice = self.store.create_notice(draft).await?;
    self.cache.add(notice.clone());
    Ok(notice)
  }

  pub async fn update(&self, id: &NoticeId, draft: &NoticeDraft) -> Result<Notice, StoreError> {
    let notice = self.store.update_notice(id, draft).await?;
    self.cache.update(id, notice.clone());
    Ok(notice)
  }

  pub async fn delete(&self, id: &NoticeId) -> Result<(), StoreError> {
    self.store.delete_notice(id).await?;
    self.cache.remove(id);
    Ok(())
  }

  /// Feature a notice. The store clears the flag everywhere else, so the
  /// list is reloaded to pick that up.
  pub async fn set_featured(&self, id: &NoticeId) -> Result<Notice, StoreError> {
    let notice = self.store.set_featured(id).await?;
    self.cache.update(id, notice.clone());
    self.cache.refresh(true).await;
    Ok(notice)
  }
}

impl<S: NoticeStore> Clone for NoticeBoard<S> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      cache: self.cache.clone(),
    }
  }
}
