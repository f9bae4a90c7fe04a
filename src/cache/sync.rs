//! Synchronizer that reconciles the remote image source with the local cache.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::observe::{Observer, Subscription};
use super::storage::ItemStore;
use crate::catapi::client::ImageSource;
use crate::catapi::types::CachedItem;
use crate::net::Connectivity;

/// Number of images requested per page.
pub const BATCH_SIZE: u32 = 100;

/// Failures surfaced by the synchronizer. Display strings are shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
  #[error("No internet connection available")]
  Connectivity,
  #[error("{0}")]
  Remote(String),
  #[error("No images available")]
  EmptyResult,
  #[error("{0}")]
  Store(String),
}

impl SyncError {
  fn remote(report: color_eyre::Report) -> Self {
    Self::Remote(report.to_string())
  }

  fn store(report: color_eyre::Report) -> Self {
    Self::Store(report.to_string())
  }
}

/// Cache-aside synchronizer.
///
/// The store is the single source of truth: pages fetched from the remote
/// are written through it, and readers follow its live query.
/// `load_more` and `refresh` are serialized on a shared write gate.
pub struct Synchronizer<S: ItemStore> {
  store: Arc<S>,
  source: Arc<dyn ImageSource>,
  connectivity: Arc<dyn Connectivity>,
  write_gate: Mutex<()>,
}

impl<S: ItemStore> Synchronizer<S> {
  pub fn new(
    store: Arc<S>,
    source: Arc<dyn ImageSource>,
    connectivity: Arc<dyn Connectivity>,
  ) -> Self {
    Self {
      store,
      source,
      connectivity,
      write_gate: Mutex::new(()),
    }
  }

  /// Follow the store's contents. Replays the current rows, then every change.
  pub fn observe_all(&self, observer: Observer) -> Result<Subscription, SyncError> {
    self.store.subscribe(observer).map_err(SyncError::store)
  }

  /// Fetch one page, persist it and return the stored items.
  ///
  /// An empty result means there is nothing more to load; the store is left untouched.
  pub async fn load_more(&self, page: u32) -> Result<Vec<CachedItem>, SyncError> {
    let _gate = self.write_gate.lock().await;
    self.load_page(page).await
  }

  /// Replace the whole cache with a fresh first page.
  pub async fn refresh(&self) -> Result<bool, SyncError> {
    let _gate = self.write_gate.lock().await;

    self.ensure_connected().await?;
    // Not transactional with the refill below.
    self.store.delete_all().map_err(SyncError::store)?;

    let items = self.fetch_page(0).await?;
    if items.is_empty() {
      warn!("refresh returned no images");
      return Err(SyncError::EmptyResult);
    }

    info!(count = items.len(), "refreshed image cache");
    Ok(true)
  }

  /// Number of rows currently cached.
  pub fn cached_count(&self) -> Result<usize, SyncError> {
    self.store.count().map_err(SyncError::store)
  }

  /// Ask the oracle on the blocking pool; a probe may sit in DNS or a TCP connect.
  async fn ensure_connected(&self) -> Result<(), SyncError> {
    let connectivity = Arc::clone(&self.connectivity);
    let connected = tokio::task::spawn_blocking(move || connectivity.is_connected())
      .await
      .unwrap_or_else(|e| {
        warn!(error = %e, "connectivity check did not complete");
        false
      });

    if connected {
      Ok(())
    } else {
      debug!("no network path, skipping request");
      Err(SyncError::Connectivity)
    }
  }

  async fn load_page(&self, page: u32) -> Result<Vec<CachedItem>, SyncError> {
    self.ensure_connected().await?;
    self.fetch_page(page).await
  }

  async fn fetch_page(&self, page: u32) -> Result<Vec<CachedItem>, SyncError> {
    // The page number only offsets titles; the API has no cursor.
    let images = self
      .source
      .search(BATCH_SIZE)
      .await
      .map_err(SyncError::remote)?;

    if images.is_empty() {
      debug!(page, "remote returned an empty page");
      return Ok(Vec::new());
    }

    let offset = u64::from(page) * u64::from(BATCH_SIZE);
    let items: Vec<CachedItem> = images
      .into_iter()
      .enumerate()
      .map(|(index, image)| CachedItem::from_api(image, offset + index as u64))
      .collect();

    self
      .store
      .insert_or_replace(&items)
      .map_err(SyncError::store)?;

    info!(page, count = items.len(), "loaded page");
    Ok(items)
  }
}
