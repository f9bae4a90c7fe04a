//! Presentation state for the image grid.
//!
//! `GalleryController` owns the pagination cursor and turns synchronizer
//! outcomes and store emissions into a single observable [`UiState`].

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::cache::{ItemStore, Subscription, Synchronizer};
use crate::catapi::types::CachedItem;

/// What the grid should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiState {
  Loading,
  Empty,
  Success { items: Vec<CachedItem> },
  Error { message: String },
}

impl UiState {
  fn from_snapshot(items: &[CachedItem]) -> Self {
    if items.is_empty() {
      UiState::Empty
    } else {
      UiState::Success {
        items: items.to_vec(),
      }
    }
  }

  pub fn items(&self) -> &[CachedItem] {
    match self {
      UiState::Success { items } => items,
      _ => &[],
    }
  }

  pub fn is_loading(&self) -> bool {
    matches!(self, UiState::Loading)
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      UiState::Error { message } => Some(message),
      _ => None,
    }
  }
}

/// Pagination bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
  pub current_page: u32,
  pub is_loading_more: bool,
  pub has_more_images: bool,
}

impl Default for Paging {
  fn default() -> Self {
    Self {
      current_page: 0,
      is_loading_more: false,
      has_more_images: true,
    }
  }
}

struct Shared<S: ItemStore> {
  sync: Arc<Synchronizer<S>>,
  paging: Mutex<Paging>,
  state: Arc<watch::Sender<UiState>>,
}

impl<S: ItemStore> Shared<S> {
  fn paging(&self) -> MutexGuard<'_, Paging> {
    self.paging.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn fail(&self, message: String) {
    warn!(%message, "gallery operation failed");
    self.state.send_replace(UiState::Error { message });
  }
}

/// State controller for one gallery screen.
///
/// Commands are fire-and-forget; results show up on the [`state`](Self::state)
/// stream. Dropping the controller cancels in-flight commands and the store
/// subscription. A store write already issued may still land.
pub struct GalleryController<S: ItemStore + 'static> {
  shared: Arc<Shared<S>>,
  tasks: Mutex<JoinSet<()>>,
  _subscription: Option<Subscription>,
}

impl<S: ItemStore + 'static> GalleryController<S> {
  /// Subscribe to the store and start loading the first page.
  ///
  /// Must be called from within a tokio runtime.
  pub fn new(sync: Arc<Synchronizer<S>>) -> Self {
    let state = Arc::new(watch::Sender::new(UiState::Loading));

    let sink = Arc::clone(&state);
    let subscription = match sync.observe_all(Arc::new(move |items: &[CachedItem]| {
      sink.send_replace(UiState::from_snapshot(items));
    })) {
      Ok(subscription) => Some(subscription),
      Err(e) => {
        state.send_replace(UiState::Error {
          message: e.to_string(),
        });
        None
      }
    };

    let controller = Self {
      shared: Arc::new(Shared {
        sync,
        paging: Mutex::new(Paging::default()),
        state,
      }),
      tasks: Mutex::new(JoinSet::new()),
      _subscription: subscription,
    };

    controller.load_more_images();
    controller
  }

  /// Stream of UI states. The receiver always holds the latest value.
  pub fn state(&self) -> watch::Receiver<UiState> {
    self.shared.state.subscribe()
  }

  pub fn current_state(&self) -> UiState {
    self.shared.state.borrow().clone()
  }

  pub fn paging(&self) -> Paging {
    *self.shared.paging()
  }

  /// Rows in the cache, or `None` if the store could not be read.
  pub fn cached_count(&self) -> Option<usize> {
    self
      .shared
      .sync
      .cached_count()
      .inspect_err(|e| warn!(error = %e, "failed to count cached images"))
      .ok()
  }

  /// Drop the cache and reload from page zero.
  pub fn refresh_images(&self) {
    {
      let mut paging = self.shared.paging();
      paging.current_page = 0;
      paging.has_more_images = true;
    }
    self.shared.state.send_replace(UiState::Loading);
    debug!("refreshing gallery");

    let shared = Arc::clone(&self.shared);
    self.spawn(async move {
      // Success needs no transition: the store emission drives the state.
      if let Err(e) = shared.sync.refresh().await {
        shared.fail(e.to_string());
      }
    });
  }

  /// Load the next page unless one is in flight or the source is exhausted.
  pub fn load_more_images(&self) {
    let page = {
      let mut paging = self.shared.paging();
      if paging.is_loading_more || !paging.has_more_images {
        return;
      }
      paging.is_loading_more = true;
      paging.current_page
    };
    debug!(page, "loading more images");

    let shared = Arc::clone(&self.shared);
    self.spawn(async move {
      let outcome = shared.sync.load_more(page).await;

      match outcome {
        Ok(items) if items.is_empty() => shared.paging().has_more_images = false,
        Ok(_) => shared.paging().current_page += 1,
        Err(e) => shared.fail(e.to_string()),
      }
      shared.paging().is_loading_more = false;
    });
  }

  fn spawn<F>(&self, task: F)
  where
    F: Future<Output = ()> + Send + 'static,
  {
    let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
    // Reap finished tasks so the set does not grow without bound
    while tasks.try_join_next().is_some() {}
    tasks.spawn(task);
  }

  /// Wait for every command issued so far to finish.
  #[cfg(test)]
  async fn settle(&self) {
    let mut tasks = std::mem::take(&mut *self.tasks.lock().unwrap());
    while tasks.join_next().await.is_some() {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::SqliteStorage;
  use crate::catapi::client::ImageSource;
  use crate::net::Connectivity;
  use crate::testing::{image, until, ScriptedSource, Switch};

  struct Fixture {
    store: Arc<SqliteStorage>,
    source: Arc<ScriptedSource>,
    sync: Arc<Synchronizer<SqliteStorage>>,
  }

  fn fixture(source: ScriptedSource, connectivity: Switch) -> Fixture {
    let store = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let source = Arc::new(source);
    let sync = Arc::new(Synchronizer::new(
      Arc::clone(&store),
      Arc::clone(&source) as Arc<dyn ImageSource>,
      Arc::new(connectivity) as Arc<dyn Connectivity>,
    ));
    Fixture {
      store,
      source,
      sync,
    }
  }

  fn cached(id: &str) -> CachedItem {
    CachedItem {
      remote_id: id.to_string(),
      image_url: format!("https://cdn.example/{}.jpg", id),
      title: format!("Cached {}", id),
      description: "A beautiful cat image with dimensions 1x1".to_string(),
    }
  }

  fn ids(state: &UiState) -> Vec<&str> {
    state.items().iter().map(|i| i.remote_id.as_str()).collect()
  }

  #[tokio::test]
  async fn test_initial_load_shows_items() {
    let f = fixture(ScriptedSource::repeating(vec![image("a", 1, 1)]), Switch::online());

    let controller = GalleryController::new(Arc::clone(&f.sync));
    controller.settle().await;

    assert_eq!(ids(&controller.current_state()), vec!["a"]);
    assert_eq!(
      controller.paging(),
      Paging {
        current_page: 1,
        is_loading_more: false,
        has_more_images: true,
      }
    );
  }

  #[tokio::test]
  async fn test_construction_replays_cache() {
    let (source, _gate) = ScriptedSource::repeating(vec![image("a", 1, 1)]).gated();
    let f = fixture(source, Switch::online());
    f.store.insert_or_replace(&[cached("old")]).unwrap();

    let controller = GalleryController::new(Arc::clone(&f.sync));

    // The live query replays before the first page arrives
    assert_eq!(ids(&controller.current_state()), vec!["old"]);
    assert!(controller.paging().is_loading_more);
  }

  #[tokio::test]
  async fn test_empty_store_shows_empty_while_loading() {
    let (source, _gate) = ScriptedSource::empty().gated();
    let f = fixture(source, Switch::online());

    let controller = GalleryController::new(Arc::clone(&f.sync));

    assert_eq!(controller.current_state(), UiState::Empty);
    assert!(controller.paging().is_loading_more);
  }

  #[tokio::test]
  async fn test_concurrent_load_more_is_suppressed() {
    let (source, gate) = ScriptedSource::repeating(vec![image("a", 1, 1)]).gated();
    let f = fixture(source, Switch::online());

    let controller = GalleryController::new(Arc::clone(&f.sync));
    controller.load_more_images();
    controller.load_more_images();
    until(|| f.source.calls() == 1).await;

    gate.notify_one();
    controller.settle().await;
    assert_eq!(f.source.calls(), 1);
    assert_eq!(controller.paging().current_page, 1);
  }

  #[tokio::test]
  async fn test_exhausted_source_stops_paging() {
    let f = fixture(ScriptedSource::empty(), Switch::online());

    let controller = GalleryController::new(Arc::clone(&f.sync));
    controller.settle().await;

    assert!(!controller.paging().has_more_images);
    assert_eq!(controller.current_state(), UiState::Empty);

    controller.load_more_images();
    controller.settle().await;
    assert_eq!(f.source.calls(), 1);
  }

  #[tokio::test]
  async fn test_failure_shows_error_and_keeps_page() {
    let f = fixture(
      ScriptedSource::repeating(vec![image("b", 1, 1)])
        .then(vec![image("a", 1, 1)])
        .then_fail("The Cat API returned 503 Service Unavailable"),
      Switch::online(),
    );

    let controller = GalleryController::new(Arc::clone(&f.sync));
    controller.settle().await;
    controller.load_more_images();
    controller.settle().await;

    assert_eq!(
      controller.current_state(),
      UiState::Error {
        message: "The Cat API returned 503 Service Unavailable".to_string()
      }
    );
    let paging = controller.paging();
    assert_eq!(paging.current_page, 1);
    assert!(!paging.is_loading_more);

    // The next attempt retries the same page
    controller.load_more_images();
    controller.settle().await;
    assert_eq!(f.store.all().unwrap()[1].title, "Cat Image 101");
    assert_eq!(ids(&controller.current_state()), vec!["a", "b"]);
  }

  #[tokio::test]
  async fn test_offline_start_reports_connectivity() {
    let f = fixture(ScriptedSource::repeating(vec![image("a", 1, 1)]), Switch::offline());
    f.store.insert_or_replace(&[cached("old")]).unwrap();

    let controller = GalleryController::new(Arc::clone(&f.sync));
    controller.settle().await;

    assert_eq!(
      controller.current_state().error(),
      Some("No internet connection available")
    );
    assert_eq!(f.store.count().unwrap(), 1);
  }

  #[tokio::test]
  async fn test_refresh_goes_loading_then_reloads() {
    let f = fixture(
      ScriptedSource::repeating(vec![image("fresh", 1, 1)]).then(vec![image("a", 1, 1)]),
      Switch::online(),
    );

    let controller = GalleryController::new(Arc::clone(&f.sync));
    controller.settle().await;
    assert_eq!(controller.paging().current_page, 1);

    controller.refresh_images();
    assert!(controller.current_state().is_loading());
    assert_eq!(controller.paging().current_page, 0);

    controller.settle().await;
    assert_eq!(ids(&controller.current_state()), vec!["fresh"]);
  }

  #[tokio::test]
  async fn test_refresh_passes_through_empty() {
    let (source, gate) = ScriptedSource::repeating(vec![image("fresh", 1, 1)])
      .then(vec![image("a", 1, 1)])
      .gated();
    let f = fixture(source, Switch::online());

    let controller = GalleryController::new(Arc::clone(&f.sync));
    gate.notify_one();
    controller.settle().await;

    let mut rx = controller.state();
    assert_eq!(ids(&rx.borrow_and_update()), vec!["a"]);

    controller.refresh_images();
    assert_eq!(*rx.borrow_and_update(), UiState::Loading);

    // The cache is cleared before the gated fetch returns
    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow_and_update(), UiState::Empty);

    gate.notify_one();
    rx.changed().await.unwrap();
    assert_eq!(ids(&rx.borrow_and_update()), vec!["fresh"]);

    controller.settle().await;
    assert_eq!(f.source.calls(), 2);
  }

  #[tokio::test]
  async fn test_refresh_failure_sets_error() {
    let f = fixture(
      ScriptedSource::empty().then(vec![image("a", 1, 1)]),
      Switch::online(),
    );

    let controller = GalleryController::new(Arc::clone(&f.sync));
    controller.settle().await;

    controller.refresh_images();
    controller.settle().await;

    assert_eq!(
      controller.current_state().error(),
      Some("No images available")
    );
  }

  #[tokio::test]
  async fn test_refresh_reenables_paging() {
    let f = fixture(
      ScriptedSource::repeating(vec![image("a", 1, 1)]).then(Vec::new()),
      Switch::online(),
    );

    let controller = GalleryController::new(Arc::clone(&f.sync));
    controller.settle().await;
    assert!(!controller.paging().has_more_images);

    controller.refresh_images();
    controller.settle().await;
    assert!(controller.paging().has_more_images);
    assert_eq!(ids(&controller.current_state()), vec!["a"]);
  }

  #[tokio::test]
  async fn test_state_stream_sees_updates() {
    let (source, gate) = ScriptedSource::repeating(vec![image("a", 1, 1)]).gated();
    let f = fixture(source, Switch::online());

    let controller = GalleryController::new(Arc::clone(&f.sync));
    let mut rx = controller.state();
    assert_eq!(*rx.borrow_and_update(), UiState::Empty);

    gate.notify_one();
    rx.changed().await.unwrap();
    assert_eq!(ids(&rx.borrow()), vec!["a"]);
  }

  #[tokio::test]
  async fn test_drop_cancels_inflight_load() {
    let (source, gate) = ScriptedSource::repeating(vec![image("a", 1, 1)]).gated();
    let f = fixture(source, Switch::online());

    let controller = GalleryController::new(Arc::clone(&f.sync));
    until(|| f.source.calls() == 1).await;

    drop(controller);
    gate.notify_one();
    tokio::task::yield_now().await;

    assert_eq!(f.store.count().unwrap(), 0);
  }
}
