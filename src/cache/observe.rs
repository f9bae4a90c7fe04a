//! Observer registration for live queries.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use crate::catapi::types::CachedItem;

/// Callback invoked with a full snapshot of the store.
pub type Observer = Arc<dyn Fn(&[CachedItem]) + Send + Sync>;

#[derive(Default)]
struct Registry {
  next_id: u64,
  observers: Vec<(u64, Observer)>,
}

/// Set of registered observers.
#[derive(Default)]
pub struct Observers {
  registry: Arc<Mutex<Registry>>,
}

impl Observers {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register an observer. It stays registered until the returned handle is dropped.
  pub fn register(&self, observer: Observer) -> Subscription {
    let mut registry = self
      .registry
      .lock()
      .unwrap_or_else(PoisonError::into_inner);
    let id = registry.next_id;
    registry.next_id += 1;
    registry.observers.push((id, observer));

    Subscription {
      id,
      registry: Arc::downgrade(&self.registry),
    }
  }

  /// Deliver a snapshot to every registered observer.
  pub fn notify(&self, items: &[CachedItem]) {
    // Snapshot the list so observers may drop their own subscription.
    let observers: Vec<Observer> = self
      .registry
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .observers
      .iter()
      .map(|(_, o)| Arc::clone(o))
      .collect();

    for observer in observers {
      observer(items);
    }
  }

  #[cfg(test)]
  pub fn len(&self) -> usize {
    self
      .registry
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .observers
      .len()
  }
}

/// Handle for a registered observer; dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
  id: u64,
  registry: Weak<Mutex<Registry>>,
}

impl Drop for Subscription {
  fn drop(&mut self) {
    if let Some(registry) = self.registry.upgrade() {
      registry
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .observers
        .retain(|(id, _)| *id != self.id);
    }
  }
}

impl std::fmt::Debug for Subscription {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subscription").field("id", &self.id).finish()
  }
}
