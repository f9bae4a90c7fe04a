//! Test doubles for the remote source and the connectivity oracle.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use color_eyre::{eyre::eyre, Result};
use futures::future::BoxFuture;
use tokio::sync::Notify;

use crate::catapi::api_types::ApiImage;
use crate::catapi::client::ImageSource;
use crate::net::Connectivity;

pub fn image(id: &str, width: u32, height: u32) -> ApiImage {
  ApiImage {
    id: id.to_string(),
    url: format!("https://cdn.example/{}.jpg", id),
    width,
    height,
  }
}

/// Image source that replays scripted responses.
///
/// Queued responses are served first; once the queue is drained every call
/// returns the fallback batch.
pub struct ScriptedSource {
  queue: Mutex<VecDeque<std::result::Result<Vec<ApiImage>, String>>>,
  fallback: Vec<ApiImage>,
  calls: AtomicUsize,
  limits: Mutex<Vec<u32>>,
  gate: Option<Arc<Notify>>,
}

impl ScriptedSource {
  /// Every call returns `images`.
  pub fn repeating(images: Vec<ApiImage>) -> Self {
    Self {
      queue: Mutex::new(VecDeque::new()),
      fallback: images,
      calls: AtomicUsize::new(0),
      limits: Mutex::new(Vec::new()),
      gate: None,
    }
  }

  /// Every call returns an empty batch unless something is queued.
  pub fn empty() -> Self {
    Self::repeating(Vec::new())
  }

  /// Queue a successful response.
  pub fn then(self, images: Vec<ApiImage>) -> Self {
    self.push(Ok(images));
    self
  }

  /// Queue a failing response.
  pub fn then_fail(self, message: &str) -> Self {
    self.push(Err(message.to_string()));
    self
  }

  /// Hold every response until the returned `Notify` grants a permit.
  pub fn gated(mut self) -> (Self, Arc<Notify>) {
    let gate = Arc::new(Notify::new());
    self.gate = Some(Arc::clone(&gate));
    (self, gate)
  }

  fn push(&self, response: std::result::Result<Vec<ApiImage>, String>) {
    self
      .queue
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .push_back(response);
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  pub fn limits(&self) -> Vec<u32> {
    self
      .limits
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }
}

impl ImageSource for ScriptedSource {
  fn search(&self, limit: u32) -> BoxFuture<'_, Result<Vec<ApiImage>>> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    self
      .limits
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .push(limit);

    let next = self
      .queue
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .pop_front()
      .unwrap_or_else(|| Ok(self.fallback.clone()));
    let gate = self.gate.clone();

    Box::pin(async move {
      if let Some(gate) = gate {
        gate.notified().await;
      }
      next.map_err(|message| eyre!(message))
    })
  }
}

/// Poll `condition` until it holds, yielding to the runtime in between.
///
/// Panics after two seconds.
pub async fn until(condition: impl Fn() -> bool) {
  for _ in 0..2000 {
    if condition() {
      return;
    }
    tokio::time::sleep(Duration::from_millis(1)).await;
  }
  panic!("condition not reached within 2s");
}

/// Connectivity oracle that can be flipped from a test.
pub struct Switch {
  connected: AtomicBool,
  checks: AtomicUsize,
}

impl Switch {
  fn with(connected: bool) -> Self {
    Self {
      connected: AtomicBool::new(connected),
      checks: AtomicUsize::new(0),
    }
  }

  pub fn online() -> Self {
    Self::with(true)
  }

  pub fn offline() -> Self {
    Self::with(false)
  }

  pub fn set_connected(&self, connected: bool) {
    self.connected.store(connected, Ordering::SeqCst);
  }

  /// How many times the oracle was asked.
  pub fn checks(&self) -> usize {
    self.checks.load(Ordering::SeqCst)
  }
}

impl Connectivity for Switch {
  fn is_connected(&self) -> bool {
    self.checks.fetch_add(1, Ordering::SeqCst);
    self.connected.load(Ordering::SeqCst)
  }
}

/// Oracle that holds its thread for a while before answering, like a probe
/// stuck on an unroutable address.
pub struct Slow {
  delay: Duration,
  answer: bool,
}

impl Slow {
  pub fn new(delay: Duration, answer: bool) -> Self {
    Self { delay, answer }
  }
}

impl Connectivity for Slow {
  fn is_connected(&self) -> bool {
    std::thread::sleep(self.delay);
    self.answer
  }
}
