use crate::gallery::UiState;
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Application events
#[derive(Debug)]
pub enum Event {
  /// Terminal key press
  Key(KeyEvent),
  /// Terminal was resized
  Resize,
  /// The gallery published a new state
  Gallery,
  /// Periodic tick for UI refresh
  Tick,
}

/// Event handler that merges terminal input, gallery updates and a tick timer
pub struct EventHandler {
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  /// Create a new event handler with the given tick rate
  pub fn new(tick_rate: Duration, mut gallery: watch::Receiver<UiState>) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();

    // Terminal reads block, so they get their own thread
    let input_tx = tx.clone();
    tokio::task::spawn_blocking(move || loop {
      let next = if event::poll(tick_rate).unwrap_or(false) {
        match event::read() {
          Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => Some(Event::Key(key)),
          Ok(CrosstermEvent::Resize(_, _)) => Some(Event::Resize),
          _ => None,
        }
      } else {
        Some(Event::Tick)
      };

      if let Some(evt) = next {
        if input_tx.send(evt).is_err() {
          break;
        }
      }
    });

    // Wake the UI whenever the gallery state moves
    tokio::spawn(async move {
      while gallery.changed().await.is_ok() {
        if tx.send(Event::Gallery).is_err() {
          break;
        }
      }
    });

    Self { rx }
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}
