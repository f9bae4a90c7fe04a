use crate::cache::SqliteStorage;
use crate::event::{Event, EventHandler};
use crate::gallery::GalleryController;
use crate::ui;
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::ui::views::GridView;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// The gallery controller as wired up by the application
pub type Gallery = GalleryController<SqliteStorage>;

/// Main application state
pub struct App {
  /// Navigation stack - the grid is always at index 0
  view_stack: Vec<Box<dyn View>>,

  gallery: Arc<Gallery>,

  /// Host shown in the header
  api_host: String,

  /// Whether network access was disabled on the command line
  offline: bool,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(gallery: Arc<Gallery>, api_host: String, offline: bool) -> Self {
    Self {
      view_stack: vec![Box::new(GridView::new(Arc::clone(&gallery)))],
      gallery,
      api_host,
      offline,
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;

    let result = self.event_loop().await;

    // Cleanup terminal, even if the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(&mut self) -> Result<()> {
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    let mut events = EventHandler::new(Duration::from_millis(250), self.gallery.state());
    info!("gallery started");

    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }

    info!("gallery closed");
    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick | Event::Gallery | Event::Resize => {
        for view in &mut self.view_stack {
          view.tick();
        }
      }
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    let action = match self.view_stack.last_mut() {
      Some(view) => view.handle_key(key),
      None => return,
    };

    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => self.view_stack.push(view),
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
    }
  }

  // Accessors for UI rendering
  pub fn current_view_mut(&mut self) -> Option<&mut Box<dyn View>> {
    self.view_stack.last_mut()
  }

  pub fn api_host(&self) -> &str {
    &self.api_host
  }

  pub fn is_offline(&self) -> bool {
    self.offline
  }

  pub fn shortcuts(&self) -> Vec<Shortcut> {
    self
      .view_stack
      .last()
      .map(|v| v.shortcuts())
      .unwrap_or_default()
  }

  pub fn view_breadcrumb(&self) -> Vec<String> {
    self
      .view_stack
      .iter()
      .map(|v| v.breadcrumb_label())
      .collect()
  }

  pub fn item_count(&self) -> Option<usize> {
    self.gallery.cached_count()
  }

  /// Pagination summary for the footer
  pub fn status_line(&self) -> String {
    let paging = self.gallery.paging();
    if paging.has_more_images {
      format!("page {}", paging.current_page)
    } else {
      format!("page {} · end of feed", paging.current_page)
    }
  }
}
