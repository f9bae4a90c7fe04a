use crate::app::Gallery;
use crate::catapi::types::CachedItem;
use crate::gallery::UiState;
use crate::ui::renderfns::{centered_rect, truncate};
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::ui::views::DetailView;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use std::sync::Arc;
use tokio::sync::watch;

const CELL_WIDTH: u16 = 26;
const CELL_HEIGHT: u16 = 4;

/// Infinitely scrolling grid of cached images
pub struct GridView {
  gallery: Arc<Gallery>,
  state_rx: watch::Receiver<UiState>,
  state: UiState,
  /// Items from the last Success, kept on screen while loading or after an error
  shown: Vec<CachedItem>,
  selected: usize,
  scroll_row: usize,
  columns: usize,
}

impl GridView {
  pub fn new(gallery: Arc<Gallery>) -> Self {
    let mut state_rx = gallery.state();
    let state = state_rx.borrow_and_update().clone();

    let mut view = Self {
      gallery,
      state_rx,
      state: UiState::Loading,
      shown: Vec::new(),
      selected: 0,
      scroll_row: 0,
      columns: 1,
    };
    view.apply_state(state);
    view
  }

  fn apply_state(&mut self, state: UiState) {
    match &state {
      UiState::Success { items } => self.shown = items.clone(),
      UiState::Empty => self.shown.clear(),
      UiState::Loading | UiState::Error { .. } => {}
    }
    self.state = state;
    self.selected = self.selected.min(self.shown.len().saturating_sub(1));
  }

  fn move_by(&mut self, delta: isize) {
    self.selected = step(self.selected, delta, self.shown.len());
    if near_end(self.selected, self.shown.len(), self.columns) {
      self.gallery.load_more_images();
    }
  }

  fn status_suffix(&self) -> &'static str {
    if self.state.is_loading() {
      " refreshing..."
    } else if self.gallery.paging().is_loading_more {
      " loading more..."
    } else {
      ""
    }
  }

  fn render_message(&self, frame: &mut Frame, area: Rect, message: &str, color: Color) {
    let rect = centered_rect(area, 60, 4);
    let paragraph = Paragraph::new(message.to_string())
      .alignment(Alignment::Center)
      .wrap(Wrap { trim: true })
      .style(Style::default().fg(color));
    frame.render_widget(paragraph, rect);
  }

  fn render_grid(&mut self, frame: &mut Frame, area: Rect) {
    let visible_rows = usize::from((area.height / CELL_HEIGHT).max(1));
    let selected_row = self.selected / self.columns;
    self.scroll_row = scroll_to(self.scroll_row, selected_row, visible_rows);

    let first = self.scroll_row * self.columns;
    let last = (first + visible_rows * self.columns).min(self.shown.len());

    for (offset, item) in self.shown[first..last].iter().enumerate() {
      let index = first + offset;
      let row = (offset / self.columns) as u16;
      let col = (offset % self.columns) as u16;
      let cell = Rect {
        x: area.x + col * CELL_WIDTH,
        y: area.y + row * CELL_HEIGHT,
        width: CELL_WIDTH.min(area.width),
        height: CELL_HEIGHT.min(area.height.saturating_sub(row * CELL_HEIGHT)),
      };
      draw_cell(frame, cell, item, index == self.selected);
    }
  }
}

fn draw_cell(frame: &mut Frame, area: Rect, item: &CachedItem, selected: bool) {
  let border = if selected {
    Style::default().fg(Color::Yellow)
  } else {
    Style::default().fg(Color::DarkGray)
  };
  let block = Block::default().borders(Borders::ALL).border_style(border);
  let width = usize::from(area.width.saturating_sub(2));

  let lines = vec![
    Line::from(Span::styled(
      truncate(&item.title, width),
      Style::default().fg(Color::White).bold(),
    )),
    Line::from(Span::styled(
      truncate(dimensions(&item.description), width),
      Style::default().fg(Color::DarkGray),
    )),
  ];

  frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// The `WxH` tail of a description, or the whole text if it has none
fn dimensions(description: &str) -> &str {
  description
    .rsplit(' ')
    .next()
    .filter(|tail| tail.contains('x'))
    .unwrap_or(description)
}

/// Move a selection by `delta` within `0..len`, clamping at both ends
fn step(selected: usize, delta: isize, len: usize) -> usize {
  if len == 0 {
    return 0;
  }
  (selected as isize + delta).clamp(0, len as isize - 1) as usize
}

/// True once the selection is within one row of the end
fn near_end(selected: usize, len: usize, columns: usize) -> bool {
  selected + columns >= len
}

/// Adjust the first visible row so `selected_row` is on screen
fn scroll_to(scroll_row: usize, selected_row: usize, visible_rows: usize) -> usize {
  if selected_row < scroll_row {
    selected_row
  } else if selected_row >= scroll_row + visible_rows {
    selected_row + 1 - visible_rows
  } else {
    scroll_row
  }
}

impl View for GridView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    let columns = self.columns as isize;
    match key.code {
      KeyCode::Left | KeyCode::Char('h') => self.move_by(-1),
      KeyCode::Right | KeyCode::Char('l') => self.move_by(1),
      KeyCode::Up | KeyCode::Char('k') => self.move_by(-columns),
      KeyCode::Down | KeyCode::Char('j') => self.move_by(columns),
      KeyCode::PageUp => self.move_by(-columns * 4),
      KeyCode::PageDown => self.move_by(columns * 4),
      KeyCode::Home | KeyCode::Char('g') => self.move_by(-(self.selected as isize)),
      KeyCode::End | KeyCode::Char('G') => self.move_by(self.shown.len() as isize),
      KeyCode::Char('r') => {
        self.selected = 0;
        self.scroll_row = 0;
        self.gallery.refresh_images();
      }
      KeyCode::Enter => {
        if let Some(item) = self.shown.get(self.selected) {
          return ViewAction::Push(Box::new(DetailView::new(item.clone())));
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let title = format!(" Cats ({}){} ", self.shown.len(), self.status_suffix());
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let inner = block.inner(area);
    frame.render_widget(block, area);
    self.columns = usize::from((inner.width / CELL_WIDTH).max(1));

    if self.shown.is_empty() {
      match &self.state {
        UiState::Error { message } => self.render_message(
          frame,
          inner,
          &format!("Error: {}\n\nPress 'r' to retry.", message),
          Color::Red,
        ),
        UiState::Empty if !self.gallery.paging().is_loading_more => self.render_message(
          frame,
          inner,
          "No cats cached yet. Press 'r' to refresh.",
          Color::DarkGray,
        ),
        _ => self.render_message(frame, inner, "Loading cats...", Color::DarkGray),
      }
      return;
    }

    let (grid_area, banner) = match self.state.error() {
      Some(message) => {
        let chunks = Layout::default()
          .direction(Direction::Vertical)
          .constraints([Constraint::Min(1), Constraint::Length(1)])
          .split(inner);
        (chunks[0], Some((chunks[1], message.to_string())))
      }
      None => (inner, None),
    };

    self.render_grid(frame, grid_area);

    if let Some((area, message)) = banner {
      let paragraph = Paragraph::new(format!(" {} (showing cached images, 'r' to retry)", message))
        .style(Style::default().fg(Color::Red));
      frame.render_widget(paragraph, area);
    }
  }

  fn breadcrumb_label(&self) -> String {
    "Cats".to_string()
  }

  fn tick(&mut self) {
    if self.state_rx.has_changed().unwrap_or(false) {
      let state = self.state_rx.borrow_and_update().clone();
      self.apply_state(state);
    }
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new("hjkl", "move"),
      Shortcut::new("enter", "details"),
      Shortcut::new("r", "refresh"),
      Shortcut::new("q", "quit"),
    ]
  }
}
