use crate::catapi::types::CachedItem;
use crate::ui::view::{Shortcut, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use tracing::warn;

/// View for a single cached image
pub struct DetailView {
  item: CachedItem,
  status: Option<String>,
}

impl DetailView {
  pub fn new(item: CachedItem) -> Self {
    Self { item, status: None }
  }

  fn open_in_browser(&mut self) {
    self.status = Some(match open::that(&self.item.image_url) {
      Ok(()) => "Opened in browser".to_string(),
      Err(e) => {
        warn!(url = %self.item.image_url, error = %e, "failed to open image");
        format!("Could not open browser: {}", e)
      }
    });
  }
}

impl View for DetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('o') => {
        self.open_in_browser();
        ViewAction::None
      }
      KeyCode::Char('q') | KeyCode::Esc => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(format!(" {} ", self.item.title))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let label = Style::default().fg(Color::DarkGray);
    let mut lines = vec![
      Line::from(vec![
        Span::styled("Title:       ", label),
        Span::styled(self.item.title.as_str(), Style::default().bold()),
      ]),
      Line::from(vec![
        Span::styled("Description: ", label),
        Span::raw(self.item.description.as_str()),
      ]),
      Line::from(vec![
        Span::styled("Image:       ", label),
        Span::styled(
          self.item.image_url.as_str(),
          Style::default().fg(Color::Cyan).underlined(),
        ),
      ]),
      Line::from(vec![
        Span::styled("Id:          ", label),
        Span::raw(self.item.remote_id.as_str()),
      ]),
    ];

    if let Some(status) = &self.status {
      lines.push(Line::raw(""));
      lines.push(Line::styled(status.as_str(), Style::default().fg(Color::Yellow)));
    }

    let paragraph = Paragraph::new(lines)
      .block(block)
      .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
  }

  fn breadcrumb_label(&self) -> String {
    self.item.title.clone()
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![Shortcut::new("o", "open"), Shortcut::new("q", "back")]
  }
}
