pub mod renderfns;
pub mod view;
pub mod views;

use crate::app::App;
use ratatui::prelude::*;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Footer
    ])
    .split(frame.area());

  let shortcuts = app.shortcuts();
  renderfns::draw_header(
    frame,
    chunks[0],
    app.api_host(),
    app.item_count(),
    app.is_offline(),
    &shortcuts,
  );

  if let Some(view) = app.current_view_mut() {
    view.render(frame, chunks[1]);
  }

  let breadcrumb = app.view_breadcrumb();
  renderfns::draw_footer(frame, chunks[2], &breadcrumb, &app.status_line());
}
