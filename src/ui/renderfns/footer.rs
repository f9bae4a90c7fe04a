use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the footer bar: view breadcrumb on the left, status text on the right
pub fn draw_footer(frame: &mut Frame, area: Rect, breadcrumb: &[String], status: &str) {
  let mut spans = vec![Span::raw(" ")];

  for (i, part) in breadcrumb.iter().enumerate() {
    if i > 0 {
      spans.push(Span::styled(" > ", Style::default().fg(Color::DarkGray)));
    }

    let style = if i == breadcrumb.len() - 1 {
      // Current view - highlighted
      Style::default().fg(Color::Cyan).bold()
    } else {
      Style::default().fg(Color::White)
    };

    spans.push(Span::styled(part.clone(), style));
  }

  let chunks = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([
      Constraint::Min(1),
      Constraint::Length(status.chars().count() as u16 + 1),
    ])
    .split(area);

  let left = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(left, chunks[0]);

  let right = Paragraph::new(format!("{} ", status))
    .alignment(Alignment::Right)
    .style(Style::default().fg(Color::DarkGray).bg(Color::Black));
  frame.render_widget(right, chunks[1]);
}
