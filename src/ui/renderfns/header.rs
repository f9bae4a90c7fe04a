use crate::ui::view::Shortcut;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the header bar with logo, API host, cached item count, connection mode and shortcuts
pub fn draw_header(
  frame: &mut Frame,
  area: Rect,
  host: &str,
  count: Option<usize>,
  offline: bool,
  shortcuts: &[Shortcut],
) {
  let (mode, mode_color) = if offline {
    ("offline", Color::Red)
  } else {
    ("online", Color::Green)
  };

  let mut spans = vec![
    Span::styled(" catgrid ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", host), Style::default().fg(Color::White)),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(
      match count {
        Some(n) => format!(" {} cached ", n),
        None => " ? cached ".to_string(),
      },
      Style::default().fg(Color::Yellow),
    ),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", mode), Style::default().fg(mode_color).bold()),
    Span::raw(" "),
  ];

  // Keys and brackets highlighted, descriptions dimmed
  for shortcut in shortcuts {
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
      format!("<{}>", shortcut.key),
      Style::default().fg(Color::Cyan),
    ));
    spans.push(Span::styled(
      format!(" {}", shortcut.label),
      Style::default().fg(Color::DarkGray),
    ));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));

  frame.render_widget(paragraph, area);
}
