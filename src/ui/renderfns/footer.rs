use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Latest message for the status line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMessage {
  Info(String),
  Error(String),
}

/// Draw the footer: breadcrumb on the left, status message after it
pub fn draw_footer(frame: &mut Frame, area: Rect, breadcrumb: &[String], status: Option<&StatusMessage>) {
  let mut spans = vec![Span::raw(" ")];

  for (i, part) in breadcrumb.iter().enumerate() {
    if i > 0 {
      spans.push(Span::styled(" > ", Style::default().fg(Color::DarkGray)));
    }

    let style = if i + 1 == breadcrumb.len() {
      Style::default().fg(Color::Cyan).bold()
    } else {
      Style::default().fg(Color::White)
    };
    spans.push(Span::styled(part.clone(), style));
  }

  if let Some(status) = status {
    let (text, color) = match status {
      StatusMessage::Info(text) => (text, Color::Green),
      StatusMessage::Error(text) => (text, Color::Red),
    };
    spans.push(Span::styled("   ", Style::default()));
    spans.push(Span::styled(text.clone(), Style::default().fg(color)));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}
