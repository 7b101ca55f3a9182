use crate::notice::types::Department;
use crate::ui::view::ShortcutInfo;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// What the header shows about the current session
pub struct HeaderContext<'a> {
  pub title: &'a str,
  pub api_url: &'a str,
  pub department: Option<Department>,
  pub user: Option<&'a str>,
}

/// Draw the header bar with title, context and the view's shortcuts
pub fn draw_header(frame: &mut Frame, area: Rect, ctx: &HeaderContext, shortcuts: &[ShortcutInfo]) {
  let separator = || Span::styled("│", Style::default().fg(Color::DarkGray));

  let department = ctx.department.map(|d| d.label()).unwrap_or("All departments");
  let user = match ctx.user {
    Some(name) => Span::styled(format!(" {} ", name), Style::default().fg(Color::Green)),
    None => Span::styled(" read-only ", Style::default().fg(Color::DarkGray)),
  };

  let mut spans = vec![
    Span::styled(format!(" {} ", ctx.title), Style::default().fg(Color::Cyan).bold()),
    separator(),
    Span::styled(
      format!(" {} ", extract_host(ctx.api_url)),
      Style::default().fg(Color::White),
    ),
    separator(),
    Span::styled(
      format!(" {} ", department),
      Style::default().fg(Color::Yellow).bold(),
    ),
    separator(),
    user,
    Span::raw(" "),
  ];

  let mut shortcuts = shortcuts.to_vec();
  shortcuts.sort_by_key(|s| s.priority);
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

/// Host (and port) part of the API url
fn extract_host(url: &str) -> &str {
  let rest = url
    .strip_prefix("https://")
    .or_else(|| url.strip_prefix("http://"))
    .unwrap_or(url);
  rest.split('/').next().unwrap_or(rest)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_extract_host() {
    assert_eq!(extract_host("http://localhost:3001"), "localhost:3001");
    assert_eq!(
      extract_host("https://notices.example.edu/board/"),
      "notices.example.edu"
    );
    assert_eq!(extract_host("board.local"), "board.local");
  }
}
