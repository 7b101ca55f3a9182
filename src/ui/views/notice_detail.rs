use super::actions::NoticeActions;
use super::CacheRefresh;
use crate::notice::board::NoticeBoard;
use crate::notice::draft::format_size;
use crate::notice::html;
use crate::notice::store::NoticeStore;
use crate::notice::types::{Department, Notice, NoticeId};
use crate::ui::renderfns::{department_color, format_date, truncate, StatusMessage};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// One notice. Looked up in the cache on every render, so edits and
/// refreshes show up without reopening it.
pub struct NoticeDetailView<S: NoticeStore> {
  id: NoticeId,
  board: NoticeBoard<S>,
  refresh: CacheRefresh,
  actions: NoticeActions<S>,
  scroll: u16,
}

impl<S: NoticeStore> NoticeDetailView<S> {
  pub fn new(id: NoticeId, board: NoticeBoard<S>) -> Self {
    Self {
      id,
      refresh: CacheRefresh::new(&board),
      actions: NoticeActions::new(board.clone()),
      board,
      scroll: 0,
    }
  }

  fn notice(&self) -> Option<Notice> {
    self.board.cache().get(&self.id)
  }

  fn body_lines(notice: &Notice) -> Vec<Line<'static>> {
    let label = |text: &'static str| Span::styled(text, Style::default().fg(Color::DarkGray));

    let mut lines = vec![
      Line::from(vec![label("Department: "), Span::styled(
        notice.department.label(),
        Style::default().fg(department_color(notice.department)),
      )]),
      Line::from(vec![label("Date:       "), Span::raw(format_date(notice.date))]),
      Line::from(vec![label("Subject:    "), Span::raw(notice.subject.clone())]),
    ];
    if notice.is_featured {
      lines.push(Line::from(Span::styled(
        "★ Featured",
        Style::default().fg(Color::Yellow),
      )));
    }
    lines.push(Line::raw(""));

    lines.extend(
      html::to_plain_text(&notice.body)
        .lines()
        .map(|l| Line::raw(l.to_string())),
    );

    if !notice.attachments.is_empty() {
      lines.push(Line::raw(""));
      lines.push(Line::from(label("Attachments")));
      for attachment in &notice.attachments {
        lines.push(Line::from(vec![
          Span::raw("  "),
          Span::styled(attachment.name.clone(), Style::default().fg(Color::Cyan)),
          Span::styled(
            format!("  {}  {}", attachment.mime_type, format_size(attachment.size_bytes)),
            Style::default().fg(Color::DarkGray),
          ),
        ]));
      }
    }

    let links = html::extract_links(&notice.body);
    if !links.is_empty() {
      lines.push(Line::raw(""));
      lines.push(Line::from(label("Links")));
      for link in links {
        lines.push(Line::from(Span::styled(
          format!("  {}", link),
          Style::default().fg(Color::Blue).underlined(),
        )));
      }
    }

    lines
  }
}

impl<S: NoticeStore> View for NoticeDetailView<S> {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if let Some(message) = self.actions.handle_confirm_key(key) {
      return ViewAction::Status(message);
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.scroll = self.scroll.saturating_add(1),
      KeyCode::Char('k') | KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
      KeyCode::PageDown => self.scroll = self.scroll.saturating_add(10),
      KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
      KeyCode::Char('r') => return ViewAction::Status(self.refresh.reload()),
      KeyCode::Char('f') => {
        if let Some(notice) = self.notice() {
          return ViewAction::Status(self.actions.feature(&notice));
        }
      }
      KeyCode::Char('d') => {
        if let Some(notice) = self.notice() {
          return ViewAction::Status(self.actions.request_delete(&notice));
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let notice = self.notice();
    let title = match &notice {
      Some(n) => format!(" {} ", n.title),
      None => format!(" {} ", self.id),
    };
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let Some(notice) = notice else {
      let text = if self.board.cache().is_loading() {
        "Loading notice..."
      } else {
        "This notice no longer exists. Press q to go back."
      };
      let paragraph = Paragraph::new(text)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    };

    let paragraph = Paragraph::new(Self::body_lines(&notice))
      .block(block)
      .wrap(Wrap { trim: false })
      .scroll((self.scroll, 0));
    frame.render_widget(paragraph, area);
  }

  fn breadcrumb_label(&self) -> String {
    match self.notice() {
      Some(notice) => truncate(&notice.title, 30),
      None => self.id.to_string(),
    }
  }

  fn department(&self) -> Option<Department> {
    self.notice().map(|n| n.department)
  }

  fn is_capturing_input(&self) -> bool {
    self.actions.is_confirming()
  }

  fn tick(&mut self) -> Option<StatusMessage> {
    let refreshed = self.refresh.tick();
    self.actions.tick().or(refreshed)
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("j/k", "scroll").with_priority(10),
      ShortcutInfo::new("f", "feature").with_priority(20),
      ShortcutInfo::new("d", "delete").with_priority(30),
      ShortcutInfo::new("r", "refresh").with_priority(40),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::notice::memory::{day, sample_notice, MemoryStore};
  use crate::notice::types::Attachment;
  use ratatui::backend::TestBackend;
  use ratatui::Terminal;
  use std::sync::Arc;

  fn rendered(view: &mut NoticeDetailView<MemoryStore>) -> String {
    let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
    terminal.draw(|frame| view.render(frame, frame.area())).unwrap();
    terminal
      .backend()
      .buffer()
      .content()
      .iter()
      .map(|cell| cell.symbol())
      .collect()
  }

  async fn board() -> NoticeBoard<MemoryStore> {
    let mut notice = sample_notice("a", Department::FeeDues, day(7));
    notice.body = r#"<p>Pay by Friday</p><p><a href="https://pay.example.edu">portal</a></p>"#.to_string();
    notice.attachments = vec![Attachment::from_bytes("fees.pdf", "application/pdf", b"%PDF")];
    let board = NoticeBoard::new(Arc::new(MemoryStore::with_notices(vec![notice])));
    board.load().await;
    board
  }

  #[tokio::test]
  async fn test_renders_body_attachments_and_links() {
    let mut view = NoticeDetailView::new(NoticeId::from("a"), board().await);
    let text = rendered(&mut view);
    assert!(text.contains("Fee Dues"));
    assert!(text.contains("Pay by Friday"));
    assert!(text.contains("fees.pdf"));
    assert!(text.contains("https://pay.example.edu"));
    assert_eq!(view.breadcrumb_label(), "Notice a");
  }

  #[tokio::test]
  async fn test_shows_cache_edits_without_reopening() {
    let board = board().await;
    let mut view = NoticeDetailView::new(NoticeId::from("a"), board.clone());

    let mut edited = board.cache().get(&NoticeId::from("a")).unwrap();
    edited.title = "Fee deadline extended".to_string();
    board.cache().update(&edited.id.clone(), edited);

    assert!(rendered(&mut view).contains("Fee deadline extended"));

    board.cache().remove(&NoticeId::from("a"));
    assert!(rendered(&mut view).contains("no longer exists"));
    assert_eq!(view.breadcrumb_label(), "a");
  }
}
