use super::{CacheRefresh, NoticeListView};
use crate::notice::board::NoticeBoard;
use crate::notice::html;
use crate::notice::store::NoticeStore;
use crate::notice::types::{Department, Notice};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{department_color, format_date, StatusMessage};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

/// Landing screen: the featured notice and how many notices each
/// department has
pub struct DashboardView<S: NoticeStore> {
  board: NoticeBoard<S>,
  refresh: CacheRefresh,
  list_state: ListState,
}

impl<S: NoticeStore> DashboardView<S> {
  pub fn new(board: NoticeBoard<S>) -> Self {
    let refresh = CacheRefresh::new(&board);
    Self {
      board,
      refresh,
      list_state: ListState::default(),
    }
  }

  fn render_featured(&self, frame: &mut Frame, area: Rect, featured: Option<&Notice>) {
    let block = Block::default()
      .title(" Featured ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow));

    let Some(notice) = featured else {
      let snapshot = self.board.cache().snapshot();
      let text = match (snapshot.is_loading, snapshot.last_error) {
        (true, _) => "Loading notices...".to_string(),
        (false, Some(error)) => format!("{}\n\nPress 'r' to retry.", error),
        (false, None) => "No notices have been published yet.".to_string(),
      };
      let paragraph = Paragraph::new(text)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    };

    let mut lines = vec![
      Line::from(Span::styled(notice.title.clone(), Style::default().bold())),
      Line::from(vec![
        Span::styled(
          notice.department.label(),
          Style::default().fg(department_color(notice.department)),
        ),
        Span::styled("  ·  ", Style::default().fg(Color::DarkGray)),
        Span::raw(format_date(notice.date)),
      ]),
      Line::from(Span::styled(
        notice.subject.clone(),
        Style::default().fg(Color::White).italic(),
      )),
      Line::raw(""),
    ];
    lines.extend(html::to_plain_text(&notice.body).lines().map(|l| Line::raw(l.to_string())));
    if !notice.attachments.is_empty() {
      lines.push(Line::raw(""));
      lines.push(Line::from(Span::styled(
        format!("{} attachment(s)", notice.attachments.len()),
        Style::default().fg(Color::DarkGray),
      )));
    }

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
  }

  fn render_departments(&mut self, frame: &mut Frame, area: Rect, counts: &[(Department, usize)]) {
    ensure_valid_selection(&mut self.list_state, counts.len());

    let block = Block::default()
      .title(" Departments ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let items: Vec<ListItem> = counts
      .iter()
      .map(|(dept, count)| {
        ListItem::new(Line::from(vec![
          Span::styled(
            format!("{:<18}", dept.label()),
            Style::default().fg(department_color(*dept)),
          ),
          Span::styled(format!("{:>4}", count), Style::default().fg(Color::White)),
        ]))
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }

  fn selected_department(&self) -> Option<Department> {
    let counts = self.board.cache().department_counts();
    self
      .list_state
      .selected()
      .and_then(|i| counts.get(i))
      .map(|(dept, _)| *dept)
  }
}

impl<S: NoticeStore> View for DashboardView<S> {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('r') => return ViewAction::Status(self.refresh.reload()),
      KeyCode::Enter => {
        if let Some(dept) = self.selected_department() {
          return ViewAction::Push(Box::new(NoticeListView::new(
            self.board.clone(),
            Some(dept),
          )));
        }
      }
      KeyCode::Char('n') => {
        return ViewAction::Push(Box::new(NoticeListView::new(self.board.clone(), None)));
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let cache = self.board.cache();
    let featured = cache.featured();
    let counts = cache.department_counts();

    let chunks = Layout::default()
      .direction(Direction::Horizontal)
      .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
      .split(area);

    self.render_featured(frame, chunks[0], featured.as_ref());
    self.render_departments(frame, chunks[1], &counts);
  }

  fn breadcrumb_label(&self) -> String {
    "Dashboard".to_string()
  }

  fn tick(&mut self) -> Option<StatusMessage> {
    self.refresh.tick()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("enter", "department").with_priority(20),
      ShortcutInfo::new("n", "all notices").with_priority(30),
      ShortcutInfo::new("r", "refresh").with_priority(40),
      ShortcutInfo::new("q", "quit").with_priority(90),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::notice::memory::{day, sample_notice, MemoryStore};
  use crossterm::event::KeyModifiers;
  use ratatui::backend::TestBackend;
  use ratatui::Terminal;
  use std::sync::Arc;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  async fn dashboard() -> DashboardView<MemoryStore> {
    let mut featured = sample_notice("f", Department::Exams, day(4));
    featured.is_featured = true;
    let store = MemoryStore::with_notices(vec![
      featured,
      sample_notice("a", Department::CS, day(1)),
      sample_notice("b", Department::CS, day(2)),
    ]);
    let board = NoticeBoard::new(Arc::new(store));
    board.load().await;
    DashboardView::new(board)
  }

  #[tokio::test]
  async fn test_renders_featured_and_counts() {
    let mut view = dashboard().await;
    let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
    terminal.draw(|frame| view.render(frame, frame.area())).unwrap();

    let text: String = terminal
      .backend()
      .buffer()
      .content()
      .iter()
      .map(|cell| cell.symbol())
      .collect();
    assert!(text.contains("Notice f"));
    assert!(text.contains("Body of f"));
    assert!(text.contains("CS"));
  }

  #[tokio::test]
  async fn test_enter_opens_department_list() {
    let mut view = dashboard().await;
    view.list_state.select(Some(0));
    match view.handle_key(key(KeyCode::Enter)) {
      ViewAction::Push(next) => {
        assert_eq!(next.department(), view.selected_department());
        assert!(next.department().is_some());
      }
      _ => panic!("expected a pushed list view"),
    }
  }

  #[tokio::test]
  async fn test_q_pops() {
    let mut view = dashboard().await;
    assert!(matches!(view.handle_key(key(KeyCode::Char('q'))), ViewAction::Pop));
  }
}
