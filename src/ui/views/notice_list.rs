use super::actions::NoticeActions;
use super::{CacheRefresh, NoticeDetailView};
use crate::notice::board::NoticeBoard;
use crate::notice::store::NoticeStore;
use crate::notice::types::{Department, Notice};
use crate::ui::components::{
  DepartmentPicker, DepartmentPickerEvent, KeyResult, SearchEvent, SearchInput,
};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{department_color, format_date, truncate, StatusMessage};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// Notices for one department (plus the ones addressed to all), or every
/// notice, newest first as the service orders them
pub struct NoticeListView<S: NoticeStore> {
  board: NoticeBoard<S>,
  department: Option<Department>,
  refresh: CacheRefresh,
  actions: NoticeActions<S>,
  list_state: ListState,
  search: SearchInput,
  filter: String,
  picker: DepartmentPicker,
}

impl<S: NoticeStore> NoticeListView<S> {
  pub fn new(board: NoticeBoard<S>, department: Option<Department>) -> Self {
    Self {
      refresh: CacheRefresh::new(&board),
      actions: NoticeActions::new(board.clone()),
      board,
      department: department.filter(|d| !d.is_wildcard()),
      list_state: ListState::default(),
      search: SearchInput::new(),
      filter: String::new(),
      picker: DepartmentPicker::new(),
    }
  }

  /// Notices after the department and search filters
  fn visible(&self) -> Vec<Notice> {
    let items = match self.department {
      Some(dept) => self.board.cache().filtered(dept),
      None => self.board.cache().items(),
    };
    items
      .into_iter()
      .filter(|n| n.matches_text(&self.filter))
      .collect()
  }

  fn selected(&self) -> Option<Notice> {
    let idx = self.list_state.selected()?;
    self.visible().into_iter().nth(idx)
  }

  fn title(&self, shown: usize) -> String {
    let snapshot = self.board.cache().snapshot();
    let mut title = format!(" {} ({}", self.breadcrumb_label(), shown);
    if !self.filter.is_empty() {
      title.push_str(&format!(" matching \"{}\"", self.filter));
    }
    title.push(')');
    if let Some(fetched) = snapshot.last_fetched_at {
      title.push_str(&format!(" updated {}", fetched.with_timezone(&Local).format("%H:%M")));
    }
    if snapshot.is_loading {
      title.push_str(" refreshing...");
    } else if snapshot.last_error.is_some() {
      title.push_str(" [stale]");
    }
    title.push(' ');
    title
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let notices = self.visible();
    ensure_valid_selection(&mut self.list_state, notices.len());

    let block = Block::default()
      .title(self.title(notices.len()))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if notices.is_empty() {
      let snapshot = self.board.cache().snapshot();
      let content = if snapshot.is_loading {
        "Loading notices...".to_string()
      } else if let Some(error) = snapshot.last_error {
        format!("{}\nPress 'r' to retry.", error)
      } else if !self.filter.is_empty() {
        "No notices match the search.".to_string()
      } else {
        "No notices found.".to_string()
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let title_width = (area.width as usize).saturating_sub(40).max(10);
    let items: Vec<ListItem> = notices
      .iter()
      .map(|notice| {
        let marker = if notice.is_featured { "★ " } else { "  " };
        ListItem::new(Line::from(vec![
          Span::styled(marker, Style::default().fg(Color::Yellow)),
          Span::styled(
            format!("{:<12}", format_date(notice.date)),
            Style::default().fg(Color::DarkGray),
          ),
          Span::styled(
            format!("{:<17}", truncate(notice.department.label(), 16)),
            Style::default().fg(department_color(notice.department)),
          ),
          Span::raw(truncate(&notice.title, title_width)),
        ]))
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }
}

impl<S: NoticeStore> View for NoticeListView<S> {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if let Some(message) = self.actions.handle_confirm_key(key) {
      return ViewAction::Status(message);
    }

    match self.picker.handle_key(key) {
      KeyResult::Event(DepartmentPickerEvent::Selected(dept)) => {
        self.department = dept;
        self.list_state.select(Some(0));
        return ViewAction::None;
      }
      KeyResult::Handled | KeyResult::Event(DepartmentPickerEvent::Cancelled) => {
        return ViewAction::None
      }
      KeyResult::NotHandled => {}
    }

    match self.search.handle_key(key) {
      KeyResult::Event(SearchEvent::Changed(query)) => {
        self.filter = query;
        self.list_state.select(Some(0));
        return ViewAction::None;
      }
      KeyResult::Event(SearchEvent::Submitted) | KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('g') | KeyCode::Home => self.list_state.select_first(),
      KeyCode::Char('G') | KeyCode::End => self.list_state.select_last(),
      KeyCode::Char('r') => return ViewAction::Status(self.refresh.reload()),
      KeyCode::Char('D') => self.picker.show(self.department),
      KeyCode::Enter => {
        if let Some(notice) = self.selected() {
          return ViewAction::Push(Box::new(NoticeDetailView::new(
            notice.id,
            self.board.clone(),
          )));
        }
      }
      KeyCode::Char('f') => {
        if let Some(notice) = self.selected() {
          return ViewAction::Status(self.actions.feature(&notice));
        }
      }
      KeyCode::Char('d') => {
        if let Some(notice) = self.selected() {
          return ViewAction::Status(self.actions.request_delete(&notice));
        }
      }
      KeyCode::Esc if !self.filter.is_empty() => {
        self.filter.clear();
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_list(frame, area);
    self.search.render_overlay(frame, area);
    self.picker.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    match self.department {
      Some(dept) => format!("Notices [{}]", dept.label()),
      None => "Notices".to_string(),
    }
  }

  fn department(&self) -> Option<Department> {
    self.department
  }

  fn is_capturing_input(&self) -> bool {
    self.search.is_active() || self.picker.is_active() || self.actions.is_confirming()
  }

  fn tick(&mut self) -> Option<StatusMessage> {
    let refreshed = self.refresh.tick();
    self.actions.tick().or(refreshed)
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("/", "search").with_priority(20),
      ShortcutInfo::new("D", "department").with_priority(30),
      ShortcutInfo::new("f", "feature").with_priority(40),
      ShortcutInfo::new("d", "delete").with_priority(50),
      ShortcutInfo::new("r", "refresh").with_priority(60),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
