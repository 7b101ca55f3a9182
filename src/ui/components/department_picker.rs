use super::KeyResult;
use crate::notice::types::Department;
use crate::ui::renderfns::department_color;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepartmentPickerEvent {
  /// `None` means every department
  Selected(Option<Department>),
  Cancelled,
}

/// Centered overlay to choose the department the list is filtered to
#[derive(Debug, Clone, Default)]
pub struct DepartmentPicker {
  active: bool,
  selected: usize,
}

impl DepartmentPicker {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Open with the cursor on `current`
  pub fn show(&mut self, current: Option<Department>) {
    self.active = true;
    self.selected = current
      .and_then(|d| Department::concrete().position(|c| c == d))
      .map(|i| i + 1)
      .unwrap_or(0);
  }

  /// First row is "every department", then the concrete ones
  fn entries() -> impl Iterator<Item = Option<Department>> {
    std::iter::once(None).chain(Department::concrete().map(Some))
  }

  fn len() -> usize {
    Self::entries().count()
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<DepartmentPickerEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Esc | KeyCode::Char('q') => {
        self.active = false;
        KeyResult::Event(DepartmentPickerEvent::Cancelled)
      }
      KeyCode::Enter => {
        self.active = false;
        let choice = Self::entries().nth(self.selected).flatten();
        KeyResult::Event(DepartmentPickerEvent::Selected(choice))
      }
      KeyCode::Char('j') | KeyCode::Down => {
        self.selected = (self.selected + 1) % Self::len();
        KeyResult::Handled
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.selected = (self.selected + Self::len() - 1) % Self::len();
        KeyResult::Handled
      }
      _ => KeyResult::Handled,
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let width = 28.min(area.width);
    let height = (Self::len() as u16 + 2).min(area.height);
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    let overlay_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(" Department ");

    let items: Vec<ListItem> = Self::entries()
      .map(|entry| match entry {
        Some(dept) => ListItem::new(Span::styled(
          dept.label(),
          Style::default().fg(department_color(dept)),
        )),
        None => ListItem::new(Span::styled(
          "Every department",
          Style::default().fg(Color::White),
        )),
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));

    let mut state = ListState::default();
    state.select(Some(self.selected));

    frame.render_stateful_widget(list, overlay_area, &mut state);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn test_enter_on_first_row_clears_filter() {
    let mut picker = DepartmentPicker::new();
    picker.show(None);
    assert_eq!(
      picker.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(DepartmentPickerEvent::Selected(None))
    );
    assert!(!picker.is_active());
  }

  #[test]
  fn test_opens_on_current_department() {
    let mut picker = DepartmentPicker::new();
    let second = Department::concrete().nth(1).unwrap();
    picker.show(Some(second));
    assert_eq!(
      picker.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(DepartmentPickerEvent::Selected(Some(second)))
    );
  }

  #[test]
  fn test_up_from_top_wraps_to_last() {
    let mut picker = DepartmentPicker::new();
    picker.show(None);
    picker.handle_key(key(KeyCode::Up));
    let last = Department::concrete().last();
    assert_eq!(
      picker.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(DepartmentPickerEvent::Selected(last))
    );
  }

  #[test]
  fn test_inactive_passes_keys_through() {
    let mut picker = DepartmentPicker::new();
    assert_eq!(picker.handle_key(key(KeyCode::Enter)), KeyResult::NotHandled);
  }
}
