use crate::notice::types::Department;
use crate::ui::renderfns::StatusMessage;
use crossterm::event::KeyEvent;
use ratatui::prelude::*;

/// A keyboard shortcut hint for the header
#[derive(Debug, Clone)]
pub struct ShortcutInfo {
  pub key: &'static str,
  pub label: &'static str,
  /// Lower is shown first
  pub priority: u8,
}

impl ShortcutInfo {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self {
      key,
      label,
      priority: 100,
    }
  }

  pub const fn with_priority(mut self, priority: u8) -> Self {
    self.priority = priority;
    self
  }
}

/// What a view asks the App to do after a key press
pub enum ViewAction {
  None,
  /// Open a view on top of this one
  Push(Box<dyn View>),
  /// Close this view (go back)
  Pop,
  /// Show a message in the footer
  Status(StatusMessage),
}

/// A screen on the navigation stack.
///
/// Views read notices from the shared cache when rendering and run remote
/// work through `Query`/`Mutation`, draining results in `tick()`.
pub trait View {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

  fn render(&mut self, frame: &mut Frame, area: Rect);

  fn breadcrumb_label(&self) -> String;

  /// Department this view is scoped to, for the header
  fn department(&self) -> Option<Department> {
    None
  }

  /// True while an input overlay owns the keyboard, so the App leaves
  /// `:` and `q` alone
  fn is_capturing_input(&self) -> bool {
    false
  }

  /// Poll background work; may report a message for the footer
  fn tick(&mut self) -> Option<StatusMessage> {
    None
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
