use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::notice::board::NoticeBoard;
use crate::notice::client::NoticeClient;
use crate::notice::types::Department;
use crate::ui;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::renderfns::{HeaderContext, StatusMessage};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::{CacheRefresh, DashboardView, NoticeListView};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Terminal UI state: a stack of views over one shared notice board
pub struct App {
  /// Navigation stack, root at index 0
  view_stack: Vec<Box<dyn View>>,
  command: CommandInput,
  status: Option<StatusMessage>,
  board: NoticeBoard<NoticeClient>,
  /// Backs the `:refresh` command
  refresh: CacheRefresh,
  config: Config,
  /// Signed-in admin, if a session was restored
  user: Option<String>,
  should_quit: bool,
}

impl App {
  /// Must be called inside the tokio runtime; views start loading at once.
  pub fn new(config: Config, client: NoticeClient, user: Option<String>) -> Self {
    let board = NoticeBoard::new(Arc::new(client));
    let refresh = CacheRefresh::new(&board);
    let root = Self::root_view(&board, config.default_department);

    Self {
      view_stack: vec![root],
      command: CommandInput::new(),
      status: None,
      board,
      refresh,
      config,
      user,
      should_quit: false,
    }
  }

  fn root_view(board: &NoticeBoard<NoticeClient>, department: Option<Department>) -> Box<dyn View> {
    match department {
      Some(dept) => Box::new(NoticeListView::new(board.clone(), Some(dept))),
      None => Box::new(DashboardView::new(board.clone())),
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;

    let result = self.event_loop().await;

    // Restore the terminal even when the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    self.board.cache().clone().dispose();
    result
  }

  async fn event_loop(&mut self) -> Result<()> {
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    let mut events = EventHandler::new(Duration::from_millis(250));

    info!(url = %self.config.api.url, "notice board UI started");

    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(Event::Key(key)) => self.handle_key(key),
        Some(Event::Tick) => self.tick(),
        Some(Event::Resize) => {}
        None => break,
      }
    }

    Ok(())
  }

  /// Poll every view so writes finish even under a detail view
  fn tick(&mut self) {
    let mut latest = self.refresh.tick();
    for view in self.view_stack.iter_mut() {
      if let Some(message) = view.tick() {
        latest = Some(message);
      }
    }
    if let Some(message) = latest {
      self.status = Some(message);
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    let view_has_keyboard = self
      .view_stack
      .last()
      .is_some_and(|view| view.is_capturing_input());

    if !view_has_keyboard {
      match self.command.handle_key(key) {
        KeyResult::Handled => return,
        KeyResult::Event(CommandEvent::Submitted(cmd)) => {
          self.execute_command(&cmd);
          return;
        }
        KeyResult::Event(CommandEvent::Cancelled) => return,
        KeyResult::NotHandled => {}
      }
    }

    if let Some(view) = self.view_stack.last_mut() {
      let action = view.handle_key(key);
      self.apply(action);
    }
  }

  fn apply(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => self.view_stack.push(view),
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
      ViewAction::Status(message) => self.status = Some(message),
    }
  }

  fn execute_command(&mut self, cmd: &str) {
    match cmd {
      "dashboard" => self.reset_root(Box::new(DashboardView::new(self.board.clone()))),
      "notices" => self.reset_root(Box::new(NoticeListView::new(self.board.clone(), None))),
      "refresh" => self.status = Some(self.refresh.reload()),
      "quit" => self.should_quit = true,
      "" => {}
      other => self.status = Some(StatusMessage::Error(format!("Unknown command: {}", other))),
    }
  }

  fn reset_root(&mut self, view: Box<dyn View>) {
    self.view_stack.clear();
    self.view_stack.push(view);
  }

  // Accessors for rendering

  pub fn current_view_mut(&mut self) -> Option<&mut Box<dyn View>> {
    self.view_stack.last_mut()
  }

  pub fn command_input(&self) -> &CommandInput {
    &self.command
  }

  pub fn status(&self) -> Option<&StatusMessage> {
    self.status.as_ref()
  }

  pub fn breadcrumb(&self) -> Vec<String> {
    self.view_stack.iter().map(|v| v.breadcrumb_label()).collect()
  }

  pub fn shortcuts(&self) -> Vec<ShortcutInfo> {
    self
      .view_stack
      .last()
      .map(|v| v.shortcuts())
      .unwrap_or_default()
  }

  pub fn header_context(&self) -> HeaderContext<'_> {
    let signed_in = self.board.store().is_authenticated();
    HeaderContext {
      title: self.config.title(),
      api_url: &self.config.api.url,
      department: self.view_stack.last().and_then(|v| v.department()),
      user: self.user.as_deref().filter(|_| signed_in),
    }
  }
}
