use crate::config::{save_guest, Config};
use crate::dates;
use crate::event::{Event, EventHandler};
use crate::notes::{CachedNotesClient, NoteRemote, NotesClient};
use crate::ui;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::context::{Context, Status};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::CalendarView;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Main application state
pub struct App {
  /// Navigation stack - root calendar is always at index 0
  view_stack: Vec<Box<dyn View>>,

  command_input: CommandInput,

  status_rx: mpsc::UnboundedReceiver<Status>,

  /// Latest footer message, cleared on the next key press
  status: Option<Status>,

  server_url: String,

  should_quit: bool,
}

impl App {
  pub async fn new(config: Config) -> Result<Self> {
    let remote = NotesClient::new(&config)?;

    let (guest_id, registered) = match config.guest_id {
      Some(id) => (id, false),
      None => (remote.create_guest().await?, true),
    };

    let (status_tx, status_rx) = mpsc::unbounded_channel();
    let ctx = Context::new(CachedNotesClient::new(remote, guest_id), status_tx);
    info!(guest_id = ctx.notes.guest_id(), server = %config.server.url, registered, "starting");
    if registered {
      match save_guest(guest_id) {
        Ok(_) => ctx.info(format!("Registered as guest {}", guest_id)),
        Err(e) => {
          warn!("Could not save guest {}: {}", guest_id, e);
          ctx.info(format!(
            "Registered as guest {0}; set guest_id: {0} in your config to keep these notes",
            guest_id
          ));
        }
      }
    }
    let root = CalendarView::new(ctx, config.start_view.into(), dates::today());

    Ok(Self {
      view_stack: vec![Box::new(root)],
      command_input: CommandInput::new(),
      status_rx,
      status: None,
      server_url: config.server.url.clone(),
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;

    let result = self.event_loop().await;

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(&mut self) -> Result<()> {
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    let mut events = EventHandler::new(Duration::from_millis(250));

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

  fn tick(&mut self) {
    // Views under the top one keep polling so they are fresh when revealed
    for view in &mut self.view_stack {
      view.tick();
    }
    while let Ok(status) = self.status_rx.try_recv() {
      self.status = Some(status);
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }
    self.status = None;

    let view_captures = self
      .current_view_mut()
      .is_some_and(|view| view.captures_input());
    if !view_captures {
      match self.command_input.handle_key(key) {
        KeyResult::Event(CommandEvent::Submitted(command)) => {
          self.execute_command(&command);
          return;
        }
        KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
        KeyResult::NotHandled => {}
      }
    }

    let action = match self.current_view_mut() {
      Some(view) => view.handle_key(key),
      None => ViewAction::None,
    };
    self.apply_action(action);
  }

  fn apply_action(&mut self, action: ViewAction) {
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
    }
  }

  /// Commands act on the root calendar; views above it are closed first
  fn execute_command(&mut self, command: &str) {
    if command.is_empty() {
      return;
    }
    if command == "quit" {
      self.should_quit = true;
      return;
    }

    self.view_stack.truncate(1);
    let handled = self
      .view_stack
      .first_mut()
      .is_some_and(|root| root.run_command(command));
    if !handled {
      self.status = Some(Status::Error(format!("Unknown command: {}", command)));
    }
  }

  pub fn current_view_mut(&mut self) -> Option<&mut Box<dyn View>> {
    self.view_stack.last_mut()
  }

  pub fn breadcrumb(&self) -> Vec<String> {
    self
      .view_stack
      .iter()
      .map(|view| view.breadcrumb_label())
      .collect()
  }

  pub fn server_url(&self) -> &str {
    &self.server_url
  }

  pub fn status(&self) -> Option<&Status> {
    self.status.as_ref()
  }

  pub fn command_input(&self) -> &CommandInput {
    &self.command_input
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ui::context::test_context;
  use crate::ui::views::{CalendarMode, DayView};

  fn test_app() -> App {
    let (_tx, status_rx) = mpsc::unbounded_channel();
    let today = chrono::NaiveDate::from_ymd_opt(2024, 1, 17).unwrap();
    App {
      view_stack: vec![Box::new(CalendarView::new(
        test_context(),
        CalendarMode::Month,
        today,
      ))],
      command_input: CommandInput::new(),
      status_rx,
      status: None,
      server_url: "http://127.0.0.1:9".to_string(),
      should_quit: false,
    }
  }

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn type_command(app: &mut App, command: &str) {
    app.handle_key(key(KeyCode::Char(':')));
    for c in command.chars() {
      app.handle_key(key(KeyCode::Char(c)));
    }
    app.handle_key(key(KeyCode::Enter));
  }

  #[tokio::test]
  async fn test_enter_pushes_day_and_q_pops() {
    let mut app = test_app();
    app.handle_key(key(KeyCode::Enter));
    assert_eq!(app.breadcrumb(), vec!["Month", "2024-01-17"]);

    app.handle_key(key(KeyCode::Char('q')));
    assert_eq!(app.breadcrumb(), vec!["Month"]);
    assert!(!app.should_quit);

    app.handle_key(key(KeyCode::Char('q')));
    assert!(app.should_quit);
  }

  #[tokio::test]
  async fn test_command_returns_to_root() {
    let mut app = test_app();
    let day = DayView::new(test_context(), chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    app.view_stack.push(Box::new(day));

    type_command(&mut app, "week");
    assert_eq!(app.breadcrumb(), vec!["Week"]);
  }

  #[tokio::test]
  async fn test_quit_command_and_ctrl_c() {
    let mut app = test_app();
    type_command(&mut app, "quit");
    assert!(app.should_quit);

    let mut app = test_app();
    app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert!(app.should_quit);
  }

  #[tokio::test]
  async fn test_colon_is_typed_while_editing() {
    let mut app = test_app();
    app.handle_key(key(KeyCode::Char('a')));
    app.handle_key(key(KeyCode::Char(':')));
    assert!(!app.command_input().is_active());
  }

  #[tokio::test]
  async fn test_status_messages_drain_on_tick() {
    let mut app = test_app();
    let (tx, rx) = mpsc::unbounded_channel();
    app.status_rx = rx;
    tx.send(Status::Info("Note added".to_string())).unwrap();

    app.tick();
    assert_eq!(app.status(), Some(&Status::Info("Note added".to_string())));

    app.handle_key(key(KeyCode::Char('l')));
    assert_eq!(app.status(), None);
  }
}
