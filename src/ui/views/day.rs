use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use tokio::sync::broadcast;

use super::{apply_editor_event, drain_changes, notes_query, subscribe, NotesQuery};
use crate::cache::CacheChange;
use crate::dates;
use crate::notes::Note;
use crate::ui::components::{KeyResult, NoteEditor};
use crate::ui::context::Context;
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{note_color, truncate};
use crate::ui::view::{Shortcut, View, ViewAction};

/// Notes of a single day as a selectable list
pub struct DayView {
  ctx: Context,
  date: NaiveDate,
  query: NotesQuery,
  changes: Option<broadcast::Receiver<CacheChange>>,
  list_state: ListState,
  editor: NoteEditor,
}

impl DayView {
  pub fn new(ctx: Context, date: NaiveDate) -> Self {
    let mut query = notes_query(&ctx);
    query.set_key((date, date));
    let changes = subscribe(&ctx);
    Self {
      ctx,
      date,
      query,
      changes,
      list_state: ListState::default(),
      editor: NoteEditor::new(),
    }
  }

  pub fn date(&self) -> NaiveDate {
    self.date
  }

  fn set_date(&mut self, date: NaiveDate) {
    self.date = date;
    self.list_state.select(None);
    self.query.set_key((date, date));
  }

  fn notes(&self) -> &[Note] {
    self.query.data().map(|v| v.as_slice()).unwrap_or(&[])
  }

  fn selected_note(&self) -> Option<Note> {
    self
      .list_state
      .selected()
      .and_then(|i| self.notes().get(i))
      .cloned()
  }

  fn move_selected(&mut self, days: i64) {
    let Some(note) = self.selected_note() else {
      return;
    };
    let notes = self.ctx.notes.clone();
    let target = dates::add_days(note.date, days);
    self.ctx.spawn_mutation("Note moved", async move {
      notes.move_note(&note, target).await.map(|_| ())
    });
  }

  fn delete_selected(&mut self) {
    let Some(note) = self.selected_note() else {
      return;
    };
    let notes = self.ctx.notes.clone();
    self
      .ctx
      .spawn_mutation("Note deleted", async move { notes.delete_note(note.id).await });
  }

  fn list_title(&self) -> String {
    if self.query.is_loading() {
      format!(" {} (loading...) ", self.title())
    } else if let Some(e) = self.query.error() {
      format!(" {} (error: {}) ", self.title(), e)
    } else {
      format!(" {} ({}) ", self.title(), self.notes().len())
    }
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.notes().len();
    ensure_valid_selection(&mut self.list_state, len);

    let block = Block::default()
      .title(self.list_title())
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if len == 0 && !self.query.is_loading() {
      let content = if self.query.is_error() {
        "Failed to load notes. Press 'r' to retry."
      } else {
        "No notes. Press 'a' to add one."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let width = area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = self
      .notes()
      .iter()
      .enumerate()
      .map(|(i, note)| {
        ListItem::new(Line::styled(
          truncate(&note.content, width),
          Style::default().fg(note_color(i)),
        ))
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }
}

impl View for DayView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.editor.handle_key(key) {
      KeyResult::Event(event) => {
        apply_editor_event(&self.ctx, event);
        return ViewAction::None;
      }
      KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('a') => self.editor.open_new(self.date),
      KeyCode::Char('e') | KeyCode::Enter => {
        if let Some(note) = self.selected_note() {
          self.editor.open_existing(&note);
        }
      }
      KeyCode::Char('d') => self.delete_selected(),
      KeyCode::Char('H') => self.move_selected(-1),
      KeyCode::Char('L') => self.move_selected(1),
      KeyCode::Char('[') => self.set_date(dates::add_days(self.date, -1)),
      KeyCode::Char(']') => self.set_date(dates::add_days(self.date, 1)),
      KeyCode::Char('r') => self.query.refetch(),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_list(frame, area);
    self.editor.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    dates::format_ymd(self.date)
  }

  fn title(&self) -> String {
    self.date.format("%A, %B %-d, %Y").to_string()
  }

  fn captures_input(&self) -> bool {
    self.editor.is_active()
  }

  fn tick(&mut self) {
    if drain_changes(&mut self.changes) {
      self.query.refetch();
    }
    self.query.poll();
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new("a", "add").with_priority(20),
      Shortcut::new("e", "edit").with_priority(30),
      Shortcut::new("d", "delete").with_priority(40),
      Shortcut::new("H/L", "move").with_priority(50),
      Shortcut::new("[/]", "prev/next day").with_priority(60),
      Shortcut::new("q", "back").with_priority(90),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ui::context::test_context;
  use crossterm::event::KeyModifiers;

  fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
  }

  fn press(view: &mut DayView, c: char) -> ViewAction {
    view.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
  }

  #[tokio::test]
  async fn test_title_and_breadcrumb() {
    let view = DayView::new(test_context(), d(3));
    assert_eq!(view.title(), "Wednesday, January 3, 2024");
    assert_eq!(view.breadcrumb_label(), "2024-01-03");
  }

  #[tokio::test]
  async fn test_brackets_change_day() {
    let mut view = DayView::new(test_context(), d(1));
    press(&mut view, '[');
    assert_eq!(view.date(), NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    press(&mut view, ']');
    press(&mut view, ']');
    assert_eq!(view.date(), d(2));
  }

  #[tokio::test]
  async fn test_edit_without_notes_does_nothing() {
    let mut view = DayView::new(test_context(), d(1));
    press(&mut view, 'e');
    assert!(!view.captures_input());

    press(&mut view, 'a');
    assert!(view.captures_input());
  }

  #[tokio::test]
  async fn test_failed_load_shows_error_in_title() {
    let mut view = DayView::new(test_context(), d(1));
    assert!(view.list_title().contains("loading"));

    for _ in 0..100 {
      view.tick();
      if view.query.is_error() {
        break;
      }
      tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert!(view.query.is_error());
    assert!(view.list_title().starts_with(" Monday, January 1, 2024 (error: "));
  }

  #[tokio::test]
  async fn test_q_pops() {
    let mut view = DayView::new(test_context(), d(1));
    assert!(matches!(press(&mut view, 'q'), ViewAction::Pop));
  }
}
