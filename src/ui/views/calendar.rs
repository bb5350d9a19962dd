use chrono::{Datelike, NaiveDate};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use tokio::sync::broadcast;

use super::{apply_editor_event, drain_changes, notes_query, subscribe, DayView, NotesQuery};
use crate::cache::CacheChange;
use crate::config::StartView;
use crate::dates::{self, GRID_WEEKS, WEEKDAY_ABBREVIATIONS};
use crate::notes::Note;
use crate::query::QueryState;
use crate::ui::components::{KeyResult, NoteEditor};
use crate::ui::context::Context;
use crate::ui::renderfns::{note_color, truncate};
use crate::ui::view::{Shortcut, View, ViewAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarMode {
  Month,
  Week,
}

impl From<StartView> for CalendarMode {
  fn from(view: StartView) -> Self {
    match view {
      StartView::Month => CalendarMode::Month,
      StartView::Week => CalendarMode::Week,
    }
  }
}

/// Month grid or single week, with notes listed in each day cell.
///
/// The selected day drives everything: the visible period is the one that
/// contains it, and the query key is that period's date range.
pub struct CalendarView {
  ctx: Context,
  mode: CalendarMode,
  selected: NaiveDate,
  today: NaiveDate,
  query: NotesQuery,
  changes: Option<broadcast::Receiver<CacheChange>>,
  editor: NoteEditor,
}

impl CalendarView {
  pub fn new(ctx: Context, mode: CalendarMode, today: NaiveDate) -> Self {
    let query = notes_query(&ctx);
    let changes = subscribe(&ctx);
    let mut view = Self {
      ctx,
      mode,
      selected: today,
      today,
      query,
      changes,
      editor: NoteEditor::new(),
    };
    view.sync_query();
    view
  }

  /// Inclusive date range currently on screen
  pub fn visible_range(&self) -> (NaiveDate, NaiveDate) {
    match self.mode {
      CalendarMode::Month => dates::month_grid(self.selected),
      CalendarMode::Week => dates::week_bounds(self.selected),
    }
  }

  pub fn selected(&self) -> NaiveDate {
    self.selected
  }

  pub fn mode(&self) -> CalendarMode {
    self.mode
  }

  fn sync_query(&mut self) {
    self.query.set_key(self.visible_range());
  }

  fn select(&mut self, date: NaiveDate) {
    self.selected = date;
    self.sync_query();
  }

  fn set_mode(&mut self, mode: CalendarMode) {
    self.mode = mode;
    self.sync_query();
  }

  fn move_selection(&mut self, days: i64) {
    self.select(dates::add_days(self.selected, days));
  }

  fn shift_period(&mut self, steps: i32) {
    let date = match self.mode {
      CalendarMode::Month => dates::add_months(self.selected, steps),
      CalendarMode::Week => dates::add_days(self.selected, 7 * steps as i64),
    };
    self.select(date);
  }

  fn notes(&self) -> &[Note] {
    self.query.data().map(|v| v.as_slice()).unwrap_or(&[])
  }

  fn notes_on(&self, date: NaiveDate) -> Vec<&Note> {
    self.notes().iter().filter(|n| n.date == date).collect()
  }

  fn frame_block(&self) -> Block<'static> {
    let title = match self.query.state() {
      QueryState::Loading => format!(" {} (loading...) ", self.title()),
      QueryState::Error(e) => format!(" {} (error: {}) ", self.title(), e),
      _ if self.query.is_fetching() => format!(" {} (refreshing...) ", self.title()),
      _ => format!(" {} ", self.title()),
    };
    Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue))
  }

  fn render_month(&self, frame: &mut Frame, area: Rect) {
    let block = self.frame_block();
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut rows = vec![Constraint::Length(1)];
    rows.extend((0..GRID_WEEKS).map(|_| Constraint::Fill(1)));
    let rows = Layout::vertical(rows).split(inner);

    let header = Layout::horizontal([Constraint::Ratio(1, 7); 7]).split(rows[0]);
    for (name, cell) in WEEKDAY_ABBREVIATIONS.iter().zip(header.iter()) {
      frame.render_widget(
        Paragraph::new(*name)
          .alignment(Alignment::Center)
          .style(Style::default().fg(Color::Cyan).bold()),
        *cell,
      );
    }

    let (start, _) = dates::month_grid(self.selected);
    let month = self.selected.month();
    for (week, row) in rows[1..].iter().enumerate() {
      let cells = Layout::horizontal([Constraint::Ratio(1, 7); 7]).split(*row);
      for (col, cell) in cells.iter().enumerate() {
        let date = dates::add_days(start, (week * 7 + col) as i64);
        let label = date.day().to_string();
        self.render_day_cell(frame, *cell, date, label, date.month() != month, col);
      }
    }
  }

  fn render_week(&self, frame: &mut Frame, area: Rect) {
    let block = self.frame_block();
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let (start, _) = dates::week_bounds(self.selected);
    let cells = Layout::horizontal([Constraint::Ratio(1, 7); 7]).split(inner);
    for (col, cell) in cells.iter().enumerate() {
      let date = dates::add_days(start, col as i64);
      let label = format!("{} {}", WEEKDAY_ABBREVIATIONS[col], date.day());
      self.render_day_cell(frame, *cell, date, label, false, col);
    }
  }

  fn render_day_cell(
    &self,
    frame: &mut Frame,
    area: Rect,
    date: NaiveDate,
    label: String,
    dimmed: bool,
    color_offset: usize,
  ) {
    let mut label_style = if dimmed {
      Style::default().fg(Color::DarkGray)
    } else {
      Style::default().fg(Color::White)
    };
    if date == self.today {
      label_style = label_style.bold().underlined();
    }
    let border_style = if date == self.selected {
      Style::default().fg(Color::Yellow)
    } else {
      Style::default().fg(Color::DarkGray)
    };

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(border_style)
      .title(Span::styled(format!(" {} ", label), label_style));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let notes = self.notes_on(date);
    let capacity = inner.height as usize;
    let width = inner.width as usize;
    let overflow = notes.len() > capacity;
    let shown = if overflow {
      capacity.saturating_sub(1)
    } else {
      notes.len()
    };

    let mut lines: Vec<Line> = notes
      .iter()
      .take(shown)
      .enumerate()
      .map(|(i, note)| {
        let color = if dimmed {
          Color::DarkGray
        } else {
          note_color(i + color_offset)
        };
        Line::styled(truncate(&note.content, width), Style::default().fg(color))
      })
      .collect();
    if overflow && capacity > 0 {
      lines.push(Line::styled("...", Style::default().fg(Color::DarkGray)));
    }
    frame.render_widget(Paragraph::new(lines), inner);
  }
}

impl View for CalendarView {
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
      KeyCode::Char('h') | KeyCode::Left => self.move_selection(-1),
      KeyCode::Char('l') | KeyCode::Right => self.move_selection(1),
      KeyCode::Char('k') | KeyCode::Up => self.move_selection(-7),
      KeyCode::Char('j') | KeyCode::Down => self.move_selection(7),
      KeyCode::Char('[') => self.shift_period(-1),
      KeyCode::Char(']') => self.shift_period(1),
      KeyCode::Char('t') => self.select(self.today),
      KeyCode::Char('m') => self.set_mode(CalendarMode::Month),
      KeyCode::Char('w') => self.set_mode(CalendarMode::Week),
      KeyCode::Char('a') => self.editor.open_new(self.selected),
      KeyCode::Char('r') => self.query.refetch(),
      KeyCode::Enter => {
        return ViewAction::Push(Box::new(DayView::new(self.ctx.clone(), self.selected)));
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    match self.mode {
      CalendarMode::Month => self.render_month(frame, area),
      CalendarMode::Week => self.render_week(frame, area),
    }
    self.editor.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    match self.mode {
      CalendarMode::Month => "Month".to_string(),
      CalendarMode::Week => "Week".to_string(),
    }
  }

  fn title(&self) -> String {
    match self.mode {
      CalendarMode::Month => dates::month_title(self.selected),
      CalendarMode::Week => dates::week_title(self.selected),
    }
  }

  fn captures_input(&self) -> bool {
    self.editor.is_active()
  }

  fn run_command(&mut self, command: &str) -> bool {
    match command {
      "month" => self.set_mode(CalendarMode::Month),
      "week" => self.set_mode(CalendarMode::Week),
      "today" => self.select(self.today),
      _ => return false,
    }
    true
  }

  fn tick(&mut self) {
    let today = dates::today();
    if today != self.today {
      self.today = today;
    }
    if drain_changes(&mut self.changes) {
      self.query.refetch();
    }
    self.query.poll();
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    let other_mode = match self.mode {
      CalendarMode::Month => Shortcut::new("w", "week"),
      CalendarMode::Week => Shortcut::new("m", "month"),
    };
    vec![
      Shortcut::new(":", "command").with_priority(10),
      Shortcut::new("[/]", "prev/next").with_priority(20),
      Shortcut::new("a", "add").with_priority(30),
      Shortcut::new("Enter", "day").with_priority(40),
      other_mode.with_priority(50),
      Shortcut::new("t", "today").with_priority(60),
      Shortcut::new("q", "quit").with_priority(90),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ui::context::test_context;
  use crossterm::event::KeyModifiers;

  fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
  }

  fn press(view: &mut CalendarView, c: char) {
    view.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
  }

  #[tokio::test]
  async fn test_month_range_follows_selection() {
    let mut view = CalendarView::new(test_context(), CalendarMode::Month, d(2024, 1, 17));
    assert_eq!(view.visible_range(), (d(2023, 12, 31), d(2024, 2, 3)));

    press(&mut view, ']');
    assert_eq!(view.selected(), d(2024, 2, 1));
    assert_eq!(view.title(), "February 2024");

    press(&mut view, '[');
    press(&mut view, '[');
    assert_eq!(view.selected(), d(2023, 12, 1));
  }

  #[tokio::test]
  async fn test_week_mode_steps_by_seven_days() {
    let mut view = CalendarView::new(test_context(), CalendarMode::Week, d(2024, 1, 3));
    assert_eq!(view.visible_range(), (d(2023, 12, 31), d(2024, 1, 6)));

    press(&mut view, ']');
    assert_eq!(view.visible_range(), (d(2024, 1, 7), d(2024, 1, 13)));
  }

  #[tokio::test]
  async fn test_selection_moves_by_day_and_week() {
    let mut view = CalendarView::new(test_context(), CalendarMode::Month, d(2024, 1, 31));
    press(&mut view, 'l');
    assert_eq!(view.selected(), d(2024, 2, 1));
    assert_eq!(view.title(), "February 2024");
    press(&mut view, 'k');
    assert_eq!(view.selected(), d(2024, 1, 25));
  }

  #[tokio::test]
  async fn test_commands_switch_mode_and_jump() {
    let mut view = CalendarView::new(test_context(), CalendarMode::Month, d(2024, 1, 17));
    assert!(view.run_command("week"));
    assert_eq!(view.mode(), CalendarMode::Week);

    press(&mut view, ']');
    assert!(view.run_command("today"));
    assert_eq!(view.selected(), d(2024, 1, 17));
    assert!(!view.run_command("bogus"));
  }

  #[tokio::test]
  async fn test_editor_captures_input() {
    let mut view = CalendarView::new(test_context(), CalendarMode::Month, d(2024, 1, 17));
    press(&mut view, 'a');
    assert!(view.captures_input());

    // typed into the editor, not treated as navigation
    press(&mut view, 'l');
    assert_eq!(view.selected(), d(2024, 1, 17));

    view.handle_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
    assert!(!view.captures_input());
  }

  #[test]
  fn test_start_view_maps_to_mode() {
    assert_eq!(CalendarMode::from(StartView::Week), CalendarMode::Week);
    assert_eq!(CalendarMode::from(StartView::Month), CalendarMode::Month);
  }
}
