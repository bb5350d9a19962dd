use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::dates::{format_ymd, parse_ymd};
use crate::notes::{Note, NoteId};
use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// A note as edited, not yet saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
  /// `None` for a note that does not exist yet
  pub id: Option<NoteId>,
  pub date: NaiveDate,
  pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
  Save(NoteDraft),
  Delete(NoteId),
  Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Field {
  Date,
  #[default]
  Content,
}

/// Modal editor for a single note: a date field and a content field.
///
/// Saving is only possible once the date or content differs from what the
/// editor was opened with.
#[derive(Debug, Clone, Default)]
pub struct NoteEditor {
  active: bool,
  id: Option<NoteId>,
  initial_date: Option<NaiveDate>,
  initial_content: String,
  date: TextInput,
  content: TextInput,
  focus: Field,
  error: Option<String>,
}

impl NoteEditor {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  pub fn open_new(&mut self, date: NaiveDate) {
    self.open(None, date, "");
  }

  pub fn open_existing(&mut self, note: &Note) {
    self.open(Some(note.id), note.date, &note.content);
  }

  fn open(&mut self, id: Option<NoteId>, date: NaiveDate, content: &str) {
    *self = Self {
      active: true,
      id,
      initial_date: Some(date),
      initial_content: content.to_string(),
      date: TextInput::with_value(&format_ymd(date)),
      content: TextInput::with_value(content),
      focus: Field::Content,
      error: None,
    };
  }

  fn close(&mut self) {
    *self = Self::default();
  }

  fn parsed_date(&self) -> Option<NaiveDate> {
    parse_ymd(self.date.value()).ok()
  }

  /// Whether the draft differs from the note the editor was opened with
  pub fn is_changed(&self) -> bool {
    self.content.value() != self.initial_content || self.parsed_date() != self.initial_date
  }

  fn focused_input(&mut self) -> &mut TextInput {
    match self.focus {
      Field::Date => &mut self.date,
      Field::Content => &mut self.content,
    }
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<EditorEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Esc => {
        self.close();
        return KeyResult::Event(EditorEvent::Cancelled);
      }
      KeyCode::Tab | KeyCode::BackTab => {
        self.focus = match self.focus {
          Field::Date => Field::Content,
          Field::Content => Field::Date,
        };
        return KeyResult::Handled;
      }
      KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        return match self.id {
          Some(id) => {
            self.close();
            KeyResult::Event(EditorEvent::Delete(id))
          }
          None => KeyResult::Handled,
        };
      }
      KeyCode::Enter => return self.submit(),
      _ => {}
    }

    let result = self.focused_input().handle_key(key);
    if result == InputResult::Consumed {
      self.error = None;
    }
    KeyResult::Handled
  }

  fn submit(&mut self) -> KeyResult<EditorEvent> {
    let Some(date) = self.parsed_date() else {
      self.error = Some("Date must be YYYY-MM-DD".to_string());
      self.focus = Field::Date;
      return KeyResult::Handled;
    };
    if !self.is_changed() {
      return KeyResult::Handled;
    }

    let draft = NoteDraft {
      id: self.id,
      date,
      content: self.content.value().to_string(),
    };
    self.close();
    KeyResult::Event(EditorEvent::Save(draft))
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let width = (area.width * 60 / 100).clamp(40, 80).min(area.width);
    let height = 8.min(area.height);
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    let overlay_area = Rect::new(x, y, width, height).intersection(area);

    frame.render_widget(Clear, overlay_area);

    let title = if self.id.is_some() {
      " Edit note "
    } else {
      " New note "
    };
    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(title);
    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    let save_style = if self.is_changed() {
      Style::default().fg(Color::Green)
    } else {
      Style::default().fg(Color::DarkGray)
    };
    let mut hints = vec![
      Span::styled("<Enter>", save_style),
      Span::styled(" save  ", Style::default().fg(Color::DarkGray)),
      Span::styled("<Tab>", Style::default().fg(Color::Cyan)),
      Span::styled(" field  ", Style::default().fg(Color::DarkGray)),
      Span::styled("<Esc>", Style::default().fg(Color::Cyan)),
      Span::styled(" cancel", Style::default().fg(Color::DarkGray)),
    ];
    if self.id.is_some() {
      hints.push(Span::styled("  <C-d>", Style::default().fg(Color::Red)));
      hints.push(Span::styled(" delete", Style::default().fg(Color::DarkGray)));
    }

    let lines = vec![
      self.field_line("Date", &self.date, Field::Date),
      Line::raw(""),
      self.field_line("Note", &self.content, Field::Content),
      Line::raw(""),
      match &self.error {
        Some(error) => Line::styled(error.as_str(), Style::default().fg(Color::Red)),
        None => Line::raw(""),
      },
      Line::from(hints),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
  }

  fn field_line<'a>(&self, label: &'a str, input: &'a TextInput, field: Field) -> Line<'a> {
    let focused = self.focus == field;
    let label_style = if focused {
      Style::default().fg(Color::Yellow).bold()
    } else {
      Style::default().fg(Color::DarkGray)
    };

    let mut spans = vec![Span::styled(format!("{:<6}", label), label_style)];
    if focused {
      let (before, after) = input.split_at_cursor();
      spans.push(Span::raw(before));
      spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
      spans.push(Span::raw(after));
    } else {
      spans.push(Span::raw(input.value()));
    }
    Line::from(spans)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
  }

  fn type_str(editor: &mut NoteEditor, s: &str) {
    for c in s.chars() {
      editor.handle_key(key(KeyCode::Char(c)));
    }
  }

  #[test]
  fn test_new_note_saves_draft() {
    let mut editor = NoteEditor::new();
    editor.open_new(day(5));
    type_str(&mut editor, "lunch");

    assert_eq!(
      editor.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(EditorEvent::Save(NoteDraft {
        id: None,
        date: day(5),
        content: "lunch".to_string(),
      }))
    );
    assert!(!editor.is_active());
  }

  #[test]
  fn test_unchanged_note_cannot_be_saved() {
    let mut editor = NoteEditor::new();
    editor.open_existing(&Note::new(3, day(5), "lunch"));

    assert!(!editor.is_changed());
    assert_eq!(editor.handle_key(key(KeyCode::Enter)), KeyResult::Handled);
    assert!(editor.is_active());
  }

  #[test]
  fn test_reverting_an_edit_is_unchanged() {
    let mut editor = NoteEditor::new();
    editor.open_existing(&Note::new(3, day(5), "lunch"));
    type_str(&mut editor, "!");
    assert!(editor.is_changed());
    editor.handle_key(key(KeyCode::Backspace));
    assert!(!editor.is_changed());
  }

  #[test]
  fn test_date_change_saves_existing_id() {
    let mut editor = NoteEditor::new();
    editor.open_existing(&Note::new(3, day(5), "lunch"));
    editor.handle_key(key(KeyCode::Tab));
    editor.handle_key(key(KeyCode::Backspace));
    type_str(&mut editor, "9");

    assert_eq!(
      editor.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(EditorEvent::Save(NoteDraft {
        id: Some(3),
        date: day(9),
        content: "lunch".to_string(),
      }))
    );
  }

  #[test]
  fn test_invalid_date_blocks_save() {
    let mut editor = NoteEditor::new();
    editor.open_new(day(5));
    type_str(&mut editor, "x");
    editor.handle_key(key(KeyCode::Tab));
    type_str(&mut editor, "z");

    assert_eq!(editor.handle_key(key(KeyCode::Enter)), KeyResult::Handled);
    assert!(editor.is_active());
  }

  #[test]
  fn test_delete_only_for_existing_notes() {
    let ctrl_d = KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL);

    let mut editor = NoteEditor::new();
    editor.open_new(day(5));
    assert_eq!(editor.handle_key(ctrl_d), KeyResult::Handled);

    editor.open_existing(&Note::new(8, day(5), "x"));
    assert_eq!(
      editor.handle_key(ctrl_d),
      KeyResult::Event(EditorEvent::Delete(8))
    );
  }

  #[test]
  fn test_escape_cancels() {
    let mut editor = NoteEditor::new();
    editor.open_new(day(5));
    assert_eq!(
      editor.handle_key(key(KeyCode::Esc)),
      KeyResult::Event(EditorEvent::Cancelled)
    );
    assert!(!editor.is_active());
  }

  #[test]
  fn test_inactive_editor_passes_keys() {
    let mut editor = NoteEditor::new();
    assert_eq!(editor.handle_key(key(KeyCode::Enter)), KeyResult::NotHandled);
  }
}
