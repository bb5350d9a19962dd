mod calendar;
mod day;

pub use calendar::{CalendarMode, CalendarView};
pub use day::DayView;

use chrono::NaiveDate;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{debug, warn};

use crate::cache::CacheChange;
use crate::notes::Note;
use crate::query::Query;
use crate::ui::components::{EditorEvent, NoteDraft};
use crate::ui::context::Context;

/// Notes for an inclusive date range
type NotesQuery = Query<(NaiveDate, NaiveDate), Vec<Note>>;

fn notes_query(ctx: &Context) -> NotesQuery {
  let notes = ctx.notes.clone();
  Query::new(move |(start, end)| {
    let notes = notes.clone();
    async move {
      notes
        .notes_in_range(start, end)
        .await
        .map_err(|e| e.to_string())
    }
  })
}

fn subscribe(ctx: &Context) -> Option<broadcast::Receiver<CacheChange>> {
  match ctx.notes.subscribe() {
    Ok(rx) => Some(rx),
    Err(e) => {
      warn!("Could not subscribe to note changes: {}", e);
      None
    }
  }
}

/// Drain pending cache changes. Returns true if any of them touched notes,
/// or if some were missed and the view can no longer tell.
fn drain_changes(changes: &mut Option<broadcast::Receiver<CacheChange>>) -> bool {
  let Some(rx) = changes else {
    return false;
  };
  let mut mutated = false;
  loop {
    match rx.try_recv() {
      Ok(change) => mutated |= change.is_mutation(),
      Err(TryRecvError::Lagged(skipped)) => {
        debug!(skipped, "missed cache changes");
        mutated = true;
      }
      Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return mutated,
    }
  }
}

/// Send a finished editor session to the note store
fn apply_editor_event(ctx: &Context, event: EditorEvent) {
  let notes = ctx.notes.clone();
  match event {
    EditorEvent::Save(NoteDraft {
      id: None,
      date,
      content,
    }) => ctx.spawn_mutation("Note added", async move {
      notes.add_note(date, &content).await.map(|_| ())
    }),
    EditorEvent::Save(NoteDraft {
      id: Some(id),
      date,
      content,
    }) => ctx.spawn_mutation("Note saved", async move {
      notes.update_note(&Note::new(id, date, content)).await
    }),
    EditorEvent::Delete(id) => {
      ctx.spawn_mutation("Note deleted", async move { notes.delete_note(id).await })
    }
    EditorEvent::Cancelled => {}
  }
}
