use chrono::NaiveDate;
use color_eyre::Result;
use std::future::Future;

use super::types::{GuestId, Note, NoteId};

/// Operations the remote note store offers.
///
/// Implemented over HTTP by `NotesClient`; tests substitute an in-memory store.
pub trait NoteRemote: Clone + Send + Sync + 'static {
  /// Notes of `guest_id` dated within `[start, end]`, inclusive on both ends
  fn fetch_notes(
    &self,
    guest_id: GuestId,
    start: NaiveDate,
    end: NaiveDate,
  ) -> impl Future<Output = Result<Vec<Note>>> + Send;

  /// Create a note and return its server-assigned id
  fn create_note(
    &self,
    guest_id: GuestId,
    date: NaiveDate,
    content: &str,
  ) -> impl Future<Output = Result<NoteId>> + Send;

  fn update_note(&self, note: &Note) -> impl Future<Output = Result<()>> + Send;

  fn delete_note(&self, id: NoteId) -> impl Future<Output = Result<()>> + Send;

  /// Register a new guest
  fn create_guest(&self) -> impl Future<Output = Result<GuestId>> + Send;
}
