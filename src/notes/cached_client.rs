//! Note client that answers range reads from the range cache.

use chrono::NaiveDate;
use color_eyre::{eyre::eyre, Result};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::client::NotesClient;
use super::remote::NoteRemote;
use super::types::{GuestId, Note, NoteId};
use crate::cache::{CacheChange, CachedRange, RangeCache};

/// Note client with a session-long range cache.
///
/// Reads are served from the cache when a single cached range covers the
/// request. Writes go to the remote store first; the cache only sees a
/// mutation after the store acknowledged it. A failed call leaves the cache
/// untouched.
pub struct CachedNotesClient<R: NoteRemote = NotesClient> {
  remote: R,
  guest_id: GuestId,
  cache: Arc<Mutex<RangeCache>>,
}

impl<R: NoteRemote> Clone for CachedNotesClient<R> {
  fn clone(&self) -> Self {
    Self {
      remote: self.remote.clone(),
      guest_id: self.guest_id,
      cache: Arc::clone(&self.cache),
    }
  }
}

impl<R: NoteRemote> CachedNotesClient<R> {
  pub fn new(remote: R, guest_id: GuestId) -> Self {
    Self {
      remote,
      guest_id,
      cache: Arc::new(Mutex::new(RangeCache::new())),
    }
  }

  pub fn guest_id(&self) -> GuestId {
    self.guest_id
  }

  fn cache(&self) -> Result<MutexGuard<'_, RangeCache>> {
    self
      .cache
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))
  }

  /// Subscribe to cache changes caused by this client or any of its clones.
  pub fn subscribe(&self) -> Result<broadcast::Receiver<CacheChange>> {
    Ok(self.cache()?.subscribe())
  }

  /// Notes dated within `[start, end]`.
  ///
  /// On a cache miss the whole interval is fetched and recorded.
  pub async fn notes_in_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Note>> {
    let cached = self.cache()?.lookup(start, end);
    if let Some(notes) = cached {
      debug!(%start, %end, count = notes.len(), "cache hit");
      return Ok(notes);
    }

    debug!(%start, %end, "cache miss");
    let notes = self
      .remote
      .fetch_notes(self.guest_id, start, end)
      .await
      .inspect_err(|e| warn!(%start, %end, "fetch failed: {}", e))?;

    self
      .cache()?
      .insert(CachedRange::new(start, end, notes.clone()));
    Ok(notes)
  }

  /// Create a note on `date` and return it with its assigned id.
  pub async fn add_note(&self, date: NaiveDate, content: &str) -> Result<Note> {
    let id = self
      .remote
      .create_note(self.guest_id, date, content)
      .await?;

    let note = Note::new(id, date, content);
    self.cache()?.apply_create(note.clone());
    Ok(note)
  }

  /// Store a new date and content for an existing note.
  pub async fn update_note(&self, note: &Note) -> Result<()> {
    self.remote.update_note(note).await?;
    self.cache()?.apply_update(note);
    Ok(())
  }

  /// Move a note to another date, keeping its content.
  pub async fn move_note(&self, note: &Note, date: NaiveDate) -> Result<Note> {
    let moved = Note {
      date,
      ..note.clone()
    };
    self.update_note(&moved).await?;
    Ok(moved)
  }

  pub async fn delete_note(&self, id: NoteId) -> Result<()> {
    self.remote.delete_note(id).await?;
    self.cache()?.apply_delete(id);
    Ok(())
  }
}
