use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::ymd;

/// Server-assigned note identifier
pub type NoteId = i64;

/// Server-assigned guest identifier; notes are scoped to a guest
pub type GuestId = i64;

/// A free-text note attached to a calendar date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
  pub id: NoteId,
  #[serde(with = "ymd")]
  pub date: NaiveDate,
  pub content: String,
}

impl Note {
  pub fn new(id: NoteId, date: NaiveDate, content: impl Into<String>) -> Self {
    Self {
      id,
      date,
      content: content.into(),
    }
  }

  /// Whether the note's date lies in `[start, end]`, inclusive on both ends
  pub fn is_within(&self, start: NaiveDate, end: NaiveDate) -> bool {
    start <= self.date && self.date <= end
  }
}

/// Guest account owning a set of notes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guest {
  pub id: GuestId,
}
