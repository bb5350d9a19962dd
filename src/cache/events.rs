//! Change notifications published by the range cache.

use chrono::NaiveDate;

use crate::notes::NoteId;

/// A state change in the range cache.
///
/// Sent after every hook call, including ones that turned out to be no-ops,
/// so observers can simply re-read through the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheChange {
  /// A fetched range was merged; bounds are those of the resulting entry
  Inserted { start: NaiveDate, end: NaiveDate },
  /// A newly created note was offered to the cache
  Created { id: NoteId, date: NaiveDate },
  /// A note's date or content changed
  Updated { id: NoteId, date: NaiveDate },
  /// A note was removed
  Deleted { id: NoteId },
}

impl CacheChange {
  /// Whether the change altered note contents rather than fetched coverage.
  /// Inserts only record data the store already returned.
  pub fn is_mutation(&self) -> bool {
    !matches!(self, CacheChange::Inserted { .. })
  }
}
