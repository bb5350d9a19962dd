//! Cached date ranges and the note union used when merging them.

use chrono::NaiveDate;
use std::collections::HashSet;

use crate::notes::Note;

/// A fetched interval together with every note known to fall inside it.
///
/// `start..=end` is fetched coverage. After an update a note may carry a date
/// outside these bounds; lookups filter by date so such notes stay invisible
/// for this range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedRange {
  pub start: NaiveDate,
  pub end: NaiveDate,
  pub notes: Vec<Note>,
}

/// How an incoming range relates to an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum MergeKind {
  /// Incoming starts earlier and ends inside or at the existing end
  LeftExtend,
  /// Incoming starts inside or right after the existing range and ends later
  RightExtend,
  /// Incoming strictly contains the existing range; old notes are replaced
  Superset,
  /// Existing range already covers the incoming one
  Covered,
}

impl CachedRange {
  pub fn new(start: NaiveDate, end: NaiveDate, notes: Vec<Note>) -> Self {
    Self { start, end, notes }
  }

  /// Whether `[start, end]` lies entirely inside this range
  pub fn covers(&self, start: NaiveDate, end: NaiveDate) -> bool {
    self.start <= start && end <= self.end
  }

  pub fn contains(&self, date: NaiveDate) -> bool {
    self.covers(date, date)
  }

  /// Classify `incoming` against this range. Rules are checked in a fixed
  /// order and the first that applies wins.
  pub(super) fn merge_kind(&self, incoming: &CachedRange) -> Option<MergeKind> {
    let day_before = self.start.pred_opt().unwrap_or(self.start);
    let day_after = self.end.succ_opt().unwrap_or(self.end);

    if incoming.start < self.start && incoming.end >= day_before && incoming.end <= self.end {
      Some(MergeKind::LeftExtend)
    } else if incoming.start >= self.start && incoming.start <= day_after && incoming.end > self.end
    {
      Some(MergeKind::RightExtend)
    } else if incoming.start < self.start && incoming.end > self.end {
      Some(MergeKind::Superset)
    } else if incoming.start >= self.start && incoming.end <= self.end {
      Some(MergeKind::Covered)
    } else {
      None
    }
  }
}

/// Every note of `first` in order, followed by the notes of `second` whose id
/// does not appear in `first`.
pub fn union_notes(mut first: Vec<Note>, second: Vec<Note>) -> Vec<Note> {
  let mut seen: HashSet<_> = first.iter().map(|note| note.id).collect();
  for note in second {
    if seen.insert(note.id) {
      first.push(note);
    }
  }
  first
}
