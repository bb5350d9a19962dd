//! The range cache: lookup, merge-on-insert and mutation propagation.

use chrono::NaiveDate;
use std::mem;
use tokio::sync::broadcast;
use tracing::debug;

use super::events::CacheChange;
use super::range::{union_notes, CachedRange, MergeKind};
use crate::notes::{Note, NoteId};

/// Ordered collection of cached ranges for one session.
///
/// Merging is pairwise against the first matching entry only, so the store
/// can end up holding entries that could have been merged with each other.
/// Nothing ever re-compacts them.
#[derive(Debug)]
pub struct RangeCache {
  ranges: Vec<CachedRange>,
  changes: broadcast::Sender<CacheChange>,
}

/// Changes a subscriber may fall behind by before it sees `Lagged`
const CHANGE_CAPACITY: usize = 64;

impl Default for RangeCache {
  fn default() -> Self {
    let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
    Self {
      ranges: Vec::new(),
      changes,
    }
  }
}

impl RangeCache {
  pub fn new() -> Self {
    Self::default()
  }

  /// Cached ranges in store order
  #[cfg(test)]
  pub fn ranges(&self) -> &[CachedRange] {
    &self.ranges
  }

  /// Receive a `CacheChange` after every state-changing call.
  pub fn subscribe(&self) -> broadcast::Receiver<CacheChange> {
    self.changes.subscribe()
  }

  fn publish(&self, change: CacheChange) {
    // Err only means nobody is subscribed
    let _ = self.changes.send(change);
  }

  /// Notes dated within `[start, end]`, if a single cached range covers the
  /// whole interval.
  ///
  /// Returns `None` on a miss. An interval spanning two cached ranges is a
  /// miss even when their union would answer it.
  pub fn lookup(&self, start: NaiveDate, end: NaiveDate) -> Option<Vec<Note>> {
    let range = self.ranges.iter().find(|r| r.covers(start, end))?;
    Some(
      range
        .notes
        .iter()
        .filter(|note| note.is_within(start, end))
        .cloned()
        .collect(),
    )
  }

  /// Record the result of a remote fetch for a missed interval.
  ///
  /// The incoming range is merged into the first existing entry it extends,
  /// contains or is contained by; otherwise it is appended.
  pub fn insert(&mut self, incoming: CachedRange) {
    let requested = (incoming.start, incoming.end);
    let (kind, start, end) = self.merge(incoming);
    debug!(
      ?kind,
      requested_start = %requested.0,
      requested_end = %requested.1,
      %start,
      %end,
      ranges = self.ranges.len(),
      "cache insert"
    );
    self.publish(CacheChange::Inserted { start, end });
  }

  fn merge(&mut self, incoming: CachedRange) -> (Option<MergeKind>, NaiveDate, NaiveDate) {
    for existing in self.ranges.iter_mut() {
      let Some(kind) = existing.merge_kind(&incoming) else {
        continue;
      };

      match kind {
        MergeKind::LeftExtend => {
          existing.start = incoming.start;
          existing.notes = union_notes(incoming.notes, mem::take(&mut existing.notes));
        }
        MergeKind::RightExtend => {
          existing.end = incoming.end;
          existing.notes = union_notes(incoming.notes, mem::take(&mut existing.notes));
        }
        // The wider fetch is taken as authoritative; previously cached notes
        // are dropped rather than unioned.
        MergeKind::Superset => *existing = incoming,
        MergeKind::Covered => {}
      }
      return (Some(kind), existing.start, existing.end);
    }

    let bounds = (incoming.start, incoming.end);
    self.ranges.push(incoming);
    (None, bounds.0, bounds.1)
  }

  /// Offer a newly created note to the first range whose interval contains
  /// its date. Notes outside every range are not cached.
  pub fn apply_create(&mut self, note: Note) {
    let (id, date) = (note.id, note.date);
    match self.ranges.iter_mut().find(|r| r.contains(date)) {
      Some(range) => range.notes.push(note),
      None => debug!(id, %date, "created note outside cached ranges"),
    }
    self.publish(CacheChange::Created { id, date });
  }

  /// Replace the first note with `note.id` in every range.
  ///
  /// Ranges are neither moved nor resized, so a note whose new date falls
  /// outside its range drops out of lookups.
  pub fn apply_update(&mut self, note: &Note) {
    for range in &mut self.ranges {
      if let Some(existing) = range.notes.iter_mut().find(|n| n.id == note.id) {
        *existing = note.clone();
      }
    }
    self.publish(CacheChange::Updated {
      id: note.id,
      date: note.date,
    });
  }

  /// Remove the first note with `id` from every range. Unknown ids are ignored.
  pub fn apply_delete(&mut self, id: NoteId) {
    for range in &mut self.ranges {
      if let Some(pos) = range.notes.iter().position(|n| n.id == id) {
        range.notes.remove(pos);
      }
    }
    self.publish(CacheChange::Deleted { id });
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn jan(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
  }

  fn note(id: NoteId, d: u32, content: &str) -> Note {
    Note::new(id, jan(d), content)
  }

  fn ids(notes: &[Note]) -> Vec<NoteId> {
    let mut ids: Vec<_> = notes.iter().map(|n| n.id).collect();
    ids.sort();
    ids
  }

  fn cache_with(ranges: Vec<CachedRange>) -> RangeCache {
    let mut cache = RangeCache::new();
    for range in ranges {
      cache.insert(range);
    }
    cache
  }

  #[test]
  fn test_empty_cache_misses() {
    let cache = RangeCache::new();
    assert_eq!(cache.lookup(jan(1), jan(31)), None);
  }

  #[test]
  fn test_miss_insert_then_hit() {
    let mut cache = RangeCache::new();
    assert!(cache.lookup(jan(1), jan(31)).is_none());

    cache.insert(CachedRange::new(jan(1), jan(31), vec![note(1, 5, "x")]));

    assert_eq!(cache.lookup(jan(5), jan(5)), Some(vec![note(1, 5, "x")]));
  }

  #[test]
  fn test_lookup_filters_inclusive_bounds() {
    let cache = cache_with(vec![CachedRange::new(
      jan(1),
      jan(31),
      vec![
        note(1, 3, "before"),
        note(2, 10, "start"),
        note(3, 15, "middle"),
        note(4, 20, "end"),
        note(5, 21, "after"),
      ],
    )]);

    let found = cache.lookup(jan(10), jan(20)).unwrap();
    assert_eq!(ids(&found), vec![2, 3, 4]);
  }

  #[test]
  fn test_hit_with_no_matching_notes_is_empty() {
    let cache = cache_with(vec![CachedRange::new(
      jan(1),
      jan(31),
      vec![note(1, 3, "x")],
    )]);
    assert_eq!(cache.lookup(jan(10), jan(12)), Some(Vec::new()));
  }

  #[test]
  fn test_lookup_spanning_two_ranges_misses() {
    let cache = cache_with(vec![
      CachedRange::new(jan(1), jan(5), vec![note(1, 2, "a")]),
      CachedRange::new(jan(20), jan(25), vec![note(2, 21, "b")]),
    ]);
    assert_eq!(cache.ranges().len(), 2);
    assert!(cache.lookup(jan(4), jan(21)).is_none());
    assert!(cache.lookup(jan(1), jan(5)).is_some());
  }

  #[test]
  fn test_lookup_uses_first_covering_range() {
    // Two overlapping entries can coexist because only the first match merges
    let mut cache = cache_with(vec![
      CachedRange::new(jan(1), jan(5), Vec::new()),
      CachedRange::new(jan(20), jan(25), Vec::new()),
    ]);
    cache.insert(CachedRange::new(jan(6), jan(22), vec![note(9, 21, "x")]));

    // Right-extended the first entry; the second entry is untouched
    assert_eq!(cache.ranges().len(), 2);
    assert_eq!(cache.ranges()[0].start, jan(1));
    assert_eq!(cache.ranges()[0].end, jan(22));
    assert_eq!(cache.ranges()[1].start, jan(20));

    // First covering range answers, even though the second also covers 21
    assert_eq!(ids(&cache.lookup(jan(21), jan(21)).unwrap()), vec![9]);
  }

  #[test]
  fn test_right_extend_overlap() {
    let cache = cache_with(vec![
      CachedRange::new(jan(1), jan(10), vec![note(1, 3, "a")]),
      CachedRange::new(jan(8), jan(20), vec![note(2, 15, "b")]),
    ]);

    assert_eq!(cache.ranges().len(), 1);
    let merged = &cache.ranges()[0];
    assert_eq!((merged.start, merged.end), (jan(1), jan(20)));
    assert_eq!(ids(&merged.notes), vec![1, 2]);
  }

  #[test]
  fn test_right_extend_abutting() {
    let cache = cache_with(vec![
      CachedRange::new(jan(1), jan(10), Vec::new()),
      CachedRange::new(jan(11), jan(20), Vec::new()),
    ]);
    assert_eq!(cache.ranges().len(), 1);
    assert_eq!(cache.ranges()[0].end, jan(20));
  }

  #[test]
  fn test_left_extend_new_entries_win() {
    let cache = cache_with(vec![
      CachedRange::new(jan(10), jan(20), vec![note(1, 12, "old"), note(2, 18, "b")]),
      CachedRange::new(jan(5), jan(15), vec![note(1, 12, "new"), note(3, 6, "c")]),
    ]);

    assert_eq!(cache.ranges().len(), 1);
    let merged = &cache.ranges()[0];
    assert_eq!((merged.start, merged.end), (jan(5), jan(20)));
    assert_eq!(
      merged.notes,
      vec![note(1, 12, "new"), note(3, 6, "c"), note(2, 18, "b")]
    );
  }

  #[test]
  fn test_right_extend_new_entries_win() {
    let cache = cache_with(vec![
      CachedRange::new(jan(1), jan(10), vec![note(2, 2, "a"), note(1, 8, "old")]),
      CachedRange::new(jan(5), jan(15), vec![note(1, 8, "new"), note(3, 14, "c")]),
    ]);

    assert_eq!(cache.ranges().len(), 1);
    let merged = &cache.ranges()[0];
    assert_eq!((merged.start, merged.end), (jan(1), jan(15)));
    assert_eq!(
      merged.notes,
      vec![note(1, 8, "new"), note(3, 14, "c"), note(2, 2, "a")]
    );
  }

  #[test]
  fn test_left_extend_abutting() {
    let cache = cache_with(vec![
      CachedRange::new(jan(10), jan(20), vec![note(1, 12, "a")]),
      CachedRange::new(jan(1), jan(9), vec![note(2, 9, "b")]),
    ]);
    assert_eq!(cache.ranges().len(), 1);
    assert_eq!(cache.ranges()[0].start, jan(1));
    assert_eq!(ids(&cache.lookup(jan(9), jan(12)).unwrap()), vec![1, 2]);
  }

  #[test]
  fn test_gap_appends_new_entry() {
    let cache = cache_with(vec![
      CachedRange::new(jan(1), jan(5), Vec::new()),
      CachedRange::new(jan(7), jan(9), Vec::new()),
    ]);
    assert_eq!(cache.ranges().len(), 2);
  }

  #[test]
  fn test_superset_discards_previous_notes() {
    let cache = cache_with(vec![
      CachedRange::new(jan(10), jan(20), vec![note(1, 12, "only cached")]),
      CachedRange::new(jan(5), jan(25), vec![note(2, 22, "fetched")]),
    ]);

    assert_eq!(cache.ranges().len(), 1);
    let merged = &cache.ranges()[0];
    assert_eq!((merged.start, merged.end), (jan(5), jan(25)));
    assert_eq!(merged.notes, vec![note(2, 22, "fetched")]);
  }

  #[test]
  fn test_covered_insert_is_noop() {
    let mut cache = cache_with(vec![CachedRange::new(
      jan(1),
      jan(31),
      vec![note(1, 5, "kept")],
    )]);
    let before = cache.ranges().to_vec();

    cache.insert(CachedRange::new(jan(3), jan(9), vec![note(1, 5, "ignored"), note(2, 6, "x")]));

    assert_eq!(cache.ranges(), before.as_slice());
  }

  #[test]
  fn test_create_lands_in_first_containing_range() {
    let mut cache = cache_with(vec![CachedRange::new(jan(1), jan(20), Vec::new())]);

    cache.apply_create(note(5, 15, "new"));

    assert_eq!(cache.lookup(jan(15), jan(15)), Some(vec![note(5, 15, "new")]));
  }

  #[test]
  fn test_create_on_range_boundary() {
    let mut cache = cache_with(vec![CachedRange::new(jan(1), jan(20), Vec::new())]);
    cache.apply_create(note(5, 20, "edge"));
    assert_eq!(ids(&cache.ranges()[0].notes), vec![5]);
  }

  #[test]
  fn test_create_outside_ranges_is_not_cached() {
    let mut cache = cache_with(vec![CachedRange::new(jan(1), jan(10), Vec::new())]);
    cache.apply_create(note(5, 15, "elsewhere"));
    assert!(cache.ranges()[0].notes.is_empty());
    assert!(cache.lookup(jan(15), jan(15)).is_none());
  }

  #[test]
  fn test_update_within_range() {
    let mut cache = cache_with(vec![CachedRange::new(
      jan(1),
      jan(31),
      vec![note(1, 5, "x")],
    )]);

    cache.apply_update(&note(1, 9, "y"));

    assert_eq!(cache.lookup(jan(5), jan(5)), Some(Vec::new()));
    assert_eq!(cache.lookup(jan(9), jan(9)), Some(vec![note(1, 9, "y")]));
  }

  #[test]
  fn test_update_out_of_range_hides_note() {
    let mut cache = cache_with(vec![
      CachedRange::new(jan(1), jan(10), vec![note(1, 5, "x")]),
      CachedRange::new(jan(20), jan(25), Vec::new()),
    ]);

    cache.apply_update(&note(1, 22, "moved"));

    // Still physically in the first range, invisible to both
    assert_eq!(ids(&cache.ranges()[0].notes), vec![1]);
    assert_eq!(cache.lookup(jan(1), jan(10)), Some(Vec::new()));
    assert_eq!(cache.lookup(jan(20), jan(25)), Some(Vec::new()));
  }

  #[test]
  fn test_update_unknown_id_is_noop() {
    let mut cache = cache_with(vec![CachedRange::new(
      jan(1),
      jan(31),
      vec![note(1, 5, "x")],
    )]);
    cache.apply_update(&note(2, 5, "y"));
    assert_eq!(cache.ranges()[0].notes, vec![note(1, 5, "x")]);
  }

  #[test]
  fn test_delete_removes_from_every_range() {
    let mut cache = cache_with(vec![
      CachedRange::new(jan(1), jan(5), vec![note(1, 2, "a"), note(2, 3, "b")]),
      CachedRange::new(jan(20), jan(25), vec![note(1, 2, "stray copy")]),
    ]);

    cache.apply_delete(1);

    assert!(cache
      .ranges()
      .iter()
      .all(|r| r.notes.iter().all(|n| n.id != 1)));
    assert_eq!(ids(&cache.ranges()[0].notes), vec![2]);
  }

  #[test]
  fn test_delete_is_idempotent() {
    let mut cache = cache_with(vec![CachedRange::new(
      jan(1),
      jan(5),
      vec![note(1, 2, "a")],
    )]);

    cache.apply_delete(1);
    let after_first = cache.ranges().to_vec();
    cache.apply_delete(1);

    assert_eq!(cache.ranges(), after_first.as_slice());
  }

  #[test]
  fn test_duplicate_ids_only_first_is_touched() {
    let duplicated = || {
      cache_with(vec![CachedRange::new(
        jan(1),
        jan(10),
        vec![note(1, 2, "first"), note(1, 3, "second")],
      )])
    };

    let mut cache = duplicated();
    cache.apply_delete(1);
    assert_eq!(cache.ranges()[0].notes, vec![note(1, 3, "second")]);

    let mut cache = duplicated();
    cache.apply_update(&note(1, 5, "edited"));
    assert_eq!(
      cache.ranges()[0].notes,
      vec![note(1, 5, "edited"), note(1, 3, "second")]
    );
  }

  #[test]
  fn test_subscribers_see_every_change() {
    let mut cache = RangeCache::new();
    let mut rx = cache.subscribe();
    let mut late = cache.subscribe();

    cache.insert(CachedRange::new(jan(1), jan(10), Vec::new()));
    cache.insert(CachedRange::new(jan(8), jan(20), Vec::new()));
    cache.apply_create(note(3, 4, "c"));
    cache.apply_update(&note(3, 6, "d"));
    cache.apply_delete(3);

    assert_eq!(
      rx.try_recv().unwrap(),
      CacheChange::Inserted {
        start: jan(1),
        end: jan(10)
      }
    );
    assert_eq!(
      rx.try_recv().unwrap(),
      CacheChange::Inserted {
        start: jan(1),
        end: jan(20)
      }
    );
    assert_eq!(
      rx.try_recv().unwrap(),
      CacheChange::Created { id: 3, date: jan(4) }
    );
    assert_eq!(
      rx.try_recv().unwrap(),
      CacheChange::Updated { id: 3, date: jan(6) }
    );
    assert_eq!(rx.try_recv().unwrap(), CacheChange::Deleted { id: 3 });
    assert!(rx.try_recv().is_err());

    // every subscriber gets its own copy
    assert_eq!(
      late.try_recv().unwrap(),
      CacheChange::Inserted {
        start: jan(1),
        end: jan(10)
      }
    );
  }

  #[test]
  fn test_changes_without_subscribers_are_dropped() {
    let mut cache = RangeCache::new();
    cache.apply_delete(9);
    cache.insert(CachedRange::new(jan(1), jan(3), Vec::new()));

    let mut rx = cache.subscribe();
    cache.apply_delete(9);
    assert_eq!(rx.try_recv().unwrap(), CacheChange::Deleted { id: 9 });
    assert!(rx.try_recv().is_err());
  }
}
