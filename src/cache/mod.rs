//! In-memory cache of fetched note date ranges.
//!
//! This module decides whether a requested `[start, end]` interval can be
//! answered without a remote fetch:
//! - Each cached range records complete knowledge of the notes dated inside it
//! - Newly fetched ranges are merged against the first overlapping or abutting entry
//! - Created, updated and deleted notes are propagated into every cached range
//! - Observers are notified of every change through a channel subscription

mod events;
mod range;
mod store;

pub use events::CacheChange;
pub use range::CachedRange;
pub use store::RangeCache;
