//! Serde types matching the note store's request and response bodies.
//!
//! These are kept apart from the domain types so the wire shape can differ
//! from what the cache and views work with.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::types::{GuestId, Note, NoteId};
use crate::dates::{format_ymd, ymd};

/// Query string for `GET /api/notes`
#[derive(Debug, Serialize)]
pub struct ApiRangeParams {
  pub start: String,
  pub end: String,
  pub guest_id: GuestId,
}

impl ApiRangeParams {
  pub fn new(guest_id: GuestId, start: NaiveDate, end: NaiveDate) -> Self {
    Self {
      start: format_ymd(start),
      end: format_ymd(end),
      guest_id,
    }
  }
}

/// Body of `POST /api/notes`
#[derive(Debug, Serialize)]
pub struct ApiCreateNote<'a> {
  #[serde(with = "ymd")]
  pub date: NaiveDate,
  pub content: &'a str,
  pub guest_id: GuestId,
}

/// Body of `PUT /api/notes/{id}`
#[derive(Debug, Serialize)]
pub struct ApiUpdateNote<'a> {
  #[serde(with = "ymd")]
  pub date: NaiveDate,
  pub content: &'a str,
}

/// Note as returned by the store
#[derive(Debug, Deserialize)]
pub struct ApiNote {
  pub id: NoteId,
  #[serde(with = "ymd")]
  pub date: NaiveDate,
  pub content: String,
}

impl From<ApiNote> for Note {
  fn from(api: ApiNote) -> Self {
    Note::new(api.id, api.date, api.content)
  }
}

/// Response of any endpoint that only needs the created id
#[derive(Debug, Deserialize)]
pub struct ApiCreated {
  pub id: i64,
}
