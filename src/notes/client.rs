use chrono::NaiveDate;
use color_eyre::{eyre::eyre, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::api_types::{ApiCreateNote, ApiCreated, ApiNote, ApiRangeParams, ApiUpdateNote};
use super::remote::NoteRemote;
use super::types::{Guest, GuestId, Note, NoteId};
use crate::config::Config;

/// HTTP client for the note store
#[derive(Clone)]
pub struct NotesClient {
  client: reqwest::Client,
  base_url: Url,
}

impl NotesClient {
  pub fn new(config: &Config) -> Result<Self> {
    let base_url = parse_base_url(&config.server.url)?;

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.server.timeout_secs))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { client, base_url })
  }

  fn endpoint(&self, path: &str) -> Result<Url> {
    self
      .base_url
      .join(path)
      .map_err(|e| eyre!("Invalid endpoint {}: {}", path, e))
  }

  /// Turn a response into `T`, or an error carrying status and body text
  async fn parse_response<T: DeserializeOwned>(
    response: reqwest::Response,
    what: &str,
  ) -> Result<T> {
    let response = Self::check_status(response, what).await?;
    response
      .json::<T>()
      .await
      .map_err(|e| eyre!("Failed to parse {} response: {}", what, e))
  }

  async fn check_status(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
      return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    Err(eyre!("Failed to {}: HTTP {}: {}", what, status.as_u16(), text))
  }
}

/// Parse the configured server URL, making sure it ends in `/` so relative
/// endpoints resolve beneath it rather than replacing its last segment.
fn parse_base_url(raw: &str) -> Result<Url> {
  let mut url = Url::parse(raw).map_err(|e| eyre!("Invalid server URL '{}': {}", raw, e))?;
  if url.cannot_be_a_base() {
    return Err(eyre!("Server URL '{}' cannot be used as a base", raw));
  }
  if !url.path().ends_with('/') {
    let path = format!("{}/", url.path());
    url.set_path(&path);
  }
  Ok(url)
}

impl NoteRemote for NotesClient {
  async fn fetch_notes(
    &self,
    guest_id: GuestId,
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<Vec<Note>> {
    debug!(guest_id, %start, %end, "fetching notes");
    let response = self
      .client
      .get(self.endpoint("api/notes")?)
      .query(&ApiRangeParams::new(guest_id, start, end))
      .send()
      .await
      .map_err(|e| eyre!("Failed to fetch notes: {}", e))?;

    let notes: Vec<ApiNote> = Self::parse_response(response, "fetch notes").await?;
    Ok(notes.into_iter().map(Note::from).collect())
  }

  async fn create_note(&self, guest_id: GuestId, date: NaiveDate, content: &str) -> Result<NoteId> {
    let body = ApiCreateNote {
      date,
      content,
      guest_id,
    };
    let response = self
      .client
      .post(self.endpoint("api/notes")?)
      .json(&body)
      .send()
      .await
      .map_err(|e| eyre!("Failed to create note: {}", e))?;

    let created: ApiCreated = Self::parse_response(response, "create note").await?;
    debug!(id = created.id, %date, "created note");
    Ok(created.id)
  }

  async fn update_note(&self, note: &Note) -> Result<()> {
    let body = ApiUpdateNote {
      date: note.date,
      content: &note.content,
    };
    let response = self
      .client
      .put(self.endpoint(&format!("api/notes/{}", note.id))?)
      .json(&body)
      .send()
      .await
      .map_err(|e| eyre!("Failed to update note {}: {}", note.id, e))?;

    Self::check_status(response, "update note").await?;
    Ok(())
  }

  async fn delete_note(&self, id: NoteId) -> Result<()> {
    let response = self
      .client
      .delete(self.endpoint(&format!("api/notes/{}", id))?)
      .send()
      .await
      .map_err(|e| eyre!("Failed to delete note {}: {}", id, e))?;

    Self::check_status(response, "delete note").await?;
    Ok(())
  }

  async fn create_guest(&self) -> Result<GuestId> {
    let response = self
      .client
      .post(self.endpoint("api/guests")?)
      .json(&serde_json::json!({}))
      .send()
      .await
      .map_err(|e| eyre!("Failed to create guest: {}", e))?;

    let guest: Guest = Self::parse_response(response, "create guest").await?;
    Ok(guest.id)
  }
}
