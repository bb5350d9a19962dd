use color_eyre::Result;
use std::future::Future;
use tokio::sync::mpsc;
use tracing::warn;

use crate::notes::CachedNotesClient;

/// One-line message shown in the footer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
  Info(String),
  Error(String),
}

/// Shared handles every view needs: the cached note client and a channel
/// for footer messages.
#[derive(Clone)]
pub struct Context {
  pub notes: CachedNotesClient,
  status: mpsc::UnboundedSender<Status>,
}

impl Context {
  pub fn new(notes: CachedNotesClient, status: mpsc::UnboundedSender<Status>) -> Self {
    Self { notes, status }
  }

  pub fn info(&self, message: impl Into<String>) {
    let _ = self.status.send(Status::Info(message.into()));
  }

  /// Run a write against the note store in the background.
  ///
  /// Views do not wait for the result: a successful write changes the cache,
  /// and the cache change makes subscribed views reload.
  pub fn spawn_mutation<F>(&self, done: &'static str, mutation: F)
  where
    F: Future<Output = Result<()>> + Send + 'static,
  {
    let status = self.status.clone();
    tokio::spawn(async move {
      let message = match mutation.await {
        Ok(()) => Status::Info(done.to_string()),
        Err(e) => {
          warn!("{} failed: {}", done, e);
          Status::Error(e.to_string())
        }
      };
      let _ = status.send(message);
    });
  }
}

/// Context backed by a client pointed at an address nothing listens on
#[cfg(test)]
pub fn test_context() -> Context {
  use crate::config::Config;
  use crate::notes::NotesClient;

  let mut config = Config::default();
  config.server.url = "http://127.0.0.1:9".to_string();
  let client = NotesClient::new(&config).expect("client");
  let (tx, _rx) = mpsc::unbounded_channel();
  Context::new(CachedNotesClient::new(client, 1), tx)
}
