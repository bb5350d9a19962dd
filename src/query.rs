//! Keyed async query for loading data in views.
//!
//! A `Query<K, T>` runs its fetcher for the current key on a spawned task
//! and exposes the loading/success/error state. Views call `poll()` on every
//! tick and change the key when the visible period moves.
//!
//! # Example
//!
//! ```ignore
//! let notes = cached_client.clone();
//! let mut query = Query::new(move |(start, end)| {
//!     let notes = notes.clone();
//!     async move { notes.notes_in_range(start, end).await.map_err(|e| e.to_string()) }
//! });
//!
//! query.set_key((first_day, last_day));
//!
//! // In event loop tick
//! if query.poll() {
//!     // State changed, trigger re-render
//! }
//! ```

use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use tokio::sync::mpsc;

/// The state of a query
#[derive(Debug, Clone)]
pub enum QueryState<T> {
  /// Query has not been started
  Idle,
  /// Query is currently fetching data
  Loading,
  /// Query completed successfully
  Success(T),
  /// Query failed with an error
  Error(String),
}

impl<T> QueryState<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, QueryState::Loading)
  }

  pub fn is_error(&self) -> bool {
    matches!(self, QueryState::Error(_))
  }

  pub fn data(&self) -> Option<&T> {
    match self {
      QueryState::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      QueryState::Error(e) => Some(e),
      _ => None,
    }
  }
}

type FetcherFn<K, T> = Box<dyn Fn(K) -> BoxFuture<'static, Result<T, String>> + Send + Sync>;

/// Async query keyed by `K`.
///
/// Only the result of the most recent fetch is ever applied: starting a new
/// fetch drops the channel of the previous one.
pub struct Query<K, T> {
  state: QueryState<T>,
  key: Option<K>,
  fetcher: FetcherFn<K, T>,
  receiver: Option<mpsc::UnboundedReceiver<Result<T, String>>>,
}

impl<K, T> Query<K, T>
where
  K: Clone + PartialEq + Send + 'static,
  T: Send + 'static,
{
  /// Create an idle query. Nothing is fetched until a key is set.
  pub fn new<F, Fut>(fetcher: F) -> Self
  where
    F: Fn(K) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    Self {
      state: QueryState::Idle,
      key: None,
      fetcher: Box::new(move |key| fetcher(key).boxed()),
      receiver: None,
    }
  }

  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  pub fn data(&self) -> Option<&T> {
    self.state.data()
  }

  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  pub fn is_error(&self) -> bool {
    self.state.is_error()
  }

  pub fn error(&self) -> Option<&str> {
    self.state.error()
  }

  /// Point the query at `key`, fetching if it differs from the current key.
  ///
  /// Previous data stays visible while the new key loads.
  pub fn set_key(&mut self, key: K) {
    if self.key.as_ref() == Some(&key) {
      return;
    }
    self.key = Some(key);
    self.refetch();
  }

  /// Fetch the current key again, discarding any pending result.
  pub fn refetch(&mut self) {
    let Some(key) = self.key.clone() else {
      return;
    };
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    if !matches!(self.state, QueryState::Success(_)) {
      self.state = QueryState::Loading;
    }

    let future = (self.fetcher)(key);
    tokio::spawn(async move {
      let result = future.await;
      // Ignore send errors - receiver may have been dropped
      let _ = tx.send(result);
    });
  }

  /// Whether a fetch is in flight (including background refreshes that keep
  /// the previous data visible)
  pub fn is_fetching(&self) -> bool {
    self.receiver.is_some()
  }

  /// Poll for results from a pending fetch.
  ///
  /// Returns `true` if the state changed (data arrived or error occurred).
  pub fn poll(&mut self) -> bool {
    let receiver = match &mut self.receiver {
      Some(rx) => rx,
      None => return false,
    };

    match receiver.try_recv() {
      Ok(Ok(data)) => {
        self.state = QueryState::Success(data);
        self.receiver = None;
        true
      }
      Ok(Err(error)) => {
        self.state = QueryState::Error(error);
        self.receiver = None;
        true
      }
      Err(mpsc::error::TryRecvError::Empty) => false,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        self.state = QueryState::Error("Query was cancelled".to_string());
        self.receiver = None;
        true
      }
    }
  }
}

impl<K: std::fmt::Debug, T: std::fmt::Debug> std::fmt::Debug for Query<K, T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("state", &self.state)
      .field("key", &self.key)
      .finish_non_exhaustive()
  }
}
