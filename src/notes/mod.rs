//! Remote note store access and the cache-backed client used by the views.

pub mod api_types;
mod cached_client;
mod client;
mod remote;
mod types;

pub use cached_client::CachedNotesClient;
pub use client::NotesClient;
pub use remote::NoteRemote;
pub use types::{GuestId, Note, NoteId};
