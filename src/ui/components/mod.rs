mod command_input;
mod input;
mod note_editor;

pub use command_input::{CommandEvent, CommandInput};
pub use note_editor::{EditorEvent, NoteDraft, NoteEditor};

/// What a component did with a key: the editor and the command line both
/// answer with this so the owning view knows whether to keep routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Consumed without anything for the owner to do
  Handled,
  /// Consumed, and the owner must act on `T`
  Event(T),
  /// Not for this component
  NotHandled,
}
