//! Collaborator traits the import orchestrator talks to.
//!
//! The orchestrator never reaches for global state: everything interactive
//! goes through an [`Interaction`] and everything stored goes through a
//! [`NoteSink`]. Both are passed in by `&mut`, so only one import can drive a
//! given host and collection at a time.
//!
//! The CLI implements [`Interaction`] with terminal prompts and uses
//! [`crate::collection::JsonCollection`] as the sink; tests use fakes.

use crate::collection::{DeckId, Note, NoteId, NoteTypeId};
use crate::error::CollectionError;
use serde::Serialize;
use std::path::PathBuf;

/// A deck as offered to the deck picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeckEntry {
    pub id: DeckId,
    /// Full name, levels separated by `::`.
    pub name: String,
}

/// The user-facing side of an import.
///
/// Every method blocks until the user answers. Returning `None` or `false`
/// cancels the run cleanly.
pub trait Interaction {
    /// Ask for the text file to import.
    fn choose_file(&mut self) -> Option<PathBuf>;

    /// Ask for a deck. Returning a name that does not exist yet creates it.
    fn pick_deck(&mut self, decks: &[DeckEntry]) -> Option<String>;

    /// Ask for a note type. `templates` is sorted; `preselected` indexes the
    /// entry to offer as the default.
    fn pick_template(&mut self, templates: &[String], preselected: usize) -> Option<String>;

    /// Ask whether to go ahead with importing `card_count` cards.
    fn confirm(&mut self, card_count: usize) -> bool;

    /// Show an informational message.
    fn notify(&mut self, message: &str);
}

/// Where notes are written.
pub trait NoteSink {
    /// All decks currently in the collection.
    fn decks(&self) -> Vec<DeckEntry>;

    /// Names of all note types.
    fn template_names(&self) -> Vec<String>;

    /// Resolve a note-type name to its id.
    fn find_template(&self, name: &str) -> Option<NoteTypeId>;

    /// Resolve a deck name to its id, creating the deck if needed.
    fn resolve_deck(&mut self, name: &str) -> Result<DeckId, CollectionError>;

    /// Make `deck` the current deck and `note_type` its default note type.
    fn select_deck(&mut self, deck: DeckId, note_type: NoteTypeId) -> Result<(), CollectionError>;

    /// Create a blank note of the given type.
    fn create_note(&self, note_type: NoteTypeId) -> Result<Note, CollectionError>;

    /// Add a filled note to a deck.
    fn add_note(&mut self, note: Note, deck: DeckId) -> Result<NoteId, CollectionError>;

    /// Make all added notes durable. Called once per run.
    fn persist(&mut self) -> Result<(), CollectionError>;
}
