//! Error types for the flashcard-import library.
//!
//! Three error types, one per failure scope:
//!
//! * [`ImportError`]: **Fatal**: the run cannot proceed (unreadable file,
//!   no cards found, note type vanished, collection could not be saved).
//!   Returned as `Err(ImportError)` from [`crate::import::run_import`] after
//!   the message has been shown to the user.
//!
//! * [`NoteError`]: **Non-fatal**: a single card could not be written. The
//!   batch continues; the error is logged and stored in
//!   [`crate::output::ImportReport::failures`].
//!
//! * [`CollectionError`]: raised by [`crate::collection::JsonCollection`];
//!   wrapped into one of the two above depending on where it happens.
//!
//! The user backing out of a prompt is not an error at all; see
//! [`crate::output::Cancellation`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the flashcard-import library.
#[derive(Debug, Error)]
pub enum ImportError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The file could not be opened or read.
    #[error("Cannot read '{path}': {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file was read but decoded to no text at all.
    #[error("Could not read '{path}' or the file is empty")]
    EmptyInput { path: PathBuf },

    /// Segmentation produced zero cards.
    #[error("No cards found. Make sure cards are separated with {delimiter}")]
    NoCards { delimiter: String },

    // ── Collection errors ─────────────────────────────────────────────────
    /// The chosen note type no longer exists in the collection.
    #[error("Note type not found: '{name}'")]
    TemplateNotFound { name: String },

    /// The chosen deck could not be resolved or created.
    #[error("Deck unavailable: {0}")]
    Collection(#[source] CollectionError),

    /// Notes were added but the collection could not be saved.
    #[error("Failed to save collection: {0}")]
    PersistFailed(#[source] CollectionError),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A non-fatal error for a single card.
///
/// Card numbers are 1-based, in source order.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum NoteError {
    /// The collection refused to create a note of the chosen type.
    #[error("Card {card}: could not create note: {detail}")]
    CreateFailed { card: usize, detail: String },

    /// A field could not be set on the new note.
    #[error("Card {card}: could not set field {field}: {detail}")]
    FieldFailed {
        card: usize,
        field: usize,
        detail: String,
    },

    /// The collection refused to add the note to the deck.
    #[error("Card {card}: could not add note: {detail}")]
    AddFailed { card: usize, detail: String },
}

impl NoteError {
    /// 1-based number of the card that failed.
    pub fn card(&self) -> usize {
        match self {
            NoteError::CreateFailed { card, .. }
            | NoteError::FieldFailed { card, .. }
            | NoteError::AddFailed { card, .. } => *card,
        }
    }
}

/// Errors raised by the JSON collection store.
#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed collection '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Collection already exists: '{0}'")]
    AlreadyExists(PathBuf),

    #[error("Unknown note type id {0}")]
    UnknownNoteType(u64),

    #[error("Unknown deck id {0}")]
    UnknownDeck(u64),

    #[error("Field index {index} out of range (note has {count} fields)")]
    FieldOutOfRange { index: usize, count: usize },

    #[error("Invalid deck name '{0}'")]
    InvalidDeckName(String),
}
