//! A flashcard collection stored as a single JSON file.
//!
//! This is the concrete note sink used by the CLI. It keeps the whole
//! collection in memory and only touches disk in [`JsonCollection::open`] and
//! [`NoteSink::persist`]; the latter writes atomically (temp file in the same
//! directory, then rename) so a crash never leaves a half-written file.

use crate::error::CollectionError;
use crate::host::{DeckEntry, NoteSink};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Separator between levels of a deck name, e.g. `Languages::Chinese`.
pub const DECK_SEPARATOR: &str = "::";

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Identifier of a deck.
    DeckId
);
id_type!(
    /// Identifier of a note type (the template a note is built from).
    NoteTypeId
);
id_type!(
    /// Identifier of a stored note.
    NoteId
);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    pub id: DeckId,
    pub name: String,
    /// Note type offered first when adding to this deck.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_note_type: Option<NoteTypeId>,
}

/// A note type: a name plus its ordered field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteType {
    pub id: NoteTypeId,
    pub name: String,
    pub fields: Vec<String>,
}

/// A note that has not been added to the collection yet.
///
/// Created blank by [`NoteSink::create_note`] with one empty field per
/// note-type field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    note_type: NoteTypeId,
    deck: Option<DeckId>,
    fields: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Note {
    pub fn new(note_type: NoteTypeId, field_count: usize) -> Self {
        Self {
            note_type,
            deck: None,
            fields: vec![String::new(); field_count],
            tags: Vec::new(),
        }
    }

    pub fn note_type(&self) -> NoteTypeId {
        self.note_type
    }

    pub fn deck(&self) -> Option<DeckId> {
        self.deck
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn set_field(&mut self, index: usize, text: impl Into<String>) -> Result<(), CollectionError> {
        let count = self.fields.len();
        let slot = self
            .fields
            .get_mut(index)
            .ok_or(CollectionError::FieldOutOfRange { index, count })?;
        *slot = text.into();
        Ok(())
    }

    pub fn assign_deck(&mut self, deck: DeckId) {
        self.deck = Some(deck);
    }
}

/// A note as stored in the collection file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredNote {
    pub id: NoteId,
    #[serde(flatten)]
    pub note: Note,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CollectionData {
    decks: Vec<Deck>,
    note_types: Vec<NoteType>,
    #[serde(default)]
    notes: Vec<StoredNote>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    current_deck: Option<DeckId>,
}

impl CollectionData {
    /// A fresh collection: the `Default` deck and the stock note types.
    fn stock() -> Self {
        let note_type = |id, name: &str, fields: &[&str]| NoteType {
            id: NoteTypeId(id),
            name: name.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        };
        Self {
            decks: vec![Deck {
                id: DeckId(1),
                name: "Default".to_string(),
                default_note_type: None,
            }],
            note_types: vec![
                note_type(1, "Basic", &["Front", "Back"]),
                note_type(2, "Basic (and reversed card)", &["Front", "Back"]),
                note_type(3, "Cloze", &["Text", "Back Extra"]),
            ],
            notes: Vec::new(),
            current_deck: None,
        }
    }
}

/// A collection backed by one JSON file.
#[derive(Debug)]
pub struct JsonCollection {
    path: PathBuf,
    data: CollectionData,
}

impl JsonCollection {
    /// Load an existing collection file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CollectionError> {
        let path = path.as_ref().to_path_buf();
        let raw = std::fs::read_to_string(&path).map_err(|source| CollectionError::Io {
            path: path.clone(),
            source,
        })?;
        let data: CollectionData =
            serde_json::from_str(&raw).map_err(|source| CollectionError::Json {
                path: path.clone(),
                source,
            })?;
        debug!(
            "Opened collection {}: {} decks, {} note types, {} notes",
            path.display(),
            data.decks.len(),
            data.note_types.len(),
            data.notes.len()
        );
        Ok(Self { path, data })
    }

    /// Start a new collection with stock decks and note types.
    ///
    /// Nothing is written until [`NoteSink::persist`] is called.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, CollectionError> {
        let path = path.as_ref().to_path_buf();
        if path.exists() {
            return Err(CollectionError::AlreadyExists(path));
        }
        info!("Creating new collection at {}", path.display());
        Ok(Self {
            path,
            data: CollectionData::stock(),
        })
    }

    /// Open `path` if it exists, otherwise [`create`](Self::create) it.
    pub fn open_or_create(path: impl AsRef<Path>) -> Result<Self, CollectionError> {
        let path = path.as_ref();
        if path.exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn deck_list(&self) -> &[Deck] {
        &self.data.decks
    }

    pub fn note_types(&self) -> &[NoteType] {
        &self.data.note_types
    }

    pub fn notes(&self) -> &[StoredNote] {
        &self.data.notes
    }

    /// The deck last imported into, if any.
    pub fn current_deck(&self) -> Option<DeckId> {
        self.data.current_deck
    }

    /// Register a note type. Returns the existing id if the name is taken.
    pub fn add_note_type(&mut self, name: &str, fields: &[&str]) -> NoteTypeId {
        if let Some(existing) = self.find_template(name) {
            return existing;
        }
        let id = NoteTypeId(next_id(self.data.note_types.iter().map(|t| t.id.0)));
        self.data.note_types.push(NoteType {
            id,
            name: name.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        });
        id
    }

    fn deck_by_name(&self, name: &str) -> Option<DeckId> {
        let wanted = name.to_lowercase();
        self.data
            .decks
            .iter()
            .find(|d| d.name.to_lowercase() == wanted)
            .map(|d| d.id)
    }

    fn insert_deck(&mut self, name: &str) -> DeckId {
        let id = DeckId(next_id(self.data.decks.iter().map(|d| d.id.0)));
        debug!("Creating deck '{}' ({})", name, id);
        self.data.decks.push(Deck {
            id,
            name: name.to_string(),
            default_note_type: None,
        });
        id
    }
}

fn next_id(ids: impl Iterator<Item = u64>) -> u64 {
    ids.max().unwrap_or(0) + 1
}

impl NoteSink for JsonCollection {
    fn decks(&self) -> Vec<DeckEntry> {
        self.data
            .decks
            .iter()
            .map(|d| DeckEntry {
                id: d.id,
                name: d.name.clone(),
            })
            .collect()
    }

    fn template_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.data.note_types.iter().map(|t| t.name.clone()).collect();
        names.sort();
        names
    }

    fn find_template(&self, name: &str) -> Option<NoteTypeId> {
        self.data
            .note_types
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.id)
    }

    /// Look up a deck by name (case-insensitive), creating it and any
    /// missing parent decks.
    fn resolve_deck(&mut self, name: &str) -> Result<DeckId, CollectionError> {
        let name = name.trim();
        let parts: Vec<&str> = name.split(DECK_SEPARATOR).map(str::trim).collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(CollectionError::InvalidDeckName(name.to_string()));
        }

        let mut resolved = None;
        for depth in 1..=parts.len() {
            let prefix = parts[..depth].join(DECK_SEPARATOR);
            let id = match self.deck_by_name(&prefix) {
                Some(id) => id,
                None => self.insert_deck(&prefix),
            };
            resolved = Some(id);
        }
        resolved.ok_or_else(|| CollectionError::InvalidDeckName(name.to_string()))
    }

    fn select_deck(&mut self, deck: DeckId, note_type: NoteTypeId) -> Result<(), CollectionError> {
        if !self.data.note_types.iter().any(|t| t.id == note_type) {
            return Err(CollectionError::UnknownNoteType(note_type.0));
        }
        let entry = self
            .data
            .decks
            .iter_mut()
            .find(|d| d.id == deck)
            .ok_or(CollectionError::UnknownDeck(deck.0))?;
        entry.default_note_type = Some(note_type);
        self.data.current_deck = Some(deck);
        Ok(())
    }

    fn create_note(&self, note_type: NoteTypeId) -> Result<Note, CollectionError> {
        let nt = self
            .data
            .note_types
            .iter()
            .find(|t| t.id == note_type)
            .ok_or(CollectionError::UnknownNoteType(note_type.0))?;
        Ok(Note::new(nt.id, nt.fields.len()))
    }

    fn add_note(&mut self, mut note: Note, deck: DeckId) -> Result<NoteId, CollectionError> {
        if !self.data.decks.iter().any(|d| d.id == deck) {
            return Err(CollectionError::UnknownDeck(deck.0));
        }
        if !self.data.note_types.iter().any(|t| t.id == note.note_type) {
            return Err(CollectionError::UnknownNoteType(note.note_type.0));
        }
        note.assign_deck(deck);
        let id = NoteId(next_id(self.data.notes.iter().map(|n| n.id.0)));
        self.data.notes.push(StoredNote { id, note });
        Ok(id)
    }

    fn persist(&mut self) -> Result<(), CollectionError> {
        let io_err = |source| CollectionError::Io {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(io_err)?;

        let json = serde_json::to_string_pretty(&self.data).map_err(|source| CollectionError::Json {
            path: self.path.clone(),
            source,
        })?;

        // Atomic write: temp file in the same directory, then rename
        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(io_err)?;
        tmp.write_all(json.as_bytes()).map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;

        info!(
            "Saved collection {} ({} notes)",
            self.path.display(),
            self.data.notes.len()
        );
        Ok(())
    }
}
