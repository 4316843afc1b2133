//! # flashcard-import
//!
//! Bulk-import a plain-text file into a flashcard collection, one note per
//! card, with cards separated by the literal token `#flashcard`.
//!
//! ## Pipeline Overview
//!
//! ```text
//! text file
//!  │
//!  ├─ 1. Read     probe UTF-8 → GBK → GB18030 → UTF-16, fall back to Latin-1
//!  ├─ 2. Segment  split on `#flashcard`, trim, drop blank spans
//!  ├─ 3. Pick     deck, note type, confirmation (host prompts)
//!  ├─ 4. Format   newline → <br>, double space → " &nbsp;", tab → 4×&nbsp;
//!  ├─ 5. Write    one note per card, first field = formatted card
//!  └─ 6. Persist  once, then report the count
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flashcard_import::{import_cards, load_cards, ImportConfig, JsonCollection};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ImportConfig::default();
//!     let mut collection = JsonCollection::open_or_create("collection.json")?;
//!     let cards = load_cards(Path::new("cards.txt"), &config)?;
//!     let report = import_cards(&mut collection, &cards, "Default", "Basic", &config)?;
//!     println!("{}", report.summary());
//!     Ok(())
//! }
//! ```
//!
//! Interactive hosts implement [`Interaction`] and call [`run_import`], which
//! asks for the file, deck, note type and confirmation in that order.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `flashcard-import` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod collection;
pub mod config;
pub mod deck_tree;
pub mod error;
pub mod host;
pub mod import;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use collection::{DeckId, JsonCollection, Note, NoteId, NoteTypeId};
pub use config::{ImportConfig, ImportConfigBuilder, DEFAULT_DELIMITER, DEFAULT_TEMPLATE_KEYWORD};
pub use deck_tree::{build_deck_tree, filter_deck_tree, DeckNode};
pub use error::{CollectionError, ImportError, NoteError};
pub use host::{DeckEntry, Interaction, NoteSink};
pub use import::{import_cards, load_cards, preselected_template, run_import, LoadedCards};
pub use output::{Cancellation, ImportOutcome, ImportReport};
pub use pipeline::format::preserve_formatting;
pub use pipeline::read::{decode_bytes, read_text, DecodedText, SourceEncoding};
pub use pipeline::segment::{split_cards, Card};
pub use progress::{ImportProgressCallback, NoopProgressCallback, ProgressCallback};
