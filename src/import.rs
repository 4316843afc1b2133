//! The import orchestrator.
//!
//! ```text
//! choose file ─▶ read ─▶ segment ─▶ pick deck ─▶ pick note type ─▶ confirm
//!                                                                    │
//!        report ◀── persist (once) ◀── for each card: format + write ◀┘
//! ```
//!
//! Nothing is written before the user confirms. Each card is written
//! independently: a card whose note cannot be created, filled or added is
//! logged and skipped, and the batch continues. The collection is persisted
//! exactly once, after the last card. Running the same import twice creates
//! duplicate notes.

use crate::collection::{DeckId, NoteId, NoteTypeId};
use crate::config::ImportConfig;
use crate::error::{CollectionError, ImportError, NoteError};
use crate::host::{Interaction, NoteSink};
use crate::output::{Cancellation, ImportOutcome, ImportReport};
use crate::pipeline::format::preserve_formatting;
use crate::pipeline::read::{read_text, SourceEncoding};
use crate::pipeline::segment::{split_cards, Card};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Cards read from one file, ready to import.
#[derive(Debug, Clone)]
pub struct LoadedCards {
    pub source: PathBuf,
    pub encoding: SourceEncoding,
    pub cards: Vec<Card>,
}

/// Read and segment a file.
///
/// # Errors
/// - [`ImportError::Unreadable`] if the file cannot be read
/// - [`ImportError::EmptyInput`] if it decodes to no text
/// - [`ImportError::NoCards`] if no non-blank card remains after splitting
pub fn load_cards(path: &Path, config: &ImportConfig) -> Result<LoadedCards, ImportError> {
    let decoded = read_text(path)?;
    if decoded.text.is_empty() {
        return Err(ImportError::EmptyInput {
            path: path.to_path_buf(),
        });
    }

    let cards = split_cards(&decoded.text, &config.delimiter);
    if cards.is_empty() {
        return Err(ImportError::NoCards {
            delimiter: config.delimiter.clone(),
        });
    }

    info!(
        "Found {} card(s) in {} ({})",
        cards.len(),
        path.display(),
        decoded.encoding
    );
    Ok(LoadedCards {
        source: path.to_path_buf(),
        encoding: decoded.encoding,
        cards,
    })
}

/// Index of the note type to preselect: the first whose name contains
/// `keyword` case-insensitively, else 0.
pub fn preselected_template(names: &[String], keyword: &str) -> usize {
    let keyword = keyword.to_lowercase();
    names
        .iter()
        .position(|n| n.to_lowercase().contains(&keyword))
        .unwrap_or(0)
}

/// Write every card as a note of `note_type` in `deck`, then persist once.
///
/// Per-card failures are collected in [`ImportReport::failures`]; only a
/// missing note type, an unresolvable deck, or a failed persist abort.
pub fn import_cards<S: NoteSink + ?Sized>(
    sink: &mut S,
    loaded: &LoadedCards,
    deck: &str,
    note_type: &str,
    config: &ImportConfig,
) -> Result<ImportReport, ImportError> {
    let start = Instant::now();

    let template = sink
        .find_template(note_type)
        .ok_or_else(|| ImportError::TemplateNotFound {
            name: note_type.to_string(),
        })?;
    let deck_id = sink.resolve_deck(deck).map_err(ImportError::Collection)?;
    sink.select_deck(deck_id, template).map_err(ImportError::Collection)?;

    let total = loaded.cards.len();
    info!(
        "Importing {} card(s) into '{}' as '{}'",
        total, deck, note_type
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_import_start(total);
    }

    let mut note_ids = Vec::with_capacity(total);
    let mut failures = Vec::new();
    for card in &loaded.cards {
        let number = card.index + 1;
        match write_card(sink, card, template, deck_id, config) {
            Ok(id) => {
                debug!("Card {}/{} added as note {}", number, total, id);
                note_ids.push(id);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_note_added(number, total);
                }
            }
            Err(e) => {
                warn!("Skipping card: {}", e);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_note_error(number, total, &e.to_string());
                }
                failures.push(e);
            }
        }
    }

    sink.persist().map_err(ImportError::PersistFailed)?;

    let imported = note_ids.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_import_complete(total, imported);
    }
    info!(
        "Import complete: {}/{} card(s), {} skipped",
        imported,
        total,
        failures.len()
    );

    Ok(ImportReport {
        source: loaded.source.clone(),
        encoding: loaded.encoding,
        deck: deck.to_string(),
        note_type: note_type.to_string(),
        candidates: total,
        imported,
        note_ids,
        failures,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

/// Create, fill and add one note.
///
/// The formatted card goes into the first field. A second field, if the note
/// type has one, is explicitly cleared.
fn write_card<S: NoteSink + ?Sized>(
    sink: &mut S,
    card: &Card,
    template: NoteTypeId,
    deck: DeckId,
    config: &ImportConfig,
) -> Result<NoteId, NoteError> {
    let number = card.index + 1;
    let formatted = preserve_formatting(&card.text);

    let mut note = sink
        .create_note(template)
        .map_err(|e| NoteError::CreateFailed {
            card: number,
            detail: e.to_string(),
        })?;
    note.assign_deck(deck);

    note.set_field(0, formatted)
        .map_err(|e| field_failed(number, 0, e))?;
    if note.field_count() >= 2 {
        note.set_field(1, "").map_err(|e| field_failed(number, 1, e))?;
    }
    note.tags = config.tags.clone();

    sink.add_note(note, deck).map_err(|e| NoteError::AddFailed {
        card: number,
        detail: e.to_string(),
    })
}

fn field_failed(card: usize, field: usize, e: CollectionError) -> NoteError {
    NoteError::FieldFailed {
        card,
        field,
        detail: e.to_string(),
    }
}

/// Run a whole interactive import.
///
/// Returns `Ok(ImportOutcome::Cancelled)` when the user backs out of any
/// prompt; nothing has been written in that case. Fatal errors are shown to
/// the user through [`Interaction::notify`] before being returned.
pub fn run_import<I, S>(
    host: &mut I,
    sink: &mut S,
    config: &ImportConfig,
) -> Result<ImportOutcome, ImportError>
where
    I: Interaction + ?Sized,
    S: NoteSink + ?Sized,
{
    let result = drive(host, sink, config);
    match &result {
        Ok(ImportOutcome::Completed(report)) => host.notify(&report.summary()),
        Ok(ImportOutcome::Cancelled { reason }) => debug!("Import cancelled: {}", reason),
        Err(e) => {
            warn!("Import failed: {}", e);
            host.notify(&e.to_string());
        }
    }
    result
}

fn drive<I, S>(host: &mut I, sink: &mut S, config: &ImportConfig) -> Result<ImportOutcome, ImportError>
where
    I: Interaction + ?Sized,
    S: NoteSink + ?Sized,
{
    let cancelled = |reason| -> Result<ImportOutcome, ImportError> {
        Ok(ImportOutcome::Cancelled { reason })
    };

    let Some(path) = host.choose_file() else {
        return cancelled(Cancellation::NoFileChosen);
    };
    let loaded = load_cards(&path, config)?;

    let Some(deck) = host.pick_deck(&sink.decks()) else {
        return cancelled(Cancellation::NoDeckChosen);
    };

    let mut templates = sink.template_names();
    templates.sort();
    let preselected = preselected_template(&templates, &config.template_keyword);
    let Some(note_type) = host.pick_template(&templates, preselected) else {
        return cancelled(Cancellation::NoTemplateChosen);
    };

    if !host.confirm(loaded.cards.len()) {
        return cancelled(Cancellation::Declined);
    }

    import_cards(sink, &loaded, &deck, &note_type, config).map(ImportOutcome::Completed)
}
