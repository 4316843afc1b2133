//! Result types returned by an import run.

use crate::collection::NoteId;
use crate::error::NoteError;
use crate::pipeline::read::SourceEncoding;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// What a completed import did.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    /// File the cards were read from.
    pub source: PathBuf,
    /// Encoding the file was decoded with.
    pub encoding: SourceEncoding,
    pub deck: String,
    pub note_type: String,
    /// Cards found in the file.
    pub candidates: usize,
    /// Notes successfully added. Never more than `candidates`.
    pub imported: usize,
    pub note_ids: Vec<NoteId>,
    /// Cards that were skipped, in source order.
    pub failures: Vec<NoteError>,
    pub duration_ms: u64,
}

impl ImportReport {
    /// The message shown to the user when the run finishes.
    ///
    /// A count of zero is still reported as a normal completion.
    pub fn summary(&self) -> String {
        format!(
            "Imported {} card(s) into deck '{}'",
            self.imported, self.deck
        )
    }
}

/// Why a run stopped without writing anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Cancellation {
    NoFileChosen,
    NoDeckChosen,
    NoTemplateChosen,
    Declined,
}

impl fmt::Display for Cancellation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Cancellation::NoFileChosen => "no file chosen",
            Cancellation::NoDeckChosen => "no deck chosen",
            Cancellation::NoTemplateChosen => "no note type chosen",
            Cancellation::Declined => "import declined",
        };
        f.write_str(s)
    }
}

/// Outcome of [`crate::import::run_import`] when no fatal error occurred.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImportOutcome {
    Completed(ImportReport),
    Cancelled { reason: Cancellation },
}

impl ImportOutcome {
    pub fn report(&self) -> Option<&ImportReport> {
        match self {
            ImportOutcome::Completed(r) => Some(r),
            ImportOutcome::Cancelled { .. } => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ImportOutcome::Cancelled { .. })
    }
}
