//! Progress-callback trait for per-note import events.
//!
//! Inject an [`Arc<dyn ImportProgressCallback>`] via
//! [`crate::config::ImportConfigBuilder::progress_callback`] to receive an
//! event for every card the orchestrator writes.
//!
//! # Example
//!
//! ```rust
//! use flashcard_import::{ImportConfig, ImportProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct Counter(AtomicUsize);
//!
//! impl ImportProgressCallback for Counter {
//!     fn on_note_added(&self, _card: usize, _total: usize) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let config = ImportConfig::builder()
//!     .progress_callback(Arc::new(Counter(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the orchestrator as it writes each card.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Card numbers are 1-based.
pub trait ImportProgressCallback: Send + Sync {
    /// Called once, after confirmation, before the first note is created.
    fn on_import_start(&self, total_cards: usize) {
        let _ = total_cards;
    }

    /// Called when a card was added to the collection.
    fn on_note_added(&self, card: usize, total_cards: usize) {
        let _ = (card, total_cards);
    }

    /// Called when a card was skipped because its note could not be written.
    fn on_note_error(&self, card: usize, total_cards: usize, error: &str) {
        let _ = (card, total_cards, error);
    }

    /// Called once after every card has been attempted and the collection saved.
    fn on_import_complete(&self, total_cards: usize, imported: usize) {
        let _ = (total_cards, imported);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ImportProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ImportConfig`].
pub type ProgressCallback = Arc<dyn ImportProgressCallback>;
