//! Card segmentation: split decoded text into card contents.
//!
//! The text is split on every literal occurrence of the delimiter. Each span
//! is trimmed at both ends; blank spans are dropped. Interior whitespace
//! (newlines, runs of spaces, tabs) is kept verbatim for the formatter.

use serde::Serialize;

/// One card's raw content, trimmed and guaranteed non-blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    /// 0-based position among the kept cards, in source order.
    pub index: usize,
    pub text: String,
}

/// Split `text` on `delimiter` and return the non-blank trimmed spans in order.
///
/// N delimiter occurrences give N+1 spans, including the span before the
/// first delimiter and the one after the last. An empty result means there
/// is nothing to import; it is not an error here.
pub fn split_cards(text: &str, delimiter: &str) -> Vec<Card> {
    text.split(delimiter)
        .map(str::trim)
        .filter(|span| !span.is_empty())
        .enumerate()
        .map(|(index, span)| Card {
            index,
            text: span.to_string(),
        })
        .collect()
}
