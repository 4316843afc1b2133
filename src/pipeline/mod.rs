//! Pipeline stages for turning a text file into note field values.
//!
//! Each submodule implements exactly one transformation step and has no
//! shared state with the others.
//!
//! ## Data Flow
//!
//! ```text
//! read ──▶ segment ──▶ format
//! (bytes)   (cards)    (field HTML)
//! ```
//!
//! 1. [`read`]    decode the file with the encoding-recovery probe
//! 2. [`segment`] split on the delimiter into trimmed, non-blank cards
//! 3. [`format`]  make newlines, space runs and tabs visible as markup

pub mod format;
pub mod read;
pub mod segment;
