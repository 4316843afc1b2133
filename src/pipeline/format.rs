//! Formatting preservation: make a card's whitespace survive HTML rendering.
//!
//! Note fields are rendered as HTML, which collapses newlines and runs of
//! spaces. Three substitutions, applied in this order:
//!
//! 1. `\n`   → `<br>`
//! 2. `"  "` → `" &nbsp;"` (non-overlapping, left to right, single pass)
//! 3. `\t`   → `&nbsp;&nbsp;&nbsp;&nbsp;`
//!
//! Rule 2 is a plain non-overlapping replace, so a run of three spaces becomes
//! `" &nbsp; "`: the odd remainder stays a plain space. Text is otherwise
//! passed through untouched; `<`, `>` and `&` are not escaped.

/// Line-break markup.
pub const LINE_BREAK: &str = "<br>";

/// Non-breaking-space markup.
pub const NBSP: &str = "&nbsp;";

/// Apply the three substitutions. Pure and total.
pub fn preserve_formatting(text: &str) -> String {
    text.replace('\n', LINE_BREAK)
        .replace("  ", &format!(" {NBSP}"))
        .replace('\t', &NBSP.repeat(4))
}
