//! Encoding recovery: turn the bytes of an arbitrary text file into a `String`.
//!
//! Files in the expected population come from editors on several platforms,
//! so the reader probes a fixed, ordered list of candidate encodings and keeps
//! the first one that decodes the whole byte stream without error and yields
//! non-empty text. When every candidate rejects the bytes, Latin-1 is used:
//! it maps every byte to a code point, so it cannot fail (though the result
//! may be mojibake).
//!
//! ## Candidate order
//!
//! ```text
//! UTF-8 ──▶ GBK ──▶ GB18030 ──▶ UTF-16 ──▶ (fallback) Latin-1
//! ```
//!
//! The order is significant. UTF-16 accepts almost any even-length input, so
//! it must come after the stricter multi-byte encodings.

use crate::error::ImportError;
use encoding_rs::{Encoding, GB18030, GBK, UTF_16BE, UTF_16LE, UTF_8};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// The encoding a file was decoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceEncoding {
    Utf8,
    Gbk,
    Gb18030,
    Utf16,
    /// Fallback; never rejects input.
    Latin1,
}

/// Probe order. Latin-1 is not listed: it is the fallback.
pub const CANDIDATES: [SourceEncoding; 4] = [
    SourceEncoding::Utf8,
    SourceEncoding::Gbk,
    SourceEncoding::Gb18030,
    SourceEncoding::Utf16,
];

impl fmt::Display for SourceEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceEncoding::Utf8 => "UTF-8",
            SourceEncoding::Gbk => "GBK",
            SourceEncoding::Gb18030 => "GB18030",
            SourceEncoding::Utf16 => "UTF-16",
            SourceEncoding::Latin1 => "Latin-1",
        };
        f.write_str(name)
    }
}

impl SourceEncoding {
    /// Decode `bytes` strictly. `None` means the bytes are malformed for
    /// this encoding.
    pub fn decode_strict(self, bytes: &[u8]) -> Option<String> {
        match self {
            SourceEncoding::Utf8 => {
                let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
                strict(UTF_8, body)
            }
            SourceEncoding::Gbk => {
                if has_four_byte_sequence(bytes) {
                    return None;
                }
                strict(GBK, bytes)
            }
            SourceEncoding::Gb18030 => strict(GB18030, bytes),
            SourceEncoding::Utf16 => {
                let (encoding, body) = match bytes {
                    [0xFF, 0xFE, rest @ ..] => (UTF_16LE, rest),
                    [0xFE, 0xFF, rest @ ..] => (UTF_16BE, rest),
                    _ => (UTF_16LE, bytes),
                };
                strict(encoding, body)
            }
            SourceEncoding::Latin1 => Some(encoding_rs::mem::decode_latin1(bytes).into_owned()),
        }
    }

    /// True if `bytes` open with this encoding's byte-order mark.
    pub fn has_bom(self, bytes: &[u8]) -> bool {
        match self {
            SourceEncoding::Utf8 => bytes.starts_with(b"\xEF\xBB\xBF"),
            SourceEncoding::Utf16 => bytes.starts_with(&[0xFF, 0xFE]) || bytes.starts_with(&[0xFE, 0xFF]),
            _ => false,
        }
    }
}

fn strict(encoding: &'static Encoding, bytes: &[u8]) -> Option<String> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(Cow::into_owned)
}

/// True if `bytes` contain a GB18030 four-byte sequence (lead byte followed
/// by an ASCII digit), which plain GBK does not define.
fn has_four_byte_sequence(bytes: &[u8]) -> bool {
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if (0x81..=0xFE).contains(&b) && i + 1 < bytes.len() {
            if bytes[i + 1].is_ascii_digit() {
                return true;
            }
            i += 2;
        } else {
            i += 1;
        }
    }
    false
}

/// Decoded file content plus the encoding that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: SourceEncoding,
}

/// Decode raw bytes using the candidate list, falling back to Latin-1.
///
/// A candidate wins when it decodes to non-empty text, or to empty text
/// behind its own byte-order mark (a BOM-only file is empty, not Latin-1).
pub fn decode_bytes(bytes: &[u8]) -> DecodedText {
    for encoding in CANDIDATES {
        match encoding.decode_strict(bytes) {
            Some(text) if !text.is_empty() || encoding.has_bom(bytes) => {
                debug!("Decoded {} bytes as {}", bytes.len(), encoding);
                return DecodedText { text, encoding };
            }
            Some(_) => debug!("{} decoded to empty text, trying next", encoding),
            None => debug!("{} rejected the input", encoding),
        }
    }

    debug!("All candidates failed, falling back to Latin-1");
    let encoding = SourceEncoding::Latin1;
    DecodedText {
        text: encoding.decode_strict(bytes).unwrap_or_default(),
        encoding,
    }
}

/// Read a file and decode it with [`decode_bytes`].
///
/// Only I/O failures are errors; every byte sequence decodes to something.
pub fn read_text(path: &Path) -> Result<DecodedText, ImportError> {
    let bytes = std::fs::read(path).map_err(|source| ImportError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(decode_bytes(&bytes))
}
