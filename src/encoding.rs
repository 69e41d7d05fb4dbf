//! Transport-safe text encoding for image bytes.
//!
//! Standard alphabet with canonical padding and no line wrapping, so the
//! output can sit in a single text block or a JSON string unchanged.

use crate::error::Result;
use base64::{engine::general_purpose::STANDARD, Engine as _};

pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Exact inverse of [`encode`]. Rejects whitespace, foreign characters and
/// non-canonical padding with `DecodeError`.
pub fn decode(text: &str) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(text)?)
}

/// Restores the standard alphabet in base64 that travelled through a query
/// string: `+` left unescaped arrives as a space, and URL-safe `-`/`_` are
/// accepted in place of `+`/`/`.
pub fn from_query_value(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            ' ' | '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect()
}

/// True when `text` is non-empty, canonical base64.
pub fn is_valid(text: &str) -> bool {
    !text.is_empty() && STANDARD.decode(text).is_ok()
}
