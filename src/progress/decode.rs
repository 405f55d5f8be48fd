//! Chunk framing
//!
//! The daemon writes JSON values back to back, sometimes separated by
//! whitespace and sometimes not at all. A chunk is decoded on its own by
//! turning every `}<whitespace>{` boundary into `},{` and parsing the result as
//! a JSON array. No bytes are carried over between chunks, so a value split
//! across two chunks fails the decode of both halves. A literal `}{` inside a
//! string value is rewritten too.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use super::event::ProgressEvent;
use crate::error::ProgressError;

fn boundary() -> &'static Regex {
    static BOUNDARY: OnceLock<Regex> = OnceLock::new();
    BOUNDARY.get_or_init(|| Regex::new(r"\}\s*\{").expect("boundary pattern is valid"))
}

/// Split a chunk into its raw JSON items.
pub fn split_items(chunk: &[u8]) -> Result<Vec<Value>, ProgressError> {
    let text = String::from_utf8_lossy(chunk);
    let joined = boundary().replace_all(&text, "},{");
    Ok(serde_json::from_str(&format!("[{}]", joined))?)
}

/// Decode a chunk into classified events, in stream order.
pub fn decode_chunk(chunk: &[u8]) -> Result<Vec<ProgressEvent>, ProgressError> {
    split_items(chunk)?
        .into_iter()
        .map(ProgressEvent::classify)
        .collect()
}
