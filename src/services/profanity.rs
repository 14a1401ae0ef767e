//! Chirp body validation and profanity masking

use crate::types::{ChirpyError, Result};

/// Maximum chirp length, counted in characters
pub const MAX_CHIRP_CHARS: usize = 140;

/// Words replaced by [`MASK`], matched case-insensitively
pub const PROFANE_WORDS: [&str; 3] = ["kerfuffle", "sharbert", "fornax"];

/// Replacement for a profane word
pub const MASK: &str = "****";

/// Mask profane words in `body`
///
/// The body is split on single spaces and each piece compared whole, so
/// punctuation attached to a word (`"kerfuffle!"`) is left alone and the
/// spacing of the input is preserved.
pub fn filter(body: &str) -> String {
    body.split(' ')
        .map(|word| {
            if PROFANE_WORDS.iter().any(|bad| word.eq_ignore_ascii_case(bad)) {
                MASK
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reject over-long bodies, then mask profanity
pub fn clean_chirp_body(body: &str) -> Result<String> {
    let len = body.chars().count();
    if len > MAX_CHIRP_CHARS {
        return Err(ChirpyError::BodyTooLong {
            len,
            max: MAX_CHIRP_CHARS,
        });
    }
    Ok(filter(body))
}
