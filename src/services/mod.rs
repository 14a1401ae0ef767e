//! Stateless helpers used by the repository

pub mod profanity;

pub use profanity::{clean_chirp_body, filter, MAX_CHIRP_CHARS};
