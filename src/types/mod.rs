//! Shared types for Chirpy

pub mod error;

pub use error::{ChirpyError, Result};
