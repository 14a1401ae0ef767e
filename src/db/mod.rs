//! Storage layer for Chirpy
//!
//! [`DocumentStore`] owns the JSON file; [`Repository`] layers the domain
//! operations on it. Every repository call is exactly one store read or one
//! store update, so each inherits the store's locking.

pub mod chirps;
pub mod document;
pub mod store;
pub mod tokens;
pub mod users;

use std::sync::Arc;

pub use document::{Chirp, ChirpId, Document, RefreshTokenRecord, User, UserId};
pub use store::DocumentStore;

/// Domain operations over the document store
#[derive(Debug, Clone)]
pub struct Repository {
    store: Arc<DocumentStore>,
}

impl Repository {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }

    /// The underlying store
    pub fn store(&self) -> &DocumentStore {
        &self.store
    }
}
