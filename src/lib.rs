//! Chirpy - authentication and persistence core
//!
//! Chirpy stores users, chirps (short posts) and refresh tokens in a single
//! JSON file and authenticates users with argon2 password hashes and
//! purpose-tagged JWT access/refresh tokens.

pub mod auth;
pub mod config;
pub mod db;
pub mod services;
pub mod types;

pub use auth::{AuthService, TokenKind};
pub use config::Args;
pub use db::{DocumentStore, Repository};
pub use types::{ChirpyError, Result};
