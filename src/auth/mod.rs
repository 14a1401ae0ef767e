//! Authentication and authorization for Chirpy
//!
//! Provides:
//! - Password hashing with Argon2
//! - JWT access/refresh token generation and validation
//! - API key authentication for payment webhooks
//! - Login, refresh and revocation flows

pub mod api_key;
pub mod jwt;
pub mod password;
pub mod service;

pub use api_key::ApiKeyValidator;
pub use jwt::{strip_bearer, Claims, TokenKind, TokenService};
pub use password::CredentialHasher;
pub use service::{AuthService, LoginSession};
