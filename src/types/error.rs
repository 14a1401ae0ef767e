//! Error types for Chirpy
//!
//! One variant per failure kind the core can report. Callers (HTTP
//! handlers, the CLI) decide how each kind is presented.

/// Main error type for Chirpy operations
#[derive(Debug, thiserror::Error)]
pub enum ChirpyError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Chirp is too long: {len} characters (max {max})")]
    BodyTooLong { len: usize, max: usize },

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Credentials do not match")]
    CredentialMismatch,

    #[error("Hashing error: {0}")]
    Hashing(String),

    #[error("Authorization header must start with \"Bearer \"")]
    MalformedAuthHeader,

    #[error("Invalid token signature: {0}")]
    SignatureInvalid(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Token issuer mismatch: expected {expected}, found {found}")]
    IssuerMismatch { expected: String, found: String },

    #[error("Token issuer claim is missing")]
    IssuerMissing,

    #[error("Token subject is malformed: {0}")]
    SubjectMalformed(String),

    #[error("Failed to sign token: {0}")]
    TokenSigning(String),

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Corrupt store: {0}")]
    CorruptStore(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ChirpyError {
    /// True for failures that mean the caller is not (or no longer) authenticated
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::CredentialMismatch
                | Self::MalformedAuthHeader
                | Self::SignatureInvalid(_)
                | Self::TokenExpired
                | Self::IssuerMismatch { .. }
                | Self::IssuerMissing
                | Self::SubjectMalformed(_)
                | Self::InvalidApiKey
        )
    }

    /// True for storage failures; fatal when raised during startup
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_) | Self::CorruptStore(_))
    }
}

impl From<std::io::Error> for ChirpyError {
    fn from(err: std::io::Error) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for ChirpyError {
    fn from(err: serde_json::Error) -> Self {
        Self::CorruptStore(format!("JSON error: {}", err))
    }
}

/// Result type alias for Chirpy operations
pub type Result<T> = std::result::Result<T, ChirpyError>;
