//! API key authentication for payment provider webhooks
//!
//! The webhook caller sends `Authorization: ApiKey <key>`. This is the only
//! check the core performs for webhooks.

use crate::types::{ChirpyError, Result};

/// Literal prefix of an API key Authorization header
pub const API_KEY_PREFIX: &str = "ApiKey ";

/// Validates the webhook API key
#[derive(Clone)]
pub struct ApiKeyValidator {
    key: Option<String>,
}

impl std::fmt::Debug for ApiKeyValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyValidator")
            .field("configured", &self.is_configured())
            .finish()
    }
}

impl ApiKeyValidator {
    /// Create a validator; an empty key counts as not configured
    pub fn new(key: Option<String>) -> Self {
        Self {
            key: key.filter(|k| !k.is_empty()),
        }
    }

    /// Check if a webhook key is configured
    pub fn is_configured(&self) -> bool {
        self.key.is_some()
    }

    /// Check an Authorization header value
    ///
    /// Fails when no key is configured, when the prefix is missing, or when
    /// the key differs.
    pub fn authorize(&self, header: &str) -> Result<()> {
        let expected = self.key.as_deref().ok_or(ChirpyError::InvalidApiKey)?;
        let presented = header
            .strip_prefix(API_KEY_PREFIX)
            .ok_or(ChirpyError::InvalidApiKey)?;

        if constant_time_compare(presented, expected) {
            Ok(())
        } else {
            Err(ChirpyError::InvalidApiKey)
        }
    }
}

/// Constant-time string comparison to prevent timing attacks
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
