//! Password hashing and verification using Argon2
//!
//! Uses the argon2id variant. Cost parameters come from [`HasherConfig`] so
//! deployments can tune them; the defaults are the argon2 crate defaults.
//! Hashes are stored in PHC string format, which carries salt and params.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::config::HasherConfig;
use crate::types::{ChirpyError, Result};

/// One-way hashing of user passwords
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    /// Create a hasher with the given cost parameters
    ///
    /// Returns an error if argon2 rejects the parameters.
    pub fn new(config: HasherConfig) -> Result<Self> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| ChirpyError::Config(format!("Invalid argon2 parameters: {e}")))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password
    ///
    /// Returns the PHC-formatted hash string.
    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ChirpyError::Hashing(format!("Failed to hash password: {e}")))
    }

    /// Verify a password against a stored hash
    ///
    /// Verification uses the parameters embedded in the stored hash, so
    /// hashes created under an older cost setting keep working.
    pub fn verify(&self, password: &str, hash: &str) -> Result<()> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| ChirpyError::Hashing(format!("Invalid password hash format: {e}")))?;

        match self.argon2().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(()),
            Err(argon2::password_hash::Error::Password) => Err(ChirpyError::CredentialMismatch),
            Err(e) => Err(ChirpyError::Hashing(format!("Failed to verify password: {e}"))),
        }
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}
