//! Refresh token records
//!
//! A refresh token is usable only while its record exists. Deleting the
//! record revokes the token regardless of its signature or expiry.
//! Records of tokens that have already expired are swept out whenever a new
//! token is recorded.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::{RefreshTokenRecord, Repository, UserId};
use crate::types::{ChirpyError, Result};

impl Repository {
    /// Record an issued refresh token that expires at `expires_at`
    pub fn create_refresh_token(
        &self,
        token: &str,
        owner_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshTokenRecord> {
        let record = RefreshTokenRecord {
            token: token.to_string(),
            owner_id,
            expires_at: Some(expires_at.timestamp()),
        };

        let pruned = self.store().update(|doc| {
            let pruned = doc.prune_expired_tokens(Utc::now().timestamp());
            doc.tokens.insert(token.to_string(), record.clone());
            Ok(pruned)
        })?;

        if pruned > 0 {
            debug!("Dropped {} expired refresh tokens", pruned);
        }
        debug!("Recorded refresh token for user {}", owner_id);
        Ok(record)
    }

    /// Look up a refresh token; `NotFound` if never issued or revoked
    pub fn get_refresh_token(&self, token: &str) -> Result<RefreshTokenRecord> {
        self.store().read(|doc| {
            doc.tokens
                .get(token)
                .cloned()
                .ok_or_else(|| ChirpyError::NotFound("refresh token".into()))
        })
    }

    /// Revoke a refresh token
    pub fn delete_refresh_token(&self, token: &str) -> Result<()> {
        let record = self.store().update(|doc| {
            doc.tokens
                .remove(token)
                .ok_or_else(|| ChirpyError::NotFound("refresh token".into()))
        })?;

        info!("Revoked refresh token for user {}", record.owner_id);
        Ok(())
    }
}
