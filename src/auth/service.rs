//! Authentication flows
//!
//! Composes the credential hasher, token service and repository:
//! - signup: hash the password and create the user
//! - login: verify the password, issue an access/refresh pair and record
//!   the refresh token
//! - refresh: accept a refresh token only if it verifies *and* its record
//!   still exists, then mint a new access token
//! - revoke: delete the refresh token record
//!
//! Plaintext passwords and token strings are never logged.

use tracing::{debug, info, warn};

use super::api_key::ApiKeyValidator;
use super::jwt::{strip_bearer, TokenKind, TokenService};
use super::password::CredentialHasher;
use crate::db::{Repository, User, UserId};
use crate::types::{ChirpyError, Result};

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginSession {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

/// Login, token refresh and revocation on top of the repository
#[derive(Debug, Clone)]
pub struct AuthService {
    hasher: CredentialHasher,
    tokens: TokenService,
    api_keys: ApiKeyValidator,
    repo: Repository,
}

impl AuthService {
    pub fn new(
        hasher: CredentialHasher,
        tokens: TokenService,
        api_keys: ApiKeyValidator,
        repo: Repository,
    ) -> Self {
        Self {
            hasher,
            tokens,
            api_keys,
            repo,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Create an account
    pub fn signup(&self, email: &str, password: &str) -> Result<User> {
        let password_hash = self.hasher.hash(password)?;
        self.repo.create_user(email, &password_hash)
    }

    /// Check credentials and issue a token pair
    ///
    /// An unknown email is reported as [`ChirpyError::CredentialMismatch`],
    /// same as a wrong password.
    pub fn login(&self, email: &str, password: &str) -> Result<LoginSession> {
        let user = match self.repo.get_user_by_email(email) {
            Ok(user) => user,
            Err(ChirpyError::NotFound(_)) => {
                debug!("Login attempt for unknown email");
                return Err(ChirpyError::CredentialMismatch);
            }
            Err(e) => return Err(e),
        };

        if let Err(e) = self.hasher.verify(password, &user.password_hash) {
            warn!("Failed login for user {}", user.id);
            return Err(e);
        }

        let access_token = self.tokens.issue_for(user.id, TokenKind::Access)?;
        let (refresh_token, refresh_expires_at) =
            self.tokens.issue_with_expiry(user.id, TokenKind::Refresh)?;
        self.repo
            .create_refresh_token(&refresh_token, user.id, refresh_expires_at)?;

        info!("User {} logged in", user.id);
        Ok(LoginSession {
            user,
            access_token,
            refresh_token,
        })
    }

    /// Resolve the acting user from an access token header
    pub fn authenticate(&self, bearer_header: &str) -> Result<UserId> {
        self.tokens.validate(bearer_header, TokenKind::Access)
    }

    /// Exchange a refresh token header for a new access token
    ///
    /// A revoked token fails with `NotFound` even while its signature and
    /// expiry are still valid.
    pub fn refresh(&self, bearer_header: &str) -> Result<String> {
        let subject = self.tokens.validate(bearer_header, TokenKind::Refresh)?;
        let token = strip_bearer(bearer_header)?;

        let record = self.repo.get_refresh_token(token)?;
        if record.owner_id != subject {
            warn!(
                "Refresh token record owner {} does not match subject {}",
                record.owner_id, subject
            );
            return Err(ChirpyError::Forbidden(
                "refresh token belongs to another user".into(),
            ));
        }

        let access_token = self.tokens.issue_for(subject, TokenKind::Access)?;
        debug!("Issued new access token for user {}", subject);
        Ok(access_token)
    }

    /// Revoke the refresh token in the header
    pub fn revoke(&self, bearer_header: &str) -> Result<()> {
        let token = strip_bearer(bearer_header)?;
        self.repo.delete_refresh_token(token)
    }

    /// Replace the authenticated user's email and password
    pub fn update_credentials(
        &self,
        bearer_header: &str,
        email: &str,
        password: &str,
    ) -> Result<User> {
        let user_id = self.authenticate(bearer_header)?;
        let password_hash = self.hasher.hash(password)?;
        self.repo.update_user(user_id, email, &password_hash)
    }

    /// Check the API key a payment webhook presents
    pub fn authorize_webhook(&self, header: &str) -> Result<()> {
        self.api_keys.authorize(header).inspect_err(|_| {
            warn!("Rejected webhook call with invalid API key");
        })
    }
}
