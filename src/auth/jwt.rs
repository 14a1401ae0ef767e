//! JWT token handling for Chirpy users
//!
//! Issues and validates the two kinds of bearer token:
//! - access tokens (short-lived, stateless)
//! - refresh tokens (long-lived, also recorded in the store so they can be revoked)
//!
//! Security notes:
//! - Tokens are signed with HS256 (HMAC-SHA256)
//! - The `iss` claim tags the token's purpose; a token is only accepted
//!   for the purpose it was issued for
//! - Expiry is checked with zero leeway
//! - Revocation of refresh tokens is enforced by [`crate::auth::AuthService`],
//!   not here

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

use crate::config::{TokenConfig, MIN_SECRET_LEN};
use crate::db::UserId;
use crate::types::{ChirpyError, Result};

/// Literal prefix every bearer Authorization header must carry
pub const BEARER_PREFIX: &str = "Bearer ";

/// Purpose of a token, carried in its `iss` claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    /// Issuer claim value for this kind
    pub fn issuer(&self) -> &'static str {
        match self {
            Self::Access => "chirpy-access",
            Self::Refresh => "chirpy-refresh",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.issuer())
    }
}

/// Claims as found on the wire; every field is optional so absence can be
/// reported precisely instead of as a generic decode failure
#[derive(Debug, Serialize, Deserialize)]
struct RawClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iss: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iat: Option<i64>,
    exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sub: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    jti: Option<String>,
}

/// Verified token claims
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Purpose the token was issued for
    pub kind: TokenKind,
    /// User id the token was issued to
    pub subject: UserId,
    /// Issued at (Unix timestamp)
    pub issued_at: Option<i64>,
    /// Expiration time (Unix timestamp)
    pub expires_at: i64,
    /// Unique token id; keeps two tokens minted in the same second distinct
    pub token_id: Option<String>,
}

impl RawClaims {
    fn into_claims(self, expected: TokenKind) -> Result<Claims> {
        let found = match self.iss {
            None | Some(serde_json::Value::Null) => return Err(ChirpyError::IssuerMissing),
            Some(serde_json::Value::String(iss)) => iss,
            Some(other) => other.to_string(),
        };
        if found != expected.issuer() {
            return Err(ChirpyError::IssuerMismatch {
                expected: expected.issuer().to_string(),
                found,
            });
        }

        let subject = match self.sub {
            Some(serde_json::Value::String(s)) => parse_subject(&s)?,
            Some(other) => {
                return Err(ChirpyError::SubjectMalformed(format!(
                    "expected a string, found {other}"
                )))
            }
            None => return Err(ChirpyError::SubjectMalformed("claim is missing".into())),
        };

        Ok(Claims {
            kind: expected,
            subject,
            issued_at: self.iat,
            expires_at: self.exp,
            token_id: self.jti,
        })
    }
}

/// Parse a subject written the way [`TokenService::issue`] writes it
///
/// Only plain decimal digits without a sign or leading zeros are accepted,
/// so each user id has exactly one subject string.
fn parse_subject(s: &str) -> Result<UserId> {
    let id = s
        .parse::<UserId>()
        .map_err(|e| ChirpyError::SubjectMalformed(format!("{s:?}: {e}")))?;
    if id.to_string() != s {
        return Err(ChirpyError::SubjectMalformed(format!(
            "{s:?} is not a canonical user id"
        )));
    }
    Ok(id)
}

/// Issues and validates signed bearer tokens
#[derive(Clone)]
pub struct TokenService {
    secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Create a new token service
    ///
    /// Returns an error if the secret is empty or too short
    pub fn new(config: TokenConfig) -> Result<Self> {
        if config.secret.is_empty() {
            return Err(ChirpyError::Config("JWT secret is required".into()));
        }

        if config.secret.len() < MIN_SECRET_LEN {
            return Err(ChirpyError::Config(format!(
                "JWT secret must be at least {} characters",
                MIN_SECRET_LEN
            )));
        }

        Ok(Self {
            secret: config.secret,
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
        })
    }

    /// Lifetime of tokens of the given kind
    pub fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    /// Sign a token for `subject` that expires at `expires_at`
    pub fn issue(
        &self,
        subject: UserId,
        expires_at: DateTime<Utc>,
        kind: TokenKind,
    ) -> Result<String> {
        let claims = RawClaims {
            iss: Some(serde_json::Value::String(kind.issuer().to_string())),
            iat: Some(Utc::now().timestamp()),
            exp: expires_at.timestamp(),
            sub: Some(serde_json::Value::String(subject.to_string())),
            jti: Some(Uuid::new_v4().to_string()),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ChirpyError::TokenSigning(e.to_string()))
    }

    /// Sign a token with the configured lifetime for its kind
    pub fn issue_for(&self, subject: UserId, kind: TokenKind) -> Result<String> {
        self.issue_with_expiry(subject, kind).map(|(token, _)| token)
    }

    /// Like [`Self::issue_for`], also returning when the token expires
    pub fn issue_with_expiry(
        &self,
        subject: UserId,
        kind: TokenKind,
    ) -> Result<(String, DateTime<Utc>)> {
        let ttl = ChronoDuration::from_std(self.ttl(kind))
            .map_err(|e| ChirpyError::Config(format!("Token lifetime out of range: {e}")))?;
        let expires_at = Utc::now() + ttl;
        let token = self.issue(subject, expires_at, kind)?;
        Ok((token, expires_at))
    }

    /// Validate a bearer Authorization header value and return the subject
    pub fn validate(&self, bearer_header: &str, expected: TokenKind) -> Result<UserId> {
        let token = strip_bearer(bearer_header)?;
        self.verify(token, expected).map(|claims| claims.subject)
    }

    /// Verify a raw token string and return its claims
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let data = decode::<RawClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|err| {
            use jsonwebtoken::errors::ErrorKind;
            match err.kind() {
                ErrorKind::ExpiredSignature => ChirpyError::TokenExpired,
                ErrorKind::InvalidSignature => ChirpyError::SignatureInvalid("Invalid signature".into()),
                ErrorKind::InvalidToken => ChirpyError::SignatureInvalid("Invalid token".into()),
                _ => ChirpyError::SignatureInvalid(format!("Token validation failed: {err}")),
            }
        })?;

        data.claims.into_claims(expected)
    }
}

/// Strip the literal `"Bearer "` prefix from an Authorization header value
pub fn strip_bearer(header: &str) -> Result<&str> {
    header
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(ChirpyError::MalformedAuthHeader)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> TokenService {
        TokenService::new(TokenConfig::new(
            "test-secret-that-is-at-least-32-characters-long",
        ))
        .unwrap()
    }

    fn bearer(token: &str) -> String {
        format!("Bearer {token}")
    }

    fn sign_raw(claims: &serde_json::Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(b"test-secret-that-is-at-least-32-characters-long"),
        )
        .unwrap()
    }

    fn future_exp() -> i64 {
        (Utc::now() + ChronoDuration::hours(1)).timestamp()
    }

    #[test]
    fn test_issue_and_validate() {
        let service = test_service();
        for kind in [TokenKind::Access, TokenKind::Refresh] {
            let token = service.issue_for(42, kind).unwrap();
            assert_eq!(service.validate(&bearer(&token), kind).unwrap(), 42);
        }
    }

    #[test]
    fn test_claims_carry_timestamps() {
        let service = test_service();
        let expires_at = Utc::now() + ChronoDuration::minutes(5);
        let token = service.issue(7, expires_at, TokenKind::Access).unwrap();

        let claims = service.verify(&token, TokenKind::Access).unwrap();
        assert_eq!(claims.subject, 7);
        assert_eq!(claims.expires_at, expires_at.timestamp());
        assert!(claims.issued_at.is_some());
        assert!(claims.token_id.is_some());
    }

    #[test]
    fn test_issue_with_expiry_matches_claims() {
        let service = test_service();
        let (token, expires_at) = service
            .issue_with_expiry(3, TokenKind::Refresh)
            .unwrap();

        let claims = service.verify(&token, TokenKind::Refresh).unwrap();
        assert_eq!(claims.expires_at, expires_at.timestamp());
        assert!(expires_at > Utc::now() + ChronoDuration::days(59));
    }

    #[test]
    fn test_tokens_are_unique() {
        let service = test_service();
        let first = service.issue_for(1, TokenKind::Refresh).unwrap();
        let second = service.issue_for(1, TokenKind::Refresh).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_expired_token() {
        let service = test_service();
        let token = service
            .issue(1, Utc::now() - ChronoDuration::seconds(30), TokenKind::Access)
            .unwrap();

        assert!(matches!(
            service.validate(&bearer(&token), TokenKind::Access),
            Err(ChirpyError::TokenExpired)
        ));
    }

    #[test]
    fn test_cross_purpose_tokens_rejected() {
        let service = test_service();
        let access = service.issue_for(1, TokenKind::Access).unwrap();
        let refresh = service.issue_for(1, TokenKind::Refresh).unwrap();

        assert!(matches!(
            service.validate(&bearer(&access), TokenKind::Refresh),
            Err(ChirpyError::IssuerMismatch { .. })
        ));
        assert!(matches!(
            service.validate(&bearer(&refresh), TokenKind::Access),
            Err(ChirpyError::IssuerMismatch { .. })
        ));
    }

    #[test]
    fn test_legacy_issuer_rejected() {
        let service = test_service();
        let token = sign_raw(&serde_json::json!({
            "iss": "chirpy",
            "exp": future_exp(),
            "sub": "1",
        }));

        match service.validate(&bearer(&token), TokenKind::Access) {
            Err(ChirpyError::IssuerMismatch { expected, found }) => {
                assert_eq!(expected, "chirpy-access");
                assert_eq!(found, "chirpy");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_non_string_issuer_is_a_mismatch() {
        let service = test_service();
        let token = sign_raw(&serde_json::json!({
            "iss": 5,
            "exp": future_exp(),
            "sub": "1",
        }));

        match service.validate(&bearer(&token), TokenKind::Access) {
            Err(ChirpyError::IssuerMismatch { expected, found }) => {
                assert_eq!(expected, "chirpy-access");
                assert_eq!(found, "5");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_missing_issuer() {
        let service = test_service();
        let missing = sign_raw(&serde_json::json!({ "exp": future_exp(), "sub": "1" }));
        let null = sign_raw(&serde_json::json!({ "iss": null, "exp": future_exp(), "sub": "1" }));

        for token in [missing, null] {
            assert!(matches!(
                service.validate(&bearer(&token), TokenKind::Access),
                Err(ChirpyError::IssuerMissing)
            ));
        }
    }

    #[test]
    fn test_malformed_subjects() {
        let service = test_service();
        let cases = [
            serde_json::json!({ "iss": "chirpy-access", "exp": future_exp() }),
            serde_json::json!({ "iss": "chirpy-access", "exp": future_exp(), "sub": 5 }),
            serde_json::json!({ "iss": "chirpy-access", "exp": future_exp(), "sub": "five" }),
            serde_json::json!({ "iss": "chirpy-access", "exp": future_exp(), "sub": "-3" }),
            serde_json::json!({ "iss": "chirpy-access", "exp": future_exp(), "sub": "+7" }),
            serde_json::json!({ "iss": "chirpy-access", "exp": future_exp(), "sub": "007" }),
            serde_json::json!({ "iss": "chirpy-access", "exp": future_exp(), "sub": "" }),
        ];

        for claims in cases {
            let token = sign_raw(&claims);
            assert!(
                matches!(
                    service.validate(&bearer(&token), TokenKind::Access),
                    Err(ChirpyError::SubjectMalformed(_))
                ),
                "claims {claims} should be rejected"
            );
        }
    }

    #[test]
    fn test_wrong_secret() {
        let service1 = test_service();
        let service2 = TokenService::new(TokenConfig::new(
            "different-secret-that-is-at-least-32-characters",
        ))
        .unwrap();

        let token = service1.issue_for(1, TokenKind::Access).unwrap();
        assert!(matches!(
            service2.validate(&bearer(&token), TokenKind::Access),
            Err(ChirpyError::SignatureInvalid(_))
        ));
    }

    #[test]
    fn test_garbage_token() {
        let service = test_service();
        assert!(matches!(
            service.validate("Bearer invalid-token", TokenKind::Access),
            Err(ChirpyError::SignatureInvalid(_))
        ));
    }

    #[test]
    fn test_bearer_prefix_required() {
        let service = test_service();
        let token = service.issue_for(1, TokenKind::Access).unwrap();

        for header in [token.clone(), format!("bearer {token}"), format!("Basic {token}"), String::new()] {
            assert!(matches!(
                service.validate(&header, TokenKind::Access),
                Err(ChirpyError::MalformedAuthHeader)
            ));
        }
    }

    #[test]
    fn test_strip_bearer() {
        assert_eq!(strip_bearer("Bearer abc123").unwrap(), "abc123");
        assert!(strip_bearer("Bearer ").is_err());
        assert!(strip_bearer("abc123").is_err());
    }

    #[test]
    fn test_secret_validation() {
        assert!(TokenService::new(TokenConfig::new("short")).is_err());
        assert!(TokenService::new(TokenConfig::new("")).is_err());
        assert!(TokenService::new(TokenConfig::new("this-secret-is-at-least-32-chars-long")).is_ok());
    }

    #[test]
    fn test_debug_hides_secret() {
        let rendered = format!("{:?}", test_service());
        assert!(!rendered.contains("test-secret"));
    }
}
