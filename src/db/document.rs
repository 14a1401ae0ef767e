//! Persisted document layout
//!
//! The whole store is one JSON object:
//!
//! ```json
//! {
//!   "chirps": { "1": { "id": 1, "body": "...", "author_id": 1 } },
//!   "users":  { "1": { "id": 1, "email": "...", "password_hash": "...", "is_premium": false } },
//!   "tokens": { "<jwt>": { "token": "<jwt>", "owner_id": 1, "expires_at": 1767225600 } },
//!   "next_chirp_id": 2,
//!   "next_user_id": 2
//! }
//! ```
//!
//! Files written before the id counters existed are accepted; the counters
//! are then derived from the highest key in each collection.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{ChirpyError, Result};

/// User identifier
pub type UserId = u64;

/// Chirp identifier
pub type ChirpId = u64;

/// A registered account
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    /// Argon2 PHC hash; never the plaintext
    pub password_hash: String,
    #[serde(default)]
    pub is_premium: bool,
}

/// A short text post
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Chirp {
    pub id: ChirpId,
    pub body: String,
    pub author_id: UserId,
}

/// A refresh token that has been issued and not yet revoked
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    /// The signed token itself
    pub token: String,
    pub owner_id: UserId,
    /// Expiry of the token (Unix timestamp); absent on records from older files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

/// Full snapshot of the store
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Document {
    pub chirps: BTreeMap<ChirpId, Chirp>,
    pub users: BTreeMap<UserId, User>,
    pub tokens: BTreeMap<String, RefreshTokenRecord>,
    #[serde(default)]
    pub next_chirp_id: ChirpId,
    #[serde(default)]
    pub next_user_id: UserId,
}

impl Document {
    /// An empty store with counters starting at 1
    pub fn empty() -> Self {
        Self {
            next_chirp_id: 1,
            next_user_id: 1,
            ..Default::default()
        }
    }

    /// Bring the id counters up to date with the stored keys
    ///
    /// Counters only ever move forward; an id that was handed out is never
    /// handed out again, even after the entity is deleted. A key at the top
    /// of the id range leaves no room for a counter and is rejected.
    pub(crate) fn normalize(&mut self) -> Result<()> {
        let chirp_floor = next_after(self.chirps.keys().next_back(), "chirp")?;
        let user_floor = next_after(self.users.keys().next_back(), "user")?;
        self.next_chirp_id = self.next_chirp_id.max(chirp_floor);
        self.next_user_id = self.next_user_id.max(user_floor);
        Ok(())
    }

    /// Take the next chirp id
    pub(crate) fn allocate_chirp_id(&mut self) -> Result<ChirpId> {
        self.normalize()?;
        let id = self.next_chirp_id;
        self.next_chirp_id = next_after(Some(&id), "chirp")?;
        Ok(id)
    }

    /// Take the next user id
    pub(crate) fn allocate_user_id(&mut self) -> Result<UserId> {
        self.normalize()?;
        let id = self.next_user_id;
        self.next_user_id = next_after(Some(&id), "user")?;
        Ok(id)
    }

    /// Drop refresh token records that expired before `now`
    ///
    /// Records without an expiry are kept. Returns how many were dropped.
    pub(crate) fn prune_expired_tokens(&mut self, now: i64) -> usize {
        let before = self.tokens.len();
        self.tokens
            .retain(|_, record| record.expires_at.map_or(true, |exp| exp > now));
        before - self.tokens.len()
    }

    /// Whether the snapshot is internally consistent
    ///
    /// Each record's id must match its key.
    pub(crate) fn check_keys(&self) -> std::result::Result<(), String> {
        if let Some((key, chirp)) = self.chirps.iter().find(|(k, c)| **k != c.id) {
            return Err(format!("chirp key {} holds chirp {}", key, chirp.id));
        }
        if let Some((key, user)) = self.users.iter().find(|(k, u)| **k != u.id) {
            return Err(format!("user key {} holds user {}", key, user.id));
        }
        if self.tokens.iter().any(|(k, t)| *k != t.token) {
            return Err("token key does not match its record".to_string());
        }
        Ok(())
    }
}

/// The id following `id`, or 1 when there is none
fn next_after(id: Option<&u64>, what: &str) -> Result<u64> {
    match id {
        None => Ok(1),
        Some(id) => id
            .checked_add(1)
            .ok_or_else(|| ChirpyError::CorruptStore(format!("{} id space exhausted at {}", what, id))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_never_reuses_ids() {
        let mut doc = Document::empty();
        let first = doc.allocate_chirp_id().unwrap();
        doc.chirps.insert(
            first,
            Chirp {
                id: first,
                body: "a".into(),
                author_id: 1,
            },
        );
        let second = doc.allocate_chirp_id().unwrap();
        doc.chirps.remove(&first);

        let third = doc.allocate_chirp_id().unwrap();
        assert_eq!((first, second, third), (1, 2, 3));
    }

    #[test]
    fn test_legacy_layout_without_counters() {
        let json = r#"{
            "chirps": {
                "1": { "id": 1, "body": "one", "author_id": 1 },
                "4": { "id": 4, "body": "four", "author_id": 1 }
            },
            "users": {
                "1": { "id": 1, "email": "a@b.com", "password_hash": "x" }
            },
            "tokens": {}
        }"#;

        let mut doc: Document = serde_json::from_str(json).unwrap();
        assert!(!doc.users[&1].is_premium);
        assert_eq!(doc.allocate_chirp_id().unwrap(), 5);
        assert_eq!(doc.allocate_user_id().unwrap(), 2);
    }

    #[test]
    fn test_missing_collection_is_rejected() {
        let json = r#"{ "chirps": {}, "users": {} }"#;
        assert!(serde_json::from_str::<Document>(json).is_err());
    }

    #[test]
    fn test_mismatched_key_detected() {
        let mut doc = Document::empty();
        doc.users.insert(
            2,
            User {
                id: 3,
                email: "a@b.com".into(),
                password_hash: "x".into(),
                is_premium: false,
            },
        );
        assert!(doc.check_keys().is_err());
    }

    #[test]
    fn test_max_key_rejected() {
        let json = format!(
            r#"{{ "chirps": {{ "{max}": {{ "id": {max}, "body": "x", "author_id": 1 }} }},
                "users": {{}}, "tokens": {{}} }}"#,
            max = u64::MAX
        );
        let mut doc: Document = serde_json::from_str(&json).unwrap();

        assert!(matches!(doc.normalize(), Err(ChirpyError::CorruptStore(_))));
        assert!(matches!(
            doc.allocate_chirp_id(),
            Err(ChirpyError::CorruptStore(_))
        ));
    }

    #[test]
    fn test_exhausted_counter_rejected() {
        let mut doc = Document::empty();
        doc.next_user_id = u64::MAX;

        assert!(doc.normalize().is_ok());
        assert!(matches!(
            doc.allocate_user_id(),
            Err(ChirpyError::CorruptStore(_))
        ));
        assert_eq!(doc.next_user_id, u64::MAX);
    }

    #[test]
    fn test_prune_expired_tokens() {
        let mut doc = Document::empty();
        for (token, expires_at) in [("old", Some(100)), ("new", Some(300)), ("legacy", None)] {
            doc.tokens.insert(
                token.into(),
                RefreshTokenRecord {
                    token: token.into(),
                    owner_id: 1,
                    expires_at,
                },
            );
        }

        assert_eq!(doc.prune_expired_tokens(200), 1);
        let left: Vec<_> = doc.tokens.keys().map(String::as_str).collect();
        assert_eq!(left, vec!["legacy", "new"]);
    }
}
