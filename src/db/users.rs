//! User operations
//!
//! Email uniqueness is checked with an exact, case-sensitive comparison.
//! `A@b.com` and `a@b.com` are different accounts; callers that want
//! case-folding must normalise before calling in.

use tracing::info;

use super::{Document, Repository, User, UserId};
use crate::types::{ChirpyError, Result};

fn ensure_email_free(doc: &Document, email: &str, except: Option<UserId>) -> Result<()> {
    let taken = doc
        .users
        .values()
        .any(|u| u.email == email && Some(u.id) != except);
    if taken {
        return Err(ChirpyError::AlreadyExists(format!(
            "a user with email {} already exists",
            email
        )));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    if !email.contains('@') {
        return Err(ChirpyError::InvalidEmail(email.to_string()));
    }
    Ok(())
}

impl Repository {
    /// Store a new user; `password_hash` must already be hashed
    pub fn create_user(&self, email: &str, password_hash: &str) -> Result<User> {
        validate_email(email)?;

        let user = self.store().update(|doc| {
            ensure_email_free(doc, email, None)?;

            let id = doc.allocate_user_id()?;
            let user = User {
                id,
                email: email.to_string(),
                password_hash: password_hash.to_string(),
                is_premium: false,
            };
            doc.users.insert(id, user.clone());
            Ok(user)
        })?;

        info!("Created user {}", user.id);
        Ok(user)
    }

    /// Replace the email and password hash of an existing user
    ///
    /// The premium flag is kept as is.
    pub fn update_user(&self, id: UserId, email: &str, password_hash: &str) -> Result<User> {
        validate_email(email)?;

        let user = self.store().update(|doc| {
            ensure_email_free(doc, email, Some(id))?;

            let user = doc
                .users
                .get_mut(&id)
                .ok_or_else(|| ChirpyError::NotFound(format!("user {}", id)))?;
            user.email = email.to_string();
            user.password_hash = password_hash.to_string();
            Ok(user.clone())
        })?;

        info!("Updated user {}", id);
        Ok(user)
    }

    /// Mark a user as premium; upgrading twice is a no-op
    pub fn upgrade_user(&self, id: UserId) -> Result<User> {
        self.store().update(|doc| {
            let user = doc
                .users
                .get_mut(&id)
                .ok_or_else(|| ChirpyError::NotFound(format!("user {}", id)))?;
            if !user.is_premium {
                info!("Upgrading user {} to premium", id);
                user.is_premium = true;
            }
            Ok(user.clone())
        })
    }

    pub fn get_user(&self, id: UserId) -> Result<User> {
        self.store().read(|doc| {
            doc.users
                .get(&id)
                .cloned()
                .ok_or_else(|| ChirpyError::NotFound(format!("user {}", id)))
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<User> {
        self.store().read(|doc| {
            doc.users
                .values()
                .find(|u| u.email == email)
                .cloned()
                .ok_or_else(|| ChirpyError::NotFound(format!("user with email {}", email)))
        })
    }

    /// All users; order unspecified
    pub fn list_users(&self) -> Result<Vec<User>> {
        self.store()
            .read(|doc| Ok(doc.users.values().cloned().collect()))
    }
}
