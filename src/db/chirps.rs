//! Chirp operations

use tracing::{debug, info};

use super::{Chirp, ChirpId, Repository, UserId};
use crate::services::clean_chirp_body;
use crate::types::{ChirpyError, Result};

impl Repository {
    /// Validate, mask and store a new chirp
    ///
    /// The length check runs before the store is touched.
    pub fn create_chirp(&self, body: &str, author_id: UserId) -> Result<Chirp> {
        let body = clean_chirp_body(body)?;

        let chirp = self.store().update(|doc| {
            let id = doc.allocate_chirp_id()?;
            let chirp = Chirp {
                id,
                body,
                author_id,
            };
            doc.chirps.insert(id, chirp.clone());
            Ok(chirp)
        })?;

        info!("Created chirp {} for user {}", chirp.id, author_id);
        Ok(chirp)
    }

    /// All chirps; callers sort for presentation
    pub fn list_chirps(&self) -> Result<Vec<Chirp>> {
        self.store()
            .read(|doc| Ok(doc.chirps.values().cloned().collect()))
    }

    pub fn get_chirp(&self, id: ChirpId) -> Result<Chirp> {
        self.store().read(|doc| {
            doc.chirps
                .get(&id)
                .cloned()
                .ok_or_else(|| ChirpyError::NotFound(format!("chirp {}", id)))
        })
    }

    /// Delete a chirp on behalf of `requester_id`, who must be its author
    pub fn delete_chirp(&self, id: ChirpId, requester_id: UserId) -> Result<()> {
        self.store().update(|doc| {
            let chirp = doc
                .chirps
                .get(&id)
                .ok_or_else(|| ChirpyError::NotFound(format!("chirp {}", id)))?;

            if chirp.author_id != requester_id {
                debug!(
                    "User {} tried to delete chirp {} owned by {}",
                    requester_id, id, chirp.author_id
                );
                return Err(ChirpyError::Forbidden(format!(
                    "chirp {} belongs to another user",
                    id
                )));
            }

            doc.chirps.remove(&id);
            Ok(())
        })?;

        info!("Deleted chirp {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::db::test_support::temp_repository;
    use crate::db::Document;
    use crate::types::ChirpyError;

    #[test]
    fn test_create_and_get() {
        let (_dir, repo) = temp_repository();

        let chirp = repo.create_chirp("hello kerfuffle world", 1).unwrap();
        assert_eq!(chirp.id, 1);
        assert_eq!(chirp.body, "hello **** world");
        assert_eq!(chirp.author_id, 1);

        assert_eq!(repo.get_chirp(1).unwrap(), chirp);
        assert!(matches!(repo.get_chirp(2), Err(ChirpyError::NotFound(_))));
    }

    #[test]
    fn test_too_long_body_leaves_store_untouched() {
        let (_dir, repo) = temp_repository();
        let before = repo.store().load().unwrap();

        let result = repo.create_chirp(&"x".repeat(141), 1);
        assert!(matches!(result, Err(ChirpyError::BodyTooLong { .. })));
        assert_eq!(repo.store().load().unwrap(), before);
    }

    #[test]
    fn test_exhausted_id_space_is_an_error() {
        let (_dir, repo) = temp_repository();
        let mut doc = Document::empty();
        doc.next_chirp_id = u64::MAX;
        repo.store().replace(&doc).unwrap();

        assert!(matches!(
            repo.create_chirp("one too many", 1),
            Err(ChirpyError::CorruptStore(_))
        ));
        assert!(repo.list_chirps().unwrap().is_empty());
    }

    #[test]
    fn test_list_chirps() {
        let (_dir, repo) = temp_repository();
        repo.create_chirp("one", 1).unwrap();
        repo.create_chirp("two", 2).unwrap();

        let mut chirps = repo.list_chirps().unwrap();
        chirps.sort_by_key(|c| c.id);
        let bodies: Vec<_> = chirps.iter().map(|c| c.body.as_str()).collect();
        assert_eq!(bodies, vec!["one", "two"]);
    }

    #[test]
    fn test_delete_requires_author() {
        let (_dir, repo) = temp_repository();
        let chirp = repo.create_chirp("mine", 1).unwrap();

        assert!(matches!(
            repo.delete_chirp(chirp.id, 2),
            Err(ChirpyError::Forbidden(_))
        ));
        assert_eq!(repo.get_chirp(chirp.id).unwrap(), chirp);

        repo.delete_chirp(chirp.id, 1).unwrap();
        assert!(matches!(
            repo.get_chirp(chirp.id),
            Err(ChirpyError::NotFound(_))
        ));
        assert!(matches!(
            repo.delete_chirp(chirp.id, 1),
            Err(ChirpyError::NotFound(_))
        ));
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let (_dir, repo) = temp_repository();
        repo.create_chirp("a", 1).unwrap();
        let second = repo.create_chirp("b", 1).unwrap();
        repo.delete_chirp(second.id, 1).unwrap();

        let third = repo.create_chirp("c", 1).unwrap();
        assert_eq!(third.id, 3);
    }
}
