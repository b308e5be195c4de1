use std::sync::{Mutex, MutexGuard};

use super::types::{Assignment, CatalogError, User, Video};

/// Create/find operations the catalog needs from a document store.
pub trait DocumentStore: Send + Sync {
    fn insert_user(&self, user: User) -> Result<User, CatalogError>;

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, CatalogError>;

    fn insert_video(&self, video: Video) -> Result<Video, CatalogError>;

    fn videos(&self) -> Result<Vec<Video>, CatalogError>;

    fn insert_assignment(&self, assignment: Assignment) -> Result<Assignment, CatalogError>;

    fn assignments(&self) -> Result<Vec<Assignment>, CatalogError>;
}

#[derive(Debug, Default)]
struct Collections {
    users: Vec<User>,
    videos: Vec<Video>,
    assignments: Vec<Assignment>,
}

/// In-process store. Collections keep insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>, CatalogError> {
        self.collections
            .lock()
            .map_err(|_| CatalogError::StoreUnavailable)
    }
}

impl DocumentStore for MemoryStore {
    fn insert_user(&self, user: User) -> Result<User, CatalogError> {
        self.lock()?.users.push(user.clone());
        Ok(user)
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, CatalogError> {
        Ok(self
            .lock()?
            .users
            .iter()
            .find(|user| user.email == email)
            .cloned())
    }

    fn insert_video(&self, video: Video) -> Result<Video, CatalogError> {
        self.lock()?.videos.push(video.clone());
        Ok(video)
    }

    fn videos(&self) -> Result<Vec<Video>, CatalogError> {
        Ok(self.lock()?.videos.clone())
    }

    fn insert_assignment(&self, assignment: Assignment) -> Result<Assignment, CatalogError> {
        self.lock()?.assignments.push(assignment.clone());
        Ok(assignment)
    }

    fn assignments(&self) -> Result<Vec<Assignment>, CatalogError> {
        Ok(self.lock()?.assignments.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::{DocumentId, Role};

    fn user(email: &str) -> User {
        User {
            id: DocumentId::generate(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            role: Role::Student,
        }
    }

    #[test]
    fn find_user_by_email() {
        let store = MemoryStore::new();
        let alice = store.insert_user(user("alice@example.com")).unwrap();
        store.insert_user(user("bob@example.com")).unwrap();

        assert_eq!(
            store.find_user_by_email("alice@example.com").unwrap(),
            Some(alice)
        );
        assert_eq!(store.find_user_by_email("carol@example.com").unwrap(), None);
    }

    #[test]
    fn videos_keep_insertion_order() {
        let store = MemoryStore::new();
        for n in 0..3 {
            store
                .insert_video(Video {
                    id: DocumentId::generate(),
                    url: format!("/uploads/{}", n),
                    uploaded_by: None,
                })
                .unwrap();
        }

        let urls: Vec<String> = store.videos().unwrap().into_iter().map(|v| v.url).collect();
        assert_eq!(urls, vec!["/uploads/0", "/uploads/1", "/uploads/2"]);
        assert!(store.assignments().unwrap().is_empty());
    }
}
