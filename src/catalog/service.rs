use tracing::{debug, info};

use super::auth::{Authenticator, Session};
use super::store::DocumentStore;
use super::types::{Assignment, AuthenticatedUser, CatalogError, DocumentId, Role, User, Video};
use super::uploads::{ASSIGNMENT_MOUNT, StoredFile, VIDEO_MOUNT};

/// Users, recorded lectures and assignments of one classroom deployment.
pub struct Catalog<S> {
    store: S,
    auth: Authenticator,
}

impl<S: DocumentStore> Catalog<S> {
    pub fn new(store: S, auth: Authenticator) -> Self {
        Self { store, auth }
    }

    /// Create an account, storing only the password hash.
    pub fn signup(&self, email: &str, password: &str, role: Role) -> Result<User, CatalogError> {
        let password_hash = self.auth.hash_password(password)?;
        let user = self.store.insert_user(User {
            id: DocumentId::generate(),
            email: email.to_string(),
            password_hash,
            role,
        })?;
        info!("User {} registered as {:?}", user.id, user.role);
        Ok(user)
    }

    /// Check credentials and issue a token. Unknown email and wrong password
    /// fail the same way.
    pub fn login(&self, email: &str, password: &str) -> Result<Session, CatalogError> {
        let Some(user) = self.store.find_user_by_email(email)? else {
            debug!("Login for unknown email");
            return Err(CatalogError::InvalidCredentials);
        };
        if !self.auth.verify_password(password, &user.password_hash) {
            debug!("Wrong password for user {}", user.id);
            return Err(CatalogError::InvalidCredentials);
        }

        let token = self.auth.issue_token(&user)?;
        info!("User {} logged in", user.id);
        Ok(Session {
            token,
            role: user.role,
        })
    }

    /// Resolve a bearer token to the identity it was issued for.
    pub fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, CatalogError> {
        self.auth.verify_token(token)
    }

    pub fn find_user(&self, email: &str) -> Result<Option<User>, CatalogError> {
        self.store.find_user_by_email(email)
    }

    /// Record an uploaded video. Anonymous uploads are kept with no uploader.
    pub fn record_video(
        &self,
        file: Option<StoredFile>,
        uploader: Option<&AuthenticatedUser>,
    ) -> Result<Video, CatalogError> {
        let file = file.ok_or(CatalogError::NoFileUploaded)?;
        let video = self.store.insert_video(Video {
            id: DocumentId::generate(),
            url: file.url_under(VIDEO_MOUNT),
            uploaded_by: uploader.map(|user| user.id),
        })?;
        info!("Video {} stored at {}", video.id, video.url);
        Ok(video)
    }

    pub fn videos(&self) -> Result<Vec<Video>, CatalogError> {
        self.store.videos()
    }

    /// Create an assignment with no attached file.
    pub fn add_assignment(
        &self,
        title: &str,
        description: Option<&str>,
        deadline: Option<&str>,
    ) -> Result<Assignment, CatalogError> {
        self.store.insert_assignment(Assignment {
            id: DocumentId::generate(),
            title: title.to_string(),
            description: description.map(str::to_string),
            deadline: deadline.map(str::to_string),
            url: None,
        })
    }

    /// Create an assignment backed by an uploaded file.
    pub fn attach_assignment(
        &self,
        title: &str,
        deadline: Option<&str>,
        file: Option<StoredFile>,
    ) -> Result<Assignment, CatalogError> {
        let file = file.ok_or(CatalogError::NoFileUploaded)?;
        let assignment = self.store.insert_assignment(Assignment {
            id: DocumentId::generate(),
            title: title.to_string(),
            description: None,
            deadline: deadline.map(str::to_string),
            url: Some(file.url_under(ASSIGNMENT_MOUNT)),
        })?;
        info!("Assignment {} uploaded as {}", assignment.id, file.name());
        Ok(assignment)
    }

    pub fn assignments(&self) -> Result<Vec<Assignment>, CatalogError> {
        self.store.assignments()
    }
}
