//! Classroom records: users, lecture videos and assignments

mod auth;
mod service;
mod store;
mod types;
mod uploads;

pub use auth::{Authenticator, Session};
pub use service::Catalog;
pub use store::{DocumentStore, MemoryStore};
pub use types::{Assignment, AuthenticatedUser, CatalogError, DocumentId, Role, User, Video};
pub use uploads::{ASSIGNMENT_MOUNT, StoredFile, VIDEO_MOUNT};
