use std::fmt;

use rand::Rng;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Catalog errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("no file uploaded")]
    NoFileUploaded,

    #[error("document store unavailable")]
    StoreUnavailable,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("crypto error: {0}")]
    Crypto(String),
}

const DOCUMENT_ID_LEN: usize = 24;
const HEX_CHARS: &[u8] = b"0123456789abcdef";

/// Document ID: 24 lowercase hex characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId {
    bytes: [u8; DOCUMENT_ID_LEN],
}

impl DocumentId {
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let mut bytes = [0u8; DOCUMENT_ID_LEN];
        for byte in &mut bytes {
            *byte = HEX_CHARS[rng.random_range(0..HEX_CHARS.len())];
        }
        Self { bytes }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let src = s.as_bytes();
        if src.len() != DOCUMENT_ID_LEN || !src.iter().all(|b| HEX_CHARS.contains(b)) {
            return None;
        }
        let mut bytes = [0u8; DOCUMENT_ID_LEN];
        bytes.copy_from_slice(src);
        Some(Self { bytes })
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.bytes).unwrap_or("")
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DocumentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DocumentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        DocumentId::parse(&s)
            .ok_or_else(|| D::Error::custom(format!("invalid document id: {:?}", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Teacher,
    Student,
}

/// Identity handed to the catalog by whatever authenticated the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: DocumentId,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: DocumentId,
    pub email: String,
    /// argon2id PHC string
    pub password_hash: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub id: DocumentId,
    pub url: String,
    pub uploaded_by: Option<DocumentId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: DocumentId,
    pub title: String,
    pub description: Option<String>,
    pub deadline: Option<String>,
    pub url: Option<String>,
}
