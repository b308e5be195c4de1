use std::time::{Duration, SystemTime, UNIX_EPOCH};

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, ParamsBuilder, Version};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::types::{AuthenticatedUser, CatalogError, DocumentId, Role, User};

const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// JWT payload: who the bearer is and what they may do
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    id: DocumentId,
    role: Role,
    exp: u64,
}

/// Result of a successful login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub role: Role,
}

/// Password hashing (argon2id) and HS256 token issuance.
pub struct Authenticator {
    argon2: Argon2<'static>,
    encoding: EncodingKey,
    decoding: DecodingKey,
    token_ttl: Duration,
}

impl Authenticator {
    pub fn new(secret: &[u8]) -> Self {
        Self::with_params(secret, Params::default())
    }

    /// Custom argon2 cost, e.g. cheaper hashing outside production.
    pub fn with_cost(secret: &[u8], m_cost: u32, t_cost: u32) -> Result<Self, CatalogError> {
        let params = ParamsBuilder::new()
            .m_cost(m_cost)
            .t_cost(t_cost)
            .p_cost(1)
            .build()
            .map_err(|err| CatalogError::Crypto(err.to_string()))?;
        Ok(Self::with_params(secret, params))
    }

    fn with_params(secret: &[u8], params: Params) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            token_ttl: DEFAULT_TOKEN_TTL,
        }
    }

    pub fn token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    pub fn hash_password(&self, password: &str) -> Result<String, CatalogError> {
        let mut salt = [0u8; 16];
        rand::rng().fill(&mut salt);
        let salt =
            SaltString::encode_b64(&salt).map_err(|err| CatalogError::Crypto(err.to_string()))?;

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| CatalogError::Crypto(err.to_string()))
    }

    /// False for a wrong password and for a hash that cannot be parsed.
    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        PasswordHash::new(hash)
            .map(|parsed| {
                self.argon2
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }

    pub fn issue_token(&self, user: &User) -> Result<String, CatalogError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let claims = Claims {
            id: user.id,
            role: user.role,
            exp: now + self.token_ttl.as_secs(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|err| CatalogError::Crypto(err.to_string()))
    }

    pub fn verify_token(&self, token: &str) -> Result<AuthenticatedUser, CatalogError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| CatalogError::InvalidToken)?;
        Ok(AuthenticatedUser {
            id: data.claims.id,
            role: data.claims.role,
        })
    }
}
