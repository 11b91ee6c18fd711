//! Credentials and signed tokens.
//!
//! Three kinds of HS512 JWTs are issued with the same key and told apart by
//! their `token_use` claim: short-lived access tokens, refresh tokens backing
//! a persisted session, and book-load tokens handed out for content delivery.
//! Refresh tokens are only ever stored as SHA-256 digests.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::domain::DomainError;

pub const ACCESS_TOKEN_TTL_SECS: i64 = 60 * 60;
pub const REFRESH_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;
pub const LOAN_TOKEN_TTL_SECS: i64 = 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenUse {
    Access,
    Refresh,
    BookLoad,
}

/// The authenticated caller, as carried by an access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: i32,
    pub name: String,
    pub roles: Vec<String>,
    pub reader_id: Option<i32>,
}

impl AuthUser {
    /// `admin` satisfies every role requirement.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles
            .iter()
            .any(|r| r == role || r == crate::models::role::ROLE_ADMIN)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: i32,
    pub name: String,
    pub roles: Vec<String>,
    pub reader_id: Option<i32>,
    pub token_use: TokenUse,
    pub iat: i64,
    pub exp: i64,
}

impl From<AccessClaims> for AuthUser {
    fn from(claims: AccessClaims) -> Self {
        Self {
            user_id: claims.sub,
            name: claims.name,
            roles: claims.roles,
            reader_id: claims.reader_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: i32,
    pub token_use: TokenUse,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanClaims {
    pub book_id: i32,
    pub token_use: TokenUse,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn hash_password(password: &str) -> Result<String, DomainError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DomainError::Internal(e.to_string()))?
        .to_string();
    Ok(password_hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, DomainError> {
    let parsed_hash =
        PasswordHash::new(password_hash).map_err(|e| DomainError::Internal(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Signing and verification keys derived from the configured secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, DomainError> {
        encode(&Header::new(Algorithm::HS512), claims, &self.encoding)
            .map_err(|e| DomainError::Internal(format!("token signing failed: {}", e)))
    }

    fn verify<T: DeserializeOwned>(&self, token: &str) -> Result<T, DomainError> {
        decode::<T>(token, &self.decoding, &Validation::new(Algorithm::HS512))
            .map(|data| data.claims)
            .map_err(|e| DomainError::Unauthorized(format!("invalid token: {}", e)))
    }

    pub fn issue_access_token(&self, user: &AuthUser) -> Result<String, DomainError> {
        let now = Utc::now();
        self.sign(&AccessClaims {
            sub: user.user_id,
            name: user.name.clone(),
            roles: user.roles.clone(),
            reader_id: user.reader_id,
            token_use: TokenUse::Access,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ACCESS_TOKEN_TTL_SECS)).timestamp(),
        })
    }

    pub fn issue_refresh_token(&self, user_id: i32) -> Result<String, DomainError> {
        let now = Utc::now();
        self.sign(&RefreshClaims {
            sub: user_id,
            token_use: TokenUse::Refresh,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(REFRESH_TOKEN_TTL_SECS)).timestamp(),
        })
    }

    pub fn issue_loan_token(&self, book_id: i32) -> Result<String, DomainError> {
        let now = Utc::now();
        self.sign(&LoanClaims {
            book_id,
            token_use: TokenUse::BookLoad,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(LOAN_TOKEN_TTL_SECS)).timestamp(),
        })
    }

    pub fn verify_access_token(&self, token: &str) -> Result<AuthUser, DomainError> {
        let claims: AccessClaims = self.verify(token)?;
        if claims.token_use != TokenUse::Access {
            return Err(DomainError::Unauthorized("not an access token".into()));
        }
        Ok(claims.into())
    }

    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims, DomainError> {
        let claims: RefreshClaims = self.verify(token)?;
        if claims.token_use != TokenUse::Refresh {
            return Err(DomainError::Unauthorized("not a refresh token".into()));
        }
        Ok(claims)
    }
}
