//! Auth Service - credentials, sessions and token refresh

use sea_orm::*;
use serde::Serialize;

use crate::domain::DomainError;
use crate::infrastructure::auth::{AuthUser, TokenKeys, hash_refresh_token, verify_password};
use crate::models::{role, session, user};
use crate::utils::time::now_timestamp;

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Check a name/password pair. Unknown names and wrong passwords are
/// indistinguishable to the caller.
pub async fn authenticate(
    db: &DatabaseConnection,
    name: &str,
    password: &str,
) -> Result<user::Model, DomainError> {
    let user = user::Entity::find()
        .filter(user::Column::Name.eq(name))
        .one(db)
        .await?
        .ok_or(DomainError::InvalidCredentials)?;

    if !verify_password(password, &user.password_hash)? {
        return Err(DomainError::InvalidCredentials);
    }
    Ok(user)
}

/// Identity carried in access tokens: the user plus its role names.
pub async fn load_identity(
    db: &DatabaseConnection,
    user: &user::Model,
) -> Result<AuthUser, DomainError> {
    let roles = user
        .find_related(role::Entity)
        .order_by_asc(role::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(|r| r.role)
        .collect();

    Ok(AuthUser {
        user_id: user.id,
        name: user.name.clone(),
        roles,
        reader_id: user.reader_id,
    })
}

pub async fn start_session(
    db: &DatabaseConnection,
    user_id: i32,
    refresh_token: &str,
) -> Result<session::Model, DomainError> {
    Ok(session::ActiveModel {
        user_id: Set(user_id),
        refresh_token_hash: Set(hash_refresh_token(refresh_token)),
        created_at: Set(now_timestamp()),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

pub async fn login(
    db: &DatabaseConnection,
    tokens: &TokenKeys,
    name: &str,
    password: &str,
) -> Result<TokenPair, DomainError> {
    let user = match authenticate(db, name, password).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!("Failed login attempt for '{}'", name);
            return Err(e);
        }
    };
    let identity = load_identity(db, &user).await?;

    let access_token = tokens.issue_access_token(&identity)?;
    let refresh_token = tokens.issue_refresh_token(user.id)?;
    start_session(db, user.id, &refresh_token).await?;

    tracing::info!("User {} logged in", user.id);
    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

/// Issue a fresh access token for a live session. The refresh token is
/// returned unchanged.
pub async fn refresh(
    db: &DatabaseConnection,
    tokens: &TokenKeys,
    refresh_token: &str,
) -> Result<TokenPair, DomainError> {
    let claims = tokens.verify_refresh_token(refresh_token)?;

    let session = session::Entity::find()
        .filter(session::Column::RefreshTokenHash.eq(hash_refresh_token(refresh_token)))
        .one(db)
        .await?
        .ok_or_else(|| DomainError::Unauthorized("session not found".into()))?;
    if session.user_id != claims.sub {
        return Err(DomainError::Unauthorized("session not found".into()));
    }

    let user = user::Entity::find_by_id(session.user_id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::Unauthorized("account no longer exists".into()))?;
    let identity = load_identity(db, &user).await?;

    Ok(TokenPair {
        access_token: tokens.issue_access_token(&identity)?,
        refresh_token: refresh_token.to_string(),
    })
}

/// End every session of a user. Returns the number of sessions removed.
pub async fn logout(db: &DatabaseConnection, user_id: i32) -> Result<u64, DomainError> {
    let res = session::Entity::delete_many()
        .filter(session::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    if res.rows_affected == 0 {
        return Err(DomainError::not_found("Session"));
    }
    tracing::info!("User {} logged out ({} sessions)", user_id, res.rows_affected);
    Ok(res.rows_affected)
}
