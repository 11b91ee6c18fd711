//! Request authentication and role policies.
//!
//! [`require_access_token`] runs before every protected route and stores the
//! verified [`AuthUser`] in the request extensions. Handlers then pick it up
//! either directly or through [`RequireRole`], which also checks a role.

use std::marker::PhantomData;

use axum::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::{HeaderMap, header, request::Parts};
use axum::middleware::Next;
use axum::response::Response;

use crate::api::error::ApiError;
use crate::domain::DomainError;
use crate::infrastructure::AppState;
use crate::infrastructure::auth::AuthUser;
use crate::models::role::{ROLE_ADMIN, ROLE_LIBRARIAN};

fn bearer_token(headers: &HeaderMap) -> Result<&str, DomainError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| DomainError::Unauthorized("missing Authorization header".into()))?;

    match value.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(DomainError::Unauthorized(
            "Authorization header must be 'Bearer <token>'".into(),
        )),
    }
}

/// Middleware: reject the request with 401 unless it carries a valid access token.
pub async fn require_access_token(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = state.tokens.verify_access_token(bearer_token(req.headers())?)?;
    tracing::debug!("Authenticated user {} for {}", user.user_id, req.uri().path());
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError(DomainError::Unauthorized("not authenticated".into())))
    }
}

/// A role a route requires.
pub trait RolePolicy: Send + Sync + 'static {
    const ROLE: &'static str;
}

pub struct Librarian;

impl RolePolicy for Librarian {
    const ROLE: &'static str = ROLE_LIBRARIAN;
}

pub struct Admin;

impl RolePolicy for Admin {
    const ROLE: &'static str = ROLE_ADMIN;
}

/// The authenticated user, guaranteed to hold `P::ROLE` (or `admin`).
/// Rejects with 403 otherwise.
pub struct RequireRole<P: RolePolicy>(pub AuthUser, PhantomData<P>);

impl<P: RolePolicy> RequireRole<P> {
    pub fn user(&self) -> &AuthUser {
        &self.0
    }
}

#[async_trait]
impl<S, P> FromRequestParts<S> for RequireRole<P>
where
    S: Send + Sync,
    P: RolePolicy,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.has_role(P::ROLE) {
            tracing::warn!("User {} lacks role '{}'", user.user_id, P::ROLE);
            return Err(ApiError(DomainError::Forbidden(format!(
                "{} role required",
                P::ROLE
            ))));
        }
        Ok(RequireRole(user, PhantomData))
    }
}
