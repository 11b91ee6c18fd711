use axum::{Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;

use crate::api::error::{ApiJson, ApiResult};
use crate::infrastructure::AppState;
use crate::infrastructure::auth::AuthUser;
use crate::services::auth_service;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let pair =
        auth_service::login(state.db(), &state.tokens, &payload.username, &payload.password).await?;
    Ok(Json(pair))
}

pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RefreshRequest>,
) -> ApiResult<impl IntoResponse> {
    let pair = auth_service::refresh(state.db(), &state.tokens, &payload.refresh_token).await?;
    Ok(Json(pair))
}

pub async fn logout(State(state): State<AppState>, user: AuthUser) -> ApiResult<impl IntoResponse> {
    let ended = auth_service::logout(state.db(), user.user_id).await?;
    Ok(Json(json!({ "message": "Logged out", "sessions_ended": ended })))
}
