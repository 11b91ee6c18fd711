use axum::{Json, extract::State, response::IntoResponse};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde_json::json;

use crate::api::error::{ApiJson, ApiResult};
use crate::api::guard::{Librarian, RequireRole};
use crate::domain::DomainError;
use crate::infrastructure::AppState;
use crate::infrastructure::auth::AuthUser;
use crate::services::loan_token_service;

#[derive(Deserialize)]
pub struct TakeBookRequest {
    pub book_id: i32,
}

#[derive(Deserialize)]
pub struct LoadBookRequest {
    pub token: String,
}

pub async fn take_book(
    State(state): State<AppState>,
    _: RequireRole<Librarian>,
    ApiJson(payload): ApiJson<TakeBookRequest>,
) -> ApiResult<impl IntoResponse> {
    let token =
        loan_token_service::issue_loan_token(state.db(), &state.tokens, payload.book_id).await?;
    Ok(Json(json!({ "token": token })))
}

/// Deliver the book behind a load token to the caller's reader record.
pub async fn load_book(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<LoadBookRequest>,
) -> ApiResult<impl IntoResponse> {
    let reader_id = user.reader_id.ok_or_else(|| {
        DomainError::Validation("this account is not linked to a reader".into())
    })?;

    let redemption = loan_token_service::redeem_loan_token(
        state.db(),
        state.store.as_ref(),
        &payload.token,
        reader_id,
    )
    .await?;

    Ok(Json(json!({
        "book_id": redemption.book_id,
        "rental_id": redemption.rental_id,
        "content": STANDARD.encode(&redemption.content),
    })))
}
