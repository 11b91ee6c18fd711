use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::api::error::{ApiJson, ApiResult};
use crate::api::guard::{Librarian, RequireRole};
use crate::services::rental_service::{self, HistoryQuery};

#[derive(Deserialize)]
pub struct RentRequest {
    pub book_id: i32,
    #[serde(alias = "current_reader")]
    pub reader_id: i32,
}

#[derive(Deserialize)]
pub struct ReturnRequest {
    pub book_id: i32,
}

pub async fn rent_book(
    State(db): State<DatabaseConnection>,
    _: RequireRole<Librarian>,
    ApiJson(payload): ApiJson<RentRequest>,
) -> ApiResult<impl IntoResponse> {
    let rental = rental_service::rent_book(&db, payload.reader_id, payload.book_id).await?;
    Ok((StatusCode::CREATED, Json(rental)))
}

pub async fn return_book(
    State(db): State<DatabaseConnection>,
    _: RequireRole<Librarian>,
    ApiJson(payload): ApiJson<ReturnRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(rental_service::return_book(&db, payload.book_id).await?))
}

pub async fn rental_history(
    State(db): State<DatabaseConnection>,
    _: RequireRole<Librarian>,
    ApiJson(query): ApiJson<HistoryQuery>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(rental_service::show_history(&db, &query).await?))
}
