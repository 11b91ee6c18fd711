use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::json;

use crate::api::IdRequest;
use crate::api::error::{ApiJson, ApiPath, ApiResult};
use crate::api::guard::{Librarian, RequireRole};
use crate::infrastructure::auth::AuthUser;
use crate::services::catalog_service::{self, ReaderInput};

#[derive(Deserialize)]
pub struct UpdateReaderRequest {
    id: i32,
    #[serde(flatten)]
    fields: ReaderInput,
}

pub async fn list_readers(
    State(db): State<DatabaseConnection>,
    _user: AuthUser,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(catalog_service::list_readers(&db).await?))
}

pub async fn get_reader(
    State(db): State<DatabaseConnection>,
    _user: AuthUser,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(catalog_service::get_reader(&db, id).await?))
}

pub async fn create_reader(
    State(db): State<DatabaseConnection>,
    _: RequireRole<Librarian>,
    ApiJson(payload): ApiJson<ReaderInput>,
) -> ApiResult<impl IntoResponse> {
    let reader = catalog_service::create_reader(&db, payload).await?;
    Ok((StatusCode::CREATED, Json(reader)))
}

pub async fn update_reader(
    State(db): State<DatabaseConnection>,
    _: RequireRole<Librarian>,
    ApiJson(payload): ApiJson<UpdateReaderRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(
        catalog_service::update_reader(&db, payload.id, payload.fields).await?,
    ))
}

pub async fn delete_reader(
    State(db): State<DatabaseConnection>,
    _: RequireRole<Librarian>,
    ApiJson(payload): ApiJson<IdRequest>,
) -> ApiResult<impl IntoResponse> {
    catalog_service::delete_reader(&db, payload.id).await?;
    Ok(Json(json!({ "message": "Reader deleted" })))
}
