use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::json;

use crate::api::IdRequest;
use crate::api::error::{ApiJson, ApiPath, ApiResult};
use crate::api::guard::{Librarian, RequireRole};
use crate::infrastructure::auth::AuthUser;
use crate::services::catalog_service;

#[derive(Deserialize)]
pub struct CreateAuthorRequest {
    name: String,
}

#[derive(Deserialize)]
pub struct UpdateAuthorRequest {
    id: i32,
    name: String,
}

pub async fn list_authors(
    State(db): State<DatabaseConnection>,
    _user: AuthUser,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(catalog_service::list_authors(&db).await?))
}

pub async fn get_author(
    State(db): State<DatabaseConnection>,
    _user: AuthUser,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(catalog_service::get_author(&db, id).await?))
}

pub async fn create_author(
    State(db): State<DatabaseConnection>,
    _: RequireRole<Librarian>,
    ApiJson(payload): ApiJson<CreateAuthorRequest>,
) -> ApiResult<impl IntoResponse> {
    let author = catalog_service::create_author(&db, &payload.name).await?;
    Ok((StatusCode::CREATED, Json(author)))
}

pub async fn update_author(
    State(db): State<DatabaseConnection>,
    _: RequireRole<Librarian>,
    ApiJson(payload): ApiJson<UpdateAuthorRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(
        catalog_service::update_author(&db, payload.id, &payload.name).await?,
    ))
}

pub async fn delete_author(
    State(db): State<DatabaseConnection>,
    _: RequireRole<Librarian>,
    ApiJson(payload): ApiJson<IdRequest>,
) -> ApiResult<impl IntoResponse> {
    catalog_service::delete_author(&db, payload.id).await?;
    Ok(Json(json!({ "message": "Author deleted" })))
}
