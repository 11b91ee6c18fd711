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
pub struct CreateGenreRequest {
    name: String,
}

#[derive(Deserialize)]
pub struct UpdateGenreRequest {
    id: i32,
    name: String,
}

pub async fn list_genres(
    State(db): State<DatabaseConnection>,
    _user: AuthUser,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(catalog_service::list_genres(&db).await?))
}

pub async fn get_genre(
    State(db): State<DatabaseConnection>,
    _user: AuthUser,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(catalog_service::get_genre(&db, id).await?))
}

pub async fn create_genre(
    State(db): State<DatabaseConnection>,
    _: RequireRole<Librarian>,
    ApiJson(payload): ApiJson<CreateGenreRequest>,
) -> ApiResult<impl IntoResponse> {
    let genre = catalog_service::create_genre(&db, &payload.name).await?;
    Ok((StatusCode::CREATED, Json(genre)))
}

pub async fn update_genre(
    State(db): State<DatabaseConnection>,
    _: RequireRole<Librarian>,
    ApiJson(payload): ApiJson<UpdateGenreRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(
        catalog_service::update_genre(&db, payload.id, &payload.name).await?,
    ))
}

pub async fn delete_genre(
    State(db): State<DatabaseConnection>,
    _: RequireRole<Librarian>,
    ApiJson(payload): ApiJson<IdRequest>,
) -> ApiResult<impl IntoResponse> {
    catalog_service::delete_genre(&db, payload.id).await?;
    Ok(Json(json!({ "message": "Genre deleted" })))
}
