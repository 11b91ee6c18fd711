use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::DatabaseConnection;
use serde_json::json;

use crate::api::IdRequest;
use crate::api::error::{ApiJson, ApiPath, ApiResult};
use crate::api::guard::{Admin, RequireRole};
use crate::services::account_service::{self, NewUser, UserUpdate};

pub async fn list_users(
    State(db): State<DatabaseConnection>,
    _: RequireRole<Admin>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(account_service::list_users(&db).await?))
}

pub async fn get_user(
    State(db): State<DatabaseConnection>,
    _: RequireRole<Admin>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(account_service::get_user(&db, id).await?))
}

pub async fn create_user(
    State(db): State<DatabaseConnection>,
    _: RequireRole<Admin>,
    ApiJson(payload): ApiJson<NewUser>,
) -> ApiResult<impl IntoResponse> {
    let user = account_service::create_user(&db, payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(db): State<DatabaseConnection>,
    _: RequireRole<Admin>,
    ApiJson(payload): ApiJson<UserUpdate>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(account_service::update_user(&db, payload).await?))
}

pub async fn delete_user(
    State(db): State<DatabaseConnection>,
    admin: RequireRole<Admin>,
    ApiJson(payload): ApiJson<IdRequest>,
) -> ApiResult<impl IntoResponse> {
    account_service::delete_user(&db, payload.id).await?;
    tracing::info!("User {} deleted by {}", payload.id, admin.user().name);
    Ok(Json(json!({ "message": "User deleted" })))
}
