use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::json;

use crate::api::IdRequest;
use crate::api::error::{ApiJson, ApiPath, ApiResult};
use crate::api::guard::{Admin, RequireRole};
use crate::services::account_service;

#[derive(Deserialize)]
pub struct CreateRoleRequest {
    role: String,
}

#[derive(Deserialize)]
pub struct RenameRoleRequest {
    id: i32,
    role: String,
}

pub async fn list_roles(
    State(db): State<DatabaseConnection>,
    _: RequireRole<Admin>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(account_service::list_roles(&db).await?))
}

pub async fn get_role(
    State(db): State<DatabaseConnection>,
    _: RequireRole<Admin>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(account_service::get_role(&db, id).await?))
}

pub async fn create_role(
    State(db): State<DatabaseConnection>,
    _: RequireRole<Admin>,
    ApiJson(payload): ApiJson<CreateRoleRequest>,
) -> ApiResult<impl IntoResponse> {
    let role = account_service::create_role(&db, &payload.role).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

pub async fn rename_role(
    State(db): State<DatabaseConnection>,
    _: RequireRole<Admin>,
    ApiJson(payload): ApiJson<RenameRoleRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(
        account_service::rename_role(&db, payload.id, &payload.role).await?,
    ))
}

pub async fn delete_role(
    State(db): State<DatabaseConnection>,
    _: RequireRole<Admin>,
    ApiJson(payload): ApiJson<IdRequest>,
) -> ApiResult<impl IntoResponse> {
    account_service::delete_role(&db, payload.id).await?;
    Ok(Json(json!({ "message": "Role deleted" })))
}
