use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde_json::json;

use crate::api::IdRequest;
use crate::api::error::{ApiError, ApiJson, ApiPath, ApiQuery, ApiResult};
use crate::api::guard::{Librarian, RequireRole};
use crate::domain::DomainError;
use crate::infrastructure::AppState;
use crate::infrastructure::auth::AuthUser;
use crate::models::Book;
use crate::services::book_service::{self, BookFilter, BookUpdate, NewBook, Upload};

pub async fn list_books(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiQuery(filter): ApiQuery<BookFilter>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(book_service::list_books(state.db(), &filter).await?))
}

pub async fn get_book(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<impl IntoResponse> {
    let book: Book = book_service::get_book(state.db(), id).await?.into();
    Ok(Json(book))
}

pub async fn get_cover(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<impl IntoResponse> {
    let bytes = book_service::load_cover(state.db(), state.store.as_ref(), id).await?;
    Ok(([(header::CONTENT_TYPE, "image/jpeg")], bytes))
}

fn parse_id(raw: &str, field: &str) -> Result<i32, DomainError> {
    raw.trim()
        .parse()
        .map_err(|_| DomainError::Validation(format!("{} must be an integer", field)))
}

fn missing(field: &str) -> ApiError {
    ApiError(DomainError::Validation(format!("missing field '{}'", field)))
}

/// Collect the form fields of a new book. Unknown fields are ignored.
async fn read_new_book(mut multipart: Multipart) -> Result<NewBook, ApiError> {
    let mut name = None;
    let mut author_id = None;
    let mut genre_id = None;
    let mut release_date = None;
    let mut content = None;
    let mut cover = None;

    while let Some(field) = multipart.next_field().await? {
        let Some(field_name) = field.name().map(str::to_owned) else {
            continue;
        };
        match field_name.as_str() {
            "book" | "image" => {
                let filename = field.file_name().map(str::to_owned).ok_or_else(|| {
                    ApiError(DomainError::Validation(format!(
                        "'{}' must be a file upload",
                        field_name
                    )))
                })?;
                let upload = Upload {
                    filename,
                    bytes: field.bytes().await?.to_vec(),
                };
                if field_name == "book" {
                    content = Some(upload);
                } else {
                    cover = Some(upload);
                }
            }
            "name" => name = Some(field.text().await?),
            "author_id" => author_id = Some(parse_id(&field.text().await?, "author_id")?),
            "genre_id" => genre_id = Some(parse_id(&field.text().await?, "genre_id")?),
            "release_date" => release_date = Some(field.text().await?),
            other => tracing::debug!("Ignoring multipart field '{}'", other),
        }
    }

    Ok(NewBook {
        name: name.ok_or_else(|| missing("name"))?,
        author_id: author_id.ok_or_else(|| missing("author_id"))?,
        genre_id: genre_id.ok_or_else(|| missing("genre_id"))?,
        release_date: release_date.ok_or_else(|| missing("release_date"))?,
        content: content.ok_or_else(|| missing("book"))?,
        cover: cover.ok_or_else(|| missing("image"))?,
    })
}

pub async fn create_book(
    State(state): State<AppState>,
    _: RequireRole<Librarian>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<impl IntoResponse> {
    let new = read_new_book(multipart?).await?;
    let book = book_service::create_book(state.db(), state.store.as_ref(), new).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

pub async fn update_book(
    State(state): State<AppState>,
    _: RequireRole<Librarian>,
    ApiJson(payload): ApiJson<BookUpdate>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(book_service::update_book(state.db(), payload).await?))
}

pub async fn delete_book(
    State(state): State<AppState>,
    _: RequireRole<Librarian>,
    ApiJson(payload): ApiJson<IdRequest>,
) -> ApiResult<impl IntoResponse> {
    book_service::delete_book(state.db(), state.store.as_ref(), payload.id).await?;
    Ok(Json(json!({ "message": "Book deleted" })))
}
