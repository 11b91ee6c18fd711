#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use library_rental::config::Config;
use library_rental::infrastructure::AppState;
use library_rental::models::book;
use library_rental::services::account_service::{self, NewUser};
use library_rental::services::auth_service;
use library_rental::services::catalog_service::{self, ReaderInput};
use library_rental::utils::time::now_timestamp;
use library_rental::{db, seed, server};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use serde_json::Value;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

pub const BOUNDARY: &str = "----library-test-boundary";

pub async fn setup_test_db() -> DatabaseConnection {
    let db = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");
    seed::ensure_roles(&db).await.expect("Failed to seed roles");
    db
}

/// A database file under `dir`, so the pool hands out several connections.
pub async fn setup_file_db(dir: &std::path::Path) -> DatabaseConnection {
    let url = format!("sqlite://{}?mode=rwc", dir.join("library.db").display());
    let db = db::init_db(&url).await.expect("Failed to init DB");
    seed::ensure_roles(&db).await.expect("Failed to seed roles");
    db
}

pub async fn create_author(db: &DatabaseConnection, name: &str) -> i32 {
    catalog_service::create_author(db, name)
        .await
        .expect("Failed to create author")
        .id
}

pub async fn create_genre(db: &DatabaseConnection, name: &str) -> i32 {
    catalog_service::create_genre(db, name)
        .await
        .expect("Failed to create genre")
        .id
}

pub async fn create_reader(db: &DatabaseConnection, name: &str) -> i32 {
    catalog_service::create_reader(
        db,
        ReaderInput {
            name: name.to_string(),
            birth_date: "1990-01-01".to_string(),
        },
    )
    .await
    .expect("Failed to create reader")
    .id
}

/// Insert a book row directly. `content_path` is relative to the content store.
pub async fn create_book(
    db: &DatabaseConnection,
    name: &str,
    author_id: i32,
    genre_id: i32,
    content_path: Option<&str>,
) -> i32 {
    let now = now_timestamp();
    book::ActiveModel {
        name: Set(name.to_string()),
        author_id: Set(author_id),
        genre_id: Set(genre_id),
        release_date: Set("1965-08-01".to_string()),
        current_reader: Set(None),
        content_path: Set(content_path.map(str::to_string)),
        cover_path: Set(None),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create book")
    .id
}

pub async fn find_book(db: &DatabaseConnection, id: i32) -> book::Model {
    book::Entity::find_by_id(id)
        .one(db)
        .await
        .expect("query failed")
        .expect("book missing")
}

pub async fn create_account(
    db: &DatabaseConnection,
    name: &str,
    password: &str,
    roles: &[&str],
    reader_id: Option<i32>,
) -> i32 {
    account_service::create_user(
        db,
        NewUser {
            name: name.to_string(),
            password: password.to_string(),
            reader_id,
            roles: Some(roles.iter().map(|r| r.to_string()).collect()),
        },
    )
    .await
    .expect("Failed to create account")
    .id
}

/// Router over an in-memory database with the content store in a temp dir.
pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub storage: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let db = setup_test_db().await;
        let storage = tempfile::tempdir().expect("tempdir");
        let state = AppState::new(db, Config::for_tests(storage.path()));
        let app = server::build_router(state.clone());
        Self { app, state, storage }
    }

    pub fn db(&self) -> &DatabaseConnection {
        self.state.db()
    }

    /// Access token for an existing account, without going through /login.
    pub async fn token_for(&self, user_id: i32) -> String {
        let user = library_rental::models::user::Entity::find_by_id(user_id)
            .one(self.db())
            .await
            .unwrap()
            .unwrap();
        let identity = auth_service::load_identity(self.db(), &user).await.unwrap();
        self.state.tokens.issue_access_token(&identity).unwrap()
    }

    /// Create an account with the given roles and return its access token.
    pub async fn login_as(&self, name: &str, roles: &[&str], reader_id: Option<i32>) -> String {
        let id = create_account(self.db(), name, "password123", roles, reader_id).await;
        self.token_for(id).await
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

/// One multipart part: field name, optional filename, content.
pub struct Part<'a> {
    pub name: &'a str,
    pub filename: Option<&'a str>,
    pub data: &'a [u8],
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part.filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                    part.name, filename
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name).as_bytes(),
            ),
        }
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_request(uri: &str, token: &str, parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}
