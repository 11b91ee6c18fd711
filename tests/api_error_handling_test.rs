mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use common::*;
use http_body_util::BodyExt;
use serde_json::json;
use tower::util::ServiceExt;

const PDF: &[u8] = b"%PDF-1.4 the spice must flow";
const JPG: &[u8] = b"\xFF\xD8\xFF\xE0 cover";

async fn librarian_with_catalogue(t: &TestApp) -> (String, i32, i32) {
    let token = t.login_as("lena", &["librarian"], None).await;
    let author = create_author(t.db(), "Frank Herbert").await;
    let genre = create_genre(t.db(), "Science Fiction").await;
    (token, author, genre)
}

fn book_form<'a>(author: &'a str, genre: &'a str, file: &'a str, image: &'a str) -> Vec<Part<'a>> {
    vec![
        Part { name: "name", filename: None, data: b"Dune" },
        Part { name: "author_id", filename: None, data: author.as_bytes() },
        Part { name: "genre_id", filename: None, data: genre.as_bytes() },
        Part { name: "release_date", filename: None, data: b"1965-08-01" },
        Part { name: "book", filename: Some(file), data: PDF },
        Part { name: "image", filename: Some(image), data: JPG },
    ]
}

#[tokio::test]
async fn test_malformed_json_is_a_validation_error() {
    let t = TestApp::new().await;
    let (token, _, _) = librarian_with_catalogue(&t).await;

    let req = Request::builder()
        .method("POST")
        .uri("/api/authors")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from("{\"name\": "))
        .unwrap();
    let (status, body) = t.send(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = t
        .send(json_request("POST", "/api/authors", Some(&token), json!({ "name": "  " })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = t
        .send(json_request("POST", "/api/rentbook", Some(&token), json!({ "book_id": "one" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_not_found_and_conflict_bodies() {
    let t = TestApp::new().await;
    let (token, author, genre) = librarian_with_catalogue(&t).await;
    let book = create_book(t.db(), "Dune", author, genre, None).await;
    let reader = create_reader(t.db(), "Ada").await;

    let (status, body) = t.send(get_request("/api/authors/999", Some(&token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
    assert_eq!(body["error"], "Author not found");

    let (status, _) = t
        .send(json_request(
            "POST",
            "/api/rentbook",
            Some(&token),
            json!({ "book_id": book, "current_reader": reader }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = t
        .send(json_request(
            "POST",
            "/api/rentbook",
            Some(&token),
            json!({ "book_id": book, "reader_id": reader }),
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, _) = t
        .send(json_request("DELETE", "/api/authors", Some(&token), json!({ "id": author })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = t
        .send(json_request("POST", "/api/returnbook", Some(&token), json!({ "book_id": book })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["return_date"].is_string());
}

#[tokio::test]
async fn test_unknown_listing_parameters() {
    let t = TestApp::new().await;
    let (token, _, _) = librarian_with_catalogue(&t).await;

    let (status, body) = t.send(get_request("/api/books?status=lost", Some(&token))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = t.send(get_request("/api/books?order=price", Some(&token))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = t.send(get_request("/api/books?offset=-1", Some(&token))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_book_upload_rejects_wrong_extensions() {
    let t = TestApp::new().await;
    let (token, author, genre) = librarian_with_catalogue(&t).await;
    let (a, g) = (author.to_string(), genre.to_string());

    let (status, body) = t
        .send(multipart_request("/api/books", &token, &book_form(&a, &g, "dune.epub", "dune.jpg")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = t
        .send(multipart_request("/api/books", &token, &book_form(&a, &g, "dune.pdf", "dune.gif")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Missing cover
    let mut form = book_form(&a, &g, "dune.pdf", "dune.jpg");
    form.pop();
    let (status, body) = t.send(multipart_request("/api/books", &token, &form)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("image"));
}

#[tokio::test]
async fn test_upload_take_and_load_book() {
    let t = TestApp::new().await;
    let (librarian, author, genre) = librarian_with_catalogue(&t).await;
    let reader = create_reader(t.db(), "Ada").await;
    let patron = t.login_as("ada", &["reader"], Some(reader)).await;
    let unlinked = t.login_as("guest", &["reader"], None).await;
    let (a, g) = (author.to_string(), genre.to_string());

    let (status, book) = t
        .send(multipart_request("/api/books", &librarian, &book_form(&a, &g, "Dune.PDF", "cover.jpg")))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let book_id = book["id"].as_i64().unwrap();
    assert_eq!(book["has_content"], true);

    // Cover is served as JPEG
    let response = t
        .app
        .clone()
        .oneshot(get_request(&format!("/api/books/{}/cover", book_id), Some(&patron)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], JPG);

    // Only librarians issue tokens
    let (status, _) = t
        .send(json_request("POST", "/take-book", Some(&patron), json!({ "book_id": book_id })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = t
        .send(json_request("POST", "/take-book", Some(&librarian), json!({ "book_id": book_id })))
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, _) = t
        .send(json_request("POST", "/load-book", Some(&unlinked), json!({ "token": token })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = t
        .send(json_request("POST", "/load-book", Some(&patron), json!({ "token": token })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["book_id"], book_id);
    let content = STANDARD.decode(body["content"].as_str().unwrap()).unwrap();
    assert_eq!(content, PDF);

    let (_, listed) = t
        .send(get_request(&format!("/api/books/{}", book_id), Some(&patron)))
        .await;
    assert_eq!(listed["current_reader"], reader);

    let (status, body) = t
        .send(json_request("POST", "/load-book", Some(&patron), json!({ "token": token })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn test_expired_load_token_is_gone() {
    use chrono::{Duration, Utc};
    use library_rental::models::book_load_token;
    use library_rental::utils::time::format_timestamp;
    use sea_orm::sea_query::Expr;
    use sea_orm::EntityTrait;

    let t = TestApp::new().await;
    let (librarian, author, genre) = librarian_with_catalogue(&t).await;
    let reader = create_reader(t.db(), "Ada").await;
    let patron = t.login_as("ada", &["reader"], Some(reader)).await;
    let book = create_book(t.db(), "Dune", author, genre, Some("books/dune.pdf")).await;

    let (_, body) = t
        .send(json_request("POST", "/take-book", Some(&librarian), json!({ "book_id": book })))
        .await;
    let token = body["token"].as_str().unwrap().to_string();

    book_load_token::Entity::update_many()
        .col_expr(
            book_load_token::Column::CreatedAt,
            Expr::value(format_timestamp(Utc::now() - Duration::minutes(61))),
        )
        .exec(t.db())
        .await
        .unwrap();

    let (status, body) = t
        .send(json_request("POST", "/load-book", Some(&patron), json!({ "token": token })))
        .await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["code"], "EXPIRED");
    assert!(find_book(t.db(), book).await.current_reader.is_none());
}
