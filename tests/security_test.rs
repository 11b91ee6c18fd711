mod common;

use axum::http::StatusCode;
use common::*;
use library_rental::infrastructure::auth::{hash_password, verify_password};
use library_rental::models::session;
use library_rental::seed;
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;

#[tokio::test]
async fn test_password_hashing() {
    let password = "super_secret_password";
    let hash = hash_password(password).unwrap();

    assert_ne!(password, hash);
    assert!(verify_password(password, &hash).unwrap());
    assert!(!verify_password("wrong_password", &hash).unwrap());
}

#[tokio::test]
async fn test_login_flow() {
    let t = TestApp::new().await;
    create_account(t.db(), "marta", "correct-horse", &["librarian"], None).await;

    let (status, body) = t
        .send(json_request(
            "POST",
            "/login",
            None,
            json!({ "username": "marta", "password": "correct-horse" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let access = body["access_token"].as_str().unwrap();
    assert!(body["refresh_token"].as_str().is_some());

    let (status, _) = t.send(get_request("/api/authors", Some(access))).await;
    assert_eq!(status, StatusCode::OK);

    // Stored digest, not the token itself
    let sessions = session::Entity::find().all(t.db()).await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_ne!(sessions[0].refresh_token_hash, body["refresh_token"].as_str().unwrap());

    let (status, body) = t
        .send(json_request(
            "POST",
            "/login",
            None,
            json!({ "username": "marta", "password": "wrong" }),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_CREDENTIALS");

    let (status, _) = t
        .send(json_request(
            "POST",
            "/login",
            None,
            json!({ "username": "nobody", "password": "correct-horse" }),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let t = TestApp::new().await;

    let (status, body) = t.send(get_request("/api/books", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = t.send(get_request("/api/books", Some("not.a.jwt"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = t.send(get_request("/logout", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_token_is_not_an_access_token() {
    let t = TestApp::new().await;
    create_account(t.db(), "marta", "correct-horse", &["librarian"], None).await;
    let (_, body) = t
        .send(json_request(
            "POST",
            "/login",
            None,
            json!({ "username": "marta", "password": "correct-horse" }),
        ))
        .await;
    let refresh = body["refresh_token"].as_str().unwrap().to_string();

    let (status, _) = t.send(get_request("/api/authors", Some(&refresh))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = t
        .send(json_request(
            "POST",
            "/refresh",
            None,
            json!({ "refresh_token": refresh }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["refresh_token"], refresh);
    let access = body["access_token"].as_str().unwrap();
    let (status, _) = t.send(get_request("/api/authors", Some(access))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_logout_ends_sessions() {
    let t = TestApp::new().await;
    create_account(t.db(), "marta", "correct-horse", &["reader"], None).await;
    let login = json!({ "username": "marta", "password": "correct-horse" });
    let (_, first) = t.send(json_request("POST", "/login", None, login.clone())).await;
    t.send(json_request("POST", "/login", None, login)).await;
    assert_eq!(session::Entity::find().count(t.db()).await.unwrap(), 2);

    let access = first["access_token"].as_str().unwrap();
    let (status, body) = t.send(get_request("/logout", Some(access))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sessions_ended"], 2);
    assert_eq!(session::Entity::find().count(t.db()).await.unwrap(), 0);

    let (status, _) = t
        .send(json_request(
            "POST",
            "/refresh",
            None,
            json!({ "refresh_token": first["refresh_token"] }),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Nothing left to end
    let (status, _) = t.send(get_request("/logout", Some(access))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_role_policies() {
    let t = TestApp::new().await;
    let reader_token = t.login_as("rita", &["reader"], None).await;
    let librarian_token = t.login_as("lena", &["librarian"], None).await;
    let admin_token = t.login_as("root", &["admin"], None).await;

    // Catalogue reads: any authenticated user
    let (status, _) = t.send(get_request("/api/genres", Some(&reader_token))).await;
    assert_eq!(status, StatusCode::OK);

    // Catalogue writes: librarian
    let new_genre = json!({ "name": "Poetry" });
    let (status, body) = t
        .send(json_request("POST", "/api/genres", Some(&reader_token), new_genre.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
    let (status, _) = t
        .send(json_request("POST", "/api/genres", Some(&librarian_token), new_genre))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // Accounts: admin only
    let (status, _) = t.send(get_request("/api/users", Some(&librarian_token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = t.send(get_request("/api/users", Some(&admin_token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);
    assert!(body[0].get("password_hash").is_none());

    // Admin satisfies librarian routes
    let (status, _) = t
        .send(json_request("POST", "/api/genres", Some(&admin_token), json!({ "name": "Drama" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_bootstrap_admin_cannot_be_deleted() {
    let t = TestApp::new().await;
    seed::ensure_admin(t.db(), "admin-password").await.unwrap();
    // Idempotent
    assert!(!seed::ensure_admin(t.db(), "admin-password").await.unwrap());

    let (_, body) = t
        .send(json_request(
            "POST",
            "/login",
            None,
            json!({ "username": "admin", "password": "admin-password" }),
        ))
        .await;
    let admin = body["access_token"].as_str().unwrap().to_string();

    let (status, body) = t
        .send(json_request("DELETE", "/api/users", Some(&admin), json!({ "id": 1 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = t
        .send(json_request(
            "POST",
            "/api/users",
            Some(&admin),
            json!({ "name": "lena", "password": "pw-lena" }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["roles"], json!(["reader"]));
    let lena = body["id"].as_i64().unwrap();

    let (status, body) = t
        .send(json_request(
            "PUT",
            "/api/users",
            Some(&admin),
            json!({ "id": lena, "roles": ["librarian", "reader"] }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["roles"], json!(["librarian", "reader"]));

    let (status, _) = t
        .send(json_request("DELETE", "/api/users", Some(&admin), json!({ "id": lena })))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_role_management() {
    let t = TestApp::new().await;
    let admin = t.login_as("root", &["admin"], None).await;

    let (status, body) = t
        .send(json_request("POST", "/api/roles", Some(&admin), json!({ "role": "archivist" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let archivist = body["id"].as_i64().unwrap();

    let (status, _) = t
        .send(json_request("POST", "/api/roles", Some(&admin), json!({ "role": "archivist" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    create_account(t.db(), "arch", "pw", &["archivist"], None).await;
    let (status, _) = t
        .send(json_request("DELETE", "/api/roles", Some(&admin), json!({ "id": archivist })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Built-in roles stay
    let (status, _) = t
        .send(json_request("PUT", "/api/roles", Some(&admin), json!({ "id": 1, "role": "boss" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = t.send(get_request("/api/roles", Some(&admin))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_reader_link_kept_or_cleared() {
    let t = TestApp::new().await;
    let admin = t.login_as("root", &["admin"], None).await;
    let reader = create_reader(t.db(), "Ada").await;

    let (status, body) = t
        .send(json_request(
            "POST",
            "/api/users",
            Some(&admin),
            json!({ "name": "ada", "password": "pw-ada", "reader_id": reader }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let ada = body["id"].as_i64().unwrap();

    // Field left out: link stays
    let (status, body) = t
        .send(json_request(
            "PUT",
            "/api/users",
            Some(&admin),
            json!({ "id": ada, "password": "pw-ada-2" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reader_id"], reader);

    // Explicit null: link removed
    let (status, body) = t
        .send(json_request(
            "PUT",
            "/api/users",
            Some(&admin),
            json!({ "id": ada, "reader_id": null }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["reader_id"].is_null());

    let (status, _) = t
        .send(json_request(
            "PUT",
            "/api/users",
            Some(&admin),
            json!({ "id": ada, "reader_id": 999 }),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
