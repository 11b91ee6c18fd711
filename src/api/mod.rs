pub mod auth;
pub mod author;
pub mod books;
pub mod error;
pub mod genre;
pub mod guard;
pub mod loan;
pub mod reader;
pub mod rental;
pub mod role;
pub mod user;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use serde::Deserialize;

use crate::infrastructure::AppState;

/// Body of the PUT/DELETE-by-id endpoints
#[derive(Debug, Deserialize)]
pub struct IdRequest {
    pub id: i32,
}

pub fn api_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    let protected = Router::new()
        // Catalogue
        .route(
            "/api/authors",
            get(author::list_authors)
                .post(author::create_author)
                .put(author::update_author)
                .delete(author::delete_author),
        )
        .route("/api/authors/:id", get(author::get_author))
        .route(
            "/api/genres",
            get(genre::list_genres)
                .post(genre::create_genre)
                .put(genre::update_genre)
                .delete(genre::delete_genre),
        )
        .route("/api/genres/:id", get(genre::get_genre))
        .route(
            "/api/readers",
            get(reader::list_readers)
                .post(reader::create_reader)
                .put(reader::update_reader)
                .delete(reader::delete_reader),
        )
        .route("/api/readers/:id", get(reader::get_reader))
        .route(
            "/api/books",
            get(books::list_books)
                .post(books::create_book)
                .put(books::update_book)
                .delete(books::delete_book)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/books/:id", get(books::get_book))
        .route("/api/books/:id/cover", get(books::get_cover))
        // Rentals
        .route("/api/rentbook", post(rental::rent_book))
        .route("/api/returnbook", post(rental::return_book))
        .route("/api/rentalhistory", post(rental::rental_history))
        .route("/take-book", post(loan::take_book))
        .route("/load-book", post(loan::load_book))
        // Accounts
        .route(
            "/api/users",
            get(user::list_users)
                .post(user::create_user)
                .put(user::update_user)
                .delete(user::delete_user),
        )
        .route("/api/users/:id", get(user::get_user))
        .route(
            "/api/roles",
            get(role::list_roles)
                .post(role::create_role)
                .put(role::rename_role)
                .delete(role::delete_role),
        )
        .route("/api/roles/:id", get(role::get_role))
        .route("/logout", get(auth::logout))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            guard::require_access_token,
        ));

    Router::new()
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .merge(protected)
        .with_state(state)
}
