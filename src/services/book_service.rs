//! Book Service - Pure business logic without HTTP layer
//!
//! Books own two stored files: the PDF content and a JPG cover. The files are
//! written to the content store before the row is inserted and removed again
//! if the insert fails.
#![allow(clippy::needless_update)] // SeaORM ActiveModels require ..Default::default()

use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::*;
use serde::Deserialize;

use crate::domain::{ContentKind, ContentStore, DomainError};
use crate::models::book::{self, Entity as BookEntity};
use crate::models::{Book, BookListing, author, book_load_token, genre, rental_history};
use crate::services::validate::{constraint_error, date, required_text};
use crate::utils::time::now_timestamp;

pub const PAGE_SIZE: u64 = 20;

/// Query parameters of the catalogue listing
#[derive(Debug, Default, Clone, Deserialize)]
pub struct BookFilter {
    pub offset: Option<u64>,
    /// `rented` or `free`
    pub status: Option<String>,
    /// `genre` or `author`; book id when absent
    pub order: Option<String>,
    /// Case-insensitive substring of the author name
    pub author: Option<String>,
}

/// An uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct NewBook {
    pub name: String,
    pub author_id: i32,
    pub genre_id: i32,
    pub release_date: String,
    pub content: Upload,
    pub cover: Upload,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookUpdate {
    pub id: i32,
    pub name: Option<String>,
    pub author_id: Option<i32>,
    pub genre_id: Option<i32>,
    pub release_date: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Make `%`, `_` and the escape character itself match literally.
fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// One page of the catalogue with author and genre names resolved.
pub async fn list_books(
    db: &DatabaseConnection,
    filter: &BookFilter,
) -> Result<Vec<BookListing>, DomainError> {
    tracing::debug!(
        "List books - Filters: offset={:?}, status={:?}, order={:?}, author={:?}",
        filter.offset,
        filter.status,
        filter.order,
        filter.author
    );

    let mut query = BookEntity::find()
        .select_only()
        .column(book::Column::Id)
        .column(book::Column::Name)
        .column_as(author::Column::Name, "author")
        .column_as(genre::Column::Name, "genre")
        .column(book::Column::ReleaseDate)
        .column(book::Column::CurrentReader)
        .column_as(book::Column::CoverPath.is_not_null(), "has_cover")
        .join(JoinType::InnerJoin, book::Relation::Author.def())
        .join(JoinType::InnerJoin, book::Relation::Genre.def());

    query = match non_empty(&filter.status) {
        None => query,
        Some("rented") => query.filter(book::Column::CurrentReader.is_not_null()),
        Some("free") => query.filter(book::Column::CurrentReader.is_null()),
        Some(other) => {
            return Err(DomainError::Validation(format!(
                "unknown status '{}', expected 'rented' or 'free'",
                other
            )));
        }
    };

    if let Some(needle) = non_empty(&filter.author) {
        let pattern = format!("%{}%", escape_like(&needle.to_lowercase()));
        query = query.filter(
            Expr::expr(Func::lower(Expr::col((author::Entity, author::Column::Name))))
                .like(LikeExpr::new(pattern).escape('\\')),
        );
    }

    query = match non_empty(&filter.order) {
        None => query,
        Some("genre") => query.order_by_asc(genre::Column::Name),
        Some("author") => query.order_by_asc(author::Column::Name),
        Some(other) => {
            return Err(DomainError::Validation(format!(
                "unknown order '{}', expected 'genre' or 'author'",
                other
            )));
        }
    };

    let books = query
        .order_by_asc(book::Column::Id)
        .limit(PAGE_SIZE)
        .offset(filter.offset.unwrap_or(0))
        .into_model::<BookListing>()
        .all(db)
        .await?;

    Ok(books)
}

pub async fn get_book(db: &DatabaseConnection, id: i32) -> Result<book::Model, DomainError> {
    BookEntity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Book"))
}

async fn ensure_author_and_genre(
    db: &DatabaseConnection,
    author_id: i32,
    genre_id: i32,
) -> Result<(), DomainError> {
    if author::Entity::find_by_id(author_id).one(db).await?.is_none() {
        return Err(DomainError::not_found("Author"));
    }
    if genre::Entity::find_by_id(genre_id).one(db).await?.is_none() {
        return Err(DomainError::not_found("Genre"));
    }
    Ok(())
}

/// Store both files and insert the book.
pub async fn create_book(
    db: &DatabaseConnection,
    store: &dyn ContentStore,
    new: NewBook,
) -> Result<Book, DomainError> {
    let name = required_text(&new.name, "name")?;
    let release_date = date(&new.release_date, "release_date")?;
    ContentKind::BookFile.validate_filename(&new.content.filename)?;
    ContentKind::CoverImage.validate_filename(&new.cover.filename)?;
    if new.content.bytes.is_empty() {
        return Err(DomainError::Validation("book file is empty".into()));
    }
    ensure_author_and_genre(db, new.author_id, new.genre_id).await?;

    let content_path = store.save(ContentKind::BookFile, &new.content.bytes).await?;
    let cover_path = match store.save(ContentKind::CoverImage, &new.cover.bytes).await {
        Ok(path) => path,
        Err(e) => {
            discard_files(store, [Some(content_path)]).await;
            return Err(e);
        }
    };

    let now = now_timestamp();
    let inserted = book::ActiveModel {
        name: Set(name),
        author_id: Set(new.author_id),
        genre_id: Set(new.genre_id),
        release_date: Set(release_date),
        current_reader: Set(None),
        content_path: Set(Some(content_path.clone())),
        cover_path: Set(Some(cover_path.clone())),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await;

    match inserted {
        Ok(model) => {
            tracing::info!("Created book {} ({})", model.id, model.name);
            Ok(model.into())
        }
        Err(e) => {
            discard_files(store, [Some(content_path), Some(cover_path)]).await;
            Err(e.into())
        }
    }
}

/// Change catalogue fields. Loan state is only changed by rent and return.
pub async fn update_book(db: &DatabaseConnection, update: BookUpdate) -> Result<Book, DomainError> {
    let existing = get_book(db, update.id).await?;
    let author_id = update.author_id.unwrap_or(existing.author_id);
    let genre_id = update.genre_id.unwrap_or(existing.genre_id);
    ensure_author_and_genre(db, author_id, genre_id).await?;

    let mut active: book::ActiveModel = existing.into();
    if let Some(name) = &update.name {
        active.name = Set(required_text(name, "name")?);
    }
    if let Some(release_date) = &update.release_date {
        active.release_date = Set(date(release_date, "release_date")?);
    }
    active.author_id = Set(author_id);
    active.genre_id = Set(genre_id);
    active.updated_at = Set(now_timestamp());

    Ok(active.update(db).await?.into())
}

/// Delete a book that is not on loan and was never rented. Its load tokens go
/// with it and its stored files are removed best-effort.
///
/// A book whose loans were all returned is still refused with `Conflict`,
/// because its rental history references it.
pub async fn delete_book(
    db: &DatabaseConnection,
    store: &dyn ContentStore,
    id: i32,
) -> Result<(), DomainError> {
    let existing = get_book(db, id).await?;

    let history = rental_history::Entity::find()
        .select_only()
        .column(rental_history::Column::Id)
        .filter(rental_history::Column::BookId.eq(id))
        .into_query();

    let txn = db.begin().await?;
    book_load_token::Entity::delete_many()
        .filter(book_load_token::Column::BookId.eq(id))
        .exec(&txn)
        .await?;
    let res = BookEntity::delete_many()
        .filter(book::Column::Id.eq(id))
        .filter(book::Column::CurrentReader.is_null())
        .filter(Expr::exists(history).not())
        .exec(&txn)
        .await
        .map_err(|e| constraint_error(e, "book is still referenced"))?;

    if res.rows_affected == 0 {
        // Dropping the transaction rolls the token delete back
        return Err(DomainError::Conflict(
            "book is on loan or has rental history".into(),
        ));
    }
    txn.commit().await?;

    discard_files(store, [existing.content_path, existing.cover_path]).await;
    tracing::info!("Deleted book {}", id);
    Ok(())
}

/// Cover image bytes of a book.
pub async fn load_cover(
    db: &DatabaseConnection,
    store: &dyn ContentStore,
    id: i32,
) -> Result<Vec<u8>, DomainError> {
    let book = get_book(db, id).await?;
    let path = book
        .cover_path
        .ok_or_else(|| DomainError::not_found("Cover image"))?;
    store.load(&path).await
}

async fn discard_files<const N: usize>(store: &dyn ContentStore, paths: [Option<String>; N]) {
    for path in paths.into_iter().flatten() {
        if let Err(e) = store.remove(&path).await {
            tracing::warn!("Failed to remove stored file {}: {}", path, e);
        }
    }
}
