//! Catalog Service - authors, genres and readers
//!
//! Deletes are conditional: the row is only removed while nothing references
//! it, checked in the same statement as the delete.
#![allow(clippy::needless_update)] // SeaORM ActiveModels require ..Default::default()

use sea_orm::sea_query::Expr;
use sea_orm::*;
use serde::Deserialize;

use crate::domain::DomainError;
use crate::models::{author, book, genre, reader, rental_history};
use crate::services::validate::{constraint_error, date, required_text};
use crate::utils::time::today;

#[derive(Debug, Clone, Deserialize)]
pub struct ReaderInput {
    pub name: String,
    pub birth_date: String,
}

/// Report why a conditional delete removed nothing.
async fn explain_blocked_delete<E>(
    db: &DatabaseConnection,
    id: i32,
    what: &str,
    reason: &str,
) -> Result<(), DomainError>
where
    E: EntityTrait,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i32>,
{
    match E::find_by_id(id).one(db).await? {
        None => Err(DomainError::not_found(what)),
        Some(_) => Err(DomainError::Conflict(reason.to_string())),
    }
}

// ---- Authors

pub async fn list_authors(db: &DatabaseConnection) -> Result<Vec<author::Model>, DomainError> {
    Ok(author::Entity::find()
        .order_by_asc(author::Column::Id)
        .all(db)
        .await?)
}

pub async fn get_author(db: &DatabaseConnection, id: i32) -> Result<author::Model, DomainError> {
    author::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Author"))
}

pub async fn create_author(db: &DatabaseConnection, name: &str) -> Result<author::Model, DomainError> {
    let model = author::ActiveModel {
        name: Set(required_text(name, "name")?),
        ..Default::default()
    }
    .insert(db)
    .await?;
    tracing::info!("Created author {} ({})", model.id, model.name);
    Ok(model)
}

pub async fn update_author(
    db: &DatabaseConnection,
    id: i32,
    name: &str,
) -> Result<author::Model, DomainError> {
    let name = required_text(name, "name")?;
    let mut active: author::ActiveModel = get_author(db, id).await?.into();
    active.name = Set(name);
    Ok(active.update(db).await?)
}

pub async fn delete_author(db: &DatabaseConnection, id: i32) -> Result<(), DomainError> {
    let referenced = book::Entity::find()
        .select_only()
        .column(book::Column::Id)
        .filter(book::Column::AuthorId.eq(id))
        .into_query();

    let res = author::Entity::delete_many()
        .filter(author::Column::Id.eq(id))
        .filter(Expr::exists(referenced).not())
        .exec(db)
        .await?;

    if res.rows_affected == 0 {
        return explain_blocked_delete::<author::Entity>(
            db,
            id,
            "Author",
            "author is referenced by at least one book",
        )
        .await;
    }
    tracing::info!("Deleted author {}", id);
    Ok(())
}

// ---- Genres

pub async fn list_genres(db: &DatabaseConnection) -> Result<Vec<genre::Model>, DomainError> {
    Ok(genre::Entity::find()
        .order_by_asc(genre::Column::Id)
        .all(db)
        .await?)
}

pub async fn get_genre(db: &DatabaseConnection, id: i32) -> Result<genre::Model, DomainError> {
    genre::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Genre"))
}

pub async fn create_genre(db: &DatabaseConnection, name: &str) -> Result<genre::Model, DomainError> {
    let name = required_text(name, "name")?;
    let model = genre::ActiveModel {
        name: Set(name.clone()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| constraint_error(e, format!("genre '{}' already exists", name)))?;
    tracing::info!("Created genre {} ({})", model.id, model.name);
    Ok(model)
}

pub async fn update_genre(
    db: &DatabaseConnection,
    id: i32,
    name: &str,
) -> Result<genre::Model, DomainError> {
    let name = required_text(name, "name")?;
    let mut active: genre::ActiveModel = get_genre(db, id).await?.into();
    active.name = Set(name.clone());
    active
        .update(db)
        .await
        .map_err(|e| constraint_error(e, format!("genre '{}' already exists", name)))
}

pub async fn delete_genre(db: &DatabaseConnection, id: i32) -> Result<(), DomainError> {
    let referenced = book::Entity::find()
        .select_only()
        .column(book::Column::Id)
        .filter(book::Column::GenreId.eq(id))
        .into_query();

    let res = genre::Entity::delete_many()
        .filter(genre::Column::Id.eq(id))
        .filter(Expr::exists(referenced).not())
        .exec(db)
        .await?;

    if res.rows_affected == 0 {
        return explain_blocked_delete::<genre::Entity>(
            db,
            id,
            "Genre",
            "genre is referenced by at least one book",
        )
        .await;
    }
    tracing::info!("Deleted genre {}", id);
    Ok(())
}

// ---- Readers

pub async fn list_readers(db: &DatabaseConnection) -> Result<Vec<reader::Model>, DomainError> {
    Ok(reader::Entity::find()
        .order_by_asc(reader::Column::Id)
        .all(db)
        .await?)
}

pub async fn get_reader(db: &DatabaseConnection, id: i32) -> Result<reader::Model, DomainError> {
    reader::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Reader"))
}

/// Register a reader. The registration date is always today.
pub async fn create_reader(
    db: &DatabaseConnection,
    input: ReaderInput,
) -> Result<reader::Model, DomainError> {
    let model = reader::ActiveModel {
        name: Set(required_text(&input.name, "name")?),
        birth_date: Set(date(&input.birth_date, "birth_date")?),
        registration_date: Set(today()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    tracing::info!("Registered reader {} ({})", model.id, model.name);
    Ok(model)
}

pub async fn update_reader(
    db: &DatabaseConnection,
    id: i32,
    input: ReaderInput,
) -> Result<reader::Model, DomainError> {
    let name = required_text(&input.name, "name")?;
    let birth_date = date(&input.birth_date, "birth_date")?;

    let mut active: reader::ActiveModel = get_reader(db, id).await?.into();
    active.name = Set(name);
    active.birth_date = Set(birth_date);
    Ok(active.update(db).await?)
}

/// Remove a reader who holds no book and has no rental history.
///
/// Returned loans still count: history rows keep a reference to the reader, so
/// anyone who ever rented a book cannot be deleted and gets `Conflict`.
pub async fn delete_reader(db: &DatabaseConnection, id: i32) -> Result<(), DomainError> {
    let holding = book::Entity::find()
        .select_only()
        .column(book::Column::Id)
        .filter(book::Column::CurrentReader.eq(id))
        .into_query();
    let history = rental_history::Entity::find()
        .select_only()
        .column(rental_history::Column::Id)
        .filter(rental_history::Column::ReaderId.eq(id))
        .into_query();

    let res = reader::Entity::delete_many()
        .filter(reader::Column::Id.eq(id))
        .filter(Expr::exists(holding).not())
        .filter(Expr::exists(history).not())
        .exec(db)
        .await?;

    if res.rows_affected == 0 {
        return explain_blocked_delete::<reader::Entity>(
            db,
            id,
            "Reader",
            "reader holds a book or has rental history",
        )
        .await;
    }
    tracing::info!("Deleted reader {}", id);
    Ok(())
}
