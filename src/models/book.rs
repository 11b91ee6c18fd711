use sea_orm::FromQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "book")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub author_id: i32,
    pub genre_id: i32,
    pub release_date: String, // YYYY-MM-DD
    /// Reader currently holding the book. NULL means the book is available.
    pub current_reader: Option<i32>,
    /// Relative path inside the content store
    pub content_path: Option<String>,
    pub cover_path: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::author::Entity",
        from = "Column::AuthorId",
        to = "super::author::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Author,
    #[sea_orm(
        belongs_to = "super::genre::Entity",
        from = "Column::GenreId",
        to = "super::genre::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Genre,
    #[sea_orm(
        belongs_to = "super::reader::Entity",
        from = "Column::CurrentReader",
        to = "super::reader::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    CurrentReader,
    #[sea_orm(has_many = "super::rental_history::Entity")]
    RentalHistory,
    #[sea_orm(has_many = "super::book_load_token::Entity")]
    LoadTokens,
}

impl Related<super::author::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::genre::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Genre.def()
    }
}

impl Related<super::rental_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RentalHistory.def()
    }
}

impl Related<super::book_load_token::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LoadTokens.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_available(&self) -> bool {
        self.current_reader.is_none()
    }
}

// DTO for API responses. Storage paths stay server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: i32,
    pub name: String,
    pub author_id: i32,
    pub genre_id: i32,
    pub release_date: String,
    pub current_reader: Option<i32>,
    pub has_content: bool,
    pub has_cover: bool,
}

impl From<Model> for Book {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            author_id: model.author_id,
            genre_id: model.genre_id,
            release_date: model.release_date,
            current_reader: model.current_reader,
            has_content: model.content_path.is_some(),
            has_cover: model.cover_path.is_some(),
        }
    }
}

/// Row of the catalogue listing: a book joined with its author and genre names.
#[derive(Debug, Clone, Serialize, FromQueryResult)]
pub struct BookListing {
    pub id: i32,
    pub name: String,
    pub author: String,
    pub genre: String,
    pub release_date: String,
    pub current_reader: Option<i32>,
    pub has_cover: bool,
}
