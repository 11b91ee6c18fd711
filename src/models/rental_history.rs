use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One row per loan event. A row is "open" while `return_date` is NULL and
/// there is at most one open row per book.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rental_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub book_id: i32,
    pub reader_id: i32,
    pub rental_date: String,
    pub return_date: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::book::Entity",
        from = "Column::BookId",
        to = "super::book::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Book,
    #[sea_orm(
        belongs_to = "super::reader::Entity",
        from = "Column::ReaderId",
        to = "super::reader::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Reader,
}

impl Related<super::book::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Book.def()
    }
}

impl Related<super::reader::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reader.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_open(&self) -> bool {
        self.return_date.is_none()
    }
}
