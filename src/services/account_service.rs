//! Account Service - user accounts and roles
#![allow(clippy::needless_update)] // SeaORM ActiveModels require ..Default::default()

use sea_orm::sea_query::Expr;
use sea_orm::*;
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::DomainError;
use crate::infrastructure::auth::hash_password;
use crate::models::{reader, role, user, user_role};
use crate::services::validate::{constraint_error, required_text};
use crate::utils::time::now_timestamp;

/// The bootstrap administrator account
pub const PROTECTED_USER_ID: i32 = 1;

#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: i32,
    pub name: String,
    pub reader_id: Option<i32>,
    pub roles: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub password: String,
    pub reader_id: Option<i32>,
    /// Role names; `reader` when absent
    pub roles: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserUpdate {
    pub id: i32,
    pub password: Option<String>,
    /// Absent keeps the link, `null` unlinks the reader
    #[serde(default, deserialize_with = "present")]
    pub reader_id: Option<Option<i32>>,
    /// Replaces the whole role set when present
    pub roles: Option<Vec<String>>,
}

// Keeps an explicit `null` apart from a missing field.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

async fn view<C: ConnectionTrait>(conn: &C, model: user::Model) -> Result<UserView, DomainError> {
    let roles = model
        .find_related(role::Entity)
        .order_by_asc(role::Column::Id)
        .all(conn)
        .await?
        .into_iter()
        .map(|r| r.role)
        .collect();
    Ok(UserView {
        id: model.id,
        name: model.name,
        reader_id: model.reader_id,
        roles,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

async fn ensure_reader<C: ConnectionTrait>(conn: &C, reader_id: Option<i32>) -> Result<(), DomainError> {
    if let Some(id) = reader_id
        && reader::Entity::find_by_id(id).one(conn).await?.is_none()
    {
        return Err(DomainError::not_found("Reader"));
    }
    Ok(())
}

/// Replace the roles of a user with the named ones. Unknown names are rejected.
async fn assign_roles<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    names: &[String],
) -> Result<(), DomainError> {
    let mut wanted: Vec<&str> = names.iter().map(|n| n.trim()).collect();
    wanted.sort_unstable();
    wanted.dedup();

    let found = role::Entity::find()
        .filter(role::Column::Role.is_in(wanted.iter().copied()))
        .all(conn)
        .await?;
    if found.len() != wanted.len() {
        let unknown: Vec<&str> = wanted
            .iter()
            .copied()
            .filter(|w| !found.iter().any(|r| r.role == *w))
            .collect();
        return Err(DomainError::Validation(format!(
            "unknown roles: {}",
            unknown.join(", ")
        )));
    }

    user_role::Entity::delete_many()
        .filter(user_role::Column::UserId.eq(user_id))
        .exec(conn)
        .await?;
    for r in found {
        user_role::ActiveModel {
            user_id: Set(user_id),
            role_id: Set(r.id),
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

// ---- Users

pub async fn list_users(db: &DatabaseConnection) -> Result<Vec<UserView>, DomainError> {
    let users = user::Entity::find()
        .order_by_asc(user::Column::Id)
        .all(db)
        .await?;
    let mut views = Vec::with_capacity(users.len());
    for u in users {
        views.push(view(db, u).await?);
    }
    Ok(views)
}

pub async fn get_user(db: &DatabaseConnection, id: i32) -> Result<UserView, DomainError> {
    let model = user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("User"))?;
    view(db, model).await
}

pub async fn create_user(db: &DatabaseConnection, new: NewUser) -> Result<UserView, DomainError> {
    let name = required_text(&new.name, "name")?;
    if new.password.is_empty() {
        return Err(DomainError::Validation("password must not be empty".into()));
    }
    let roles = new
        .roles
        .unwrap_or_else(|| vec![role::ROLE_READER.to_string()]);

    let txn = db.begin().await?;
    ensure_reader(&txn, new.reader_id).await?;

    let now = now_timestamp();
    let model = user::ActiveModel {
        name: Set(name.clone()),
        password_hash: Set(hash_password(&new.password)?),
        reader_id: Set(new.reader_id),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| constraint_error(e, format!("user '{}' already exists", name)))?;
    assign_roles(&txn, model.id, &roles).await?;
    let created = view(&txn, model).await?;
    txn.commit().await?;

    tracing::info!("Created user {} ({})", created.id, created.name);
    Ok(created)
}

/// Change password, linked reader and/or roles.
pub async fn update_user(db: &DatabaseConnection, update: UserUpdate) -> Result<UserView, DomainError> {
    let txn = db.begin().await?;
    let existing = user::Entity::find_by_id(update.id)
        .one(&txn)
        .await?
        .ok_or_else(|| DomainError::not_found("User"))?;
    ensure_reader(&txn, update.reader_id.flatten()).await?;

    let mut active: user::ActiveModel = existing.into();
    if let Some(password) = &update.password {
        if password.is_empty() {
            return Err(DomainError::Validation("password must not be empty".into()));
        }
        active.password_hash = Set(hash_password(password)?);
    }
    if let Some(reader_id) = update.reader_id {
        active.reader_id = Set(reader_id);
    }
    active.updated_at = Set(now_timestamp());
    let model = active.update(&txn).await?;

    if let Some(roles) = &update.roles {
        assign_roles(&txn, model.id, roles).await?;
    }
    let updated = view(&txn, model).await?;
    txn.commit().await?;

    tracing::info!("Updated user {}", updated.id);
    Ok(updated)
}

pub async fn delete_user(db: &DatabaseConnection, id: i32) -> Result<(), DomainError> {
    if id == PROTECTED_USER_ID {
        return Err(DomainError::Validation(
            "the bootstrap administrator cannot be deleted".into(),
        ));
    }
    let res = user::Entity::delete_by_id(id).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(DomainError::not_found("User"));
    }
    tracing::info!("Deleted user {}", id);
    Ok(())
}

// ---- Roles

pub async fn list_roles(db: &DatabaseConnection) -> Result<Vec<role::Model>, DomainError> {
    Ok(role::Entity::find()
        .order_by_asc(role::Column::Id)
        .all(db)
        .await?)
}

pub async fn get_role(db: &DatabaseConnection, id: i32) -> Result<role::Model, DomainError> {
    role::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Role"))
}

pub async fn create_role(db: &DatabaseConnection, name: &str) -> Result<role::Model, DomainError> {
    let name = required_text(name, "role")?;
    let model = role::ActiveModel {
        role: Set(name.clone()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| constraint_error(e, format!("role '{}' already exists", name)))?;
    tracing::info!("Created role {} ({})", model.id, model.role);
    Ok(model)
}

fn ensure_not_builtin(model: &role::Model) -> Result<(), DomainError> {
    if role::BUILTIN_ROLES.contains(&model.role.as_str()) {
        return Err(DomainError::Conflict(format!(
            "built-in role '{}' cannot be changed",
            model.role
        )));
    }
    Ok(())
}

pub async fn rename_role(db: &DatabaseConnection, id: i32, name: &str) -> Result<role::Model, DomainError> {
    let name = required_text(name, "role")?;
    let existing = get_role(db, id).await?;
    ensure_not_builtin(&existing)?;

    let mut active: role::ActiveModel = existing.into();
    active.role = Set(name.clone());
    active
        .update(db)
        .await
        .map_err(|e| constraint_error(e, format!("role '{}' already exists", name)))
}

/// Delete a role nobody holds.
pub async fn delete_role(db: &DatabaseConnection, id: i32) -> Result<(), DomainError> {
    let existing = get_role(db, id).await?;
    ensure_not_builtin(&existing)?;

    let assigned = user_role::Entity::find()
        .select_only()
        .column(user_role::Column::UserId)
        .filter(user_role::Column::RoleId.eq(id))
        .into_query();
    let res = role::Entity::delete_many()
        .filter(role::Column::Id.eq(id))
        .filter(Expr::exists(assigned).not())
        .exec(db)
        .await?;
    if res.rows_affected == 0 {
        return Err(DomainError::Conflict(format!(
            "role '{}' is still assigned",
            existing.role
        )));
    }
    tracing::info!("Deleted role {}", id);
    Ok(())
}
