use crate::domain::DomainError;
use crate::infrastructure::auth::hash_password;
use crate::models::{author, genre, reader, role, user, user_role};
use crate::utils::time::{now_timestamp, today};
use sea_orm::*;

/// Create the built-in roles that are missing.
pub async fn ensure_roles(db: &DatabaseConnection) -> Result<(), DbErr> {
    for name in role::BUILTIN_ROLES {
        role::Entity::insert(role::ActiveModel {
            role: Set(name.to_owned()),
            ..Default::default()
        })
        .on_conflict(
            sea_orm::sea_query::OnConflict::column(role::Column::Role)
                .do_nothing()
                .to_owned(),
        )
        .do_nothing()
        .exec(db)
        .await?;
    }
    Ok(())
}

/// Create the `admin` account with the admin role unless it already exists.
/// Returns true when the account was created.
pub async fn ensure_admin(db: &DatabaseConnection, password: &str) -> Result<bool, DomainError> {
    let existing = user::Entity::find()
        .filter(user::Column::Name.eq("admin"))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(false);
    }

    let admin_role = role::Entity::find()
        .filter(role::Column::Role.eq(role::ROLE_ADMIN))
        .one(db)
        .await?
        .ok_or_else(|| DomainError::Internal("admin role missing".into()))?;

    let now = now_timestamp();
    let txn = db.begin().await?;
    let admin = user::ActiveModel {
        name: Set("admin".to_owned()),
        password_hash: Set(hash_password(password)?),
        reader_id: Set(None),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    user_role::ActiveModel {
        user_id: Set(admin.id),
        role_id: Set(admin_role.id),
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    tracing::info!("Created bootstrap admin account (id {})", admin.id);
    Ok(true)
}

/// Demo catalogue. Skipped when authors already exist.
pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    if author::Entity::find().count(db).await? > 0 {
        tracing::debug!("Catalogue not empty, skipping demo data");
        return Ok(());
    }

    let authors = vec!["Ursula K. Le Guin", "Isaac Asimov", "Frank Herbert"];
    for name in authors {
        author::ActiveModel {
            name: Set(name.to_owned()),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    let genres = vec!["Fantasy", "Science Fiction", "Classic"];
    for name in genres {
        genre::Entity::insert(genre::ActiveModel {
            name: Set(name.to_owned()),
            ..Default::default()
        })
        .on_conflict(
            sea_orm::sea_query::OnConflict::column(genre::Column::Name)
                .do_nothing()
                .to_owned(),
        )
        .do_nothing()
        .exec(db)
        .await?;
    }

    let readers = vec![("Ada Reader", "1990-04-12"), ("Tomas Page", "1985-11-30")];
    for (name, birth_date) in readers {
        reader::ActiveModel {
            name: Set(name.to_owned()),
            birth_date: Set(birth_date.to_owned()),
            registration_date: Set(today()),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    Ok(())
}
