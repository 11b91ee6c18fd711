//! Loan tokens: time-boxed, single-use credentials for downloading a book.
//!
//! A librarian issues a token for a book; the reader who presents it within
//! the validity window receives the file and becomes the book's current
//! reader in the same step.

use chrono::{Duration, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::*;

use crate::domain::{ContentStore, DomainError};
use crate::infrastructure::auth::{LOAN_TOKEN_TTL_SECS, TokenKeys};
use crate::models::{book, book_load_token};
use crate::services::rental_service::rent_book_in;
use crate::utils::time::{now_timestamp, parse_timestamp};

/// Outcome of a successful redemption.
#[derive(Debug, Clone)]
pub struct Redemption {
    pub book_id: i32,
    pub rental_id: i32,
    pub content: Vec<u8>,
}

/// Sign and persist a load token for a book that has a content file.
pub async fn issue_loan_token(
    db: &DatabaseConnection,
    tokens: &TokenKeys,
    book_id: i32,
) -> Result<String, DomainError> {
    let book = book::Entity::find_by_id(book_id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Book"))?;
    if book.content_path.is_none() {
        return Err(DomainError::not_found("Book content"));
    }

    let token = tokens.issue_loan_token(book_id)?;
    book_load_token::ActiveModel {
        book_id: Set(book_id),
        token: Set(token.clone()),
        created_at: Set(now_timestamp()),
        redeemed_at: Set(None),
        redeemed_by: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!("Issued load token for book {}", book_id);
    Ok(token)
}

/// Exchange a load token for the book content, renting the book to `reader_id`.
///
/// The token row is only marked as used when the rent succeeds, so a token
/// presented for a book that is on loan can be retried after the return.
pub async fn redeem_loan_token(
    db: &DatabaseConnection,
    store: &dyn ContentStore,
    token: &str,
    reader_id: i32,
) -> Result<Redemption, DomainError> {
    let row = book_load_token::Entity::find()
        .filter(book_load_token::Column::Token.eq(token))
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Loan token"))?;

    let issued_at = parse_timestamp(&row.created_at)?;
    if Utc::now() - issued_at > Duration::seconds(LOAN_TOKEN_TTL_SECS) {
        tracing::debug!("Load token {} presented after expiry", row.id);
        return Err(DomainError::Expired("Loan token".into()));
    }
    if row.redeemed_at.is_some() {
        return Err(DomainError::Conflict("loan token has already been used".into()));
    }

    let book = book::Entity::find_by_id(row.book_id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("Book"))?;
    let path = book
        .content_path
        .ok_or_else(|| DomainError::not_found("Book content"))?;
    let content = store.load(&path).await?;

    let txn = db.begin().await?;
    let rental = rent_book_in(&txn, reader_id, book.id).await?;
    let marked = book_load_token::Entity::update_many()
        .col_expr(book_load_token::Column::RedeemedAt, Expr::value(now_timestamp()))
        .col_expr(book_load_token::Column::RedeemedBy, Expr::value(reader_id))
        .filter(book_load_token::Column::Id.eq(row.id))
        .filter(book_load_token::Column::RedeemedAt.is_null())
        .exec(&txn)
        .await?;
    if marked.rows_affected == 0 {
        return Err(DomainError::Conflict("loan token has already been used".into()));
    }
    txn.commit().await?;

    tracing::info!(
        "Load token {} redeemed: book {} delivered to reader {}",
        row.id,
        book.id,
        reader_id
    );
    Ok(Redemption {
        book_id: book.id,
        rental_id: rental.id,
        content,
    })
}
