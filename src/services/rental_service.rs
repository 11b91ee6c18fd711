//! Rental Service - rent and return transitions and the rental history
//!
//! A book's `current_reader` and its open `rental_history` row always change
//! together inside one transaction.

use chrono::{NaiveDate, NaiveTime};
use sea_orm::sea_query::Expr;
use sea_orm::*;
use serde::Deserialize;

use crate::domain::DomainError;
use crate::models::{book, reader, rental_history};
use crate::utils::time::{format_timestamp, now_timestamp, parse_timestamp};

/// Bounds of a history query. Each accepts `YYYY-MM-DD` or an RFC 3339
/// timestamp; a bare date covers the whole day.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryQuery {
    pub rental_date_from: String,
    pub rental_date_to: String,
    pub return_date_from: String,
    pub return_date_to: String,
}

/// Lend `book_id` to `reader_id` in its own transaction.
pub async fn rent_book(
    db: &DatabaseConnection,
    reader_id: i32,
    book_id: i32,
) -> Result<rental_history::Model, DomainError> {
    let txn = db.begin().await?;
    let rental = rent_book_in(&txn, reader_id, book_id).await?;
    txn.commit().await?;

    tracing::info!("Book {} rented by reader {}", book_id, reader_id);
    Ok(rental)
}

/// Rent inside a caller-owned transaction. The availability check and the
/// assignment are one conditional update, so of two concurrent rents only
/// one can succeed.
pub async fn rent_book_in<C: ConnectionTrait>(
    conn: &C,
    reader_id: i32,
    book_id: i32,
) -> Result<rental_history::Model, DomainError> {
    if reader::Entity::find_by_id(reader_id).one(conn).await?.is_none() {
        return Err(DomainError::not_found("Reader"));
    }

    let now = now_timestamp();
    let res = book::Entity::update_many()
        .col_expr(book::Column::CurrentReader, Expr::value(reader_id))
        .col_expr(book::Column::UpdatedAt, Expr::value(now.clone()))
        .filter(book::Column::Id.eq(book_id))
        .filter(book::Column::CurrentReader.is_null())
        .exec(conn)
        .await?;

    if res.rows_affected == 0 {
        return match book::Entity::find_by_id(book_id).one(conn).await? {
            None => Err(DomainError::not_found("Book")),
            Some(_) => Err(DomainError::Conflict(format!(
                "book {} is already on loan",
                book_id
            ))),
        };
    }

    let rental = rental_history::ActiveModel {
        book_id: Set(book_id),
        reader_id: Set(reader_id),
        rental_date: Set(now),
        return_date: Set(None),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    Ok(rental)
}

/// Close the latest open rental of a book and make the book available again.
pub async fn return_book(
    db: &DatabaseConnection,
    book_id: i32,
) -> Result<rental_history::Model, DomainError> {
    let txn = db.begin().await?;

    let open = rental_history::Entity::find()
        .filter(rental_history::Column::BookId.eq(book_id))
        .filter(rental_history::Column::ReturnDate.is_null())
        .order_by_desc(rental_history::Column::RentalDate)
        .one(&txn)
        .await?;

    let Some(open) = open else {
        return match book::Entity::find_by_id(book_id).one(&txn).await? {
            None => Err(DomainError::not_found("Book")),
            Some(_) => Err(DomainError::not_found(format!(
                "Open rental for book {}",
                book_id
            ))),
        };
    };

    let now = now_timestamp();
    let mut active: rental_history::ActiveModel = open.into();
    active.return_date = Set(Some(now.clone()));
    let closed = active.update(&txn).await?;

    book::Entity::update_many()
        .col_expr(book::Column::CurrentReader, Expr::value(Option::<i32>::None))
        .col_expr(book::Column::UpdatedAt, Expr::value(now))
        .filter(book::Column::Id.eq(book_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!("Book {} returned by reader {}", book_id, closed.reader_id);
    Ok(closed)
}

#[derive(Clone, Copy)]
enum Edge {
    Start,
    End,
}

fn parse_bound(raw: &str, field: &str, edge: Edge) -> Result<String, DomainError> {
    let raw = raw.trim();
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let time = match edge {
            Edge::Start => NaiveTime::MIN,
            Edge::End => NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999)
                .ok_or_else(|| DomainError::Internal("invalid end of day".into()))?,
        };
        return Ok(format_timestamp(day.and_time(time).and_utc()));
    }
    parse_timestamp(raw)
        .map(format_timestamp)
        .map_err(|_| DomainError::Validation(format!("{} must be a date or RFC 3339 timestamp", field)))
}

fn range(
    from: &str,
    to: &str,
    from_field: &str,
    to_field: &str,
) -> Result<(String, String), DomainError> {
    let from = parse_bound(from, from_field, Edge::Start)?;
    let to = parse_bound(to, to_field, Edge::End)?;
    if from > to {
        return Err(DomainError::Validation(format!(
            "{} is after {}",
            from_field, to_field
        )));
    }
    Ok((from, to))
}

/// Closed rentals whose rental and return dates fall inside both ranges,
/// oldest first.
pub async fn show_history(
    db: &DatabaseConnection,
    query: &HistoryQuery,
) -> Result<Vec<rental_history::Model>, DomainError> {
    let (rented_from, rented_to) = range(
        &query.rental_date_from,
        &query.rental_date_to,
        "rental_date_from",
        "rental_date_to",
    )?;
    let (returned_from, returned_to) = range(
        &query.return_date_from,
        &query.return_date_to,
        "return_date_from",
        "return_date_to",
    )?;

    let rows = rental_history::Entity::find()
        .filter(rental_history::Column::RentalDate.between(rented_from, rented_to))
        .filter(rental_history::Column::ReturnDate.between(returned_from, returned_to))
        .order_by_asc(rental_history::Column::RentalDate)
        .order_by_asc(rental_history::Column::Id)
        .all(db)
        .await?;

    tracing::debug!("History query matched {} rentals", rows.len());
    Ok(rows)
}
