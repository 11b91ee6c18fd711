//! Services Layer
//!
//! This module contains pure business logic extracted from HTTP handlers.
//! Every function takes the database connection explicitly.

pub mod account_service;
pub mod auth_service;
pub mod book_service;
pub mod catalog_service;
pub mod loan_token_service;
pub mod rental_service;
pub mod validate;
