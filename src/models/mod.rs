pub mod author;
pub mod book;
pub mod book_load_token;
pub mod genre;
pub mod reader;
pub mod rental_history;
pub mod role;
pub mod session;
pub mod user;
pub mod user_role;

pub use book::{Book, BookListing};
