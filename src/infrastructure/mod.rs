//! Infrastructure layer - Framework implementations
//!
//! This layer contains:
//! - Database connection and migrations (db)
//! - HTTP server setup (server)
//! - Configuration loading (config)
//! - Passwords and signed tokens (auth)
//! - Filesystem content store (storage)
//! - Application state (state)

pub mod auth;
pub mod config;
pub mod db;
pub mod seed;
pub mod server;
pub mod state;
pub mod storage;

pub use state::AppState;
pub use storage::LocalContentStore;
