//! Application state shared by every handler

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::domain::ContentStore;
use crate::infrastructure::auth::TokenKeys;
use crate::infrastructure::config::Config;
use crate::infrastructure::storage::LocalContentStore;

#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    pub config: Arc<Config>,
    pub tokens: Arc<TokenKeys>,
    /// Where uploaded book files and covers live
    pub store: Arc<dyn ContentStore>,
}

impl AppState {
    /// Build state with the local filesystem store rooted at `config.storage_dir`.
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        let store = Arc::new(LocalContentStore::new(config.storage_dir.clone()));
        Self::with_store(db, config, store)
    }

    pub fn with_store(
        db: DatabaseConnection,
        config: Config,
        store: Arc<dyn ContentStore>,
    ) -> Self {
        let tokens = Arc::new(TokenKeys::new(&config.jwt_secret));
        Self {
            db,
            config: Arc::new(config),
            tokens,
            store,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl axum::extract::FromRef<AppState> for DatabaseConnection {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}
