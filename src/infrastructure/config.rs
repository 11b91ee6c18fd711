use std::env;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    /// Root directory of uploaded book files and cover images
    pub storage_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub cors_allowed_origins: Vec<String>,
    /// Password for the bootstrap `admin` account, created only when set
    pub admin_password: Option<String>,
    pub seed_demo: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ if cfg!(debug_assertions) => {
                tracing::warn!("JWT_SECRET not set, using the development fallback");
                "secret".to_string()
            }
            _ => return Err("JWT_SECRET environment variable must be set in production".into()),
        };

        let port = match env::var("PORT") {
            Ok(p) => p
                .parse()
                .map_err(|e| format!("PORT must be a valid port number: {}", e))?,
            Err(_) => 8080,
        };

        let max_upload_mb: usize = match env::var("MAX_UPLOAD_MB") {
            Ok(v) => v
                .parse()
                .map_err(|e| format!("MAX_UPLOAD_MB must be an integer: {}", e))?,
            Err(_) => 50,
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://library.db?mode=rwc".to_string()),
            port,
            jwt_secret,
            storage_dir: env::var("STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("resources")),
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .ok()
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(Vec::new),
            admin_password: env::var("ADMIN_PASSWORD").ok().filter(|p| !p.is_empty()),
            seed_demo: env::var("SEED_DEMO").is_ok(),
        })
    }

    /// Configuration for tests and embedded use: in-memory database, given storage root.
    pub fn for_tests(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            port: 0,
            jwt_secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            storage_dir: storage_dir.into(),
            max_upload_bytes: 10 * 1024 * 1024,
            cors_allowed_origins: Vec::new(),
            admin_password: None,
            seed_demo: false,
        }
    }
}
