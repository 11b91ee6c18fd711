use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use library_rental::infrastructure::AppState;
use library_rental::{config, db, seed, server};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "library_rental=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let config = match config::Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize database
    let db = match db::init_db(&config.database_url).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = seed::ensure_roles(&db).await {
        tracing::error!("Failed to create built-in roles: {}", e);
        std::process::exit(1);
    }

    if let Some(password) = &config.admin_password {
        if let Err(e) = seed::ensure_admin(&db, password).await {
            tracing::error!("Failed to create admin account: {}", e);
        }
    }

    if config.seed_demo {
        tracing::info!("Seeding demo data...");
        if let Err(e) = seed::seed_demo_data(&db).await {
            tracing::error!("Failed to seed data: {}", e);
        } else {
            tracing::info!("Demo data seeded successfully.");
        }
    }

    let port = config.port;
    let state = AppState::new(db, config);

    if let Err(e) = server::serve(state, port).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}
