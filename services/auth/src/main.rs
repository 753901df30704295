use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use auth::{AppState, cache::CacheConfig, routes, session::SessionConfig};
use common::database;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting identity service");

    // Initialize database connection pool
    let db_config = database::DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    // Check database connectivity
    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied");

    let session_config = SessionConfig::from_env()?;
    let cache_config = CacheConfig::from_env();
    let upload_dir = std::env::var("UPLOAD_DIR")
        .unwrap_or_else(|_| "uploads".to_string())
        .into();

    let state = AppState::new(pool, session_config, cache_config, upload_dir);

    // Bound auth cache growth independent of traffic shape
    tokio::spawn(state.cache.clone().run_sweeper());

    let app = routes::create_router(state);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Identity service listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
