use std::sync::Arc;

use recommendations_api::{
    api::{create_router, AppState},
    config::Config,
    db::{create_pool, run_migrations, PgRecommendationRepository},
    services::{RandomSource, SeededRandom, ThreadRandom},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("recommendations_api=debug,tower_http=debug")),
        )
        .init();

    // Initialize database
    let pool = create_pool(&config.database_url, config.database_max_connections).await?;
    run_migrations(&pool).await?;
    tracing::info!("Database ready");

    let random: Arc<dyn RandomSource> = match config.random_seed {
        Some(seed) => {
            tracing::info!(seed, "Using seeded random source");
            Arc::new(SeededRandom::new(seed))
        }
        None => Arc::new(ThreadRandom),
    };

    // Initialize application state
    let repository = Arc::new(PgRecommendationRepository::new(pool));
    let state = AppState::new(repository, random).with_reset_route(config.enable_reset_route);

    // Create the router with all routes
    let app = create_router(state);

    // Start the server
    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
