//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{load_seed_users, seed_in_memory, DbAdapter, TracingNotifier},
    config::Config,
    error::ApiError,
    web::{router, state::AppState, ApiDoc},
};
use axum::Router;
use mentorship_core::{
    ports::{DatabaseService, SystemClock},
    InMemoryStore, MentorshipServices,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    let db: Arc<dyn DatabaseService> = match &config.database_url {
        Some(url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(url)
                .await?;
            let db_adapter = DbAdapter::new(db_pool);
            info!("Running database migrations...");
            db_adapter.run_migrations().await?;
            info!("Database migrations complete.");
            Arc::new(db_adapter)
        }
        None => {
            warn!("DATABASE_URL is not set; using the in-memory store. Data will not persist.");
            let store = InMemoryStore::new();
            match &config.seed_users_path {
                Some(path) => {
                    let seeded = seed_in_memory(&store, load_seed_users(path).await?)?;
                    info!("Seeded {} users from {}", seeded, path.display());
                }
                None => warn!("SEED_USERS is not set; no users can authenticate."),
            }
            Arc::new(store)
        }
    };

    // --- 3. Wire the Core Services ---
    let notifier = Arc::new(TracingNotifier::new(db.clone()));
    let services = MentorshipServices::new(
        db.clone(),
        notifier,
        Arc::new(SystemClock),
        config.same_day_policy,
    );
    info!("Same-day slot policy: {:?}", config.same_day_policy);

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        db,
        config: config.clone(),
        services,
    });

    // --- 5. Create the Web Router ---
    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(router(app_state)?)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
