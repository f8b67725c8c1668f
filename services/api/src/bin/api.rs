//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, SimulatedBackend},
    config::Config,
    error::ApiError,
    seed::ensure_seeded,
    web::{router, ApiDoc, AppState},
};
use axum::http::{header::{ACCEPT, CONTENT_TYPE}, HeaderValue, Method};
use axum::Router;
use std::sync::Arc;
use talentflow_core::ports::DocumentStore;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
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
    info!("Connecting to database...");
    let db_adapter = DbAdapter::connect(&config.database_url).await?;
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Seed Data ---
    // Seeding talks to the database directly so injected failures cannot skip it.
    if config.seed_on_startup {
        let report = ensure_seeded(&db_adapter).await?;
        info!(?report, "Seeding step finished");
    }

    // --- 4. Wrap the Store in the Simulated Backend ---
    let store: Arc<dyn DocumentStore> = Arc::new(SimulatedBackend::new(db_adapter, config.simulation));
    if config.simulation.error_rate > 0.0 {
        warn!(
            error_rate = config.simulation.error_rate,
            "Simulated backend will fail a share of requests"
        );
    }

    // --- 5. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(store, config.clone()));

    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS origin '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    // --- 6. Create the Web Router ---
    let app = Router::new()
        .merge(router(app_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // --- 7. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
