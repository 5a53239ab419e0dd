//! tenantdb API server entry point.

use std::sync::Arc;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tenantdb_api::config::AppConfig;
use tenantdb_api::error::AppError;
use tenantdb_api::routes;
use tenantdb_api::state::AppState;
use tenantdb_api::telemetry;
use tenantdb_event_store::PgEventStore;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // A missing .env file is not an error.
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env()?;
    let _telemetry = telemetry::init(config.otlp_endpoint.as_deref())?;

    tracing::info!("Starting tenantdb API server");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("database migrations applied");

    let app_state = AppState::new(Arc::new(PgEventStore::new(pool)));

    // TODO: Replace CorsLayer::permissive() with configured origins.
    let app = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/tenants", routes::events::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let addr = config.socket_addr()?;
    tracing::info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
