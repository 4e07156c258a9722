mod config;
mod db;
mod errors;
mod handlers;
mod models;
mod normalizer;
mod signer;
mod storage;
mod sumsub_client;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::Database;
use crate::signer::RequestSigner;
use crate::sumsub_client::SumsubClient;

/// Main entry point for the application.
///
/// This function initializes the application, including:
/// - Logging and tracing.
/// - Configuration loading.
/// - Database connection.
/// - The signed provider client.
/// - HTTP routes and middleware (CORS, Rate Limiting).
///
/// It then starts the Axum server.
///
/// # Returns
///
/// * `anyhow::Result<()>` - Ok if the server runs successfully, or an error if initialization fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_kyc_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    // Initialize database connection pool
    let db = Database::new(&config.database_url).await?;
    tracing::info!("Database connection pool established");

    // Provider client with credentials injected from configuration
    let signer = RequestSigner::new(
        config.sumsub_app_token.clone(),
        config.sumsub_secret_key.clone(),
    );
    let sumsub = SumsubClient::new(
        config.sumsub_base_url.clone(),
        signer,
        config.request_timeout_secs,
    )
    .map_err(|e| anyhow::anyhow!("Failed to initialize provider client: {}", e))?;
    tracing::info!("Provider client initialized: {}", config.sumsub_base_url);

    // Build application state
    let app_state = Arc::new(handlers::AppState {
        db: db.pool.clone(),
        config: config.clone(),
        sumsub,
    });

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .unwrap(),
    );

    // Build protected routes with security layers
    let protected_routes = Router::new()
        .route("/api/v1/applicants", post(handlers::create_applicant))
        .route(
            "/api/v1/applicants/:applicant_id/documents",
            post(handlers::add_document),
        )
        .route(
            "/api/v1/applicants/:applicant_id/status",
            get(handlers::get_verification_status),
        )
        .route(
            "/api/v1/applicants/:applicant_id/status/saved",
            get(handlers::get_saved_verification),
        )
        .layer(
            ServiceBuilder::new()
                // Request size limit: 1MB max payload (document images travel by URL, not inline)
                .layer(RequestBodyLimitLayer::new(1024 * 1024))
                // Rate limiting: 10 req/sec per IP, burst of 20
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    // Build final app with health check (bypasses rate limiting)
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
