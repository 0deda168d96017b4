//! HTTP server implementation using Axum.

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use seatwatch_core::config::{GatewayConfig, SeatWatchConfig};
use seatwatch_scheduler::SubscriptionRegistry;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared state for the gateway server.
#[derive(Clone)]
pub struct AppState {
    /// Owns every running course check.
    pub registry: Arc<SubscriptionRegistry>,
    /// Supplies the term and poll interval for new checks.
    pub config: Arc<SeatWatchConfig>,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(registry: Arc<SubscriptionRegistry>, config: Arc<SeatWatchConfig>) -> Self {
        Self {
            registry,
            config,
            start_time: std::time::Instant::now(),
        }
    }
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    let shared = Arc::new(state);

    let cors = {
        let cors = CorsLayer::new()
            .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
            .allow_headers(Any)
            .max_age(std::time::Duration::from_secs(3600));

        // Example: SEATWATCH_CORS_ORIGINS=https://seats.example.edu
        if let Ok(origins_str) = std::env::var("SEATWATCH_CORS_ORIGINS") {
            let origins: Vec<_> = origins_str
                .split(',')
                .filter_map(|s| s.trim().parse::<axum::http::HeaderValue>().ok())
                .collect();
            cors.allow_origin(origins)
        } else {
            cors.allow_origin(Any)
        }
    };

    Router::new()
        .route("/health", get(super::routes::health_check))
        .route("/start-course-check", post(super::routes::start_course_check))
        .route("/stop-course-check", post(super::routes::stop_course_check))
        .route("/course-check/status", get(super::routes::course_check_status))
        .route("/course-checks", get(super::routes::list_course_checks))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

/// Serve until `shutdown` resolves.
pub async fn start<F>(config: &GatewayConfig, state: AppState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("🌐 Gateway server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
