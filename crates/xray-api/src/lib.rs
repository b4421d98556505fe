//! X-Ray API: REST endpoints over a [`TraceStore`]
//!
//! | method | path                  |                                   |
//! |--------|-----------------------|-----------------------------------|
//! | POST   | `/api/executions`     | store a snapshot                  |
//! | GET    | `/api/executions`     | newest first, `?limit=&status=`   |
//! | GET    | `/api/executions/:id` | one snapshot by stored id         |
//! | GET    | `/api/health`         | liveness and record count         |
//! | GET    | `/metrics`            | Prometheus text format            |
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;

use axum::{routing::get, Router};
use std::sync::Arc;
use xray_store::TraceStore;

pub use config::ApiConfig;
pub use error::ApiError;
pub use metrics::ApiMetrics;

/// Shared handler state. The store is created by the caller and passed in.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TraceStore>,
    pub config: Arc<ApiConfig>,
    pub metrics: ApiMetrics,
}

impl AppState {
    pub fn new(store: Arc<dyn TraceStore>, config: ApiConfig) -> Result<Self, prometheus::Error> {
        Ok(Self {
            store,
            config: Arc::new(config),
            metrics: ApiMetrics::new()?,
        })
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/executions",
            get(handlers::list_executions).post(handlers::save_execution),
        )
        .route("/api/executions/:id", get(handlers::get_execution))
        .route("/api/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::cors())
        .layer(middleware::trace())
        .with_state(state)
}

pub async fn run(state: AppState) -> std::io::Result<()> {
    let addr = state.config.addr.clone();
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("X-Ray API listening on {}", addr);
    axum::serve(listener, app).await
}
