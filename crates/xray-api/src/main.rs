//! Binary entrypoint for the X-Ray API server.
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use xray_api::{run, ApiConfig, AppState};
use xray_store::MemoryStore;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ApiConfig::from_env();
    let store = Arc::new(MemoryStore::new());
    let state = match AppState::new(store, config) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("failed to register metrics: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(state).await {
        tracing::error!("server error: {}", e);
        std::process::exit(1);
    }
}
