//! Runs the competitor selection demo and prints the stored trace.
//!
//! `xray-demo [--fail]`
mod catalog;
mod pipeline;

use tracing_subscriber::EnvFilter;
use xray_store::{MemoryStore, TraceStore};

use crate::catalog::Product;
use crate::pipeline::PipelineOptions;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let options = PipelineOptions {
        fail_search: std::env::args().any(|a| a == "--fail"),
        ..PipelineOptions::default()
    };
    let reference = Product {
        asin: "B0XYZ123".to_string(),
        title: "ProBrand Steel Bottle 32oz Insulated".to_string(),
        price: 29.99,
        rating: 4.2,
        reviews: 1287,
    };

    let (trace, result) = pipeline::run(&reference, &options);
    if let Err(e) = &result {
        tracing::warn!("pipeline failed: {}", e);
    }

    let store = MemoryStore::new();
    let stored = match store.save(trace.snapshot()).await {
        Ok(id) => store.get(&id.to_string()).await,
        Err(e) => Err(e),
    };
    match stored.map(|s| s.to_json_pretty()) {
        Ok(Ok(json)) => println!("{}", json),
        Ok(Err(e)) => {
            tracing::error!("could not render trace: {}", e);
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!("could not store trace: {}", e);
            std::process::exit(1);
        }
    }
}
