//! Prometheus counters exposed on `/metrics`
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct ApiMetrics {
    registry: Registry,
    pub executions_saved: IntCounter,
    pub store_errors: IntCounterVec,
}

impl ApiMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let executions_saved = IntCounter::new(
            "xray_executions_saved_total",
            "Execution snapshots accepted by the store",
        )?;
        let store_errors = IntCounterVec::new(
            Opts::new("xray_store_errors_total", "Store operations that failed"),
            &["kind"],
        )?;
        registry.register(Box::new(executions_saved.clone()))?;
        registry.register(Box::new(store_errors.clone()))?;

        Ok(Self {
            registry,
            executions_saved,
            store_errors,
        })
    }

    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}
