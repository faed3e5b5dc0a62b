use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Validation metrics
    pub token_validations: IntCounterVec,
    pub remote_validation_duration: HistogramVec,

    // Token issuing metrics
    pub token_requests: IntCounterVec,

    // Cache metrics
    pub cache_operations: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Arc<Self>, prometheus::Error> {
        let registry = Registry::new_custom(Some("persona".into()), None)?;

        let metrics = Self {
            token_validations: IntCounterVec::new(Opts::new("token_validations_total", "Token validations by path and result"), &["path", "result"])?,
            remote_validation_duration: HistogramVec::new(HistogramOpts::new("remote_validation_duration_seconds", "Remote token validation duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]), &["result"])?,

            token_requests: IntCounterVec::new(Opts::new("token_requests_total", "Client credentials token requests by outcome"), &["outcome"])?,

            cache_operations: IntCounterVec::new(Opts::new("cache_operations_total", "Cache operations by cache, operation and outcome"), &["cache", "operation", "outcome"])?,

            registry,
        };

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.token_validations.clone()))?;
        reg.register(Box::new(metrics.remote_validation_duration.clone()))?;
        reg.register(Box::new(metrics.token_requests.clone()))?;
        reg.register(Box::new(metrics.cache_operations.clone()))?;

        Ok(Arc::new(metrics))
    }

    pub fn validation(&self, path: &str, result: &str) {
        self.token_validations.with_label_values(&[path, result]).inc();
    }

    pub fn cache_op(&self, cache: &str, operation: &str, outcome: &str) {
        self.cache_operations.with_label_values(&[cache, operation, outcome]).inc();
    }

    pub fn token_request(&self, outcome: &str) {
        self.token_requests.with_label_values(&[outcome]).inc();
    }

    /// Text exposition of every registered metric.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
