use std::time::Duration;

use prometheus::{
    HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder, proto::MetricFamily,
};
use todo_core::{MetricsBackend, Outcome};

/// Prometheus-backed [`MetricsBackend`].
///
/// Clones share the same registry and collectors.
#[derive(Clone)]
pub struct PrometheusMetrics {
    registry: Registry,
    operations: IntCounterVec,
    decode_failures: IntCounterVec,
    query_duration: HistogramVec,
}

impl PrometheusMetrics {
    /// Create collectors in a fresh registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::with_registry(Registry::new())
    }

    /// Create collectors and register them in `registry`.
    pub fn with_registry(registry: Registry) -> Result<Self, prometheus::Error> {
        let operations = IntCounterVec::new(
            Opts::new(
                "todo_repository_operations_total",
                "Repository operations by outcome",
            ),
            &["operation", "outcome"],
        )?;
        let decode_failures = IntCounterVec::new(
            Opts::new(
                "todo_decode_failures_total",
                "Stored records that could not be decoded",
            ),
            &["namespace"],
        )?;
        let query_duration = HistogramVec::new(
            HistogramOpts::new(
                "todo_query_duration_seconds",
                "Duration of scan-based task queries",
            )
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
            &["operation"],
        )?;

        registry.register(Box::new(operations.clone()))?;
        registry.register(Box::new(decode_failures.clone()))?;
        registry.register(Box::new(query_duration.clone()))?;

        Ok(Self {
            registry,
            operations,
            decode_failures,
            query_duration,
        })
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Render every family in the Prometheus text exposition format.
    pub fn encode_text(&self) -> Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.gather())
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn record_operation(&self, operation: &'static str, outcome: Outcome) {
        self.operations
            .with_label_values(&[operation, outcome.as_str()])
            .inc();
    }

    fn record_decode_failure(&self, namespace: &'static str) {
        self.decode_failures.with_label_values(&[namespace]).inc();
    }

    fn observe_query(&self, operation: &'static str, elapsed: Duration) {
        self.query_duration
            .with_label_values(&[operation])
            .observe(elapsed.as_secs_f64());
    }
}
