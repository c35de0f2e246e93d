use std::time::Duration;

/// Result class of a repository operation, used as a metrics label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    NotFound,
    Error,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Ok => "ok",
            Outcome::NotFound => "not_found",
            Outcome::Error => "error",
        }
    }
}

/// Sink for repository telemetry.
///
/// Decode failures are reported here because lookups treat a corrupt record as absent;
/// this keeps corruption visible without failing the request.
pub trait MetricsBackend: Send + Sync + 'static {
    /// A repository operation finished.
    fn record_operation(&self, operation: &'static str, outcome: Outcome);

    /// A stored value under `namespace` could not be decoded.
    fn record_decode_failure(&self, namespace: &'static str);

    /// A scan-based query took `elapsed`.
    fn observe_query(&self, operation: &'static str, elapsed: Duration);
}

/// Metrics backend that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetrics;

impl MetricsBackend for NoOpMetrics {
    fn record_operation(&self, _operation: &'static str, _outcome: Outcome) {}
    fn record_decode_failure(&self, _namespace: &'static str) {}
    fn observe_query(&self, _operation: &'static str, _elapsed: Duration) {}
}
