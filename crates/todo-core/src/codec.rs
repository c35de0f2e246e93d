use serde::{Serialize, de::DeserializeOwned};
use tracing::warn;

use crate::{error::CoreError, metrics::MetricsBackend};

pub(crate) fn encode<T: Serialize>(record: &T) -> Result<String, CoreError> {
    Ok(serde_json::to_string(record)?)
}

/// Decode a stored record, treating a corrupt value as absent.
///
/// The failure is logged and counted so corruption does not go unnoticed.
pub(crate) fn decode<T: DeserializeOwned>(
    key: &str,
    raw: &str,
    metrics: &dyn MetricsBackend,
) -> Option<T> {
    match serde_json::from_str(raw) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!(key, error = %e, "skipping undecodable record");
            let namespace = key.split(':').next().unwrap_or("unknown");
            metrics.record_decode_failure(namespace_label(namespace));
            None
        }
    }
}

fn namespace_label(namespace: &str) -> &'static str {
    match namespace {
        "task" => "task",
        "user" => "user",
        _ => "unknown",
    }
}
