use serde::Deserialize;
use todo_model::Task;

use crate::error::ClientError;

/// One entry of an import file.
///
/// Only the content is taken over; ids, timestamps, completion and owner are assigned
/// anew when the entry is re-created on the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImportedTask {
    pub title: String,
    pub description: String,
}

/// Serialise tasks as a pretty-printed JSON array.
pub fn export_tasks(tasks: &[Task]) -> Result<String, ClientError> {
    serde_json::to_string_pretty(tasks).map_err(|e| ClientError::InvalidFormat(e.to_string()))
}

/// Parse an import file: a JSON array whose entries carry at least `title` and `description`.
///
/// Extra fields, such as those written by [`export_tasks`], are ignored.
pub fn parse_import(raw: &str) -> Result<Vec<ImportedTask>, ClientError> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| ClientError::InvalidFormat(e.to_string()))?;
    let serde_json::Value::Array(entries) = value else {
        return Err(ClientError::InvalidFormat(
            "expected a JSON array of tasks".into(),
        ));
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            serde_json::from_value(entry)
                .map_err(|e| ClientError::InvalidFormat(format!("entry {i}: {e}")))
        })
        .collect()
}
