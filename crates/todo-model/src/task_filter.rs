use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Completion-state filter applied to task listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskFilter {
    /// Keep every task.
    #[default]
    All,
    /// Keep tasks that are not completed.
    Pending,
    /// Keep completed tasks.
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid filter: '{0}' (valid: all, pending, completed)")]
pub struct ParseFilterError(pub String);

impl TaskFilter {
    /// Returns `true` if a task with the given completion flag passes the filter.
    pub fn accepts(&self, completed: bool) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Pending => !completed,
            TaskFilter::Completed => completed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskFilter::All => "all",
            TaskFilter::Pending => "pending",
            TaskFilter::Completed => "completed",
        }
    }
}

impl FromStr for TaskFilter {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(TaskFilter::All),
            "pending" => Ok(TaskFilter::Pending),
            "completed" => Ok(TaskFilter::Completed),
            _ => Err(ParseFilterError(s.to_string())),
        }
    }
}

impl fmt::Display for TaskFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_by_completion() {
        assert!(TaskFilter::All.accepts(true));
        assert!(TaskFilter::All.accepts(false));
        assert!(TaskFilter::Pending.accepts(false));
        assert!(!TaskFilter::Pending.accepts(true));
        assert!(TaskFilter::Completed.accepts(true));
        assert!(!TaskFilter::Completed.accepts(false));
    }

    #[test]
    fn parse_is_exact() {
        assert_eq!("pending".parse::<TaskFilter>(), Ok(TaskFilter::Pending));
        assert_eq!("completed".parse::<TaskFilter>(), Ok(TaskFilter::Completed));
        assert!("Pending".parse::<TaskFilter>().is_err());
        assert!("done".parse::<TaskFilter>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&TaskFilter::Completed).unwrap();
        assert_eq!(json, r#""completed""#);

        let back: TaskFilter = serde_json::from_str(r#""all""#).unwrap();
        assert_eq!(back, TaskFilter::All);
    }
}
