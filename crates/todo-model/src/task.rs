use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{TaskId, UserId, timestamp};

/// A to-do item as persisted by the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task identifier.
    pub id: TaskId,
    /// Short human title.
    pub title: String,
    /// Free-form details.
    pub description: String,
    /// Whether the task has been done.
    pub completed: bool,
    /// When the task was created. Never changes afterwards.
    #[serde(with = "timestamp")]
    pub created_at: OffsetDateTime,
    /// When the task was last mutated (creation included).
    #[serde(with = "timestamp")]
    pub updated_at: OffsetDateTime,
    /// Optional owner reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
}

impl Task {
    /// Returns `true` if `needle` (already lower-cased) occurs in the title or the description, ignoring case.
    pub fn matches_search(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
    }

    /// Returns `true` if the task is owned by `user_id`.
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id.as_deref() == Some(user_id)
    }
}
