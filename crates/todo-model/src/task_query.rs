use crate::{Task, TaskFilter, UserId};

/// Query parameters for listing tasks.
///
/// Every field is optional; the predicates present are combined conjunctively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub filter: Option<TaskFilter>,
    pub search: Option<String>,
    pub user_id: Option<UserId>,
}

impl TaskQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: TaskFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_user(mut self, user_id: impl Into<UserId>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Compile the query into a reusable predicate.
    ///
    /// The search text is lower-cased once here instead of per task.
    /// An empty search string matches everything.
    pub fn matcher(&self) -> impl Fn(&Task) -> bool + '_ {
        let needle = self
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        let filter = self.filter.unwrap_or_default();

        move |task: &Task| {
            if let Some(user_id) = &self.user_id
                && !task.is_owned_by(user_id)
            {
                return false;
            }
            if !filter.accepts(task.completed) {
                return false;
            }
            match &needle {
                Some(needle) => task.matches_search(needle),
                None => true,
            }
        }
    }
}
