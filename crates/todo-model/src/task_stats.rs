use serde::{Deserialize, Serialize};

/// Aggregate counts over a task listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
}

impl TaskStats {
    /// Account for one more task.
    pub fn record(&mut self, completed: bool) {
        self.total += 1;
        if completed {
            self.completed += 1;
        } else {
            self.pending += 1;
        }
    }
}
