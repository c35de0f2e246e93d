//! Task persistence and the list query pipeline.
//!
//! Tasks live in the shared store under [`TASK_PREFIX`] followed by their id.
//! Listing is a full prefix scan followed by in-memory filtering and sorting;
//! the store offers no secondary indexes.

use std::{sync::Arc, time::Instant};

use tokio::sync::Mutex;
use todo_model::{CreateTask, Task, TaskFilter, TaskId, TaskQuery, TaskStats, UpdateTask};
use tracing::{debug, instrument};

use crate::{
    clock::{Clock, SystemClock},
    codec,
    error::CoreError,
    metrics::{MetricsBackend, NoOpMetrics, Outcome},
    store::KvStore,
};

/// Key prefix reserved for task records.
pub const TASK_PREFIX: &str = "task:";

/// Repository owning the task key-space of the store.
///
/// Cheap to clone; clones share the store handle and the mutation lock.
#[derive(Clone)]
pub struct TaskRepository {
    store: Arc<dyn KvStore>,
    metrics: Arc<dyn MetricsBackend>,
    clock: Arc<dyn Clock>,
    /// Serialises the read-then-write mutations within this process.
    write_lock: Arc<Mutex<()>>,
}

impl TaskRepository {
    /// Create a repository over `store`, with no metrics and the system clock.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            metrics: Arc::new(NoOpMetrics),
            clock: Arc::new(SystemClock),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsBackend>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn key(id: &TaskId) -> String {
        format!("{TASK_PREFIX}{id}")
    }

    fn track<T>(&self, op: &'static str, res: &Result<T, CoreError>) {
        let outcome = match res {
            Ok(_) => Outcome::Ok,
            Err(e) if e.is_not_found() => Outcome::NotFound,
            Err(_) => Outcome::Error,
        };
        self.metrics.record_operation(op, outcome);
    }

    /// Persist a new task with a fresh id, `completed = false` and both timestamps set to now.
    #[instrument(level = "debug", skip(self, input), fields(user_id = ?input.user_id))]
    pub async fn create(&self, input: CreateTask) -> Result<Task, CoreError> {
        let res = self.create_inner(input).await;
        self.track("create", &res);
        res
    }

    async fn create_inner(&self, input: CreateTask) -> Result<Task, CoreError> {
        let now = self.clock.now();
        let task = Task {
            id: TaskId::from(uuid::Uuid::new_v4().to_string()),
            title: input.title,
            description: input.description,
            completed: false,
            created_at: now,
            updated_at: now,
            user_id: input.user_id,
        };

        self.store
            .put(&Self::key(&task.id), codec::encode(&task)?)
            .await?;
        debug!(task_id = %task.id, "task created");
        Ok(task)
    }

    /// Point lookup.
    ///
    /// A missing key and an undecodable record both come back as `Ok(None)`;
    /// only store faults are errors.
    pub async fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>, CoreError> {
        let res = self.load(id).await;
        let outcome = match &res {
            Ok(Some(_)) => Outcome::Ok,
            Ok(None) => Outcome::NotFound,
            Err(_) => Outcome::Error,
        };
        self.metrics.record_operation("find_by_id", outcome);
        res
    }

    async fn load(&self, id: &TaskId) -> Result<Option<Task>, CoreError> {
        let key = Self::key(id);
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(None);
        };
        Ok(codec::decode(&key, &raw, self.metrics.as_ref()))
    }

    /// Run the list query pipeline: scan, filter by owner / completion / search text,
    /// then sort newest first by `createdAt`.
    ///
    /// Records that fail to decode are skipped. Ties on `createdAt` keep no particular order.
    #[instrument(level = "debug", skip(self))]
    pub async fn find_all(&self, query: &TaskQuery) -> Result<Vec<Task>, CoreError> {
        let started = Instant::now();
        let res = self.scan_filtered(query).await;
        self.metrics.observe_query("find_all", started.elapsed());
        self.track("find_all", &res);
        res
    }

    async fn scan_filtered(&self, query: &TaskQuery) -> Result<Vec<Task>, CoreError> {
        let entries = self.store.scan(TASK_PREFIX).await?;
        let scanned = entries.len();

        let matches = query.matcher();
        let mut tasks: Vec<Task> = entries
            .iter()
            .filter_map(|(key, raw)| codec::decode::<Task>(key, raw, self.metrics.as_ref()))
            .filter(|task| matches(task))
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        debug!(scanned, matched = tasks.len(), "task query evaluated");
        Ok(tasks)
    }

    /// Merge the present fields of `patch` over the stored task and refresh `updatedAt`.
    ///
    /// `updatedAt` is refreshed even when `patch` is empty, and never moves backwards.
    #[instrument(level = "debug", skip(self, patch), fields(task_id = %id))]
    pub async fn update(&self, id: &TaskId, patch: UpdateTask) -> Result<Task, CoreError> {
        let res = self.update_inner(id, patch).await;
        self.track("update", &res);
        res
    }

    async fn update_inner(&self, id: &TaskId, patch: UpdateTask) -> Result<Task, CoreError> {
        let _guard = self.write_lock.lock().await;

        let mut task = self
            .load(id)
            .await?
            .ok_or_else(|| CoreError::TaskNotFound(id.clone()))?;

        patch.merge_into(&mut task);
        task.updated_at = self.clock.now().max(task.updated_at);

        self.store.put(&Self::key(id), codec::encode(&task)?).await?;
        debug!("task updated");
        Ok(task)
    }

    /// Remove one task, failing with [`CoreError::TaskNotFound`] if it does not exist.
    #[instrument(level = "debug", skip(self), fields(task_id = %id))]
    pub async fn delete(&self, id: &TaskId) -> Result<(), CoreError> {
        let res = self.delete_inner(id).await;
        self.track("delete", &res);
        res
    }

    async fn delete_inner(&self, id: &TaskId) -> Result<(), CoreError> {
        let _guard = self.write_lock.lock().await;

        if self.load(id).await?.is_none() {
            return Err(CoreError::TaskNotFound(id.clone()));
        }
        self.store.delete(&Self::key(id)).await?;
        debug!("task deleted");
        Ok(())
    }

    /// Remove every task. Other namespaces in the store are left alone.
    ///
    /// Returns the number of removed records.
    #[instrument(level = "debug", skip(self))]
    pub async fn delete_all(&self) -> Result<usize, CoreError> {
        let res = {
            let _guard = self.write_lock.lock().await;
            self.store
                .clear_prefix(TASK_PREFIX)
                .await
                .map_err(CoreError::from)
        };
        if let Ok(removed) = &res {
            debug!(removed, "all tasks deleted");
        }
        self.track("delete_all", &res);
        res
    }

    /// Number of tasks `find_all(query)` would return.
    pub async fn count(&self, query: &TaskQuery) -> Result<usize, CoreError> {
        Ok(self.find_all(query).await?.len())
    }

    /// Total / completed / pending counts, optionally scoped to one owner.
    ///
    /// Equivalent to three [`TaskRepository::count`] calls, computed from a single scan.
    pub async fn stats(&self, user_id: Option<&str>) -> Result<TaskStats, CoreError> {
        let mut query = TaskQuery::new().with_filter(TaskFilter::All);
        if let Some(user_id) = user_id {
            query = query.with_user(user_id);
        }

        let mut stats = TaskStats::default();
        for task in self.find_all(&query).await? {
            stats.record(task.completed);
        }
        Ok(stats)
    }
}
