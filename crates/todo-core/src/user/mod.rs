//! User records and the email index.
//!
//! A user is stored under `user:<id>`; `user:email:<email>` maps an email to the id.

use std::sync::Arc;

use todo_model::{User, UserId};
use tracing::{debug, instrument};

use crate::{
    clock::{Clock, SystemClock},
    codec,
    error::CoreError,
    metrics::{MetricsBackend, NoOpMetrics},
    store::KvStore,
};

/// Key prefix reserved for user records.
pub const USER_PREFIX: &str = "user:";

/// Key prefix of the email-to-id index.
pub const EMAIL_INDEX_PREFIX: &str = "user:email:";

/// Partial update of a user record.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password_hash: Option<String>,
}

/// Repository owning the user key-space of the store.
#[derive(Clone)]
pub struct UserRepository {
    store: Arc<dyn KvStore>,
    metrics: Arc<dyn MetricsBackend>,
    clock: Arc<dyn Clock>,
}

impl UserRepository {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            metrics: Arc::new(NoOpMetrics),
            clock: Arc::new(SystemClock),
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

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    fn key(id: &str) -> String {
        format!("{USER_PREFIX}{id}")
    }

    fn email_key(email: &str) -> String {
        format!("{EMAIL_INDEX_PREFIX}{email}")
    }

    /// Store `user` and its email index entry.
    #[instrument(level = "debug", skip(self, user), fields(user_id = %user.id))]
    pub async fn create(&self, user: User) -> Result<User, CoreError> {
        self.store
            .put(&Self::key(&user.id), codec::encode(&user)?)
            .await?;
        self.store
            .put(&Self::email_key(&user.email), user.id.clone())
            .await?;
        debug!("user created");
        Ok(user)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>, CoreError> {
        let key = Self::key(id);
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(None);
        };
        Ok(codec::decode(&key, &raw, self.metrics.as_ref()))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, CoreError> {
        match self.store.get(&Self::email_key(email)).await? {
            Some(id) => self.find_by_id(&id).await,
            None => Ok(None),
        }
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool, CoreError> {
        Ok(self.store.get(&Self::email_key(email)).await?.is_some())
    }

    /// Merge `patch` over the stored user, keeping its id and refreshing `updatedAt`.
    ///
    /// A changed email moves the index entry.
    #[instrument(level = "debug", skip(self, patch))]
    pub async fn update(&self, id: &str, patch: UserUpdate) -> Result<User, CoreError> {
        let mut user = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| CoreError::UserNotFound(id.to_string()))?;

        let previous_email = user.email.clone();
        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(name) = patch.name {
            user.name = name;
        }
        if let Some(password_hash) = patch.password_hash {
            user.password_hash = password_hash;
        }
        user.updated_at = self.clock.now().max(user.updated_at);

        self.store.put(&Self::key(id), codec::encode(&user)?).await?;
        if user.email != previous_email {
            self.store
                .put(&Self::email_key(&user.email), user.id.clone())
                .await?;
            self.store.delete(&Self::email_key(&previous_email)).await?;
        }
        Ok(user)
    }

    /// Remove the user and its email index entry.
    ///
    /// Returns `false` if there was no such user.
    pub async fn delete(&self, id: &str) -> Result<bool, CoreError> {
        let Some(user) = self.find_by_id(id).await? else {
            return Ok(false);
        };
        self.store.delete(&Self::key(&user.id)).await?;
        self.store.delete(&Self::email_key(&user.email)).await?;
        Ok(true)
    }
}

/// Fresh identifier for a new user.
pub(crate) fn new_user_id() -> UserId {
    uuid::Uuid::new_v4().to_string()
}
