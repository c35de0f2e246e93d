use reqwest::{Method, RequestBuilder, Url};
use serde::{Deserialize, Serialize, de::DeserializeOwned, de::IgnoredAny};
use serde_json::json;
use tracing::debug;

use todo_model::{AuthSession, Task, TaskFilter, TaskId, TaskStats, UpdateTask, UserView};

use crate::{error::ClientError, transfer::parse_import};

/// Response envelope as produced by the server.
#[derive(Deserialize)]
struct Reply<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    message: Option<String>,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

/// Client for the `/api` surface.
///
/// After [`register`](Self::register) or [`login`](Self::login) the issued token
/// is attached as a bearer credential to every later call until [`logout`](Self::logout).
#[derive(Debug, Clone)]
pub struct TodoClient {
    http: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl TodoClient {
    /// Client for the server at `base_url` (e.g. `http://localhost:3000`).
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let mut base = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base,
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Forget the stored token.
    pub fn logout(&mut self) {
        self.token = None;
    }

    // ---- tasks ----

    /// List tasks, newest first.
    pub async fn tasks(
        &self,
        filter: Option<TaskFilter>,
        search: Option<&str>,
    ) -> Result<Vec<Task>, ClientError> {
        let mut url = self.url("api/tasks")?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(filter) = filter {
                pairs.append_pair("filter", filter.as_str());
            }
            if let Some(search) = search {
                pairs.append_pair("search", search);
            }
        }
        let tasks = self.call(self.request(Method::GET, url)).await?;
        Ok(tasks.unwrap_or_default())
    }

    pub async fn task(&self, id: &TaskId) -> Result<Task, ClientError> {
        let url = self.url(&format!("api/tasks/{id}"))?;
        required(self.call(self.request(Method::GET, url)).await?)
    }

    pub async fn create_task(&self, title: &str, description: &str) -> Result<Task, ClientError> {
        let url = self.url("api/tasks")?;
        let req = self
            .request(Method::POST, url)
            .json(&json!({ "title": title, "description": description }));
        required(self.call(req).await?)
    }

    pub async fn update_task(&self, id: &TaskId, patch: &UpdateTask) -> Result<Task, ClientError> {
        let url = self.url(&format!("api/tasks/{id}"))?;
        required(self.call(self.request(Method::PUT, url).json(patch)).await?)
    }

    /// Flip the completion state of `task`.
    pub async fn toggle_task(&self, task: &Task) -> Result<Task, ClientError> {
        self.update_task(&task.id, &UpdateTask::new().completed(!task.completed))
            .await
    }

    pub async fn delete_task(&self, id: &TaskId) -> Result<(), ClientError> {
        let url = self.url(&format!("api/tasks/{id}"))?;
        self.call::<IgnoredAny>(self.request(Method::DELETE, url))
            .await?;
        Ok(())
    }

    pub async fn delete_all_tasks(&self) -> Result<(), ClientError> {
        let url = self.url("api/tasks")?;
        self.call::<IgnoredAny>(self.request(Method::DELETE, url))
            .await?;
        Ok(())
    }

    pub async fn stats(&self) -> Result<TaskStats, ClientError> {
        let url = self.url("api/tasks/stats")?;
        required(self.call(self.request(Method::GET, url)).await?)
    }

    /// Re-create every entry of an import file as a new task, in file order.
    ///
    /// The whole file is parsed before anything is sent. Stops at the first rejected entry;
    /// tasks created before it are kept.
    pub async fn import_tasks(&self, raw: &str) -> Result<Vec<Task>, ClientError> {
        let entries = parse_import(raw)?;
        let mut created = Vec::with_capacity(entries.len());
        for entry in entries {
            created.push(self.create_task(&entry.title, &entry.description).await?);
        }
        debug!(count = created.len(), "tasks imported");
        Ok(created)
    }

    // ---- auth ----

    pub async fn register(
        &mut self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<AuthSession, ClientError> {
        let body = Credentials {
            email,
            password,
            name: Some(name),
        };
        self.authenticate("api/auth/register", &body).await
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<AuthSession, ClientError> {
        let body = Credentials {
            email,
            password,
            name: None,
        };
        self.authenticate("api/auth/login", &body).await
    }

    /// The account behind the stored token.
    pub async fn me(&self) -> Result<UserView, ClientError> {
        let url = self.url("api/auth/me")?;
        required(self.call(self.request(Method::GET, url)).await?)
    }

    async fn authenticate(
        &mut self,
        path: &str,
        body: &Credentials<'_>,
    ) -> Result<AuthSession, ClientError> {
        let url = self.url(path)?;
        let session: AuthSession =
            required(self.call(self.request(Method::POST, url).json(body)).await?)?;
        self.token = Some(session.token.clone());
        Ok(session)
    }

    // ---- plumbing ----

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        self.base
            .join(path)
            .map_err(|e| ClientError::InvalidUrl(e.to_string()))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let req = self.http.request(method, url);
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn call<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<Option<T>, ClientError> {
        let response = req.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), "api response");

        if !status.is_success() {
            let message = serde_json::from_str::<Reply<IgnoredAny>>(&body)
                .ok()
                .and_then(|r| r.message)
                .unwrap_or_else(|| status.to_string());
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let reply: Reply<T> = serde_json::from_str(&body).map_err(|e| {
            ClientError::InvalidResponse(format!("failed to parse response: {e}, body: {body}"))
        })?;
        if !reply.success {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: reply.message.unwrap_or_default(),
            });
        }
        Ok(reply.data)
    }
}

fn required<T>(data: Option<T>) -> Result<T, ClientError> {
    data.ok_or_else(|| ClientError::InvalidResponse("response carried no data".into()))
}
