use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use todo_core::{AuthConfig, AuthService, KvStore, MemoryStore, TaskRepository, UserRepository};
use tower::ServiceExt;

use super::{ApiConfig, HttpApi};
use crate::RepositoryAdapter;

fn app_with(config: ApiConfig) -> Router {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let tasks = TaskRepository::new(store.clone());
    let auth = AuthService::new(UserRepository::new(store), &AuthConfig::new("test-secret"));
    let handler = Arc::new(RepositoryAdapter::new(tasks, Arc::new(auth)));
    HttpApi::new(handler).with_config(config).router()
}

fn app() -> Router {
    app_with(ApiConfig::default())
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::delete(uri).body(Body::empty()).unwrap()
}

fn with_json(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn authed(mut req: Request<Body>, token: &str) -> Request<Body> {
    req.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {token}").parse().unwrap(),
    );
    req
}

async fn create(app: &Router, title: &str, description: &str) -> Value {
    let (status, body) = send(
        app,
        with_json(
            "POST",
            "/api/tasks",
            json!({ "title": title, "description": description }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"].clone()
}

async fn register(app: &Router, email: &str) -> String {
    let (status, body) = send(
        app,
        with_json(
            "POST",
            "/api/auth/register",
            json!({ "email": email, "password": "secret1", "name": "Tester" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_reports_running() {
    let (status, body) = send(&app(), get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "API is running");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn unknown_route_is_enveloped_404() {
    let (status, body) = send(&app(), get("/api/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Route GET /api/nope not found");
}

#[tokio::test]
async fn create_returns_trimmed_task() {
    let app = app();
    let (status, body) = send(
        &app,
        with_json(
            "POST",
            "/api/tasks",
            json!({ "title": "  Test Task  ", "description": " Test Description " }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Task created successfully");
    let task = &body["data"];
    assert_eq!(task["title"], "Test Task");
    assert_eq!(task["description"], "Test Description");
    assert_eq!(task["completed"], false);
    assert_eq!(task["createdAt"], task["updatedAt"]);
    assert!(task["id"].as_str().is_some_and(|id| !id.is_empty()));
    assert!(task.get("userId").is_none());
}

#[tokio::test]
async fn create_validation_failures() {
    let app = app();

    let (status, body) = send(
        &app,
        with_json("POST", "/api/tasks", json!({ "description": "Test Description" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("Title is required"));

    let (status, body) = send(
        &app,
        with_json("POST", "/api/tasks", json!({ "title": "AB", "description": "Valid" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("Title must be between 3 and 100 characters")
    );

    let (status, _) = send(
        &app,
        Request::post("/api/tasks")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_filters_and_searches() {
    let app = app();
    create(&app, "Task 1", "Description 1").await;
    let second = create(&app, "Task 2", "Description 2").await;
    create(&app, "Groceries", "buy MILK").await;

    let id = second["id"].as_str().unwrap();
    let (status, _) = send(
        &app,
        with_json("PUT", &format!("/api/tasks/{id}"), json!({ "completed": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, get("/api/tasks")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let (_, body) = send(&app, get("/api/tasks?filter=completed")).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["title"], "Task 2");

    let (_, body) = send(&app, get("/api/tasks?filter=pending")).await;
    assert_eq!(body["count"], 2);

    let (_, body) = send(&app, get("/api/tasks?search=Task%201")).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["title"], "Task 1");

    let (_, body) = send(&app, get("/api/tasks?search=milk")).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["title"], "Groceries");

    let (status, body) = send(&app, get("/api/tasks?filter=later")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("Filter must be one of: all, pending, completed")
    );

    let (status, _) = send(&app, get("/api/tasks?search=")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_update_delete_lifecycle() {
    let app = app();
    let task = create(&app, "Test Task", "Test Description").await;
    let id = task["id"].as_str().unwrap();
    let uri = format!("/api/tasks/{id}");

    let (status, body) = send(&app, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], task);

    let (status, body) = send(
        &app,
        with_json("PUT", &uri, json!({ "title": "Updated Task", "completed": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Task updated successfully");
    assert_eq!(body["data"]["title"], "Updated Task");
    assert_eq!(body["data"]["description"], "Test Description");
    assert_eq!(body["data"]["completed"], true);
    assert_eq!(body["data"]["createdAt"], task["createdAt"]);

    let (status, body) = send(&app, with_json("PUT", &uri, json!({ "completed": "yes" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("Completed must be a boolean"));

    let (status, body) = send(&app, delete(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Task deleted successfully");

    let (status, body) = send(&app, get(&uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], format!("Task with id {id} not found"));

    let (status, _) = send(&app, delete(&uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, with_json("PUT", &uri, json!({ "title": "Again" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stats_and_delete_all() {
    let app = app();
    create(&app, "Task 1", "Description 1").await;
    let done = create(&app, "Task 2", "Description 2").await;
    let id = done["id"].as_str().unwrap();
    send(
        &app,
        with_json("PUT", &format!("/api/tasks/{id}"), json!({ "completed": true })),
    )
    .await;

    let (status, body) = send(&app, get("/api/tasks/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({ "total": 2, "completed": 1, "pending": 1 }));

    let (status, body) = send(&app, delete("/api/tasks")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "All tasks deleted successfully");

    let (_, body) = send(&app, get("/api/tasks")).await;
    assert_eq!(body["count"], 0);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn register_login_and_me() {
    let app = app();
    let token = register(&app, "Ada@Example.com").await;

    let (status, body) = send(
        &app,
        with_json(
            "POST",
            "/api/auth/register",
            json!({ "email": "ada@example.com", "password": "secret1", "name": "Tester" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Email already registered");

    let (status, body) = send(
        &app,
        with_json(
            "POST",
            "/api/auth/login",
            json!({ "email": "ada@example.com", "password": "wrong-pass" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials");

    let (status, body) = send(
        &app,
        with_json(
            "POST",
            "/api/auth/login",
            json!({ "email": "ada@example.com", "password": "secret1" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["token"].is_string());
    assert!(body["data"]["user"].get("passwordHash").is_none());

    let (status, body) = send(&app, authed(get("/api/auth/me"), &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "ada@example.com");

    let (status, body) = send(&app, get("/api/auth/me")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "No token provided");

    let (status, body) = send(&app, authed(get("/api/auth/me"), "garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token");
}

#[tokio::test]
async fn authenticated_callers_only_see_their_tasks() {
    let app = app();
    let alice = register(&app, "alice@example.com").await;
    let bob = register(&app, "bob@example.com").await;

    let (status, body) = send(
        &app,
        authed(
            with_json(
                "POST",
                "/api/tasks",
                json!({ "title": "Alice task", "description": "mine", "userId": "someone-else" }),
            ),
            &alice,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let alice_task = body["data"].clone();
    assert!(alice_task["userId"].is_string());
    assert_ne!(alice_task["userId"], "someone-else");
    let uri = format!("/api/tasks/{}", alice_task["id"].as_str().unwrap());

    send(
        &app,
        authed(
            with_json("POST", "/api/tasks", json!({ "title": "Bob task", "description": "his" })),
            &bob,
        ),
    )
    .await;
    create(&app, "Anonymous", "nobody's").await;

    let (_, body) = send(&app, authed(get("/api/tasks"), &alice)).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["title"], "Alice task");

    let (_, body) = send(&app, get("/api/tasks")).await;
    assert_eq!(body["count"], 3);

    let (status, _) = send(&app, authed(get(&uri), &bob)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(
        &app,
        authed(with_json("PUT", &uri, json!({ "completed": true })), &bob),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, authed(delete(&uri), &bob)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, authed(get("/api/tasks/stats"), &bob)).await;
    assert_eq!(body["data"]["total"], 1);

    let (status, _) = send(&app, authed(delete("/api/tasks"), &bob)).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = send(&app, get("/api/tasks")).await;
    assert_eq!(body["count"], 2);

    let (status, _) = send(&app, authed(get(&uri), &alice)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn required_auth_rejects_anonymous_task_calls() {
    let app = app_with(ApiConfig { require_auth: true });

    let (status, body) = send(&app, get("/api/tasks")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "No token provided");

    let (status, _) = send(&app, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);

    let token = register(&app, "carol@example.com").await;
    let (status, body) = send(&app, authed(get("/api/tasks"), &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn update_rejects_null_fields() {
    let app = app();
    let task = create(&app, "Keep me", "Unchanged").await;
    let uri = format!("/api/tasks/{}", task["id"].as_str().unwrap());

    let (status, body) = send(&app, with_json("PUT", &uri, json!({ "completed": null }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("Completed must be a boolean"));

    let (status, body) = send(&app, with_json("PUT", &uri, json!({ "title": null }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("Title must be between 3 and 100 characters")
    );

    let (status, _) = send(&app, with_json("PUT", &uri, json!({ "description": null }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&app, get(&uri)).await;
    assert_eq!(body["data"], task);
}

#[tokio::test]
async fn stats_and_listing_agree_on_owner_filter() {
    let app = app();
    let (status, _) = send(
        &app,
        with_json(
            "POST",
            "/api/tasks",
            json!({ "title": "Owned", "description": "by u1", "userId": "u1" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    create(&app, "Unowned", "nobody").await;

    let (_, body) = send(&app, get("/api/tasks?userId=%20u1")).await;
    assert_eq!(body["count"], 1);

    let (status, body) = send(&app, get("/api/tasks/stats?userId=%20u1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({ "total": 1, "completed": 0, "pending": 1 }));

    let (status, _) = send(&app, get("/api/tasks/stats?userId=%20")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
