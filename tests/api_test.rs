mod helpers;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use helpers::{app_state, capture_logs, counting_store, CountingStore, FakeProvider};
use memoryos::server::router;
use serde_json::{json, Value};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    store: Arc<CountingStore>,
    provider: Arc<FakeProvider>,
}

fn test_app() -> TestApp {
    test_app_with(FakeProvider::new())
}

fn test_app_with(provider: FakeProvider) -> TestApp {
    let store = Arc::new(counting_store());
    let provider = Arc::new(provider);
    let state = app_state(store.clone(), provider.clone());
    TestApp {
        router: router(state),
        store,
        provider,
    }
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
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

fn with_json(method: &str, uri: &str, body: &Value) -> Request<Body> {
    raw_json(method, uri, body.to_string())
}

fn raw_json(method: &str, uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn create(app: &TestApp, body: Value) -> String {
    let (status, json) = send(app, with_json("POST", "/memories", &body)).await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    json["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn create_then_fetch() {
    let app = test_app();

    let (status, body) = send(
        &app,
        with_json(
            "POST",
            "/memories",
            &json!({
                "title": "Borrowing",
                "content": "Shared references are Copy.",
                "category": "Learning",
                "tags": "rust, refs",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Memory created successfully");
    let id = body["id"].as_str().unwrap();

    let (status, memory) = send(&app, get(&format!("/memories/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(memory["title"], "Borrowing");
    assert_eq!(memory["category"], "Learning");
    assert_eq!(memory["memory_type"], "Note");
    assert_eq!(memory["tags"], json!(["rust", "refs"]));
    assert_eq!(memory["summary"], "A short summary.");
}

#[tokio::test]
async fn malformed_json_is_a_client_error() {
    let app = test_app();
    let (status, body) = send(&app, raw_json("POST", "/memories", "{not json".into())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert_eq!(app.store.calls(), 0);
}

#[tokio::test]
async fn missing_title_is_rejected_without_side_effects() {
    let app = test_app();
    let (status, body) = send(
        &app,
        with_json("POST", "/memories", &json!({ "content": "orphan" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Title and content are required" }));
    assert_eq!(app.store.calls(), 0);
    assert_eq!(app.provider.calls(), 0);
}

#[tokio::test]
async fn store_failure_on_create_is_a_server_error() {
    let app = test_app();
    app.store.set_failing(true);

    let (status, body) = send(
        &app,
        with_json("POST", "/memories", &json!({ "title": "t", "content": "c" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn update_and_delete_round() {
    let app = test_app();
    let id = create(&app, json!({ "title": "v1", "content": "first", "category": "Task" })).await;

    let (status, body) = send(
        &app,
        with_json(
            "PUT",
            &format!("/memories/{id}"),
            &json!({ "title": "v2", "content": "second" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Memory updated successfully");

    let (_, memory) = send(&app, get(&format!("/memories/{id}"))).await;
    assert_eq!(memory["title"], "v2");
    assert_eq!(memory["category"], "Task");

    let (status, body) = send(&app, delete(&format!("/memories/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = send(&app, get(&format!("/memories/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Memory not found" }));
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let app = test_app();

    let (status, _) = send(&app, delete("/memories/missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        with_json(
            "PUT",
            "/memories/missing",
            &json!({ "title": "t", "content": "c" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn search_and_tags() {
    let app = test_app();
    create(&app, json!({ "title": "Axum routing", "content": "nested routers", "tags": ["rust", "web"] })).await;
    create(&app, json!({ "title": "Groceries", "content": "milk", "tags": ["home"] })).await;

    let (status, body) = send(
        &app,
        with_json("POST", "/memories/search", &json!({ "query": "router" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["title"], "Axum routing");

    let (_, body) = send(
        &app,
        with_json("POST", "/memories/search", &json!({ "tags": "home", "category": "all" })),
    )
    .await;
    assert_eq!(body["results"][0]["title"], "Groceries");

    let (_, body) = send(&app, with_json("POST", "/memories/search", &json!({}))).await;
    assert_eq!(body, json!({ "results": [] }));

    let (status, body) = send(&app, get("/memories/tags")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "tags": ["home", "rust", "web"] }));
}

#[tokio::test]
async fn analytics_and_stacks() {
    let app = test_app();
    create(&app, json!({ "title": "a", "content": "c", "category": "Idea", "tags": ["x"] })).await;
    create(&app, json!({ "title": "b", "content": "c", "category": "Idea", "tags": ["x", "y"] })).await;

    let (status, body) = send(&app, get("/analytics/memories?timeRange=week")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_memories"], 2);
    assert_eq!(body["by_category"][0]["category"], "Idea");
    assert_eq!(body["by_category"][0]["count"], 2);
    assert_eq!(body["popular_tags"][0], json!({ "tag": "x", "count": 2 }));

    let (status, body) = send(&app, get("/memory-stack")).await;
    assert_eq!(status, StatusCode::OK);
    let stacks = body["stacks"].as_array().unwrap();
    let idea = stacks.iter().find(|s| s["title"] == "Idea").unwrap();
    assert_eq!(idea["itemCount"], 2);
    assert_eq!(idea["color"], "emerald");

    app.store.set_failing(true);
    let (status, body) = send(&app, get("/analytics/memories")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn health_reflects_store_state() {
    let app = test_app();

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["memory_count"], 0);

    app.store.set_failing(true);
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "error");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn diagnostics_probes() {
    let app = test_app();

    let (status, body) = send(&app, get("/check-table")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["exists"], true);

    let (status, body) = send(&app, get("/test-store")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["connection"], "ok");

    let (status, body) = send(&app, get("/test-openai")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Connected Successfully");
    assert_eq!(body["response"], "A short summary.");

    let (status, body) = send(&app, get("/test-env")).await;
    assert_eq!(status, StatusCode::OK);
    let value = &body["OPENAI_API_KEY"];
    assert!(value == "set" || value == "unset");
}

#[tokio::test]
async fn provider_probe_reports_failure() {
    let app = test_app_with(FakeProvider::failing());
    let (status, body) = send(&app, get("/test-openai")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("503"));
}

#[tokio::test]
async fn provider_outage_still_creates() {
    let app = test_app_with(FakeProvider::failing());
    let id = create(&app, json!({ "title": "offline", "content": "still saved" })).await;

    let (_, memory) = send(&app, get(&format!("/memories/{id}"))).await;
    assert_eq!(memory["summary"], "still saved");
    assert!(memory["embedding"].is_null());
}

#[tokio::test]
async fn store_failures_are_logged_once_per_request() {
    let app = test_app();
    app.store.set_failing(true);
    let (logs, _guard) = capture_logs();

    let requests = [
        with_json("POST", "/memories", &json!({ "title": "t", "content": "c" })),
        get("/memories/some-id"),
        delete("/memories/some-id"),
        with_json("POST", "/memories/search", &json!({ "query": "x" })),
        get("/memories/tags"),
        get("/analytics/memories"),
        get("/memory-stack"),
    ];
    let count = requests.len();
    for request in requests {
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    let errors = logs.error_lines();
    assert_eq!(errors.len(), count, "{errors:#?}");
}
