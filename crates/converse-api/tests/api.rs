//! End-to-end API tests against an in-process router with a deterministic
//! inference provider and a tempfile SQLite database.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use converse_api::http::router::build_router;
use converse_api::state::AppState;
use converse_core::gateway::InferenceProvider;
use converse_infra::config::ServiceConfig;
use converse_infra::sqlite::conversation::SqliteConversationRepository;
use converse_infra::sqlite::pool::DatabasePool;
use converse_types::llm::{GenerationOptions, InferenceError};

/// Provider that echoes the prompt, or fails every call.
#[derive(Clone)]
struct EchoProvider {
    fail: bool,
}

impl InferenceProvider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    async fn generate(
        &self,
        prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<String, InferenceError> {
        if self.fail {
            Err(InferenceError::Unavailable("simulated outage".into()))
        } else {
            Ok(format!("echo: {prompt}"))
        }
    }
}

async fn test_router(fail_inference: bool) -> (tempfile::TempDir, Router) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("api.db").display());
    let pool = DatabasePool::new(&url).await.unwrap();
    let repo = SqliteConversationRepository::new(pool);

    let mut config = ServiceConfig::default();
    // Keep failing-provider tests fast.
    config.inference.max_retries = 0;

    let state = AppState::with_parts(
        repo,
        EchoProvider {
            fail: fail_inference,
        },
        &config,
    );
    (dir, build_router(state))
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(body) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn scenario_a_new_conversation_succeeds() {
    let (_dir, router) = test_router(false).await;

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/v1/chat",
        Some(json!({ "user_id": "u1", "message": "hello" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert!(body["chat_id"].is_string());
    assert_eq!(body["response"], "echo: hello");
    assert_eq!(body["metadata"]["question"], "hello");
}

#[tokio::test]
async fn scenario_b_eleventh_request_rate_limited() {
    let (_dir, router) = test_router(false).await;

    for i in 0..10 {
        let (status, _) = send(
            &router,
            Method::POST,
            "/api/v1/chat",
            Some(json!({ "user_id": "u2", "message": format!("msg {i}") })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "request {i} should be admitted");
    }

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/v1/chat",
        Some(json!({ "user_id": "u2", "message": "one too many" })),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["code"], "RATE_LIMIT_EXCEEDED");
}

#[tokio::test]
async fn scenario_c_same_chat_distinct_turn_ids() {
    let (_dir, router) = test_router(false).await;

    let (_, first) = send(
        &router,
        Method::POST,
        "/api/v1/chat",
        Some(json!({ "user_id": "u1", "message": "first" })),
    )
    .await;
    let chat_id = first["chat_id"].as_str().unwrap().to_string();

    let (status, second) = send(
        &router,
        Method::POST,
        "/api/v1/chat",
        Some(json!({ "user_id": "u1", "message": "second", "chat_id": chat_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["chat_id"], first["chat_id"]);
    assert_ne!(second["message_uid"], first["message_uid"]);
    assert_ne!(second["response_session_id"], first["response_session_id"]);

    let (status, history) = send(
        &router,
        Method::GET,
        &format!("/api/v1/chats/{chat_id}/history"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let turns = history["turns"].as_array().unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0]["user_input"], "first");
    assert_eq!(turns[1]["user_input"], "second");
}

#[tokio::test]
async fn scenario_d_failed_inference_leaves_no_record() {
    let (_dir, router) = test_router(true).await;

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/v1/chat",
        Some(json!({ "user_id": "u1", "message": "hello", "chat_id": "018f4e1a-0000-7000-8000-000000000001" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "INFERENCE_UNAVAILABLE");

    let (status, history) = send(
        &router,
        Method::GET,
        "/api/v1/chats/018f4e1a-0000-7000-8000-000000000001/history",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(history["turns"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn empty_message_rejected() {
    let (_dir, router) = test_router(false).await;

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/v1/chat",
        Some(json!({ "user_id": "u1", "message": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn negative_offset_rejected() {
    let (_dir, router) = test_router(false).await;

    let (status, body) = send(
        &router,
        Method::GET,
        "/api/v1/chats/018f4e1a-0000-7000-8000-000000000001/history?offset=-1",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn list_and_delete_conversation() {
    let (_dir, router) = test_router(false).await;

    let (_, created) = send(
        &router,
        Method::POST,
        "/api/v1/chat",
        Some(json!({ "user_id": "u1", "message": "hello" })),
    )
    .await;
    let chat_id = created["chat_id"].as_str().unwrap().to_string();

    let (status, list) = send(&router, Method::GET, "/api/v1/chats?user_id=u1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["chats"].as_array().unwrap().len(), 1);

    let (status, deleted) = send(
        &router,
        Method::DELETE,
        &format!("/api/v1/chats/{chat_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["deleted"], 1);

    // Deleting again is a 404, not an idempotent success.
    let (status, body) = send(
        &router,
        Method::DELETE,
        &format!("/api/v1/chats/{chat_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn message_lookup_round_trip() {
    let (_dir, router) = test_router(false).await;

    let (_, created) = send(
        &router,
        Method::POST,
        "/api/v1/chat",
        Some(json!({ "user_id": "u1", "message": "find me" })),
    )
    .await;
    let message_uid = created["message_uid"].as_str().unwrap();

    let (status, turn) = send(
        &router,
        Method::GET,
        &format!("/api/v1/messages/{message_uid}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(turn["user_input"], "find me");

    let (status, _) = send(
        &router,
        Method::GET,
        "/api/v1/messages/018f4e1a-0000-7000-8000-00000000dead",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_endpoint() {
    let (_dir, router) = test_router(false).await;
    let (status, body) = send(&router, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}
