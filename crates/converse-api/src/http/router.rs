//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/`. Middleware: permissive CORS (auth is
//! handled outside this service, matching the source system) and request
//! tracing.

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use converse_core::gateway::InferenceProvider;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router<P: InferenceProvider + 'static>(state: AppState<P>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/chat", post(handlers::chat::submit_message))
        .route("/chats", get(handlers::history::list_conversations))
        .route(
            "/chats/{chat_id}/history",
            get(handlers::history::get_chat_history),
        )
        .route(
            "/chats/{chat_id}",
            delete(handlers::history::delete_conversation),
        )
        .route(
            "/messages/{message_uid}",
            get(handlers::history::get_message),
        )
        .route(
            "/turns/{record_id}",
            delete(handlers::history::delete_turn),
        );

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - simple health check endpoint.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "healthy",
        "service": "converse",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
