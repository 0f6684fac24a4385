//! History and conversation management endpoints.
//!
//! - GET    /api/v1/chats                      -- list conversations
//! - GET    /api/v1/chats/{chat_id}/history    -- ordered turn views
//! - GET    /api/v1/messages/{message_uid}     -- single turn lookup
//! - DELETE /api/v1/chats/{chat_id}            -- delete a conversation
//! - DELETE /api/v1/turns/{record_id}          -- delete one record

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use converse_core::gateway::InferenceProvider;
use converse_types::turn::{ChatSummary, TurnView};

use crate::http::error::AppError;
use crate::state::AppState;

/// Pagination query parameters shared by the list endpoints.
#[derive(Debug, Deserialize, Default)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Query parameters for the conversation list endpoint.
#[derive(Debug, Deserialize, Default)]
pub struct ChatListQuery {
    /// Filter to a single user's conversations.
    pub user_id: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub chat_id: Uuid,
    pub turns: Vec<TurnView>,
}

#[derive(Debug, Serialize)]
pub struct ChatListResponse {
    pub chats: Vec<ChatSummary>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: u64,
}

/// GET /api/v1/chats/{chat_id}/history
pub async fn get_chat_history<P: InferenceProvider + 'static>(
    State(state): State<AppState<P>>,
    Path(chat_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<Json<HistoryResponse>, AppError> {
    let turns = state
        .service
        .get_chat_history(chat_id, query.limit, query.offset)
        .await?;
    Ok(Json(HistoryResponse { chat_id, turns }))
}

/// GET /api/v1/chats
pub async fn list_conversations<P: InferenceProvider + 'static>(
    State(state): State<AppState<P>>,
    Query(query): Query<ChatListQuery>,
) -> Result<Json<ChatListResponse>, AppError> {
    let chats = state
        .service
        .list_conversations(query.user_id.as_deref(), query.limit, query.offset)
        .await?;
    Ok(Json(ChatListResponse { chats }))
}

/// GET /api/v1/messages/{message_uid}
pub async fn get_message<P: InferenceProvider + 'static>(
    State(state): State<AppState<P>>,
    Path(message_uid): Path<Uuid>,
) -> Result<Json<TurnView>, AppError> {
    let turn = state.service.get_turn_by_message(message_uid).await?;
    Ok(Json(TurnView::from(turn)))
}

/// DELETE /api/v1/chats/{chat_id}
pub async fn delete_conversation<P: InferenceProvider + 'static>(
    State(state): State<AppState<P>>,
    Path(chat_id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, AppError> {
    let deleted = state.service.delete_conversation(chat_id).await?;
    Ok(Json(DeleteResponse { deleted }))
}

/// DELETE /api/v1/turns/{record_id}
pub async fn delete_turn<P: InferenceProvider + 'static>(
    State(state): State<AppState<P>>,
    Path(record_id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, AppError> {
    state.service.delete_record(record_id).await?;
    Ok(Json(DeleteResponse { deleted: 1 }))
}
