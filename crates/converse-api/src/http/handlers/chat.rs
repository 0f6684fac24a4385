//! Chat submission endpoint.
//!
//! POST /api/v1/chat -- forwards one user message through the orchestrator
//! and returns the persisted turn.

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use converse_core::gateway::InferenceProvider;
use converse_core::limiter::ANONYMOUS_USER;
use converse_core::service::SubmitMessage;
use converse_types::identity::ConversationKey;
use converse_types::turn::{Turn, TurnMetadata};

use crate::http::error::AppError;
use crate::state::AppState;

/// Request body for message submission.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The user's message text.
    pub message: String,
    /// Requester identity; defaults to `"anonymous"`.
    pub user_id: Option<String>,
    /// Existing conversation to continue; absent starts a new one.
    pub chat_id: Option<Uuid>,
    /// Caller-supplied message identifier, generated when absent.
    pub message_uid: Option<Uuid>,
}

/// Response body for a successfully processed turn.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub status: &'static str,
    pub record_id: Uuid,
    pub chat_id: Uuid,
    pub message_uid: Uuid,
    pub response_session_id: Uuid,
    pub response: String,
    pub metadata: TurnMetadata,
    pub created_at: DateTime<Utc>,
}

impl From<Turn> for ChatResponse {
    fn from(turn: Turn) -> Self {
        Self {
            status: "success",
            record_id: turn.id,
            chat_id: turn.chat_id,
            message_uid: turn.message_uid,
            response_session_id: turn.response_session_id,
            response: turn.model_response,
            metadata: turn.metadata,
            created_at: turn.created_at,
        }
    }
}

/// POST /api/v1/chat -- submit a message and get the AI response.
pub async fn submit_message<P: InferenceProvider + 'static>(
    State(state): State<AppState<P>>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let msg = SubmitMessage {
        user_id: body.user_id.unwrap_or_else(|| ANONYMOUS_USER.to_string()),
        text: body.message,
        key: ConversationKey::from_parts(body.chat_id, body.message_uid),
    };

    let turn = state.service.submit_message(msg).await?;
    Ok(Json(ChatResponse::from(turn)))
}
