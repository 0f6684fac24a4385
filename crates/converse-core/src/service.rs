//! Chat orchestration: the state machine for one turn.
//!
//! `ChatService` sequences a single incoming message through admission,
//! identity resolution, inference, and persistence:
//!
//! `RECEIVED -> ADMITTED -> IDENTIFIED -> INFERRED -> PERSISTED`
//!
//! Failure exits (`RateLimitExceeded`, `InvalidRequest`,
//! `InferenceUnavailable`) are terminal and persist nothing. History reads
//! bypass the limiter and the gateway entirely.
//!
//! Generic over `ConversationRepository` and `InferenceProvider` so the
//! transport layer pins concrete infra implementations and tests substitute
//! deterministic stand-ins.

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use converse_types::error::{ChatError, RepositoryError};
use converse_types::identity::ConversationKey;
use converse_types::llm::GenerationOptions;
use converse_types::turn::{ChatSummary, Turn, TurnMetadata, TurnPatch, TurnView};

use crate::gateway::{InferenceGateway, InferenceProvider, RetryPolicy};
use crate::history;
use crate::identity;
use crate::limiter::RateLimiter;
use crate::repository::ConversationRepository;

/// An incoming chat message, already parsed by the transport layer.
#[derive(Debug, Clone)]
pub struct SubmitMessage {
    pub user_id: String,
    pub text: String,
    pub key: ConversationKey,
}

/// Orchestrates the full lifecycle of chat turns.
pub struct ChatService<R: ConversationRepository, P: InferenceProvider> {
    repo: R,
    gateway: InferenceGateway<P>,
    limiter: RateLimiter,
    options: GenerationOptions,
}

impl<R: ConversationRepository, P: InferenceProvider> ChatService<R, P> {
    pub fn new(
        repo: R,
        provider: P,
        retry_policy: RetryPolicy,
        limiter: RateLimiter,
        options: GenerationOptions,
    ) -> Self {
        Self {
            repo,
            gateway: InferenceGateway::new(provider, retry_policy),
            limiter,
            options,
        }
    }

    /// Process one user message end to end.
    ///
    /// Returns the fully persisted turn on success. No turn is written for
    /// any failure exit; a store failure after a successful inference call
    /// is reported as `ResponseNotSaved` rather than a false success.
    pub async fn submit_message(&self, msg: SubmitMessage) -> Result<Turn, ChatError> {
        // RECEIVED -> ADMITTED
        self.limiter
            .admit(&msg.user_id)
            .map_err(ChatError::RateLimitExceeded)?;

        // ADMITTED -> IDENTIFIED
        if msg.text.trim().is_empty() {
            return Err(ChatError::InvalidRequest(
                "message text must not be empty".to_string(),
            ));
        }
        let ids = identity::allocate(&msg.key);
        info!(
            user_id = %msg.user_id,
            chat_id = %ids.chat_id,
            message_uid = %ids.message_uid,
            "processing chat request"
        );

        // IDENTIFIED -> INFERRED
        let response = self.gateway.invoke(&msg.text, &self.options).await?;

        // INFERRED -> PERSISTED
        let now = Utc::now();
        let turn = Turn {
            id: Uuid::now_v7(),
            user_id: msg.user_id.clone(),
            chat_id: ids.chat_id,
            message_uid: ids.message_uid,
            response_session_id: ids.response_session_id,
            user_input: msg.text.clone(),
            model_response: response,
            metadata: build_metadata(&msg, &ids, now),
            created_at: now,
            updated_at: now,
        };

        match self.repo.create(&turn).await {
            Ok(()) => {
                info!(record_id = %turn.id, chat_id = %turn.chat_id, "turn persisted");
                Ok(turn)
            }
            Err(RepositoryError::Conflict(detail)) => {
                // A fresh response_session_id collided: identity-generation
                // defect, not a transient condition.
                error!(
                    response_session_id = %turn.response_session_id,
                    detail,
                    "duplicate key on freshly allocated turn"
                );
                Err(ChatError::Internal(format!(
                    "identifier collision on insert: {detail}"
                )))
            }
            Err(err) => {
                warn!(error = %err, "response generated but persistence failed");
                Err(ChatError::ResponseNotSaved(err.to_string()))
            }
        }
    }

    /// Ordered, paginated history for one chat.
    ///
    /// An unknown chat or an offset past the end yields an empty list, not
    /// an error; repeated calls with unchanged data return identical views.
    pub async fn get_chat_history(
        &self,
        chat_id: Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<TurnView>, ChatError> {
        let page = history::validate_page(limit, offset)?;
        let turns = self
            .repo
            .get_by_chat(&chat_id, page)
            .await
            .map_err(internal)?;
        Ok(history::assemble(turns))
    }

    /// Chat summaries ordered by most recent activity.
    pub async fn list_conversations(
        &self,
        user_id: Option<&str>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<ChatSummary>, ChatError> {
        let page = history::validate_page(limit, offset)?;
        self.repo.list_chats(user_id, page).await.map_err(internal)
    }

    /// Look up the single turn carrying a message uid.
    pub async fn get_turn_by_message(&self, message_uid: Uuid) -> Result<Turn, ChatError> {
        self.repo
            .get_by_message(&message_uid)
            .await
            .map_err(internal)?
            .ok_or(ChatError::NotFound)
    }

    /// Delete every turn in a conversation. Returns the number removed.
    pub async fn delete_conversation(&self, chat_id: Uuid) -> Result<u64, ChatError> {
        let removed = self.repo.delete_by_chat(&chat_id).await.map_err(|err| match err {
            RepositoryError::NotFound => ChatError::NotFound,
            other => internal(other),
        })?;
        info!(chat_id = %chat_id, removed, "conversation deleted");
        Ok(removed)
    }

    /// Delete a single turn by record id.
    pub async fn delete_record(&self, record_id: Uuid) -> Result<(), ChatError> {
        self.repo.delete_by_record(&record_id).await.map_err(|err| match err {
            RepositoryError::NotFound => ChatError::NotFound,
            other => internal(other),
        })
    }

    /// Amend a stored turn's response or metadata.
    pub async fn amend_turn(&self, record_id: Uuid, patch: TurnPatch) -> Result<Turn, ChatError> {
        self.repo.update(&record_id, &patch).await.map_err(|err| match err {
            RepositoryError::NotFound => ChatError::NotFound,
            other => internal(other),
        })
    }
}

fn internal(err: RepositoryError) -> ChatError {
    ChatError::Internal(err.to_string())
}

/// Auxiliary fields duplicated for client convenience, mirroring the
/// metadata document the source system attached to each turn.
fn build_metadata(
    msg: &SubmitMessage,
    ids: &converse_types::identity::TurnIds,
    now: chrono::DateTime<Utc>,
) -> TurnMetadata {
    let mut metadata = TurnMetadata::new();
    metadata.insert("question".to_string(), msg.text.clone().into());
    metadata.insert("processed".to_string(), true.into());
    metadata.insert("user_id".to_string(), msg.user_id.clone().into());
    metadata.insert("chat_id".to_string(), ids.chat_id.to_string().into());
    metadata.insert("message_uid".to_string(), ids.message_uid.to_string().into());
    metadata.insert(
        "response_session_id".to_string(),
        ids.response_session_id.to_string().into(),
    );
    metadata.insert("timestamp".to_string(), now.to_rfc3339().into());
    metadata
}
