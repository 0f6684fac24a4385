//! ConversationRepository trait definition.
//!
//! Durable persistence keyed by record id, with secondary lookup by user,
//! chat, and message. Implementations live in converse-infra (e.g.,
//! `SqliteConversationRepository`). Uses native async fn in traits
//! (RPITIT, Rust 2024 edition).

use converse_types::error::RepositoryError;
use converse_types::turn::{ChatSummary, Page, Turn, TurnPatch};
use uuid::Uuid;

pub trait ConversationRepository: Send + Sync {
    /// Persist a completed turn atomically (input and response together,
    /// never input alone).
    ///
    /// Fails with `RepositoryError::Conflict` if the turn's
    /// `response_session_id` already exists, or if its `message_uid` is
    /// already taken within the chat.
    fn create(
        &self,
        turn: &Turn,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Turns in a chat, ordered by `created_at` ascending.
    fn get_by_chat(
        &self,
        chat_id: &Uuid,
        page: Page,
    ) -> impl std::future::Future<Output = Result<Vec<Turn>, RepositoryError>> + Send;

    /// Chat summaries, most recent activity first. A `user_id` filter of
    /// `None` lists every conversation.
    fn list_chats(
        &self,
        user_id: Option<&str>,
        page: Page,
    ) -> impl std::future::Future<Output = Result<Vec<ChatSummary>, RepositoryError>> + Send;

    /// Zero or one turn carrying the given message uid.
    fn get_by_message(
        &self,
        message_uid: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Turn>, RepositoryError>> + Send;

    /// Remove every turn in a chat. Fails with `NotFound` if the chat has
    /// no turns; returns the number of rows removed otherwise.
    fn delete_by_chat(
        &self,
        chat_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Remove a single turn by record id. Fails with `NotFound` if absent.
    fn delete_by_record(
        &self,
        record_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Amend `model_response` and/or `metadata`; bumps `updated_at`.
    /// Fails with `NotFound` if the record does not exist.
    fn update(
        &self,
        record_id: &Uuid,
        patch: &TurnPatch,
    ) -> impl std::future::Future<Output = Result<Turn, RepositoryError>> + Send;
}
